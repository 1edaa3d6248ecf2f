use fibre_binder::{
  implements, resolve, Binding, BindingFactory, BindingType, Construct, ConstraintType, ConstructionError, Container,
  ContainerExtension, ContainerRef, DuplicatePolicy, Error, Id, InjectionContext, Injectable, Result, TypeKey,
  Value,
};
use std::io;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

// --- Test Fixtures ---

trait Foo: Send + Sync {
  fn name(&self) -> &'static str;
}

#[derive(Default)]
struct FooImpl;

impl Foo for FooImpl {
  fn name(&self) -> &'static str {
    "foo-impl"
  }
}

#[derive(Default)]
struct LoudFoo;

impl Foo for LoudFoo {
  fn name(&self) -> &'static str {
    "LOUD"
  }
}

implements!(FooImpl => dyn Foo);
implements!(LoudFoo => dyn Foo);

#[derive(Debug, PartialEq)]
struct Weapon(&'static str);

#[derive(Default)]
struct Knight {
  weapon: Mutex<Option<Arc<Weapon>>>,
}

impl Knight {
  fn weapon(&self) -> Option<&'static str> {
    self.weapon.lock().unwrap().as_ref().map(|w| w.0)
  }
}

impl Injectable for Knight {
  fn inject(&self, container: &Container, ctx: &InjectionContext) -> Result<()> {
    let weapon = container.resolve::<Weapon>(None, ctx)?;
    *self.weapon.lock().unwrap() = Some(weapon);
    Ok(())
  }
}

struct Archer;

fn container_with_foos() -> Arc<Container> {
  let container = Container::new();
  let factories = container.factories().unwrap();
  factories.register_default::<FooImpl>();
  factories.register_default::<LoudFoo>();
  container
}

fn empty_ctx() -> InjectionContext {
  InjectionContext::new()
}

// --- Binding & Resolution ---

#[test]
fn test_bind_to_concrete_as_id_then_unbind() {
  // Arrange
  let container = container_with_foos();
  let x = Id::from("x");

  // Act
  container.bind::<dyn Foo>().to::<FooImpl>().unwrap().as_id("x");
  let binding = container.get_binding::<dyn Foo>(Some(&x)).unwrap();
  let foo = container.resolve::<dyn Foo>(Some(&x), &empty_ctx()).unwrap();

  // Assert
  assert_eq!(binding.type_key(), TypeKey::of::<dyn Foo>());
  assert_eq!(binding.id(), Some(&x));
  assert_eq!(foo.name(), "foo-impl");

  // Act
  container.unbind::<dyn Foo>(Some(&x));

  // Assert
  assert!(container.get_binding::<dyn Foo>(Some(&x)).is_none());
  assert!(matches!(
    container.resolve::<dyn Foo>(Some(&x), &empty_ctx()),
    Err(Error::NotFound { .. })
  ));
}

#[test]
fn test_temp_binding_constructs_every_time() {
  let container = container_with_foos();
  container.bind::<dyn Foo>().to::<FooImpl>().unwrap();

  let a = resolve!(container, dyn Foo).unwrap();
  let b = resolve!(container, dyn Foo).unwrap();
  assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn test_singleton_binding_caches_first_construction() {
  // Arrange
  let container = Container::new();
  let built = Arc::new(AtomicUsize::new(0));
  let counter = built.clone();
  container.factories().unwrap().register_fn(move || {
    counter.fetch_add(1, Ordering::SeqCst);
    FooImpl
  });
  let index = container.bind_singleton::<dyn Foo>().to::<FooImpl>().unwrap().index();

  // Act
  let a = resolve!(container, dyn Foo).unwrap();
  let b = resolve!(container, dyn Foo).unwrap();

  // Assert
  assert!(Arc::ptr_eq(&a, &b));
  assert_eq!(built.load(Ordering::SeqCst), 1);
  let cached = container.binding(index).unwrap().value().unwrap();
  assert!(cached.points_to(&a));
}

#[test]
fn test_singleton_resolves_to_one_instance_across_threads() {
  let container = container_with_foos();
  container.bind_singleton::<dyn Foo>().to::<FooImpl>().unwrap();

  let handles: Vec<_> = (0..8)
    .map(|_| {
      let container = container.clone();
      thread::spawn(move || resolve!(container, dyn Foo).unwrap())
    })
    .collect();
  let resolved: Vec<Arc<dyn Foo>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

  let first = Value::from_arc(resolved[0].clone());
  for foo in &resolved {
    assert!(first.points_to(foo));
  }
}

#[test]
fn test_singleton_value_replaces_on_second_instance() {
  let container = Container::new();
  let first = Arc::new(Weapon("axe"));
  let second = Arc::new(Weapon("bow"));

  let index = container
    .bind_singleton::<Weapon>()
    .to_instance(first)
    .to_instance(second.clone())
    .index();

  let values = container.binding(index).unwrap().values();
  assert_eq!(values.len(), 1);
  assert!(values[0].points_to(&second));
}

#[test]
fn test_multiple_binding_resolve_all_preserves_order() {
  let container = Container::new();
  container
    .bind::<Weapon>()
    .to_value(Weapon("axe"))
    .to_value(Weapon("bow"))
    .to_value(Weapon("club"));

  let all = container.resolve_all::<Weapon>(None, &empty_ctx()).unwrap();
  let names: Vec<&str> = all.iter().map(|w| w.0).collect();
  assert_eq!(names, vec!["axe", "bow", "club"]);
}

#[test]
fn test_resolve_all_collects_every_matching_multiple_binding() {
  let container = container_with_foos();
  container.bind::<dyn Foo>().to::<FooImpl>().unwrap();
  container.bind::<dyn Foo>().to::<LoudFoo>().unwrap();

  let foos = container.resolve_all::<dyn Foo>(None, &empty_ctx()).unwrap();
  let names: Vec<&str> = foos.iter().map(|f| f.name()).collect();
  assert_eq!(names, vec!["foo-impl", "LOUD"]);
}

#[test]
fn test_factory_binding_sees_injection_context() {
  // Arrange
  let container = Container::new();
  container.bind_factory::<String>().to_factory(|ctx, _| {
    let parent = ctx.parent_type.map_or("nobody", |key| key.name());
    let member = ctx.member_type.map_or("?", |key| key.name());
    Ok(Arc::new(format!("{member} for {parent}")))
  });

  // Act
  let ctx = InjectionContext::new().with_parent_type::<Knight>();
  let a = container.resolve::<String>(None, &ctx).unwrap();
  let b = container.resolve::<String>(None, &ctx).unwrap();

  // Assert
  assert_eq!(
    *a,
    format!(
      "{} for {}",
      std::any::type_name::<String>(),
      std::any::type_name::<Knight>()
    )
  );
  assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn test_value_binding_constructs_eagerly() {
  // Arrange
  let container = Container::new();
  let built = Arc::new(AtomicUsize::new(0));
  let counter = built.clone();
  container.factories().unwrap().register_fn(move || {
    counter.fetch_add(1, Ordering::SeqCst);
    FooImpl
  });

  // Act
  let index = container.bind_value::<dyn Foo>().to::<FooImpl>().unwrap().index();

  // Assert
  assert_eq!(built.load(Ordering::SeqCst), 1);
  let binding = container.binding(index).unwrap();
  assert_eq!(binding.binding_type(), BindingType::Value);
  assert!(binding.value().is_some());
}

#[test]
fn test_value_binding_surfaces_construction_errors_at_bind() {
  let container = Container::new();
  let err = container.bind_value::<dyn Foo>().to::<FooImpl>().unwrap_err();
  assert!(matches!(
    err,
    Error::Construction(ConstructionError::NoFactory(_))
  ));
}

// --- Conditions ---

#[test]
fn test_parent_type_condition_selects_binding() {
  // Arrange
  let container = Container::new();
  container
    .bind::<Weapon>()
    .to_value(Weapon("sword"))
    .into_type::<Knight>();
  container.bind::<Weapon>().to_value(Weapon("fists"));

  // Act
  let for_knight = container
    .resolve::<Weapon>(None, &InjectionContext::new().with_parent_type::<Knight>())
    .unwrap();
  let for_archer = container
    .resolve::<Weapon>(None, &InjectionContext::new().with_parent_type::<Archer>())
    .unwrap();

  // Assert
  assert_eq!(*for_knight, Weapon("sword"));
  assert_eq!(*for_archer, Weapon("fists"));
}

#[test]
fn test_unsatisfied_conditions_report_no_matching_binding() {
  let container = Container::new();
  container.bind::<Weapon>().to_value(Weapon("sword")).into_type::<Knight>();

  let err = container.resolve::<Weapon>(None, &empty_ctx()).unwrap_err();
  assert!(matches!(err, Error::NoMatchingBinding { candidates: 1, .. }));
  assert!(err.is_absent());
  assert!(container.try_resolve::<Weapon>(None, &empty_ctx()).unwrap().is_none());
}

#[test]
fn test_empty_bindings_are_skipped() {
  let container = Container::new();
  container.bind::<Weapon>();
  container.bind::<Weapon>().to_value(Weapon("club"));

  assert_eq!(*resolve!(container, Weapon).unwrap(), Weapon("club"));
}

#[test]
fn test_parent_instance_condition_is_identity_based() {
  // Arrange
  let container = Container::new();
  let chosen = Arc::new(Knight::default());
  let other = Arc::new(Knight::default());
  container
    .bind::<Weapon>()
    .to_value(Weapon("lance"))
    .into_instance(&chosen);
  container.bind::<Weapon>().to_value(Weapon("dagger"));

  // Act
  container.inject(&chosen).unwrap();
  container.inject(&other).unwrap();

  // Assert
  assert_eq!(chosen.weapon(), Some("lance"));
  assert_eq!(other.weapon(), Some("dagger"));
}

#[test]
fn test_custom_condition() {
  let container = Container::new();
  container
    .bind::<Weapon>()
    .to_value(Weapon("hidden"))
    .when_fn(|ctx| ctx.id.is_none() && ctx.parent_type.is_none());

  assert!(resolve!(container, Weapon).is_ok());
  let ctx = InjectionContext::new().with_parent_type::<Archer>();
  assert!(container.try_resolve::<Weapon>(None, &ctx).unwrap().is_none());
}

// --- Construction ---

#[test]
fn test_construction_failure_propagates_verbatim() {
  let container = Container::new();
  container
    .factories()
    .unwrap()
    .register::<Weapon>(|_| Err("forge is cold".into()));
  container.bind::<Weapon>().to_self().unwrap();

  let err = resolve!(container, Weapon).unwrap_err();
  match err {
    Error::Construction(ConstructionError::Failed { type_name, source }) => {
      assert_eq!(type_name, std::any::type_name::<Weapon>());
      assert_eq!(source.to_string(), "forge is cold");
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[derive(Debug)]
struct Chicken;
#[derive(Debug)]
struct Egg;

#[test]
fn test_circular_construction_is_an_error() {
  let container = Container::new();
  let factories = container.factories().unwrap();
  factories.register::<Chicken>(|c| {
    c.construct::<Egg>()?;
    Ok(Chicken)
  });
  factories.register::<Egg>(|c| {
    c.construct::<Chicken>()?;
    Ok(Egg)
  });

  let err = container.construct::<Chicken>().unwrap_err();
  assert!(err.to_string().contains("circular construction"));

  // The guard is released after the failure.
  factories.register_fn(|| Egg);
  assert!(container.construct::<Chicken>().is_ok());
}

#[test]
fn test_factories_resolve_their_own_dependencies() {
  struct Armory {
    weapon: Arc<Weapon>,
  }

  let container = Container::new();
  container.bind::<Weapon>().to_value(Weapon("mace"));
  container.factories().unwrap().register::<Armory>(|c| {
    Ok(Armory {
      weapon: c.resolve::<Weapon>(None, &InjectionContext::new().with_parent_type::<Armory>())?,
    })
  });
  container.bind_singleton::<Armory>().to_self().unwrap();

  let armory = resolve!(container, Armory).unwrap();
  assert_eq!(*armory.weapon, Weapon("mace"));
}

// --- Self Registration ---

#[test]
fn test_container_resolves_itself() {
  let container = Container::with_id("root");

  let handle = resolve!(container, ContainerRef).unwrap();
  let resolved = handle.upgrade().unwrap();

  assert!(Arc::ptr_eq(&resolved, &container));
  assert_eq!(resolved.id(), Some(&Id::from("root")));
  assert_eq!(container.len(), 1);
}

#[test]
fn test_container_ref_does_not_keep_container_alive() {
  let container = Container::new();
  let handle = resolve!(container, ContainerRef).unwrap();
  drop(container);
  assert!(handle.upgrade().is_none());
}

// --- Fluent Updates ---

#[test]
fn test_builder_remove_value_reports_removal() {
  let container = Container::new();
  let axe = Arc::new(Weapon("axe"));
  let bow = Arc::new(Weapon("bow"));
  let builder = container
    .bind::<Weapon>()
    .to_instance(axe.clone())
    .to_instance(bow.clone());

  let builder = builder.remove_value(&axe).unwrap();
  assert!(builder.remove_value(&bow).is_none());
  assert!(container.get_bindings_by_type::<Weapon>().is_empty());
}

#[test]
fn test_updates_on_removed_binding_are_ignored() {
  let container = Container::new();
  let builder = container.bind::<Weapon>();
  container.remove_binding(builder.index());

  let builder = builder.to_value(Weapon("ghost")).as_id("gone");
  assert!(builder.snapshot().is_none());
  assert!(container.get_bindings_by_type::<Weapon>().is_empty());
}

#[test]
fn test_contains_instance_uses_identity() {
  let container = Container::new();
  let axe = Arc::new(Weapon("axe"));
  container.bind::<Weapon>().to_instance(axe.clone());

  assert!(container.contains_instance(&Value::from_arc(axe)));
  assert!(!container.contains_instance(&Value::new(Weapon("axe"))));
}

// --- Untyped Registration ---

#[test]
fn test_multiple_bind_configures_group_through_container() {
  // Arrange
  let container = Container::new();
  let loadout = Id::from("loadout");

  // Act
  let group = container
    .multiple_bind(
      &[TypeKey::of::<Weapon>(), TypeKey::of::<String>()],
      &[BindingType::Temp, BindingType::Temp],
    )
    .unwrap()
    .as_id("loadout")
    .into_type::<Knight>()
    .to_values([Value::new(Weapon("axe")), Value::new("cape".to_string())]);

  // Assert
  assert_eq!(group.indices().len(), 2);
  let for_knight = InjectionContext::new().with_parent_type::<Knight>();
  assert_eq!(
    *container.resolve::<Weapon>(Some(&loadout), &for_knight).unwrap(),
    Weapon("axe")
  );
  assert_eq!(
    *container.resolve::<String>(Some(&loadout), &for_knight).unwrap(),
    "cape"
  );
  let for_archer = InjectionContext::new().with_parent_type::<Archer>();
  assert!(matches!(
    container.resolve::<Weapon>(Some(&loadout), &for_archer),
    Err(Error::NoMatchingBinding { .. })
  ));
}

#[test]
fn test_multiple_bind_rejects_mismatched_lengths_through_container() {
  let container = Container::new();
  let result = container.multiple_bind(&[TypeKey::of::<Weapon>()], &[]);
  assert!(matches!(
    result,
    Err(Error::ArityMismatch {
      types: 1,
      binding_types: 0
    })
  ));
  assert_eq!(container.get_bindings_by_type::<Weapon>().len(), 0);
}

#[test]
fn test_bind_key_then_configure() {
  // Arrange
  let container = Container::new();
  let index = container.bind_key(TypeKey::of::<Weapon>(), BindingType::Temp);

  // Act
  let constraint = container.configure(index, |binding| {
    let binding = binding
      .to_value(Value::new(Weapon("club")))
      .as_id("spare")
      .set_constraint(ConstraintType::Single);
    binding.get().constraint()
  });

  // Assert
  assert_eq!(constraint, Some(ConstraintType::Single));
  let spare = Id::from("spare");
  let stored = container.get_binding::<Weapon>(Some(&spare)).unwrap();
  assert_eq!(stored.binding_type(), BindingType::Temp);
  assert_eq!(*resolve!(container, Weapon, spare).unwrap(), Weapon("club"));

  container.remove_binding(index);
  assert!(container.configure(index, |binding| binding.index()).is_none());
}

#[test]
fn test_storing_a_prebuilt_binding() {
  // Arrange
  let container = Container::new();
  let added = Arc::new(AtomicUsize::new(0));
  let counter = added.clone();
  container.after_add_binding(move |_| {
    counter.fetch_add(1, Ordering::SeqCst);
  });
  let binding = BindingFactory.create_single(TypeKey::of::<Weapon>(), BindingType::Singleton);

  // Act
  let index = container.storing(binding);
  container.configure(index, |binding| {
    binding.to_value(Value::new(Weapon("lance")));
  });

  // Assert
  assert_eq!(added.load(Ordering::SeqCst), 1);
  assert_eq!(container.binding(index).unwrap().index(), Some(index));
  assert_eq!(*resolve!(container, Weapon).unwrap(), Weapon("lance"));
}

// --- Custom Construction ---

struct Offline;

impl Construct for Offline {
  fn construct(&self, _key: TypeKey, _container: &Container) -> Result<Value, ConstructionError> {
    Err(ConstructionError::NoFactory("engine offline"))
  }
}

#[test]
fn test_custom_constructor_errors_reach_resolve_unchanged() {
  let container = Container::builder().constructor(Arc::new(Offline)).build();
  assert!(container.factories().is_none());

  container.bind::<dyn Foo>().to::<FooImpl>().unwrap();

  assert!(matches!(
    resolve!(container, dyn Foo),
    Err(Error::Construction(ConstructionError::NoFactory("engine offline")))
  ));
}

// --- Duplicate Defaults ---

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
  fn contents(&self) -> String {
    String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
  }
}

impl io::Write for LogBuffer {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.0.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

fn log_two_unidentified_singletons(policy: DuplicatePolicy) -> String {
  let buffer = LogBuffer::default();
  let writer = buffer.clone();
  let subscriber = tracing_subscriber::fmt()
    .with_max_level(tracing::Level::WARN)
    .with_writer(move || writer.clone())
    .finish();

  tracing::subscriber::with_default(subscriber, || {
    let container = Container::builder().duplicate_defaults(policy).build();
    container.bind_singleton::<Weapon>().to_value(Weapon("axe"));
    container.bind_singleton::<Weapon>().to_value(Weapon("bow"));
    container.bind_singleton::<Weapon>().to_value(Weapon("named")).as_id("named");
  });
  buffer.contents()
}

#[test]
fn test_duplicate_unidentified_singleton_warns() {
  let logs = log_two_unidentified_singletons(DuplicatePolicy::Warn);
  assert_eq!(
    logs.matches("unidentified singleton registered more than once").count(),
    1
  );
}

#[test]
fn test_duplicate_unidentified_singleton_allowed_silently() {
  let logs = log_two_unidentified_singletons(DuplicatePolicy::Allow);
  assert!(!logs.contains("unidentified singleton registered more than once"));
}

// --- Hooks ---

#[test]
fn test_container_hooks_proxy_the_binder() {
  // Arrange
  let container = Container::new();
  let added = Arc::new(Mutex::new(Vec::new()));
  let removed = Arc::new(AtomicUsize::new(0));
  let log = added.clone();
  let handle = container.after_add_binding(move |binding| {
    log.lock().unwrap().push(binding.type_key().name());
  });
  let counter = removed.clone();
  container.before_remove_binding(move |_| {
    counter.fetch_add(1, Ordering::SeqCst);
  });

  // Act
  container.bind::<Weapon>();
  container.unbind_by_type::<Weapon>();
  assert!(container.remove_hook(handle));
  container.bind::<Knight>();

  // Assert
  assert_eq!(*added.lock().unwrap(), vec![std::any::type_name::<Weapon>()]);
  assert_eq!(removed.load(Ordering::SeqCst), 1);
}

fn record_len(
  container: &Arc<Container>,
  seen: &Arc<Mutex<Vec<(&'static str, usize)>>>,
  point: &'static str,
) -> impl Fn(&Binding) + Send + Sync + 'static {
  let weak = Arc::downgrade(container);
  let log = seen.clone();
  move |_| {
    if let Some(container) = weak.upgrade() {
      log.lock().unwrap().push((point, container.len()));
    }
  }
}

#[test]
fn test_hooks_may_query_their_own_container() {
  // Arrange
  let container = Container::new();
  let seen = Arc::new(Mutex::new(Vec::new()));
  container.before_add_binding(record_len(&container, &seen, "before_add"));
  container.after_add_binding(record_len(&container, &seen, "after_add"));
  container.before_remove_binding(record_len(&container, &seen, "before_remove"));
  container.after_remove_binding(record_len(&container, &seen, "after_remove"));

  // Act
  container.bind::<Weapon>();
  container.unbind_by_type::<Weapon>();

  // Assert
  assert_eq!(
    *seen.lock().unwrap(),
    vec![
      ("before_add", 1),
      ("after_add", 2),
      ("before_remove", 1),
      ("after_remove", 1)
    ]
  );
}

// --- Extensions ---

#[derive(Default)]
struct Recorder {
  events: Mutex<Vec<String>>,
}

impl Recorder {
  fn events(&self) -> Vec<String> {
    self.events.lock().unwrap().clone()
  }
}

impl ContainerExtension for Recorder {
  fn on_register(&self, container: &Container) {
    self
      .events
      .lock()
      .unwrap()
      .push(format!("register:{}", container.id().map_or("-".to_string(), Id::to_string)));
  }

  fn on_unregister(&self, _container: &Container) {
    self.events.lock().unwrap().push("unregister".to_string());
  }
}

struct HookInstaller {
  seen: Arc<AtomicUsize>,
}

impl ContainerExtension for HookInstaller {
  fn on_register(&self, container: &Container) {
    let seen = self.seen.clone();
    container.after_add_binding(move |_| {
      seen.fetch_add(1, Ordering::SeqCst);
    });
  }

  fn on_unregister(&self, _container: &Container) {}
}

#[test]
fn test_extension_lifecycle_callbacks() {
  // Arrange
  let container = Container::with_id("game");
  let recorder = Arc::new(Recorder::default());

  // Act
  assert!(container.register_extension(recorder.clone()));
  assert!(!container.register_extension(recorder.clone()));
  assert!(container.has_extension_of_type::<Recorder>());
  assert!(container.unregister_extension(&recorder));
  assert!(!container.unregister_extension(&recorder));

  // Assert
  assert_eq!(recorder.events(), vec!["register:game", "unregister"]);
  assert!(!container.has_extension_of_type::<Recorder>());
}

#[test]
fn test_unregister_extensions_of_type() {
  let container = Container::new();
  let a = Arc::new(Recorder::default());
  let b = Arc::new(Recorder::default());
  let seen = Arc::new(AtomicUsize::new(0));
  container.register_extension(a.clone());
  container.register_extension(b.clone());
  container.register_extension(Arc::new(HookInstaller { seen }));

  assert_eq!(container.unregister_extensions_of_type::<Recorder>(), 2);
  assert_eq!(container.extension_count(), 1);
  assert_eq!(a.events(), vec!["register:-", "unregister"]);
  assert_eq!(b.events(), vec!["register:-", "unregister"]);
}

#[test]
fn test_extension_constructed_through_container() {
  let container = Container::new();
  container.factories().unwrap().register_default::<Recorder>();

  let recorder = container.register_extension_of::<Recorder>().unwrap();

  assert_eq!(recorder.events(), vec!["register:-"]);
  assert!(container.has_extension_of_type::<Recorder>());
}

struct DuplicateDetector {
  duplicates: Arc<AtomicUsize>,
}

impl ContainerExtension for DuplicateDetector {
  fn on_register(&self, container: &Container) {
    let Ok(this) = container.resolve::<ContainerRef>(None, &InjectionContext::new()) else {
      return;
    };
    let duplicates = self.duplicates.clone();
    container.after_add_binding(move |binding| {
      if let Some(container) = this.upgrade() {
        if !container.get_same_null_id_binding(binding).is_empty() {
          duplicates.fetch_add(1, Ordering::SeqCst);
        }
      }
    });
  }

  fn on_unregister(&self, _container: &Container) {}
}

#[test]
fn test_extension_hook_checks_for_duplicate_defaults() {
  let container = Container::new();
  let duplicates = Arc::new(AtomicUsize::new(0));
  container.register_extension(Arc::new(DuplicateDetector {
    duplicates: duplicates.clone(),
  }));

  container.bind_singleton::<Weapon>().to_value(Weapon("axe"));
  container.bind_singleton::<Knight>();
  container.bind_singleton::<Weapon>().to_value(Weapon("bow"));

  assert_eq!(duplicates.load(Ordering::SeqCst), 1);
}

#[test]
fn test_extension_of_bound_type_is_the_bound_instance() {
  let container = Container::new();
  container.factories().unwrap().register_default::<Recorder>();
  let bound = Arc::new(Recorder::default());
  container.bind_singleton::<Recorder>().to_instance(bound.clone());

  let registered = container.register_extension_of::<Recorder>().unwrap();

  assert!(Arc::ptr_eq(&bound, &registered));
  assert_eq!(bound.events(), vec!["register:-"]);
}

#[test]
fn test_extension_can_subscribe_hooks_on_register() {
  let container = Container::new();
  let seen = Arc::new(AtomicUsize::new(0));
  container.register_extension(Arc::new(HookInstaller { seen: seen.clone() }));

  container.bind::<Weapon>();
  container.bind::<Knight>();

  assert_eq!(seen.load(Ordering::SeqCst), 2);
}

// --- Disposal ---

#[test]
fn test_dispose_clears_everything_without_callbacks() {
  // Arrange
  let container = container_with_foos();
  let recorder = Arc::new(Recorder::default());
  container.register_extension(recorder.clone());
  container.bind_singleton::<dyn Foo>().to::<FooImpl>().unwrap();
  container.pool_instance(Arc::new(Weapon("spare"))).unwrap();

  // Act
  container.dispose();

  // Assert
  assert!(container.is_empty());
  assert_eq!(container.pooled_count::<Weapon>(), 0);
  assert_eq!(container.extension_count(), 0);
  assert_eq!(recorder.events(), vec!["register:-"]);
  assert!(matches!(
    resolve!(container, dyn Foo),
    Err(Error::NotFound { .. })
  ));
}
