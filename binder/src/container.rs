//! The `Container`: a binder plus a construction capability, forming one
//! independently addressable registry.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::binder::{select_bindings, Binder, BindingMut};
use crate::binding::{Binding, BindingIndex, BindingType, Condition, ConstraintType, Deferred, Slot};
use crate::builder::{ContainerBuilder, DuplicatePolicy};
use crate::construct::{upcaster, Construct, FactoryRegistry, InstanceFactory, Upcast};
use crate::core::{Id, InjectionContext, TypeKey, Value};
use crate::error::{ConstructionError, Error, Result};
use crate::extension::{ContainerExtension, ExtensionEntry};
use crate::factory::BindingFactory;
use crate::hooks::{HookHandle, HookPoint};
use crate::pool::CommandPool;
use crate::routing::Injectable;

/// A handle to a container, bound inside the container itself so it can be
/// resolved like any other dependency.
///
/// Holds a weak reference: a container never keeps itself alive.
#[derive(Clone)]
pub struct ContainerRef(Weak<Container>);

impl ContainerRef {
  pub fn upgrade(&self) -> Option<Arc<Container>> {
    self.0.upgrade()
  }
}

impl fmt::Debug for ContainerRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("ContainerRef")
      .field(&self.0.upgrade().map(|c| c.id.clone()))
      .finish()
  }
}

/// The binding resolution container.
///
/// Thread-safe: the binder sits behind a read/write lock and is never
/// locked while user code (factories, conditions, extensions, hooks) runs.
/// `BeforeAdd` hooks fire before the binding is stored. Remove hooks and
/// `AfterAdd` hooks fire in order once the mutation is done and the lock is
/// released, so any hook may query or modify the same container.
pub struct Container {
  id: Option<Id>,
  factory: BindingFactory,
  binder: RwLock<Binder>,
  constructor: Arc<dyn Construct>,
  factories: Option<Arc<FactoryRegistry>>,
  pool: Mutex<CommandPool>,
  extensions: Mutex<Vec<ExtensionEntry>>,
  duplicate_defaults: DuplicatePolicy,
}

impl Container {
  /// An unidentified container with its own factory registry.
  pub fn new() -> Arc<Self> {
    ContainerBuilder::new().build()
  }

  pub fn with_id(id: impl Into<Id>) -> Arc<Self> {
    ContainerBuilder::new().id(id).build()
  }

  pub fn builder() -> ContainerBuilder {
    ContainerBuilder::new()
  }

  pub(crate) fn from_builder(builder: ContainerBuilder) -> Arc<Self> {
    let (constructor, factories) = match builder.constructor {
      Some(constructor) => (constructor, builder.factories),
      None => {
        let registry = Arc::new(FactoryRegistry::new());
        (registry.clone() as Arc<dyn Construct>, Some(registry))
      }
    };
    let id = builder.id;
    let pool = CommandPool::with_capacity_per_type(builder.pool_capacity);
    let duplicate_defaults = builder.duplicate_defaults;

    let container = Arc::new_cyclic(|this: &Weak<Container>| {
      let mut binder = Binder::new();
      binder.defer_hooks();
      binder
        .bind_singleton::<ContainerRef>()
        .to_value(Value::new(ContainerRef(this.clone())));
      Container {
        id,
        factory: BindingFactory,
        binder: RwLock::new(binder),
        constructor,
        factories,
        pool: Mutex::new(pool),
        extensions: Mutex::new(Vec::new()),
        duplicate_defaults,
      }
    });
    tracing::debug!(id = ?container.id, "container created");
    container
  }

  pub fn id(&self) -> Option<&Id> {
    self.id.as_ref()
  }

  /// The default factory registry, unless a custom constructor was given.
  pub fn factories(&self) -> Option<&Arc<FactoryRegistry>> {
    self.factories.as_ref()
  }

  pub fn constructor(&self) -> &Arc<dyn Construct> {
    &self.constructor
  }

  // --- Binding ---

  /// Runs `f` under the write lock, then fires the hooks it triggered.
  fn mutate<R>(&self, f: impl FnOnce(&mut Binder) -> R) -> R {
    let (result, pending) = {
      let mut binder = self.binder.write();
      let result = f(&mut binder);
      (result, binder.take_pending())
    };
    pending.fire();
    result
  }

  fn store(&self, binding: Binding) -> BindingIndex {
    let announce = self.binder.read().announce_add(&binding);
    announce.fire();
    self.mutate(|binder| binder.store_announced(binding))
  }

  fn bind_as<T: ?Sized + Any + Send + Sync>(
    &self,
    binding_type: BindingType,
    constraint: ConstraintType,
  ) -> BindingBuilder<'_, T> {
    let binding = self.factory.create_for::<T>(binding_type, constraint);
    BindingBuilder::new(self, self.store(binding))
  }

  /// `TEMP` / `MULTIPLE`.
  pub fn bind<T: ?Sized + Any + Send + Sync>(&self) -> BindingBuilder<'_, T> {
    self.bind_as(BindingType::Temp, ConstraintType::Multiple)
  }

  /// `SINGLETON` / `SINGLE`.
  pub fn bind_singleton<T: ?Sized + Any + Send + Sync>(&self) -> BindingBuilder<'_, T> {
    self.bind_as(BindingType::Singleton, ConstraintType::Single)
  }

  /// `FACTORY` / `SINGLE`.
  pub fn bind_factory<T: ?Sized + Any + Send + Sync>(&self) -> BindingBuilder<'_, T> {
    self.bind_as(BindingType::Factory, ConstraintType::Single)
  }

  /// `POOL` / `POOL`.
  pub fn bind_pool<T: ?Sized + Any + Send + Sync>(&self) -> BindingBuilder<'_, T> {
    self.bind_as(BindingType::Pool, ConstraintType::Pool)
  }

  /// `VALUE` / `MULTIPLE`: types are constructed as soon as they are bound.
  pub fn bind_value<T: ?Sized + Any + Send + Sync>(&self) -> BindingBuilder<'_, T> {
    self.bind_as(BindingType::Value, ConstraintType::Multiple)
  }

  /// Untyped bind, for callers that only hold a [`TypeKey`].
  pub fn bind_key(&self, key: TypeKey, binding_type: BindingType) -> BindingIndex {
    self.store(self.factory.create_multiple(key, binding_type))
  }

  /// One `MULTIPLE` binding per `(type, binding type)` pair, configured
  /// together through the returned group.
  pub fn multiple_bind(&self, types: &[TypeKey], binding_types: &[BindingType]) -> Result<GroupBuilder<'_>> {
    if types.len() != binding_types.len() {
      return Err(Error::ArityMismatch {
        types: types.len(),
        binding_types: binding_types.len(),
      });
    }
    let indices = types
      .iter()
      .zip(binding_types)
      .map(|(key, binding_type)| self.store(self.factory.create_multiple(*key, *binding_type)))
      .collect();
    Ok(GroupBuilder {
      container: self,
      indices,
    })
  }

  /// Stores a binding built elsewhere, e.g. with a [`BindingFactory`].
  pub fn storing(&self, binding: Binding) -> BindingIndex {
    self.store(binding)
  }

  /// Runs `f` against a stored binding under the write lock. `None` if the
  /// binding no longer exists.
  ///
  /// `f` must not call back into this container.
  pub fn configure<R>(&self, index: BindingIndex, f: impl FnOnce(BindingMut<'_>) -> R) -> Option<R> {
    self.mutate(|binder| binder.binding_mut(index).map(f))
  }

  // --- Hooks ---

  pub fn before_add_binding(&self, hook: impl Fn(&Binding) + Send + Sync + 'static) -> HookHandle {
    self.binder.write().subscribe(HookPoint::BeforeAdd, hook)
  }

  pub fn after_add_binding(&self, hook: impl Fn(&Binding) + Send + Sync + 'static) -> HookHandle {
    self.binder.write().subscribe(HookPoint::AfterAdd, hook)
  }

  pub fn before_remove_binding(&self, hook: impl Fn(&Binding) + Send + Sync + 'static) -> HookHandle {
    self.binder.write().subscribe(HookPoint::BeforeRemove, hook)
  }

  pub fn after_remove_binding(&self, hook: impl Fn(&Binding) + Send + Sync + 'static) -> HookHandle {
    self.binder.write().subscribe(HookPoint::AfterRemove, hook)
  }

  pub fn remove_hook(&self, handle: HookHandle) -> bool {
    self.binder.write().unsubscribe(handle)
  }

  // --- Queries ---
  // Everything returned here is a snapshot taken under the read lock.

  pub fn binding(&self, index: BindingIndex) -> Option<Binding> {
    self.binder.read().binding(index).cloned()
  }

  pub fn get_bindings_by_type<T: ?Sized + Any>(&self) -> Vec<Binding> {
    self.get_bindings_by_type_key(TypeKey::of::<T>())
  }

  pub fn get_bindings_by_type_key(&self, key: TypeKey) -> Vec<Binding> {
    snapshot(self.binder.read().get_bindings_by_type(key))
  }

  pub fn get_bindings_by_id(&self, id: Option<&Id>) -> Vec<Binding> {
    snapshot(self.binder.read().get_bindings_by_id(id))
  }

  pub fn get_binding<T: ?Sized + Any>(&self, id: Option<&Id>) -> Option<Binding> {
    self.get_binding_key(TypeKey::of::<T>(), id)
  }

  pub fn get_binding_key(&self, key: TypeKey, id: Option<&Id>) -> Option<Binding> {
    self.binder.read().get_binding(key, id).cloned()
  }

  pub fn get_same_null_id_binding(&self, binding: &Binding) -> Vec<Binding> {
    snapshot(self.binder.read().get_same_null_id_binding(binding))
  }

  pub fn get_all_bindings(&self) -> Vec<Binding> {
    snapshot(self.binder.read().get_all_bindings())
  }

  pub fn contains_instance(&self, value: &Value) -> bool {
    self.binder.read().contains_instance(value)
  }

  pub fn len(&self) -> usize {
    self.binder.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.binder.read().is_empty()
  }

  // --- Removal ---

  pub fn remove_value(&self, index: BindingIndex, value: &Value) -> bool {
    self.mutate(|binder| binder.remove_value(index, value))
  }

  pub fn remove_values(&self, index: BindingIndex, values: &[Value]) -> usize {
    self.mutate(|binder| binder.remove_values(index, values))
  }

  pub fn remove_binding(&self, index: BindingIndex) -> Option<Binding> {
    self.mutate(|binder| binder.remove_binding(index))
  }

  pub fn remove_binding_by_id(&self, key: TypeKey, id: Option<&Id>) -> Result<Option<Binding>> {
    self.mutate(|binder| binder.remove_binding_by_id(key, id))
  }

  pub fn unbind_by_type<T: ?Sized + Any>(&self) -> usize {
    self.unbind_by_type_key(TypeKey::of::<T>())
  }

  pub fn unbind_by_type_key(&self, key: TypeKey) -> usize {
    self.mutate(|binder| binder.unbind_by_type(key))
  }

  pub fn unbind_null_id_binding_by_type<T: ?Sized + Any>(&self) -> usize {
    self.mutate(|binder| binder.unbind_null_id_binding_by_type(TypeKey::of::<T>()))
  }

  pub fn unbind<T: ?Sized + Any>(&self, id: Option<&Id>) -> Option<Binding> {
    self.unbind_key(TypeKey::of::<T>(), id)
  }

  pub fn unbind_key(&self, key: TypeKey, id: Option<&Id>) -> Option<Binding> {
    self.mutate(|binder| binder.unbind(key, id))
  }

  // --- Resolution ---

  /// Resolves one `T` for the given id and call site.
  ///
  /// [`Error::NotFound`] and [`Error::NoMatchingBinding`] are expected
  /// outcomes; see [`Container::try_resolve`].
  pub fn resolve<T: ?Sized + Any + Send + Sync>(&self, id: Option<&Id>, ctx: &InjectionContext) -> Result<Arc<T>> {
    let value = self.resolve_key(TypeKey::of::<T>(), id, ctx)?;
    downcast(&value)
  }

  /// Like [`Container::resolve`], mapping "nothing to inject" to `None`.
  pub fn try_resolve<T: ?Sized + Any + Send + Sync>(
    &self,
    id: Option<&Id>,
    ctx: &InjectionContext,
  ) -> Result<Option<Arc<T>>> {
    match self.resolve::<T>(id, ctx) {
      Ok(value) => Ok(Some(value)),
      Err(err) if err.is_absent() => Ok(None),
      Err(err) => Err(err),
    }
  }

  pub fn resolve_all<T: ?Sized + Any + Send + Sync>(
    &self,
    id: Option<&Id>,
    ctx: &InjectionContext,
  ) -> Result<Vec<Arc<T>>> {
    self
      .resolve_key_all(TypeKey::of::<T>(), id, ctx)?
      .iter()
      .map(downcast)
      .collect()
  }

  pub fn resolve_key(&self, key: TypeKey, id: Option<&Id>, ctx: &InjectionContext) -> Result<Value> {
    let plan = self.plan(key, id, ctx)?;
    let ctx = ctx.targeting(key, id);
    let binding = plan.first().ok_or(Error::NotFound {
      type_name: key.name(),
      id: id.cloned(),
    })?;
    tracing::trace!(type_name = key.name(), id = ?id, "resolving");
    self.materialize(binding, 0, &ctx)
  }

  pub fn resolve_key_all(&self, key: TypeKey, id: Option<&Id>, ctx: &InjectionContext) -> Result<Vec<Value>> {
    let plan = self.plan(key, id, ctx)?;
    let ctx = ctx.targeting(key, id);
    let mut values = Vec::new();
    for binding in &plan {
      for position in 0..binding.slots.len() {
        values.push(self.materialize(binding, position, &ctx)?);
      }
    }
    Ok(values)
  }

  /// Selects bindings on a snapshot so conditions run without the lock.
  fn plan(&self, key: TypeKey, id: Option<&Id>, ctx: &InjectionContext) -> Result<Vec<Binding>> {
    let candidates = snapshot(self.binder.read().candidates(key, id));
    let chosen = select_bindings(candidates.iter().collect(), key, id, ctx)?;
    Ok(chosen.into_iter().cloned().collect())
  }

  fn materialize(&self, binding: &Binding, position: usize, ctx: &InjectionContext) -> Result<Value> {
    let slot = binding.slots.get(position).ok_or(Error::NotFound {
      type_name: binding.type_key.name(),
      id: binding.id.clone(),
    })?;
    match slot {
      Slot::Instance(value) => Ok(value.clone()),
      Slot::Factory(factory) => Ok(factory.create(ctx, self)?),
      Slot::Type(deferred) => match binding.binding_type {
        BindingType::Singleton => {
          let value = self.build_deferred(deferred)?;
          Ok(match binding.index {
            Some(index) => self
              .binder
              .write()
              .cache_instance(index, position, deferred.concrete, value),
            None => value,
          })
        }
        BindingType::Pool => match self.take_pooled(binding.type_key, deferred.concrete) {
          Some(value) if value.type_key() == binding.type_key => Ok(value),
          Some(value) => Ok((deferred.upcast)(&value)?),
          None => self.build_deferred(deferred),
        },
        BindingType::Temp | BindingType::Factory | BindingType::Value => self.build_deferred(deferred),
      },
    }
  }

  fn build_deferred(&self, deferred: &Deferred) -> Result<Value> {
    let concrete = self.construct_key(deferred.concrete)?;
    Ok((deferred.upcast)(&concrete)?)
  }

  // A pooled instance may have been returned either as the concrete type or
  // as the bound type.
  fn take_pooled(&self, bound: TypeKey, concrete: TypeKey) -> Option<Value> {
    let mut pool = self.pool.lock();
    pool
      .get_command_from_pool(concrete)
      .ok()
      .or_else(|| pool.get_command_from_pool(bound).ok())
  }

  // --- Construction ---

  /// Builds a fresh `T` through the construction capability.
  pub fn construct<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
    let value = self.construct_key(TypeKey::of::<T>())?;
    downcast(&value)
  }

  pub fn construct_key(&self, key: TypeKey) -> Result<Value> {
    Ok(self.constructor.construct(key, self)?)
  }

  // --- Command pool ---

  /// Builds a `T` and parks it in the command pool.
  ///
  /// Capacity is checked before building, so a full pool fails with
  /// [`Error::PoolFull`] without constructing anything.
  pub fn pool_command<T: Any + Send + Sync>(&self) -> Result<()> {
    let key = TypeKey::of::<T>();
    self.pool.lock().ensure_room(key)?;
    // Construction may use the pool, so it runs unlocked.
    let value = self.construct_key(key)?;
    self.pool.lock().pool_built(key, value)
  }

  /// Returns an unused instance to the pool.
  pub fn pool_instance<T: ?Sized + Any + Send + Sync>(&self, instance: Arc<T>) -> Result<()> {
    self.pool.lock().pool_instance(Value::from_arc(instance))
  }

  /// [`Error::PoolEmpty`] means the caller should construct a fresh one.
  pub fn get_command_from_pool<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    let value = self.pool.lock().get_command_from_pool(TypeKey::of::<T>())?;
    downcast(&value)
  }

  pub fn pooled_count<T: ?Sized + Any>(&self) -> usize {
    self.pool.lock().available(TypeKey::of::<T>())
  }

  // --- Extensions ---

  /// Attaches an extension and calls its `on_register`. Returns `false`
  /// (and does nothing) if this exact instance is already attached.
  pub fn register_extension<E: ContainerExtension>(&self, extension: Arc<E>) -> bool {
    {
      let mut extensions = self.extensions.lock();
      if extensions.iter().any(|entry| entry.is(&extension)) {
        tracing::debug!(extension = std::any::type_name::<E>(), "extension already registered");
        return false;
      }
      extensions.push(ExtensionEntry::new(extension.clone()));
    }
    extension.on_register(self);
    true
  }

  /// Resolves an `E` from the container's bindings, constructing a fresh one
  /// if none is bound, then attaches it.
  pub fn register_extension_of<E: ContainerExtension>(&self) -> Result<Arc<E>> {
    let extension = match self.try_resolve::<E>(None, &InjectionContext::new())? {
      Some(bound) => bound,
      None => self.construct::<E>()?,
    };
    self.register_extension(extension.clone());
    Ok(extension)
  }

  pub fn unregister_extension<E: ContainerExtension>(&self, extension: &Arc<E>) -> bool {
    let removed = {
      let mut extensions = self.extensions.lock();
      extensions
        .iter()
        .position(|entry| entry.is(extension))
        .map(|i| extensions.remove(i))
    };
    match removed {
      Some(entry) => {
        entry.extension.on_unregister(self);
        true
      }
      None => false,
    }
  }

  /// Detaches every extension of type `E`. Returns how many were removed.
  pub fn unregister_extensions_of_type<E: ContainerExtension>(&self) -> usize {
    let removed: Vec<ExtensionEntry> = {
      let mut extensions = self.extensions.lock();
      let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut *extensions)
        .into_iter()
        .partition(|entry| entry.is_of_type::<E>());
      *extensions = rest;
      matching
    };
    for entry in &removed {
      entry.extension.on_unregister(self);
    }
    removed.len()
  }

  pub fn has_extension_of_type<E: ContainerExtension>(&self) -> bool {
    self.extensions.lock().iter().any(ExtensionEntry::is_of_type::<E>)
  }

  pub fn extension_count(&self) -> usize {
    self.extensions.lock().len()
  }

  // --- Injection ---

  /// Lets `target` pull its dependencies from this container.
  pub fn inject<T: Injectable>(&self, target: &Arc<T>) -> Result<()> {
    tracing::trace!(target_type = std::any::type_name::<T>(), id = ?self.id, "injecting");
    let ctx = InjectionContext::for_parent(target);
    target.inject(self, &ctx)
  }

  /// Drops every binding, pooled instance and extension. Hooks and extension
  /// callbacks are not invoked.
  pub fn dispose(&self) {
    self.binder.write().clear();
    self.pool.lock().clear();
    self.extensions.lock().clear();
    tracing::debug!(id = ?self.id, "container disposed");
  }
}

fn snapshot(bindings: Vec<&Binding>) -> Vec<Binding> {
  bindings.into_iter().cloned().collect()
}

fn downcast<T: ?Sized + Any + Send + Sync>(value: &Value) -> Result<Arc<T>> {
  value.downcast::<T>().ok_or(Error::TypeMismatch {
    expected: std::any::type_name::<T>(),
    actual: value.type_key().name(),
  })
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("id", &self.id)
      .field("binder", &*self.binder.read())
      .field("extensions", &self.extensions.lock().len())
      .finish_non_exhaustive()
  }
}

/// Fluent configuration of a binding of `T` stored in a container.
///
/// The handle holds no lock; each call locks the container briefly and
/// mutates its copy of the binding. Calls on a binding that has since been
/// removed are ignored.
pub struct BindingBuilder<'c, T: ?Sized> {
  container: &'c Container,
  index: BindingIndex,
  _type: PhantomData<fn() -> Arc<T>>,
}

impl<'c, T: ?Sized + Any + Send + Sync> BindingBuilder<'c, T> {
  fn new(container: &'c Container, index: BindingIndex) -> Self {
    Self {
      container,
      index,
      _type: PhantomData,
    }
  }

  pub fn index(&self) -> BindingIndex {
    self.index
  }

  /// The binding as currently stored, or `None` once removed.
  pub fn snapshot(&self) -> Option<Binding> {
    self.container.binding(self.index)
  }

  fn update(self, f: impl FnOnce(&mut Binder, BindingIndex) -> bool) -> Self {
    let found = f(&mut *self.container.binder.write(), self.index);
    if !found {
      tracing::debug!(type_name = std::any::type_name::<T>(), "binding no longer stored, update ignored");
    }
    self
  }

  fn push(self, slot: Slot) -> Self {
    {
      let mut binder = self.container.binder.write();
      if binder.push_slot(self.index, slot) {
        self.warn_on_duplicate_default(&binder);
      }
    }
    self
  }

  fn warn_on_duplicate_default(&self, binder: &Binder) {
    if self.container.duplicate_defaults != DuplicatePolicy::Warn {
      return;
    }
    let Some(binding) = binder.binding(self.index) else {
      return;
    };
    if binding.binding_type != BindingType::Singleton || binding.id.is_some() {
      return;
    }
    let duplicates = binder
      .get_same_null_id_binding(binding)
      .into_iter()
      .filter(|other| !other.is_empty())
      .count();
    if duplicates > 0 {
      tracing::warn!(
        type_name = binding.type_key.name(),
        duplicates,
        "unidentified singleton registered more than once"
      );
    }
  }

  /// Binds the concrete type `U`, constructed through the container.
  ///
  /// `VALUE` bindings construct immediately, so construction errors surface
  /// here. Other kinds defer construction to resolution.
  pub fn to<U>(self) -> Result<Self>
  where
    U: Any + Send + Sync + Upcast<T>,
  {
    let deferred = Deferred {
      concrete: TypeKey::of::<U>(),
      upcast: upcaster::<T, U>(),
    };
    let eager = self
      .container
      .binder
      .read()
      .binding(self.index)
      .is_some_and(|b| b.binding_type == BindingType::Value);
    if eager {
      let value = self.container.build_deferred(&deferred)?;
      return Ok(self.push(Slot::Instance(value)));
    }
    Ok(self.push(Slot::Type(deferred)))
  }

  /// Binds `T` to itself.
  pub fn to_self(self) -> Result<Self>
  where
    T: Sized,
  {
    self.to::<T>()
  }

  /// Adds an existing instance; replaces under `SINGLE`.
  pub fn to_instance(self, instance: Arc<T>) -> Self {
    self.push(Slot::Instance(Value::from_arc(instance)))
  }

  pub fn to_value(self, value: T) -> Self
  where
    T: Sized,
  {
    self.to_instance(Arc::new(value))
  }

  pub fn to_instances(self, instances: impl IntoIterator<Item = Arc<T>>) -> Self {
    instances
      .into_iter()
      .fold(self, |builder, instance| builder.to_instance(instance))
  }

  /// Adds a factory invoked with the injection context on every resolution.
  pub fn to_factory(
    self,
    factory: impl Fn(&InjectionContext, &Container) -> Result<Arc<T>, ConstructionError> + Send + Sync + 'static,
  ) -> Self {
    let factory: Arc<dyn InstanceFactory> =
      Arc::new(move |ctx: &InjectionContext, container: &Container| {
        factory(ctx, container).map(Value::from_arc)
      });
    self.push(Slot::Factory(factory))
  }

  /// Replaces every value with `instance`.
  pub fn set_value(self, instance: Arc<T>) -> Self {
    let slot = Slot::Instance(Value::from_arc(instance));
    self.update(|binder, index| binder.replace_slots(index, slot))
  }

  pub fn as_id(self, id: impl Into<Id>) -> Self {
    let id = id.into();
    self.update(|binder, index| binder.set_id(index, Some(id)))
  }

  pub fn as_type<M: ?Sized + Any>(self) -> Self {
    self.as_id(Id::of_type::<M>())
  }

  pub fn when(self, condition: Condition) -> Self {
    self.update(|binder, index| binder.set_condition(index, condition))
  }

  pub fn when_fn(self, predicate: impl Fn(&InjectionContext) -> bool + Send + Sync + 'static) -> Self {
    self.when(Condition::new(predicate))
  }

  /// Only applies when injecting into an object of type `P`.
  pub fn into_type<P: ?Sized + Any>(self) -> Self {
    self.when(Condition::parent_type(TypeKey::of::<P>()))
  }

  /// Only applies when injecting into `parent` itself.
  pub fn into_instance<P: ?Sized + Any + Send + Sync>(self, parent: &Arc<P>) -> Self {
    self.when(Condition::parent_instance(Value::from_arc(Arc::clone(parent))))
  }

  pub fn set_constraint(self, constraint: ConstraintType) -> Self {
    self.update(|binder, index| binder.set_constraint(index, constraint))
  }

  pub fn set_binding_type(self, binding_type: BindingType) -> Self {
    self.update(|binder, index| binder.set_binding_type(index, binding_type))
  }

  /// Removes `instance`. Returns `None` if that removed the binding too.
  pub fn remove_value(self, instance: &Arc<T>) -> Option<Self> {
    let value = Value::from_arc(Arc::clone(instance));
    self.container.remove_value(self.index, &value);
    self.snapshot().map(|_| self)
  }
}

impl<T: ?Sized> fmt::Debug for BindingBuilder<'_, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BindingBuilder")
      .field("type", &std::any::type_name::<T>())
      .field("index", &self.index)
      .finish()
  }
}

/// The bindings created by one [`Container::multiple_bind`] call, configured
/// together.
pub struct GroupBuilder<'c> {
  container: &'c Container,
  indices: Vec<BindingIndex>,
}

impl<'c> GroupBuilder<'c> {
  pub fn indices(&self) -> &[BindingIndex] {
    &self.indices
  }

  fn update(self, f: impl Fn(&mut Binder, BindingIndex) -> bool) -> Self {
    self.container.mutate(|binder| {
      for index in &self.indices {
        f(binder, *index);
      }
    });
    self
  }

  pub fn as_id(self, id: impl Into<Id>) -> Self {
    let id = id.into();
    self.update(|binder, index| binder.set_id(index, Some(id.clone())))
  }

  pub fn as_type<M: ?Sized + Any>(self) -> Self {
    self.as_id(Id::of_type::<M>())
  }

  pub fn when(self, condition: Condition) -> Self {
    self.update(|binder, index| binder.set_condition(index, condition.clone()))
  }

  pub fn into_type<P: ?Sized + Any>(self) -> Self {
    self.when(Condition::parent_type(TypeKey::of::<P>()))
  }

  pub fn set_constraint(self, constraint: ConstraintType) -> Self {
    self.update(|binder, index| binder.set_constraint(index, constraint))
  }

  pub fn set_binding_type(self, binding_type: BindingType) -> Self {
    self.update(|binder, index| binder.set_binding_type(index, binding_type))
  }

  /// Adds the value at position `i` to the `i`-th binding.
  pub fn to_values(self, values: impl IntoIterator<Item = Value>) -> Self {
    let values: Vec<Value> = values.into_iter().collect();
    self.container.mutate(|binder| {
      for (index, value) in self.indices.iter().zip(values) {
        binder.push_slot(*index, Slot::Instance(value));
      }
    });
    self
  }
}

impl fmt::Debug for GroupBuilder<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("GroupBuilder")
      .field("indices", &self.indices)
      .finish()
  }
}
