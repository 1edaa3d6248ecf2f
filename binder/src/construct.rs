//! The construction capability: turning a type into an instance.
//!
//! The engine only depends on the [`Construct`] trait. [`FactoryRegistry`] is
//! the default implementation, a concurrent map of per-type factories with a
//! guard against circular construction.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::container::Container;
use crate::core::{InjectionContext, TypeKey, Value};
use crate::error::{BoxError, ConstructionError};

thread_local! {
  // Types currently being constructed on this thread.
  static CONSTRUCTING: RefCell<HashSet<TypeKey>> = RefCell::new(HashSet::new());
}

/// Marks `key` as under construction on this thread until dropped.
///
/// Entering a key that is already under construction is a cycle.
pub(crate) struct ConstructionGuard {
  key: TypeKey,
}

impl ConstructionGuard {
  pub(crate) fn enter(key: TypeKey) -> Result<Self, ConstructionError> {
    let fresh = CONSTRUCTING.with(|set| set.borrow_mut().insert(key));
    if !fresh {
      return Err(ConstructionError::Circular(key.name()));
    }
    Ok(Self { key })
  }
}

impl Drop for ConstructionGuard {
  fn drop(&mut self) {
    CONSTRUCTING.with(|set| {
      set.borrow_mut().remove(&self.key);
    });
  }
}

/// Views an `Arc<Self>` as an `Arc<I>`.
///
/// Every type upcasts to itself. To bind a concrete type under a trait,
/// declare the edge with [`implements!`](crate::implements).
pub trait Upcast<I: ?Sized> {
  fn upcast(self: Arc<Self>) -> Arc<I>;
}

impl<T: ?Sized> Upcast<T> for T {
  fn upcast(self: Arc<Self>) -> Arc<T> {
    self
  }
}

/// Converts a constructed concrete value into the binding's type.
pub(crate) type Upcaster = Arc<dyn Fn(&Value) -> Result<Value, ConstructionError> + Send + Sync>;

pub(crate) fn upcaster<T, U>() -> Upcaster
where
  T: ?Sized + Any + Send + Sync,
  U: Any + Send + Sync + Upcast<T>,
{
  Arc::new(|value: &Value| {
    let concrete = value.downcast::<U>().ok_or(ConstructionError::Incompatible {
      expected: std::any::type_name::<U>(),
      actual: value.type_key().name(),
    })?;
    Ok(Value::from_arc(<U as Upcast<T>>::upcast(concrete)))
  })
}

/// Produces a value for every resolution of a `FACTORY` binding.
pub trait InstanceFactory: Send + Sync {
  fn create(&self, ctx: &InjectionContext, container: &Container) -> Result<Value, ConstructionError>;
}

impl<F> InstanceFactory for F
where
  F: Fn(&InjectionContext, &Container) -> Result<Value, ConstructionError> + Send + Sync,
{
  fn create(&self, ctx: &InjectionContext, container: &Container) -> Result<Value, ConstructionError> {
    self(ctx, container)
  }
}

/// Given a type, produce an instance.
///
/// Implementations report failure through [`ConstructionError`]; the engine
/// propagates it untouched.
pub trait Construct: Send + Sync {
  fn construct(&self, key: TypeKey, container: &Container) -> Result<Value, ConstructionError>;
}

type Factory = Arc<dyn Fn(&Container) -> Result<Value, BoxError> + Send + Sync>;

/// The default [`Construct`] implementation: a map from type to factory.
///
/// Factories receive the container doing the construction, so they can
/// resolve their own dependencies from it.
#[derive(Default)]
pub struct FactoryRegistry {
  factories: DashMap<TypeKey, Factory>,
}

impl FactoryRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a fallible factory for `T`, replacing any previous one.
  pub fn register<T: Any + Send + Sync>(
    &self,
    factory: impl Fn(&Container) -> Result<T, BoxError> + Send + Sync + 'static,
  ) {
    let factory: Factory = Arc::new(move |container: &Container| factory(container).map(Value::new));
    self.factories.insert(TypeKey::of::<T>(), factory);
  }

  /// Registers an infallible factory that needs nothing from the container.
  pub fn register_fn<T: Any + Send + Sync>(&self, factory: impl Fn() -> T + Send + Sync + 'static) {
    self.register(move |_| Ok(factory()));
  }

  pub fn register_default<T: Default + Any + Send + Sync>(&self) {
    self.register_fn(T::default);
  }

  pub fn contains(&self, key: TypeKey) -> bool {
    self.factories.contains_key(&key)
  }

  pub fn remove(&self, key: TypeKey) -> bool {
    self.factories.remove(&key).is_some()
  }

  pub fn len(&self) -> usize {
    self.factories.len()
  }

  pub fn is_empty(&self) -> bool {
    self.factories.is_empty()
  }

  pub fn clear(&self) {
    self.factories.clear();
  }
}

impl Construct for FactoryRegistry {
  fn construct(&self, key: TypeKey, container: &Container) -> Result<Value, ConstructionError> {
    let _guard = ConstructionGuard::enter(key)?;

    // Clone the factory out so no map shard stays locked while it runs.
    let factory = self
      .factories
      .get(&key)
      .map(|entry| Arc::clone(entry.value()))
      .ok_or(ConstructionError::NoFactory(key.name()))?;

    factory(container).map_err(|source| ConstructionError::Failed {
      type_name: key.name(),
      source,
    })
  }
}

impl fmt::Debug for FactoryRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FactoryRegistry")
      .field("factories", &self.factories.len())
      .finish()
  }
}
