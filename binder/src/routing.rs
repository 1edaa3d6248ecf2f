//! Routing an object's injection across every live container.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::container::Container;
use crate::core::{Id, InjectionContext, Value};
use crate::error::Result;

/// An object that can pull its dependencies out of a container.
pub trait Injectable: Any + Send + Sync {
  /// Resolves dependencies from `container`. `ctx` names `self` as the
  /// parent, so parent-conditioned bindings apply.
  fn inject(&self, container: &Container, ctx: &InjectionContext) -> Result<()>;

  /// Ids of the containers this object wants to be injected by. Empty means
  /// every container.
  fn target_containers(&self) -> Vec<Id> {
    Vec::new()
  }
}

/// The set of live containers an object can be routed to.
///
/// Containers are kept in registration order. A registry only holds what it
/// is given; call [`ContainerRegistry::clear`] on shutdown.
#[derive(Default)]
pub struct ContainerRegistry {
  containers: RwLock<Vec<Arc<Container>>>,
}

impl ContainerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns `false` if this exact container is already registered.
  pub fn register(&self, container: Arc<Container>) -> bool {
    let mut containers = self.containers.write();
    if containers.iter().any(|c| Arc::ptr_eq(c, &container)) {
      return false;
    }
    tracing::debug!(id = ?container.id(), "container registered for routing");
    containers.push(container);
    true
  }

  /// Removes every container carrying `id`.
  pub fn unregister(&self, id: &Id) -> usize {
    let mut containers = self.containers.write();
    let before = containers.len();
    containers.retain(|c| c.id() != Some(id));
    before - containers.len()
  }

  pub fn unregister_container(&self, container: &Arc<Container>) -> bool {
    let mut containers = self.containers.write();
    let before = containers.len();
    containers.retain(|c| !Arc::ptr_eq(c, container));
    before != containers.len()
  }

  pub fn clear(&self) {
    self.containers.write().clear();
  }

  /// A snapshot of the registered containers.
  pub fn containers(&self) -> Vec<Arc<Container>> {
    self.containers.read().clone()
  }

  /// The first container registered under `id`.
  pub fn get(&self, id: &Id) -> Option<Arc<Container>> {
    self
      .containers
      .read()
      .iter()
      .find(|c| c.id() == Some(id))
      .cloned()
  }

  pub fn len(&self) -> usize {
    self.containers.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.containers.read().is_empty()
  }
}

impl fmt::Debug for ContainerRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let ids: Vec<Option<Id>> = self
      .containers
      .read()
      .iter()
      .map(|c| c.id().cloned())
      .collect();
    f.debug_struct("ContainerRegistry").field("containers", &ids).finish()
  }
}

/// Injects `target` into every eligible container in `registry`.
///
/// See [`inject_into`].
pub fn inject<T: Injectable>(registry: &ContainerRegistry, target: &Arc<T>) -> Result<usize> {
  inject_into(registry, target, None)
}

/// Injects `target` into the containers of `registry` that
/// - carry `id`, when one is given,
/// - are among `target.target_containers()`, when that is not empty,
/// - do not already hold `target` as a bound value.
///
/// The last rule makes routing the same object twice harmless. Returns how
/// many containers injected it; stops at the first injection error.
pub fn inject_into<T: Injectable>(registry: &ContainerRegistry, target: &Arc<T>, id: Option<&Id>) -> Result<usize> {
  let declared = target.target_containers();
  let value = Value::from_arc(Arc::clone(target));

  let mut injected = 0;
  for container in registry.containers() {
    if id.is_some() && container.id() != id {
      continue;
    }
    if !declared.is_empty() && !container.id().is_some_and(|cid| declared.contains(cid)) {
      continue;
    }
    if container.contains_instance(&value) {
      tracing::trace!(id = ?container.id(), "target already bound, skipping");
      continue;
    }
    container.inject(target)?;
    injected += 1;
  }
  Ok(injected)
}
