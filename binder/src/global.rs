//! The process-wide container registry.

use once_cell::sync::Lazy;

use crate::routing::ContainerRegistry;

// Created on first access.
static GLOBAL_REGISTRY: Lazy<ContainerRegistry> = Lazy::new(ContainerRegistry::new);

/// The registry shared by the whole process.
///
/// Register containers before routing through it and clear it on shutdown;
/// nothing is removed automatically.
///
/// # Examples
///
/// ```
/// use fibre_binder::{global_registry, Container};
///
/// let ui = Container::with_id("ui");
/// global_registry().register(ui.clone());
/// assert!(global_registry().get(&"ui".into()).is_some());
/// global_registry().clear();
/// ```
pub fn global_registry() -> &'static ContainerRegistry {
  &GLOBAL_REGISTRY
}
