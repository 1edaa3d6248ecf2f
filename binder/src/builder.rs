//! Container configuration and construction.

use std::sync::Arc;

use crate::construct::{Construct, FactoryRegistry};
use crate::container::Container;
use crate::core::Id;

/// What to do when a second unidentified singleton of a type receives a
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DuplicatePolicy {
  /// Say nothing.
  Allow,
  /// Log a warning. The binding is still stored.
  #[default]
  Warn,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
  /// Maximum idle instances kept per type. `None` is unbounded.
  pub capacity_per_type: Option<usize>,
}

/// Declarative container settings, e.g. loaded from a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContainerConfig {
  pub id: Option<String>,
  pub pool: PoolConfig,
  pub duplicate_defaults: DuplicatePolicy,
}

/// A builder for [`Container`] instances.
///
/// Without an explicit constructor the container gets its own
/// [`FactoryRegistry`], reachable through [`Container::factories`].
#[derive(Default)]
pub struct ContainerBuilder {
  pub(crate) id: Option<Id>,
  pub(crate) constructor: Option<Arc<dyn Construct>>,
  pub(crate) factories: Option<Arc<FactoryRegistry>>,
  pub(crate) pool_capacity: Option<usize>,
  pub(crate) duplicate_defaults: DuplicatePolicy,
}

impl ContainerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Distinguishes this container among coexisting ones.
  pub fn id(mut self, id: impl Into<Id>) -> Self {
    self.id = Some(id.into());
    self
  }

  /// Uses a custom construction capability.
  pub fn constructor(mut self, constructor: Arc<dyn Construct>) -> Self {
    self.constructor = Some(constructor);
    self.factories = None;
    self
  }

  /// Uses a shared factory registry as the construction capability.
  pub fn factories(mut self, factories: Arc<FactoryRegistry>) -> Self {
    self.constructor = Some(factories.clone() as Arc<dyn Construct>);
    self.factories = Some(factories);
    self
  }

  pub fn pool_capacity(mut self, capacity: usize) -> Self {
    self.pool_capacity = Some(capacity);
    self
  }

  pub fn duplicate_defaults(mut self, policy: DuplicatePolicy) -> Self {
    self.duplicate_defaults = policy;
    self
  }

  /// Applies every setting in `config`, overriding earlier calls.
  pub fn with_config(mut self, config: &ContainerConfig) -> Self {
    self.id = config.id.clone().map(Id::from);
    self.pool_capacity = config.pool.capacity_per_type;
    self.duplicate_defaults = config.duplicate_defaults;
    self
  }

  pub fn build(self) -> Arc<Container> {
    Container::from_builder(self)
  }
}
