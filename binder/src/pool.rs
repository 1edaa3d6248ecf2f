//! A type-keyed pool of reusable instances.

use std::collections::HashMap;

use crate::core::{TypeKey, Value};
use crate::error::{ConstructionError, Error, Result};

/// Keeps idle instances per type so frequently used command objects can be
/// reused instead of rebuilt.
///
/// An instance is either pooled or handed out, never both. The pool does not
/// track identity beyond type, so it cannot tell if the same instance is
/// pooled twice.
#[derive(Debug, Default)]
pub struct CommandPool {
  pools: HashMap<TypeKey, Vec<Value>>,
  capacity_per_type: Option<usize>,
}

impl CommandPool {
  /// An unbounded pool.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_capacity_per_type(capacity: Option<usize>) -> Self {
    Self {
      pools: HashMap::new(),
      capacity_per_type: capacity,
    }
  }

  pub fn capacity_per_type(&self) -> Option<usize> {
    self.capacity_per_type
  }

  /// Builds a fresh instance of `key` and stores it for later reuse.
  ///
  /// Fails with [`Error::PoolFull`] before building if the bucket is at
  /// capacity.
  pub fn pool_command(
    &mut self,
    key: TypeKey,
    build: impl FnOnce() -> Result<Value, ConstructionError>,
  ) -> Result<()> {
    self.ensure_room(key)?;
    let value = build()?;
    self.pool_built(key, value)
  }

  /// Stores an instance just built for `key`, rejecting one of another type.
  pub(crate) fn pool_built(&mut self, key: TypeKey, value: Value) -> Result<()> {
    if value.type_key() != key {
      return Err(
        ConstructionError::Incompatible {
          expected: key.name(),
          actual: value.type_key().name(),
        }
        .into(),
      );
    }
    self.ensure_room(key)?;
    self.pools.entry(key).or_default().push(value);
    tracing::trace!(type_name = key.name(), "command pooled");
    Ok(())
  }

  /// Returns a no longer used instance to the pool.
  pub fn pool_instance(&mut self, value: Value) -> Result<()> {
    let key = value.type_key();
    if let Err(err) = self.ensure_room(key) {
      tracing::warn!(type_name = key.name(), "command pool full, dropping instance");
      return Err(err);
    }
    self.pools.entry(key).or_default().push(value);
    Ok(())
  }

  /// Takes the most recently pooled instance of `key`.
  ///
  /// [`Error::PoolEmpty`] tells the caller to construct a fresh one.
  pub fn get_command_from_pool(&mut self, key: TypeKey) -> Result<Value> {
    self
      .pools
      .get_mut(&key)
      .and_then(Vec::pop)
      .ok_or(Error::PoolEmpty(key.name()))
  }

  pub fn available(&self, key: TypeKey) -> usize {
    self.pools.get(&key).map_or(0, Vec::len)
  }

  pub fn clear_type(&mut self, key: TypeKey) -> usize {
    self.pools.remove(&key).map_or(0, |bucket| bucket.len())
  }

  pub fn clear(&mut self) {
    self.pools.clear();
  }

  /// [`Error::PoolFull`] if the bucket for `key` is at capacity.
  pub fn ensure_room(&self, key: TypeKey) -> Result<()> {
    match self.capacity_per_type {
      Some(capacity) if self.available(key) >= capacity => Err(Error::PoolFull {
        type_name: key.name(),
        capacity,
      }),
      _ => Ok(()),
    }
  }
}
