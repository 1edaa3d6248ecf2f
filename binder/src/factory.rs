//! Creation of binding records.

use std::any::Any;

use crate::binding::{Binding, BindingType, ConstraintType};
use crate::core::TypeKey;

/// Builds [`Binding`] records with a consistent kind/constraint pairing.
///
/// The factory has no state and never touches a binder; storing the result
/// is the binder's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindingFactory;

impl BindingFactory {
  pub fn create(&self, key: TypeKey, binding_type: BindingType, constraint: ConstraintType) -> Binding {
    Binding::new(key, binding_type, constraint)
  }

  /// `MULTIPLE` is the default constraint.
  pub fn create_multiple(&self, key: TypeKey, binding_type: BindingType) -> Binding {
    self.create(key, binding_type, ConstraintType::Multiple)
  }

  pub fn create_single(&self, key: TypeKey, binding_type: BindingType) -> Binding {
    self.create(key, binding_type, ConstraintType::Single)
  }

  pub fn create_pool(&self, key: TypeKey, binding_type: BindingType) -> Binding {
    self.create(key, binding_type, ConstraintType::Pool)
  }

  pub fn create_for<T: ?Sized + Any>(&self, binding_type: BindingType, constraint: ConstraintType) -> Binding {
    self.create(TypeKey::of::<T>(), binding_type, constraint)
  }
}
