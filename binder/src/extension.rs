//! Auxiliary objects attached to a container's lifecycle.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::container::Container;

/// A lifecycle participant notified when attached to or detached from a
/// container. Typically used to subscribe binding hooks.
pub trait ContainerExtension: Send + Sync + 'static {
  fn on_register(&self, container: &Container);

  fn on_unregister(&self, container: &Container);
}

pub(crate) struct ExtensionEntry {
  pub(crate) type_id: TypeId,
  pub(crate) extension: Arc<dyn ContainerExtension>,
}

impl ExtensionEntry {
  pub(crate) fn new<E: ContainerExtension>(extension: Arc<E>) -> Self {
    Self {
      type_id: TypeId::of::<E>(),
      extension,
    }
  }

  /// Reference identity with `other`.
  pub(crate) fn is<E: ContainerExtension>(&self, other: &Arc<E>) -> bool {
    let held = Arc::as_ptr(&self.extension) as *const ();
    held == Arc::as_ptr(other) as *const ()
  }

  pub(crate) fn is_of_type<E: Any>(&self) -> bool {
    self.type_id == TypeId::of::<E>()
  }
}

impl fmt::Debug for ExtensionEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ExtensionEntry")
      .field("type_id", &self.type_id)
      .finish_non_exhaustive()
  }
}
