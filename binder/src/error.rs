use thiserror::Error;

use crate::core::Id;

/// A boxed error returned by user-supplied factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures raised by the construction capability.
///
/// The engine never reinterprets these; they reach the caller verbatim inside
/// [`Error::Construction`].
#[derive(Debug, Error)]
pub enum ConstructionError {
  #[error("no factory registered for type {0}")]
  NoFactory(&'static str),

  #[error("circular construction detected while building {0}")]
  Circular(&'static str),

  #[error("constructed {actual} cannot be bound as {expected}")]
  Incompatible {
    expected: &'static str,
    actual: &'static str,
  },

  #[error("failed to construct {type_name}: {source}")]
  Failed {
    type_name: &'static str,
    #[source]
    source: BoxError,
  },
}

/// The main error type for `fibre_binder`.
#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid argument: {0}")]
  InvalidArgument(&'static str),

  #[error("expected one binding type per type, got {types} types and {binding_types} binding types")]
  ArityMismatch { types: usize, binding_types: usize },

  #[error("no binding for {type_name}{}", fmt_id(.id))]
  NotFound {
    type_name: &'static str,
    id: Option<Id>,
  },

  #[error("{candidates} binding(s) for {type_name}{} but none matches the injection context", fmt_id(.id))]
  NoMatchingBinding {
    type_name: &'static str,
    id: Option<Id>,
    candidates: usize,
  },

  #[error("resolved value of type {actual} is not a {expected}")]
  TypeMismatch {
    expected: &'static str,
    actual: &'static str,
  },

  #[error("command pool has no instance of {0}")]
  PoolEmpty(&'static str),

  #[error("command pool for {type_name} is full ({capacity} instances)")]
  PoolFull {
    type_name: &'static str,
    capacity: usize,
  },

  #[error(transparent)]
  Construction(#[from] ConstructionError),
}

fn fmt_id(id: &Option<Id>) -> String {
  match id {
    Some(id) => format!(" with id '{}'", id),
    None => String::new(),
  }
}

impl Error {
  /// `true` for outcomes that mean "nothing to inject here" rather than a
  /// broken registry.
  pub fn is_absent(&self) -> bool {
    matches!(
      self,
      Error::NotFound { .. } | Error::NoMatchingBinding { .. } | Error::PoolEmpty(_)
    )
  }
}

/// A specialized `Result` type for `fibre_binder` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
