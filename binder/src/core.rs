//! Core data structures shared by every layer of the engine: type keys,
//! identifiers, type-erased values and the resolution context.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The registered type of a binding.
///
/// Equality and hashing only consider the `TypeId`; the name is carried for
/// diagnostics. Unsized types such as `dyn Trait` are valid keys.
#[derive(Clone, Copy)]
pub struct TypeKey {
  id: TypeId,
  name: &'static str,
}

impl TypeKey {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
    }
  }

  pub fn type_id(&self) -> TypeId {
    self.id
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl PartialEq for TypeKey {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeKey({})", self.name)
  }
}

impl fmt::Display for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// An opaque identifier used to tell apart bindings of the same type, and
/// coexisting containers.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Id {
  Name(Arc<str>),
  Int(i64),
  /// A type used as an identifier, e.g. `as_type::<Marker>()`.
  Type(TypeKey),
}

impl Id {
  pub fn of_type<T: ?Sized + Any>() -> Self {
    Id::Type(TypeKey::of::<T>())
  }
}

impl fmt::Debug for Id {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Id::Name(name) => write!(f, "Id({:?})", name),
      Id::Int(n) => write!(f, "Id({})", n),
      Id::Type(key) => write!(f, "Id(type {})", key.name()),
    }
  }
}

impl fmt::Display for Id {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Id::Name(name) => f.write_str(name),
      Id::Int(n) => write!(f, "{}", n),
      Id::Type(key) => f.write_str(key.name()),
    }
  }
}

impl From<&str> for Id {
  fn from(name: &str) -> Self {
    Id::Name(Arc::from(name))
  }
}

impl From<String> for Id {
  fn from(name: String) -> Self {
    Id::Name(Arc::from(name))
  }
}

impl From<i64> for Id {
  fn from(n: i64) -> Self {
    Id::Int(n)
  }
}

impl From<TypeKey> for Id {
  fn from(key: TypeKey) -> Self {
    Id::Type(key)
  }
}

/// A shared, type-erased instance held by a binding.
///
/// Internally this is an `Arc<T>` boxed behind `dyn Any`, so trait objects
/// can be stored and handed back out as `Arc<dyn Trait>`. Cloning a `Value`
/// never clones the instance.
///
/// Identity is the address of the instance. Two values compare equal under
/// [`Value::ptr_eq`] only if they point at the same allocation, even if one
/// was upcast to a trait object.
#[derive(Clone)]
pub struct Value {
  inner: Arc<dyn Any + Send + Sync>,
  type_key: TypeKey,
  addr: usize,
}

impl Value {
  /// Wraps a freshly created instance.
  pub fn new<T: Any + Send + Sync>(instance: T) -> Self {
    Self::from_arc(Arc::new(instance))
  }

  /// Wraps an already shared instance, keeping its identity.
  pub fn from_arc<T: ?Sized + Any + Send + Sync>(instance: Arc<T>) -> Self {
    let addr = Arc::as_ptr(&instance) as *const () as usize;
    Self {
      inner: Arc::new(instance),
      type_key: TypeKey::of::<T>(),
      addr,
    }
  }

  /// The type this value was stored as.
  pub fn type_key(&self) -> TypeKey {
    self.type_key
  }

  pub fn is<T: ?Sized + Any + Send + Sync>(&self) -> bool {
    self.inner.is::<Arc<T>>()
  }

  /// Returns the instance as `Arc<T>` if it was stored as `T`.
  pub fn downcast<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.inner.downcast_ref::<Arc<T>>().cloned()
  }

  /// Reference identity.
  pub fn ptr_eq(&self, other: &Value) -> bool {
    self.addr == other.addr
  }

  /// Whether this value is the very instance behind `instance`.
  pub fn points_to<T: ?Sized>(&self, instance: &Arc<T>) -> bool {
    self.addr == Arc::as_ptr(instance) as *const () as usize
  }
}

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Value({} @ {:#x})", self.type_key.name(), self.addr)
  }
}

/// Describes the call site of a resolution request.
///
/// Conditions attached to bindings are evaluated against this context. The
/// engine fills in `member_type` and `id` for every request; the parent
/// fields come from the caller (typically the object being injected).
#[derive(Clone, Debug, Default)]
pub struct InjectionContext {
  pub member_type: Option<TypeKey>,
  pub id: Option<Id>,
  pub parent_type: Option<TypeKey>,
  pub parent_instance: Option<Value>,
}

impl InjectionContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// A context for resolving on behalf of `parent`.
  pub fn for_parent<P: ?Sized + Any + Send + Sync>(parent: &Arc<P>) -> Self {
    Self {
      parent_type: Some(TypeKey::of::<P>()),
      parent_instance: Some(Value::from_arc(Arc::clone(parent))),
      ..Self::default()
    }
  }

  pub fn with_parent_type<P: ?Sized + Any>(mut self) -> Self {
    self.parent_type = Some(TypeKey::of::<P>());
    self
  }

  pub fn with_parent_instance(mut self, parent: Value) -> Self {
    self.parent_type = Some(parent.type_key());
    self.parent_instance = Some(parent);
    self
  }

  pub(crate) fn targeting(&self, key: TypeKey, id: Option<&Id>) -> Self {
    Self {
      member_type: Some(key),
      id: id.cloned(),
      parent_type: self.parent_type,
      parent_instance: self.parent_instance.clone(),
    }
  }
}
