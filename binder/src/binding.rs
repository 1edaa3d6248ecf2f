//! The binding record and the small types it is made of.

use std::fmt;
use std::sync::Arc;

use generational_arena::Index;

use crate::construct::{InstanceFactory, Upcaster};
use crate::core::{Id, InjectionContext, TypeKey, Value};

/// Governs how and when a binding produces its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
  /// Deferred types are constructed on every resolution.
  Temp,
  /// Deferred types are constructed once, then cached in place.
  Singleton,
  /// Values come from an [`InstanceFactory`] invoked per resolution.
  Factory,
  /// Deferred types are served from the command pool before construction.
  Pool,
  /// Types are constructed eagerly when bound.
  Value,
}

impl fmt::Display for BindingType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      BindingType::Temp => "temp",
      BindingType::Singleton => "singleton",
      BindingType::Factory => "factory",
      BindingType::Pool => "pool",
      BindingType::Value => "value",
    };
    f.write_str(s)
  }
}

/// Governs how many values a binding may hold and how resolution picks
/// among candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintType {
  /// At most one value; adding replaces.
  Single,
  /// An ordered sequence of values.
  Multiple,
  /// A set of reusable instances.
  Pool,
}

impl fmt::Display for ConstraintType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ConstraintType::Single => "single",
      ConstraintType::Multiple => "multiple",
      ConstraintType::Pool => "pool",
    };
    f.write_str(s)
  }
}

/// Stable handle to a binding stored in a [`Binder`](crate::Binder).
///
/// Handles are generational: once the binding is removed, its handle never
/// matches a binding again, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingIndex(pub(crate) Index);

type Predicate = dyn Fn(&InjectionContext) -> bool + Send + Sync;

/// A predicate over the injection context, evaluated lazily at resolution.
#[derive(Clone, Default)]
pub struct Condition(Option<Arc<Predicate>>);

impl Condition {
  /// Always satisfied.
  pub fn always() -> Self {
    Self(None)
  }

  pub fn new(predicate: impl Fn(&InjectionContext) -> bool + Send + Sync + 'static) -> Self {
    Self(Some(Arc::new(predicate)))
  }

  /// Satisfied when the object being injected is of type `key`.
  pub fn parent_type(key: TypeKey) -> Self {
    Self::new(move |ctx| ctx.parent_type == Some(key))
  }

  /// Satisfied when the object being injected is `instance` itself.
  pub fn parent_instance(instance: Value) -> Self {
    Self::new(move |ctx| {
      ctx
        .parent_instance
        .as_ref()
        .is_some_and(|parent| parent.ptr_eq(&instance))
    })
  }

  pub fn is_unconditional(&self) -> bool {
    self.0.is_none()
  }

  pub fn evaluate(&self, ctx: &InjectionContext) -> bool {
    match &self.0 {
      Some(predicate) => predicate(ctx),
      None => true,
    }
  }
}

impl fmt::Debug for Condition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.0 {
      Some(_) => f.write_str("Condition(<predicate>)"),
      None => f.write_str("Condition(always)"),
    }
  }
}

/// A deferred construction: the concrete type to build and how to view it
/// as the binding's type.
#[derive(Clone)]
pub struct Deferred {
  pub(crate) concrete: TypeKey,
  pub(crate) upcast: Upcaster,
}

impl Deferred {
  pub fn concrete(&self) -> TypeKey {
    self.concrete
  }
}

/// One entry of a binding's value sequence.
#[derive(Clone)]
pub enum Slot {
  Instance(Value),
  Type(Deferred),
  Factory(Arc<dyn InstanceFactory>),
}

impl Slot {
  pub fn as_instance(&self) -> Option<&Value> {
    match self {
      Slot::Instance(value) => Some(value),
      _ => None,
    }
  }
}

impl fmt::Debug for Slot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Slot::Instance(value) => write!(f, "Instance({:?})", value),
      Slot::Type(deferred) => write!(f, "Type({})", deferred.concrete.name()),
      Slot::Factory(_) => f.write_str("Factory(<factory>)"),
    }
  }
}

/// One registration: a type mapped to zero or more values under a
/// constraint policy.
///
/// Records handed out by the binder are snapshots. Mutations go through the
/// binder ([`BindingMut`](crate::BindingMut)) or the container
/// ([`BindingBuilder`](crate::BindingBuilder)), which own the authoritative
/// copy.
#[derive(Clone, Debug)]
pub struct Binding {
  pub(crate) index: Option<BindingIndex>,
  pub(crate) type_key: TypeKey,
  pub(crate) binding_type: BindingType,
  pub(crate) constraint: ConstraintType,
  pub(crate) id: Option<Id>,
  pub(crate) condition: Condition,
  pub(crate) slots: Vec<Slot>,
}

impl Binding {
  pub(crate) fn new(type_key: TypeKey, binding_type: BindingType, constraint: ConstraintType) -> Self {
    Self {
      index: None,
      type_key,
      binding_type,
      constraint,
      id: None,
      condition: Condition::always(),
      slots: Vec::new(),
    }
  }

  /// `None` until the binding has been stored in a binder.
  pub fn index(&self) -> Option<BindingIndex> {
    self.index
  }

  pub fn type_key(&self) -> TypeKey {
    self.type_key
  }

  pub fn binding_type(&self) -> BindingType {
    self.binding_type
  }

  pub fn constraint(&self) -> ConstraintType {
    self.constraint
  }

  pub fn id(&self) -> Option<&Id> {
    self.id.as_ref()
  }

  pub fn condition(&self) -> &Condition {
    &self.condition
  }

  pub fn slots(&self) -> &[Slot] {
    &self.slots
  }

  /// The constructed instances currently held, in insertion order.
  pub fn values(&self) -> Vec<Value> {
    self.slots.iter().filter_map(Slot::as_instance).cloned().collect()
  }

  /// The first constructed instance, if any.
  pub fn value(&self) -> Option<Value> {
    self.slots.iter().find_map(Slot::as_instance).cloned()
  }

  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }

  pub fn contains_instance(&self, value: &Value) -> bool {
    self
      .slots
      .iter()
      .filter_map(Slot::as_instance)
      .any(|held| held.ptr_eq(value))
  }

  // --- crate-internal mutation, reached only through the owning binder ---

  pub(crate) fn push_slot(&mut self, slot: Slot) {
    if self.constraint == ConstraintType::Single {
      self.slots.clear();
    }
    self.slots.push(slot);
  }

  pub(crate) fn replace_slots(&mut self, slot: Slot) {
    self.slots.clear();
    self.slots.push(slot);
  }

  /// Removes the first instance identical to `value`. Returns whether one
  /// was found.
  pub(crate) fn remove_instance(&mut self, value: &Value) -> bool {
    let position = self
      .slots
      .iter()
      .position(|slot| slot.as_instance().is_some_and(|held| held.ptr_eq(value)));
    match position {
      Some(i) => {
        self.slots.remove(i);
        true
      }
      None => false,
    }
  }

  pub(crate) fn set_constraint(&mut self, constraint: ConstraintType) {
    self.constraint = constraint;
    if constraint == ConstraintType::Single && self.slots.len() > 1 {
      // Keep the most recent value, matching replace-on-add.
      let last = self.slots.pop();
      self.slots.clear();
      self.slots.extend(last);
    }
  }
}
