//! The registry: storage, queries, removal and binding selection.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use generational_arena::Arena;

use crate::binding::{Binding, BindingIndex, BindingType, Condition, ConstraintType, Slot};
use crate::core::{Id, InjectionContext, TypeKey, Value};
use crate::error::{Error, Result};
use crate::factory::BindingFactory;
use crate::hooks::{BindingHooks, HookHandle, HookPoint, PendingHooks};

/// Stores bindings and answers queries about them.
///
/// Bindings live in an arena and are addressed by [`BindingIndex`]. `all`
/// keeps registration order and `by_type` is an index over it; both are
/// updated together on every add and remove.
///
/// A `Binder` is not synchronized. [`Container`](crate::Container) wraps one
/// in a lock and switches it to deferred hooks, so hooks run after the lock
/// is released.
#[derive(Default)]
pub struct Binder {
  factory: BindingFactory,
  arena: Arena<Binding>,
  all: Vec<BindingIndex>,
  by_type: HashMap<TypeKey, Vec<BindingIndex>>,
  hooks: BindingHooks,
  // `Some` once hooks are deferred.
  pending: Option<PendingHooks>,
}

impl Binder {
  pub fn new() -> Self {
    Self::default()
  }

  // --- Registration ---

  /// Creates and stores a `MULTIPLE` binding of `key`.
  pub fn bind_key(&mut self, key: TypeKey, binding_type: BindingType) -> BindingMut<'_> {
    let binding = self.factory.create_multiple(key, binding_type);
    let index = self.storing(binding);
    BindingMut { binder: self, index }
  }

  pub fn bind_with(
    &mut self,
    key: TypeKey,
    binding_type: BindingType,
    constraint: ConstraintType,
  ) -> BindingMut<'_> {
    let binding = self.factory.create(key, binding_type, constraint);
    let index = self.storing(binding);
    BindingMut { binder: self, index }
  }

  /// `TEMP` / `MULTIPLE`.
  pub fn bind<T: ?Sized + Any>(&mut self) -> BindingMut<'_> {
    self.bind_key(TypeKey::of::<T>(), BindingType::Temp)
  }

  /// `SINGLETON` / `SINGLE`.
  pub fn bind_singleton<T: ?Sized + Any>(&mut self) -> BindingMut<'_> {
    self.bind_with(TypeKey::of::<T>(), BindingType::Singleton, ConstraintType::Single)
  }

  /// `FACTORY` / `SINGLE`.
  pub fn bind_factory<T: ?Sized + Any>(&mut self) -> BindingMut<'_> {
    self.bind_with(TypeKey::of::<T>(), BindingType::Factory, ConstraintType::Single)
  }

  /// `POOL` / `POOL`.
  pub fn bind_pool<T: ?Sized + Any>(&mut self) -> BindingMut<'_> {
    self.bind_with(TypeKey::of::<T>(), BindingType::Pool, ConstraintType::Pool)
  }

  /// Creates one `MULTIPLE` binding per `(type, binding type)` pair.
  pub fn multiple_bind(
    &mut self,
    types: &[TypeKey],
    binding_types: &[BindingType],
  ) -> Result<BindingGroup<'_>> {
    if types.len() != binding_types.len() {
      return Err(Error::ArityMismatch {
        types: types.len(),
        binding_types: binding_types.len(),
      });
    }
    let indices: Vec<BindingIndex> = types
      .iter()
      .zip(binding_types)
      .map(|(key, binding_type)| {
        let binding = self.factory.create_multiple(*key, *binding_type);
        self.storing(binding)
      })
      .collect();
    Ok(BindingGroup {
      binder: self,
      indices,
    })
  }

  /// Adds a binding to the store. Duplicates are not checked here; see
  /// [`Binder::get_same_null_id_binding`].
  pub fn storing(&mut self, binding: Binding) -> BindingIndex {
    notify(&self.hooks, &mut self.pending, HookPoint::BeforeAdd, &binding);
    self.store_announced(binding)
  }

  /// [`Binder::storing`] for a binding whose `BeforeAdd` hooks already ran.
  pub(crate) fn store_announced(&mut self, mut binding: Binding) -> BindingIndex {
    let key = binding.type_key;
    let raw = self.arena.insert_with(|raw| {
      binding.index = Some(BindingIndex(raw));
      binding
    });
    let index = BindingIndex(raw);
    self.all.push(index);
    self.by_type.entry(key).or_default().push(index);

    tracing::debug!(type_name = key.name(), ?index, "binding stored");
    notify(&self.hooks, &mut self.pending, HookPoint::AfterAdd, &self.arena[raw]);
    index
  }

  // --- Hooks ---

  pub fn subscribe(
    &mut self,
    point: HookPoint,
    hook: impl Fn(&Binding) + Send + Sync + 'static,
  ) -> HookHandle {
    self.hooks.subscribe(point, hook)
  }

  pub fn unsubscribe(&mut self, handle: HookHandle) -> bool {
    self.hooks.unsubscribe(handle)
  }

  pub fn hook_count(&self) -> usize {
    self.hooks.len()
  }

  /// From now on hooks are recorded instead of called; the owner delivers
  /// them with [`Binder::take_pending`].
  pub(crate) fn defer_hooks(&mut self) {
    self.pending.get_or_insert_with(PendingHooks::default);
  }

  pub(crate) fn take_pending(&mut self) -> PendingHooks {
    self.pending.as_mut().map(std::mem::take).unwrap_or_default()
  }

  /// The `BeforeAdd` calls for `binding`, to be fired by the caller.
  pub(crate) fn announce_add(&self, binding: &Binding) -> PendingHooks {
    self.hooks.defer(HookPoint::BeforeAdd, binding)
  }

  // --- Queries ---

  pub fn binding(&self, index: BindingIndex) -> Option<&Binding> {
    self.arena.get(index.0)
  }

  /// Fluent access to a stored binding. `None` if it has been removed.
  pub fn binding_mut(&mut self, index: BindingIndex) -> Option<BindingMut<'_>> {
    if self.arena.contains(index.0) {
      Some(BindingMut { binder: self, index })
    } else {
      None
    }
  }

  /// Every binding of `key` in registration order; empty if there are none.
  pub fn get_bindings_by_type(&self, key: TypeKey) -> Vec<&Binding> {
    self
      .by_type
      .get(&key)
      .map(|bucket| self.resolve_indices(bucket))
      .unwrap_or_default()
  }

  /// Every binding whose id equals `id`. `None` matches unidentified
  /// bindings only.
  pub fn get_bindings_by_id(&self, id: Option<&Id>) -> Vec<&Binding> {
    self
      .resolve_indices(&self.all)
      .into_iter()
      .filter(|binding| binding.id.as_ref() == id)
      .collect()
  }

  /// The first binding of `key` whose id equals `id`.
  pub fn get_binding(&self, key: TypeKey, id: Option<&Id>) -> Option<&Binding> {
    self
      .get_bindings_by_type(key)
      .into_iter()
      .find(|binding| binding.id.as_ref() == id)
  }

  /// Every other unidentified binding of the same type as `binding`.
  pub fn get_same_null_id_binding(&self, binding: &Binding) -> Vec<&Binding> {
    self
      .get_bindings_by_type(binding.type_key)
      .into_iter()
      .filter(|other| other.id.is_none() && other.index != binding.index)
      .collect()
  }

  pub fn get_all_bindings(&self) -> Vec<&Binding> {
    self.resolve_indices(&self.all)
  }

  pub fn len(&self) -> usize {
    self.all.len()
  }

  pub fn is_empty(&self) -> bool {
    self.all.is_empty()
  }

  /// Whether `value` is held by any binding of its own type.
  pub fn contains_instance(&self, value: &Value) -> bool {
    self
      .get_bindings_by_type(value.type_key())
      .into_iter()
      .any(|binding| binding.contains_instance(value))
  }

  fn resolve_indices(&self, indices: &[BindingIndex]) -> Vec<&Binding> {
    indices.iter().filter_map(|index| self.arena.get(index.0)).collect()
  }

  // --- Removal ---

  /// Removes the instance identical to `value` from the binding. The binding
  /// itself goes away if it ends up empty or is `SINGLE`.
  ///
  /// Returns whether a value was removed. Missing values are a no-op.
  pub fn remove_value(&mut self, index: BindingIndex, value: &Value) -> bool {
    let Some(binding) = self.arena.get_mut(index.0) else {
      return false;
    };
    if !binding.remove_instance(value) {
      return false;
    }
    if binding.is_empty() || binding.constraint == ConstraintType::Single {
      self.remove_binding(index);
    }
    true
  }

  /// Applies [`Binder::remove_value`] for each value. Returns how many were
  /// removed.
  pub fn remove_values(&mut self, index: BindingIndex, values: &[Value]) -> usize {
    values
      .iter()
      .filter(|value| self.remove_value(index, value))
      .count()
  }

  /// Unconditionally removes a binding, returning it.
  pub fn remove_binding(&mut self, index: BindingIndex) -> Option<Binding> {
    let binding = self.arena.get(index.0)?;
    notify(&self.hooks, &mut self.pending, HookPoint::BeforeRemove, binding);
    let key = binding.type_key;

    self.all.retain(|i| *i != index);
    if let Some(bucket) = self.by_type.get_mut(&key) {
      bucket.retain(|i| *i != index);
      if bucket.is_empty() {
        self.by_type.remove(&key);
      }
    }
    let removed = self.arena.remove(index.0)?;

    tracing::debug!(type_name = key.name(), id = ?removed.id, "binding removed");
    notify(&self.hooks, &mut self.pending, HookPoint::AfterRemove, &removed);
    Some(removed)
  }

  /// Removes the binding identified by `key` and `id`.
  ///
  /// Unlike the other removal paths the id is mandatory, since several
  /// unidentified bindings may share a type.
  pub fn remove_binding_by_id(&mut self, key: TypeKey, id: Option<&Id>) -> Result<Option<Binding>> {
    let id = id.ok_or(Error::InvalidArgument(
      "remove_binding_by_id requires an id",
    ))?;
    let index = self.get_binding(key, Some(id)).and_then(Binding::index);
    Ok(index.and_then(|index| self.remove_binding(index)))
  }

  /// Removes every binding of `key`. Returns how many were removed.
  pub fn unbind_by_type(&mut self, key: TypeKey) -> usize {
    let bucket = self.by_type.get(&key).cloned().unwrap_or_default();
    let removed = bucket
      .into_iter()
      .filter(|index| self.remove_binding(*index).is_some())
      .count();
    self.by_type.remove(&key);
    removed
  }

  /// Removes the unidentified bindings of `key`, keeping identified ones.
  pub fn unbind_null_id_binding_by_type(&mut self, key: TypeKey) -> usize {
    let targets: Vec<BindingIndex> = self
      .get_bindings_by_type(key)
      .into_iter()
      .filter(|binding| binding.id.is_none())
      .filter_map(Binding::index)
      .collect();
    targets
      .into_iter()
      .filter(|index| self.remove_binding(*index).is_some())
      .count()
  }

  /// Removes the binding matching `key` and `id`, if any.
  pub fn unbind(&mut self, key: TypeKey, id: Option<&Id>) -> Option<Binding> {
    let index = self.get_binding(key, id).and_then(Binding::index)?;
    self.remove_binding(index)
  }

  /// Drops every binding without firing hooks.
  pub fn clear(&mut self) {
    let count = self.all.len();
    self.arena.clear();
    self.all.clear();
    self.by_type.clear();
    tracing::debug!(count, "binder cleared");
  }

  // --- Resolution ---

  /// Bindings of `key` with exactly this id, in registration order.
  pub fn candidates(&self, key: TypeKey, id: Option<&Id>) -> Vec<&Binding> {
    self
      .get_bindings_by_type(key)
      .into_iter()
      .filter(|binding| binding.id.as_ref() == id)
      .collect()
  }

  /// Picks the bindings that serve a request for `key`/`id` in `ctx`.
  pub fn select(&self, key: TypeKey, id: Option<&Id>, ctx: &InjectionContext) -> Result<Vec<&Binding>> {
    select_bindings(self.candidates(key, id), key, id, ctx)
  }

  // --- Index-based mutation ---

  fn with_binding(&mut self, index: BindingIndex, f: impl FnOnce(&mut Binding)) -> bool {
    match self.arena.get_mut(index.0) {
      Some(binding) => {
        f(binding);
        true
      }
      None => false,
    }
  }

  pub(crate) fn push_slot(&mut self, index: BindingIndex, slot: Slot) -> bool {
    self.with_binding(index, |b| b.push_slot(slot))
  }

  pub(crate) fn replace_slots(&mut self, index: BindingIndex, slot: Slot) -> bool {
    self.with_binding(index, |b| b.replace_slots(slot))
  }

  pub(crate) fn set_id(&mut self, index: BindingIndex, id: Option<Id>) -> bool {
    self.with_binding(index, |b| b.id = id)
  }

  pub(crate) fn set_condition(&mut self, index: BindingIndex, condition: Condition) -> bool {
    self.with_binding(index, |b| b.condition = condition)
  }

  pub(crate) fn set_constraint(&mut self, index: BindingIndex, constraint: ConstraintType) -> bool {
    self.with_binding(index, |b| b.set_constraint(constraint))
  }

  pub(crate) fn set_binding_type(&mut self, index: BindingIndex, binding_type: BindingType) -> bool {
    self.with_binding(index, |b| b.binding_type = binding_type)
  }

  /// Replaces the deferred slot at `position` with a constructed instance.
  ///
  /// If another caller cached first, their instance wins and is returned.
  /// If the slot no longer defers `concrete` the constructed value is
  /// returned uncached.
  pub(crate) fn cache_instance(
    &mut self,
    index: BindingIndex,
    position: usize,
    concrete: TypeKey,
    value: Value,
  ) -> Value {
    let Some(slot) = self
      .arena
      .get_mut(index.0)
      .and_then(|binding| binding.slots.get_mut(position))
    else {
      return value;
    };
    match slot {
      Slot::Type(deferred) if deferred.concrete == concrete => {
        *slot = Slot::Instance(value.clone());
        value
      }
      Slot::Instance(existing) => existing.clone(),
      _ => value,
    }
  }
}

fn notify(hooks: &BindingHooks, pending: &mut Option<PendingHooks>, point: HookPoint, binding: &Binding) {
  match pending {
    Some(pending) => pending.push(hooks, point, binding),
    None => hooks.fire(point, binding),
  }
}

/// Condition evaluation and constraint enforcement over a candidate list.
///
/// Candidates are tried in order; empty bindings never match. The first
/// satisfied candidate wins. If it is `MULTIPLE`, every later satisfied
/// `MULTIPLE` candidate is collected too.
pub(crate) fn select_bindings<'a>(
  candidates: Vec<&'a Binding>,
  key: TypeKey,
  id: Option<&Id>,
  ctx: &InjectionContext,
) -> Result<Vec<&'a Binding>> {
  if candidates.is_empty() {
    return Err(Error::NotFound {
      type_name: key.name(),
      id: id.cloned(),
    });
  }

  let ctx = ctx.targeting(key, id);
  let total = candidates.len();
  let mut chosen: Vec<&Binding> = Vec::new();
  for binding in candidates {
    if binding.is_empty() || !binding.condition.evaluate(&ctx) {
      continue;
    }
    match chosen.first() {
      None => {
        chosen.push(binding);
        if binding.constraint != ConstraintType::Multiple {
          break;
        }
      }
      Some(_) if binding.constraint == ConstraintType::Multiple => chosen.push(binding),
      Some(_) => {}
    }
  }

  if chosen.is_empty() {
    return Err(Error::NoMatchingBinding {
      type_name: key.name(),
      id: id.cloned(),
      candidates: total,
    });
  }
  tracing::trace!(type_name = key.name(), chosen = chosen.len(), "bindings selected");
  Ok(chosen)
}

impl fmt::Debug for Binder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Binder")
      .field("bindings", &self.all.len())
      .field("types", &self.by_type.len())
      .field("hooks", &self.hooks)
      .finish()
  }
}

/// Fluent, in-place configuration of one stored binding.
///
/// Every setter mutates the binder's copy and returns `self` for chaining.
pub struct BindingMut<'b> {
  binder: &'b mut Binder,
  index: BindingIndex,
}

impl<'b> BindingMut<'b> {
  pub fn index(&self) -> BindingIndex {
    self.index
  }

  /// A snapshot of the binding as currently configured.
  pub fn get(&self) -> &Binding {
    &self.binder.arena[self.index.0]
  }

  /// Adds a value; replaces under `SINGLE`.
  pub fn to_value(self, value: Value) -> Self {
    self.binder.push_slot(self.index, Slot::Instance(value));
    self
  }

  pub fn to_values(self, values: impl IntoIterator<Item = Value>) -> Self {
    for value in values {
      self.binder.push_slot(self.index, Slot::Instance(value));
    }
    self
  }

  pub fn to_slot(self, slot: Slot) -> Self {
    self.binder.push_slot(self.index, slot);
    self
  }

  /// Replaces every value with `value`.
  pub fn set_value(self, value: Value) -> Self {
    self.binder.replace_slots(self.index, Slot::Instance(value));
    self
  }

  pub fn as_id(self, id: impl Into<Id>) -> Self {
    self.binder.set_id(self.index, Some(id.into()));
    self
  }

  /// Uses a type as the binding's id.
  pub fn as_type<M: ?Sized + Any>(self) -> Self {
    self.as_id(Id::of_type::<M>())
  }

  pub fn when(self, condition: Condition) -> Self {
    self.binder.set_condition(self.index, condition);
    self
  }

  /// Only applies when injecting into an object of type `P`.
  pub fn into_type<P: ?Sized + Any>(self) -> Self {
    self.into_key(TypeKey::of::<P>())
  }

  pub fn into_key(self, parent: TypeKey) -> Self {
    self.when(Condition::parent_type(parent))
  }

  /// Only applies when injecting into `parent` itself.
  pub fn into_instance(self, parent: Value) -> Self {
    self.when(Condition::parent_instance(parent))
  }

  pub fn set_constraint(self, constraint: ConstraintType) -> Self {
    self.binder.set_constraint(self.index, constraint);
    self
  }

  pub fn set_binding_type(self, binding_type: BindingType) -> Self {
    self.binder.set_binding_type(self.index, binding_type);
    self
  }

  /// Removes a value. Returns `None` if that removed the binding too.
  pub fn remove_value(self, value: &Value) -> Option<Self> {
    self.binder.remove_value(self.index, value);
    if self.binder.arena.contains(self.index.0) {
      Some(self)
    } else {
      None
    }
  }
}

impl fmt::Debug for BindingMut<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("BindingMut").field(self.get()).finish()
  }
}

/// The bindings created by one [`Binder::multiple_bind`] call, configured
/// together.
pub struct BindingGroup<'b> {
  binder: &'b mut Binder,
  indices: Vec<BindingIndex>,
}

impl<'b> BindingGroup<'b> {
  pub fn indices(&self) -> &[BindingIndex] {
    &self.indices
  }

  pub fn as_id(self, id: impl Into<Id>) -> Self {
    let id = id.into();
    for index in &self.indices {
      self.binder.set_id(*index, Some(id.clone()));
    }
    self
  }

  pub fn when(self, condition: Condition) -> Self {
    for index in &self.indices {
      self.binder.set_condition(*index, condition.clone());
    }
    self
  }

  pub fn into_type<P: ?Sized + Any>(self) -> Self {
    self.when(Condition::parent_type(TypeKey::of::<P>()))
  }

  pub fn set_constraint(self, constraint: ConstraintType) -> Self {
    for index in &self.indices {
      self.binder.set_constraint(*index, constraint);
    }
    self
  }

  pub fn set_binding_type(self, binding_type: BindingType) -> Self {
    for index in &self.indices {
      self.binder.set_binding_type(*index, binding_type);
    }
    self
  }

  /// Adds the value at position `i` to the `i`-th binding.
  pub fn to_values(self, values: impl IntoIterator<Item = Value>) -> Self {
    for (index, value) in self.indices.iter().zip(values) {
      self.binder.push_slot(*index, Slot::Instance(value));
    }
    self
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn by_type_index_tracks_all() {
    let mut binder = Binder::new();
    let a = binder.bind::<u8>().index();
    let _b = binder.bind::<u16>().index();
    let c = binder.bind::<u8>().index();

    assert_eq!(binder.len(), 3);
    assert_eq!(binder.by_type[&TypeKey::of::<u8>()], vec![a, c]);

    binder.remove_binding(a);
    assert_eq!(binder.by_type[&TypeKey::of::<u8>()], vec![c]);
    assert!(!binder.all.contains(&a));

    binder.remove_binding(c);
    assert!(!binder.by_type.contains_key(&TypeKey::of::<u8>()));
    assert_eq!(binder.len(), 1);
  }

  #[test]
  fn stale_index_does_not_alias_reused_slot() {
    let mut binder = Binder::new();
    let old = binder.bind::<u8>().index();
    binder.remove_binding(old);
    let new = binder.bind::<u8>().index();

    assert_ne!(old, new);
    assert!(binder.binding(old).is_none());
    assert!(binder.binding_mut(old).is_none());
    assert!(binder.binding(new).is_some());
  }

  #[test]
  fn cache_instance_prefers_first_writer() {
    let mut binder = Binder::new();
    let deferred = crate::binding::Deferred {
      concrete: TypeKey::of::<u32>(),
      upcast: crate::construct::upcaster::<u32, u32>(),
    };
    let index = binder
      .bind_singleton::<u32>()
      .to_slot(Slot::Type(deferred))
      .index();

    let first = Value::new(1u32);
    let second = Value::new(2u32);
    let concrete = TypeKey::of::<u32>();
    assert!(binder.cache_instance(index, 0, concrete, first.clone()).ptr_eq(&first));
    assert!(binder.cache_instance(index, 0, concrete, second).ptr_eq(&first));
    assert!(binder.binding(index).unwrap().value().unwrap().ptr_eq(&first));
  }

  #[test]
  fn select_skips_empty_bindings() {
    let mut binder = Binder::new();
    binder.bind::<u8>();
    let err = binder
      .select(TypeKey::of::<u8>(), None, &InjectionContext::new())
      .unwrap_err();
    assert!(matches!(err, Error::NoMatchingBinding { candidates: 1, .. }));
  }
}
