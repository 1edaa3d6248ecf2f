//! Observer callbacks fired around binder mutations.

use std::fmt;
use std::sync::Arc;

use crate::binding::Binding;

/// Where in a mutation a hook fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
  BeforeAdd,
  AfterAdd,
  BeforeRemove,
  AfterRemove,
}

/// Returned on subscription; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(u64);

type Hook = Arc<dyn Fn(&Binding) + Send + Sync>;

/// Hooks are notifications, not gates: they observe the binding but cannot
/// stop the mutation. They run synchronously in subscription order.
#[derive(Default)]
pub(crate) struct BindingHooks {
  next_handle: u64,
  entries: Vec<(HookHandle, HookPoint, Hook)>,
}

impl BindingHooks {
  pub(crate) fn subscribe(
    &mut self,
    point: HookPoint,
    hook: impl Fn(&Binding) + Send + Sync + 'static,
  ) -> HookHandle {
    let handle = HookHandle(self.next_handle);
    self.next_handle += 1;
    self.entries.push((handle, point, Arc::new(hook)));
    handle
  }

  pub(crate) fn unsubscribe(&mut self, handle: HookHandle) -> bool {
    let before = self.entries.len();
    self.entries.retain(|(h, _, _)| *h != handle);
    self.entries.len() != before
  }

  pub(crate) fn fire(&self, point: HookPoint, binding: &Binding) {
    for (_, _, hook) in self.entries.iter().filter(|(_, p, _)| *p == point) {
      hook(binding);
    }
  }

  /// Records `binding` for later delivery to the hooks at `point`.
  pub(crate) fn defer(&self, point: HookPoint, binding: &Binding) -> PendingHooks {
    let mut pending = PendingHooks::default();
    pending.push(self, point, binding);
    pending
  }

  pub(crate) fn len(&self) -> usize {
    self.entries.len()
  }
}

/// Hook calls recorded while the binder was locked.
///
/// Each event carries a copy of the binding and the hooks subscribed at the
/// time it was recorded. [`PendingHooks::fire`] delivers them in order.
#[derive(Default)]
pub(crate) struct PendingHooks {
  events: Vec<(Vec<Hook>, Binding)>,
}

impl PendingHooks {
  pub(crate) fn push(&mut self, hooks: &BindingHooks, point: HookPoint, binding: &Binding) {
    let subscribed: Vec<Hook> = hooks
      .entries
      .iter()
      .filter(|(_, p, _)| *p == point)
      .map(|(_, _, hook)| Arc::clone(hook))
      .collect();
    if !subscribed.is_empty() {
      self.events.push((subscribed, binding.clone()));
    }
  }

  pub(crate) fn fire(self) {
    for (hooks, binding) in &self.events {
      for hook in hooks {
        hook(binding);
      }
    }
  }
}

impl fmt::Debug for BindingHooks {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BindingHooks")
      .field("subscribed", &self.entries.len())
      .finish()
  }
}
