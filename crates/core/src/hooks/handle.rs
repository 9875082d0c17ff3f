//! Handles returned when a callback is fastened to a hook

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::callback::Callback;
use super::hook::HookInner;
use super::lock;

/// Process-wide handle id counter; ids are never reused
static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_handle_id() -> u64 {
    NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed)
}

/// One attachment of a callback, shared between the hook and its handle
pub(crate) struct Slot<T> {
    pub(crate) id: u64,
    order: Mutex<Option<i64>>,
    pub(crate) callback: Callback<T>,
}

impl<T> Slot<T> {
    pub(crate) fn new(id: u64, order: Option<i64>, callback: Callback<T>) -> Self {
        Self {
            id,
            order: Mutex::new(order),
            callback,
        }
    }

    pub(crate) fn order(&self) -> Option<i64> {
        *lock(&self.order)
    }
}

/// Token for one attached callback.
///
/// Clones refer to the same attachment. Dropping a handle does not detach.
pub struct HookHandle<T> {
    slot: Arc<Slot<T>>,
    owner: Weak<HookInner<T>>,
}

impl<T> HookHandle<T> {
    pub(crate) fn new(slot: Arc<Slot<T>>, owner: Weak<HookInner<T>>) -> Self {
        Self { slot, owner }
    }

    pub fn id(&self) -> u64 {
        self.slot.id
    }

    pub fn order(&self) -> Option<i64> {
        self.slot.order()
    }

    /// Takes effect from the next invocation; a running invocation keeps
    /// the order it sorted with.
    pub fn set_order(&self, order: Option<i64>) {
        *lock(&self.slot.order) = order;
    }

    pub fn is_async(&self) -> bool {
        self.slot.callback.is_async()
    }

    pub fn callback(&self) -> &Callback<T> {
        &self.slot.callback
    }

    pub fn is_attached(&self) -> bool {
        self.owner
            .upgrade()
            .is_some_and(|hook| hook.contains(self.slot.id))
    }

    /// Remove this attachment from its hook.
    ///
    /// Returns false if it was already detached or the hook no longer exists.
    pub fn detach(&self) -> bool {
        match self.owner.upgrade() {
            Some(hook) => hook.remove(self.slot.id),
            None => false,
        }
    }
}

impl<T> Clone for HookHandle<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            owner: self.owner.clone(),
        }
    }
}

impl<T> fmt::Debug for HookHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookHandle")
            .field("id", &self.id())
            .field("order", &self.order())
            .field("is_async", &self.is_async())
            .finish()
    }
}
