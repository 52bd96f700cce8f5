//! Ordered, ID-addressed callback lists with reentrancy protection.
//!
//! Each parameter owns four lists (pre/post read, pre/post write) and each
//! broker owns two (create/destroy). A list dispatches synchronously, in
//! registration order. If a callback triggers the same list again (say a
//! pre-write callback writing the parameter it is reacting to), the nested
//! dispatch is skipped entirely: vetoed for the pre-write list, a plain
//! no-op for the others. Without this the nested call would recurse
//! without bound.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::common::Originator;

/// Identifies a registered callback within one list. Never reused for the
/// lifetime of the list.
pub type CallbackId = u64;

/// Payload passed to pre- and post-read callbacks. Read callbacks observe;
/// they cannot veto or rewrite the value.
#[derive(Debug, Clone)]
pub struct ReadEvent<T> {
    pub value: T,
    pub name: String,
}

/// Payload passed to pre- and post-write callbacks.
#[derive(Debug, Clone)]
pub struct WriteEvent<T> {
    pub old_value: T,
    pub new_value: T,
    pub name: String,
    pub originator: Originator,
}

/// Clears the dispatch flag on every exit path, including unwinding.
struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// An insertion-ordered `id -> callback` collection guarded against
/// reentrant dispatch.
pub struct CallbackList<E, R> {
    entries: RefCell<Vec<(CallbackId, Rc<dyn Fn(&E) -> R>)>>,
    next_id: Cell<CallbackId>,
    dispatching: Cell<bool>,
}

impl<E, R> Default for CallbackList<E, R> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            dispatching: Cell::new(false),
        }
    }
}

impl<E, R> CallbackList<E, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; returns its id. Safe to call from within a
    /// dispatch of this same list; the new callback only runs on the
    /// next dispatch.
    pub fn register(&self, callback: impl Fn(&E) -> R + 'static) -> CallbackId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    pub fn register_rc(&self, callback: Rc<dyn Fn(&E) -> R>) -> CallbackId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, callback));
        id
    }

    /// Remove a callback by id. Returns whether it was present.
    pub fn unregister(&self, id: CallbackId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Clear the list. Returns whether it held any callbacks.
    pub fn unregister_all(&self) -> bool {
        let mut entries = self.entries.borrow_mut();
        let had_any = !entries.is_empty();
        entries.clear();
        had_any
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Snapshot the current entries so callbacks may register or
    /// unregister on this list while it is being dispatched.
    fn snapshot(&self) -> Vec<(CallbackId, Rc<dyn Fn(&E) -> R>)> {
        self.entries.borrow().clone()
    }
}

impl<E> CallbackList<E, ()> {
    /// Invoke every callback in id order. A reentrant dispatch is a no-op.
    pub fn dispatch(&self, event: &E) {
        if self.dispatching.get() {
            return;
        }
        self.dispatching.set(true);
        let _guard = DispatchGuard(&self.dispatching);
        for (_, callback) in self.snapshot() {
            callback(event);
        }
    }
}

impl<E> CallbackList<E, bool> {
    /// Invoke every callback in id order and AND their verdicts. A
    /// reentrant dispatch is treated as vetoed. An empty list accepts.
    ///
    /// All callbacks run even after a veto, so each registered observer
    /// sees every attempted write; the aggregate verdict is what gates
    /// the commit.
    pub fn dispatch_vetoable(&self, event: &E) -> bool {
        if self.dispatching.get() {
            return false;
        }
        self.dispatching.set(true);
        let _guard = DispatchGuard(&self.dispatching);
        let mut accepted = true;
        for (_, callback) in self.snapshot() {
            accepted &= callback(event);
        }
        accepted
    }
}
