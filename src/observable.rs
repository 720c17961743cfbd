//! Observable value cell, the foundation the capability graph is built on.
//!
//! An [`ObservableFlag`] holds a value and a list of `(old, new)` listeners.
//! The one invariant everything above relies on: **setting a value equal to
//! the current one is a no-op and fires nothing**. Dependency resolution is
//! recursive and re-entrant; this rule is what bounds it.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A listener receiving `(old, new)` on every effective change.
pub type Listener<T> = Rc<dyn Fn(&T, &T)>;

/// Unique identifier for a registered listener, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

static LISTENER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

impl ListenerId {
    fn next() -> Self {
        ListenerId(LISTENER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

struct ListenerEntry<T> {
    id: ListenerId,
    callback: Listener<T>,
}

/// A value cell that notifies registered listeners on change.
///
/// Listeners are invoked after the internal borrows are released, so a
/// listener is free to re-enter [`set`](Self::set) on this or any other
/// flag. Identical re-entrant transitions terminate via the equal-value
/// no-op rule.
pub struct ObservableFlag<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<ListenerEntry<T>>>,
}

impl<T: Clone + PartialEq> ObservableFlag<T> {
    /// Create a flag with the given initial value.
    pub fn new(initial: T) -> Self {
        Self {
            value: RefCell::new(initial),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Set a new value, notifying listeners with `(old, new)`.
    ///
    /// No-op when `new` equals the current value.
    pub fn set(&self, new: T) {
        let old = {
            let mut value = self.value.borrow_mut();
            if *value == new {
                return;
            }
            std::mem::replace(&mut *value, new.clone())
        };

        // Snapshot before invoking: a listener may subscribe or unsubscribe
        // on this same flag while the cascade runs.
        let snapshot: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|entry| entry.callback.clone())
            .collect();

        for callback in snapshot {
            callback(&old, &new);
        }
    }

    /// Register a listener; returns an id usable with
    /// [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(&self, listener: impl Fn(&T, &T) + 'static) -> ListenerId {
        let id = ListenerId::next();
        self.listeners.borrow_mut().push(ListenerEntry {
            id,
            callback: Rc::new(listener),
        });
        id
    }

    /// Remove a listener. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl<T: Clone + PartialEq + std::fmt::Debug> std::fmt::Debug for ObservableFlag<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableFlag")
            .field("value", &*self.value.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}
