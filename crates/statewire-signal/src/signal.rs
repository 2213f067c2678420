#![forbid(unsafe_code)]

//! Shared subscriber channel with lazy cleanup.
//!
//! # Design
//!
//! [`Signal<T>`] holds a list of subscriber callbacks in shared,
//! reference-counted storage (`Rc<RefCell<..>>`). Emitting a payload invokes
//! every live subscriber in registration order. The channel stores no value
//! of its own; the data owner (the store) decides what to broadcast and when.
//!
//! # Performance
//!
//! | Operation   | Complexity                 |
//! |-------------|----------------------------|
//! | `emit()`    | O(S) where S = subscribers |
//! | `connect()` | O(1) amortized             |
//! | `clear()`   | O(S)                       |
//! | Memory      | ~40 bytes + per-subscriber `Weak` |
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: if [`Subscription`] guards are stored indefinitely
//!   without being dropped, callbacks accumulate. Dead weak references are
//!   cleaned lazily during `emit()`.
//! - **Nested emit**: a callback that emits on the same signal delivers the
//!   nested payload immediately, before the outer emission resumes. Allowed,
//!   but deep recursion is the caller's responsibility.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A subscriber callback stored as a strong `Rc` inside the guard, handed to
/// the channel as `Weak`.
type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

/// Shared interior for [`Signal<T>`].
struct SignalInner<T> {
    /// Subscribers stored as weak references. Dead entries are pruned on emit.
    subscribers: Vec<CallbackWeak<T>>,
    /// Total emissions since construction. Monotonic.
    emits: u64,
}

/// A shared, single-threaded notification channel.
///
/// Cloning a `Signal` creates a new handle to the **same** channel — both
/// handles deliver to the same subscribers, and `clear()` through one handle
/// is visible through the other.
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

// Manual Clone: shares the same Rc.
impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("subscriber_count", &inner.subscribers.len())
            .field("emits", &inner.emits)
            .finish()
    }
}

impl<T> Signal<T> {
    /// Create a new channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                subscribers: Vec::new(),
                emits: 0,
            })),
        }
    }

    /// Subscribe to emissions. The callback is invoked with a reference to
    /// each emitted payload.
    ///
    /// Returns a [`Subscription`] guard. Dropping the guard unsubscribes the
    /// callback (it will not be called after drop, though it may remain in
    /// the subscriber list until the next `emit()` prunes it).
    pub fn connect(&self, callback: impl Fn(&T) + 'static) -> Subscription
    where
        T: 'static,
    {
        let strong: CallbackRc<T> = Rc::new(callback);
        let weak = Rc::downgrade(&strong);
        self.inner.borrow_mut().subscribers.push(weak);
        // The guard type-erases the callback as `dyn Any`, since
        // `Rc<dyn Fn(&T)>` cannot directly coerce to `Rc<dyn Any>`.
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Emit a payload to every live subscriber, pruning dead ones.
    pub fn emit(&self, payload: &T) {
        // Collect live callbacks first, so the borrow is released before
        // any subscriber code runs.
        let callbacks: Vec<CallbackRc<T>> = {
            let mut inner = self.inner.borrow_mut();
            inner.emits += 1;
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner
                .subscribers
                .iter()
                .filter_map(|w| w.upgrade())
                .collect()
        };

        for cb in &callbacks {
            cb(payload);
        }
    }

    /// Drop every subscriber. Outstanding [`Subscription`] guards become
    /// inert; subsequent emissions reach nobody.
    pub fn clear(&self) {
        self.inner.borrow_mut().subscribers.clear();
    }

    /// Number of currently registered subscribers (including dead ones not
    /// yet pruned).
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Total number of `emit` calls on this channel. Useful for
    /// dirty-checking in render loops.
    #[must_use]
    pub fn emit_count(&self) -> u64 {
        self.inner.borrow().emits
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the `Subscription` causes the associated callback to become
/// unreachable (the strong `Rc` is dropped, so the `Weak` in the channel's
/// subscriber list will fail to upgrade on the next emission cycle).
pub struct Subscription {
    /// Type-erased strong reference keeping the callback `Rc` alive.
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
