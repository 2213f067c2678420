#![forbid(unsafe_code)]

//! The state container: a JSON-valued mapping with change notification.
//!
//! # Design
//!
//! [`Store`] owns a flat map from string keys to [`Value`]s. Mutators go
//! through a single commit path: an effective change bumps the store version,
//! emits on the key's channel (if anyone subscribed), then on the store-wide
//! [`Store::changed`] channel. Reads hand out deep copies, so a caller can
//! never alias store internals through a returned value.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 per effective mutation.
//! 2. Writing a value equal to the stored one is a no-op: no version bump,
//!    no notification.
//! 3. Per-key subscribers are notified before store-wide subscribers.
//! 4. After [`Store::destroy`], mutators are no-ops and no channel (including
//!    handles cloned out of [`Store::changed`]) ever fires again.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `NotBool` | `toggle` on a non-boolean value | `Err`, store untouched |
//! | `NotNumber` | `increment`/`decrement` on a non-number | `Err`, store untouched |
//! | `TypeProtected` | protected `set`/`merge` changing a value's kind | `Err`, store untouched |
//! | Re-entrant mutation | subscriber mutating the same store through `Rc<RefCell<Store>>` | `RefCell` borrow panic |

use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use statewire_signal::{Signal, Subscription};
use tracing::{debug, trace};

use crate::value::{Clamp, ValueKind, is_tombstone};

/// Errors from store mutators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// `toggle` was called on a key whose value is not a boolean.
    NotBool { key: String, actual: ValueKind },
    /// `increment`/`decrement` was called on a non-numeric value.
    NotNumber { key: String, actual: ValueKind },
    /// A type-protected write attempted to change a value's kind.
    TypeProtected {
        key: String,
        stored: ValueKind,
        incoming: ValueKind,
    },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotBool { key, actual } => {
                write!(f, "cannot toggle '{key}': value is {actual}, not bool")
            }
            Self::NotNumber { key, actual } => {
                write!(f, "cannot adjust '{key}': value is {actual}, not a number")
            }
            Self::TypeProtected {
                key,
                stored,
                incoming,
            } => {
                write!(
                    f,
                    "type-protected write to '{key}': stored kind is {stored}, incoming is {incoming}"
                )
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Payload broadcast on every effective mutation.
///
/// `value` carries a deep copy of the new value, or `None` when the key was
/// deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub key: String,
    pub value: Option<Value>,
}

/// Observable key-value state container.
///
/// Constructed empty or from an initial mapping, mutated in place, and
/// explicitly destroyed when its owning screen or session goes away.
pub struct Store {
    values: FxHashMap<String, Value>,
    /// Per-key channels, created lazily on first subscription.
    key_signals: FxHashMap<String, Signal<Change>>,
    /// Store-wide change channel, emitted after every effective mutation.
    pub changed: Signal<Change>,
    /// When set, `set`/`merge` refuse to change the kind of an existing
    /// value. Null-valued slots are free to adopt any kind.
    pub protect_types: bool,
    version: u64,
    destroyed: bool,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("len", &self.values.len())
            .field("version", &self.version)
            .field("protect_types", &self.protect_types)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl Store {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: FxHashMap::default(),
            key_signals: FxHashMap::default(),
            changed: Signal::new(),
            protect_types: false,
            version: 0,
            destroyed: false,
        }
    }

    /// Create a store from an initial mapping.
    ///
    /// Duplicate keys resolve last-wins; tombstones in the initial mapping
    /// are skipped.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        let mut store = Self::new();
        for (key, value) in entries {
            if is_tombstone(&value) {
                continue;
            }
            store.values.insert(key, value);
        }
        store
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Get a deep copy of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    /// Get the value under `key`, or `default` if the key is absent.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.values.get(key).cloned().unwrap_or(default)
    }

    /// Get the value under `key` deserialized into `T`.
    ///
    /// Returns `None` when the key is absent or the value does not fit `T`.
    #[must_use]
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Whether `key` currently holds a value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all stored keys (unordered).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Current version number. Increments by 1 per effective mutation.
    /// Useful for dirty-checking in render loops.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether [`Store::destroy`] has been called.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------

    /// Store `value` under `key`.
    ///
    /// Passing the deletion tombstone deletes the key instead. Writing a
    /// value equal to the stored one is a no-op. With [`Store::protect_types`]
    /// set, a write that would change the stored value's kind is rejected
    /// (slots holding `Null` may adopt any kind).
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<(), StoreError> {
        if self.destroyed {
            debug!("set on destroyed store ignored");
            return Ok(());
        }
        let key = key.into();
        if is_tombstone(&value) {
            self.delete(&key);
            return Ok(());
        }
        if self.protect_types {
            self.check_kind(&key, &value)?;
        }
        if self.values.get(&key) == Some(&value) {
            return Ok(());
        }
        self.write(key, value);
        Ok(())
    }

    /// Backdoor write: no type protection, no notification, no version bump.
    ///
    /// Framework internals use this to seed state behind the store's back.
    /// A tombstone removes the key, silently.
    pub fn raw_set(&mut self, key: impl Into<String>, value: Value) {
        if self.destroyed {
            debug!("raw_set on destroyed store ignored");
            return;
        }
        let key = key.into();
        if is_tombstone(&value) {
            self.values.remove(&key);
            return;
        }
        self.values.insert(key, value);
    }

    /// Remove `key`, returning the previous value. Removing an absent key is
    /// a no-op returning `None`.
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        if self.destroyed {
            debug!("delete on destroyed store ignored");
            return None;
        }
        let prev = self.values.remove(key)?;
        self.commit(key.to_owned(), None);
        Some(prev)
    }

    /// Bulk update. Each entry follows `set` semantics: tombstones delete,
    /// equal values are no-ops, each effective change notifies individually.
    ///
    /// With [`Store::protect_types`] set, the whole batch is validated
    /// against the pre-merge store before anything is applied, so a kind
    /// conflict leaves the store untouched.
    pub fn merge(
        &mut self,
        entries: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<(), StoreError> {
        if self.destroyed {
            debug!("merge on destroyed store ignored");
            return Ok(());
        }
        let entries: Vec<(String, Value)> = entries.into_iter().collect();
        if self.protect_types {
            for (key, value) in &entries {
                if is_tombstone(value) {
                    continue;
                }
                self.check_kind(key, value)?;
            }
        }
        // Validation covered every pre-existing slot, so entries apply
        // without re-checking.
        for (key, value) in entries {
            if is_tombstone(&value) {
                self.delete(&key);
            } else if self.values.get(&key) != Some(&value) {
                self.write(key, value);
            }
        }
        Ok(())
    }

    /// Add `delta` to the numeric value under `key`, clamp the result, and
    /// store it. A missing key counts from 0. Returns the stored value.
    ///
    /// Integer-valued slots stay integers as long as both the delta and the
    /// clamped result are integral. Results that overflow the finite `f64`
    /// range saturate; a NaN result leaves the store untouched.
    pub fn increment(&mut self, key: &str, delta: f64, clamp: Clamp) -> Result<f64, StoreError> {
        if self.destroyed {
            debug!("increment on destroyed store ignored");
            return Ok(0.0);
        }
        let (current, integral_slot) = match self.values.get(key) {
            None => (0.0, true),
            Some(Value::Number(n)) => (n.as_f64().unwrap_or(0.0), n.is_i64() || n.is_u64()),
            Some(other) => {
                return Err(StoreError::NotNumber {
                    key: key.to_owned(),
                    actual: ValueKind::of(other),
                });
            }
        };
        let next = clamp.apply(current + delta);
        if next.is_nan() {
            return Ok(current);
        }
        // JSON numbers cannot hold infinities.
        let next = next.clamp(f64::MIN, f64::MAX);
        let keep_integer = integral_slot
            && delta.fract() == 0.0
            && next.fract() == 0.0
            && next >= i64::MIN as f64
            && next <= i64::MAX as f64;
        let value = if keep_integer {
            Value::from(next as i64)
        } else {
            Value::from(next)
        };
        if self.values.get(key) != Some(&value) {
            self.write(key.to_owned(), value);
        }
        Ok(next)
    }

    /// Subtract `delta` from the numeric value under `key`. See
    /// [`Store::increment`].
    pub fn decrement(&mut self, key: &str, delta: f64, clamp: Clamp) -> Result<f64, StoreError> {
        self.increment(key, -delta, clamp)
    }

    /// Flip the boolean under `key`, returning the new value. A missing key
    /// counts as `false`, so the first toggle stores `true`.
    pub fn toggle(&mut self, key: &str) -> Result<bool, StoreError> {
        if self.destroyed {
            debug!("toggle on destroyed store ignored");
            return Ok(false);
        }
        let next = match self.values.get(key) {
            None => true,
            Some(Value::Bool(b)) => !b,
            Some(other) => {
                return Err(StoreError::NotBool {
                    key: key.to_owned(),
                    actual: ValueKind::of(other),
                });
            }
        };
        self.write(key.to_owned(), Value::Bool(next));
        Ok(next)
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Subscribe to changes of a single key.
    ///
    /// The callback fires on every effective mutation of `key` (including
    /// deletion, where the change payload carries `None`). Dropping the
    /// returned guard unsubscribes.
    pub fn subscribe(
        &mut self,
        key: impl Into<String>,
        callback: impl Fn(&Change) + 'static,
    ) -> Subscription {
        self.key_signals
            .entry(key.into())
            .or_default()
            .connect(callback)
    }

    // ------------------------------------------------------------------
    // Snapshot / restore
    // ------------------------------------------------------------------

    /// Deep copy of all entries, in a JSON object map.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Replace the store contents wholesale.
    ///
    /// Emits the minimal change set: one deletion per vanished key, one
    /// change per entry that differs. Bypasses type protection (this is the
    /// snapshot counterpart of [`Store::raw_set`]).
    pub fn restore(&mut self, map: Map<String, Value>) {
        if self.destroyed {
            debug!("restore on destroyed store ignored");
            return;
        }
        let stale: Vec<String> = self
            .values
            .keys()
            .filter(|k| !map.contains_key(*k))
            .cloned()
            .collect();
        for key in stale {
            self.delete(&key);
        }
        for (key, value) in map {
            if is_tombstone(&value) {
                self.delete(&key);
            } else if self.values.get(&key) != Some(&value) {
                self.write(key, value);
            }
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Clear all values and release every notification channel.
    ///
    /// Idempotent. Afterwards the store is inert: mutators are no-ops,
    /// reads see an empty store, and no subscriber (even one holding a
    /// cloned handle of [`Store::changed`]) is ever notified again.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        debug!(entries = self.values.len(), "destroying store");
        self.values.clear();
        for signal in self.key_signals.values() {
            signal.clear();
        }
        self.key_signals.clear();
        self.changed.clear();
        self.destroyed = true;
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Reject a protected write that would change the stored kind.
    fn check_kind(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        if let Some(stored) = self.values.get(key) {
            let stored_kind = ValueKind::of(stored);
            let incoming_kind = ValueKind::of(value);
            if stored_kind != ValueKind::Null && stored_kind != incoming_kind {
                return Err(StoreError::TypeProtected {
                    key: key.to_owned(),
                    stored: stored_kind,
                    incoming: incoming_kind,
                });
            }
        }
        Ok(())
    }

    /// Insert an already-validated value and notify.
    fn write(&mut self, key: String, value: Value) {
        self.values.insert(key.clone(), value.clone());
        self.commit(key, Some(value));
    }

    /// Bump the version and broadcast a change: per-key channel first, then
    /// the store-wide one.
    fn commit(&mut self, key: String, value: Option<Value>) {
        self.version += 1;
        trace!(
            key = %key,
            version = self.version,
            deleted = value.is_none(),
            "state change"
        );
        let change = Change { key, value };
        if let Some(signal) = self.key_signals.get(&change.key) {
            signal.emit(&change);
        }
        self.changed.emit(&change);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
