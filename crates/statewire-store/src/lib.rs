#![forbid(unsafe_code)]

//! Observable key-value state container for component-based terminal UIs.
//!
//! The store is the single data owner sitting between application state and
//! the widgets that render it: a JSON-valued mapping with convenience
//! mutators, per-key change signals, and a binding adapter that redraws
//! views when the slices they depend on change.
//!
//! # Layers
//!
//! - [`store`]: the container itself — reads, mutators, type protection,
//!   subscriptions, snapshot/restore, destruction.
//! - [`value`]: the value model — JSON kind tags, the deletion tombstone,
//!   numeric clamping bounds.
//! - [`bind`]: the seam to the component framework — the [`View`] trait and
//!   RAII [`Binding`] bundles.
//!
//! # Invariants
//!
//! 1. Every value handed out (reads, change payloads, snapshots) is an owned
//!    deep copy; mutating it never affects the store.
//! 2. A mutation that leaves a value unchanged emits nothing and does not
//!    bump the store version.
//! 3. On an effective change, the per-key channel fires before the
//!    store-wide one; subscribers fire in registration order.
//! 4. A destroyed store never notifies again, through any channel handle.

pub mod bind;
pub mod store;
pub mod value;

pub use bind::{Binding, View};
pub use store::{Change, Store, StoreError};
pub use value::{Clamp, ValueKind, is_tombstone, tombstone};

pub use serde_json::Value;
pub use statewire_signal::{Signal, Subscription};
