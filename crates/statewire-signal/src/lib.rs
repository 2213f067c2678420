#![forbid(unsafe_code)]

//! Change-notification signals for statewire.
//!
//! This crate provides the event primitive the state container broadcasts
//! through:
//!
//! - [`Signal`]: a shared, single-threaded channel that delivers payloads to
//!   subscriber callbacks.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//!
//! # Architecture
//!
//! `Signal<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during emission.
//!
//! # Invariants
//!
//! 1. Subscribers are invoked in registration order.
//! 2. Dropping a [`Subscription`] removes the callback before the next
//!    emission cycle.
//! 3. Callbacks run outside the channel's internal borrow: a callback may
//!    connect further subscribers or clone the signal handle.
//! 4. `emit_count` increments by exactly 1 per `emit` call.

pub mod signal;

pub use signal::{Signal, Subscription};
