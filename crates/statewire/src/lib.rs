#![forbid(unsafe_code)]

//! statewire public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users: the
//! observable key-value [`Store`], its change channels, and the view-binding
//! adapter.
//!
//! # Example
//!
//! ```
//! use statewire::prelude::*;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! struct Counter {
//!     redraws: u32,
//! }
//!
//! impl View for Counter {
//!     fn redraw(&mut self) {
//!         self.redraws += 1;
//!     }
//! }
//!
//! # fn main() -> Result<(), StoreError> {
//! let mut store = Store::from_entries([("count".to_owned(), Value::from(0))]);
//! let counter = Rc::new(RefCell::new(Counter { redraws: 0 }));
//! let _binding = store.bind(&["count"], &counter);
//!
//! store.increment("count", 1.0, Clamp::at_most(10.0))?;
//! assert_eq!(store.get_as::<i64>("count"), Some(1));
//! assert_eq!(counter.borrow().redraws, 1);
//! # Ok(())
//! # }
//! ```

pub use statewire_signal::{Signal, Subscription};
pub use statewire_store::{
    Binding, Change, Clamp, Store, StoreError, Value, ValueKind, View, is_tombstone, tombstone,
};

pub mod prelude {
    pub use statewire_signal::{Signal, Subscription};
    pub use statewire_store::{
        Binding, Change, Clamp, Store, StoreError, Value, ValueKind, View, is_tombstone, tombstone,
    };
}
