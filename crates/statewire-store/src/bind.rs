#![forbid(unsafe_code)]

//! Binding store slices to component re-renders.
//!
//! The component framework sits behind the [`View`] trait: anything that can
//! redraw itself can be bound to a set of keys, and the store redraws it on
//! every effective change to those keys.
//!
//! Bindings hold only a `Weak` handle to the view, so a dropped component
//! silently stops being redrawn and a binding never extends a component's
//! lifetime. Dropping the [`Binding`] itself unhooks all its subscriptions.

use std::cell::RefCell;
use std::rc::Rc;

use statewire_signal::Subscription;

use crate::store::{Change, Store};

/// A component that can be re-rendered when bound state changes.
pub trait View {
    /// Redraw the component from current state.
    fn redraw(&mut self);
}

/// RAII bundle of the subscriptions backing one `bind` call.
///
/// Dropping the binding unhooks the view from every key it was bound to.
pub struct Binding {
    subscriptions: Vec<Subscription>,
}

impl Binding {
    /// Number of per-key hooks held by this binding.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl Store {
    /// Redraw `view` whenever any of `keys` changes.
    ///
    /// The view is redrawn once per effective change (a mutation touching
    /// two bound keys redraws twice). The binding holds the view weakly.
    pub fn bind<V: View + 'static>(&mut self, keys: &[&str], view: &Rc<RefCell<V>>) -> Binding {
        let subscriptions = keys
            .iter()
            .map(|key| {
                let weak = Rc::downgrade(view);
                self.subscribe(*key, move |_change: &Change| {
                    if let Some(view) = weak.upgrade() {
                        view.borrow_mut().redraw();
                    }
                })
            })
            .collect();
        Binding { subscriptions }
    }

    /// Redraw `view` on every store change, regardless of key.
    pub fn bind_all<V: View + 'static>(&mut self, view: &Rc<RefCell<V>>) -> Binding {
        let weak = Rc::downgrade(view);
        let subscription = self.changed.connect(move |_change: &Change| {
            if let Some(view) = weak.upgrade() {
                view.borrow_mut().redraw();
            }
        });
        Binding {
            subscriptions: vec![subscription],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Label {
        redraws: u32,
    }

    impl View for Label {
        fn redraw(&mut self) {
            self.redraws += 1;
        }
    }

    #[test]
    fn bound_key_triggers_redraw() {
        let mut store = Store::new();
        let label = Rc::new(RefCell::new(Label { redraws: 0 }));
        let _binding = store.bind(&["title"], &label);

        store.set("title", json!("hello")).unwrap();
        assert_eq!(label.borrow().redraws, 1);

        store.set("unrelated", json!(1)).unwrap();
        assert_eq!(label.borrow().redraws, 1);
    }

    #[test]
    fn multi_key_binding() {
        let mut store = Store::new();
        let label = Rc::new(RefCell::new(Label { redraws: 0 }));
        let binding = store.bind(&["a", "b"], &label);
        assert_eq!(binding.subscription_count(), 2);

        store.set("a", json!(1)).unwrap();
        store.set("b", json!(2)).unwrap();
        assert_eq!(label.borrow().redraws, 2);
    }

    #[test]
    fn noop_mutation_does_not_redraw() {
        let mut store = Store::new();
        store.set("k", json!(1)).unwrap();
        let label = Rc::new(RefCell::new(Label { redraws: 0 }));
        let _binding = store.bind(&["k"], &label);

        store.set("k", json!(1)).unwrap();
        assert_eq!(label.borrow().redraws, 0);
    }

    #[test]
    fn deletion_redraws() {
        let mut store = Store::new();
        store.set("k", json!(1)).unwrap();
        let label = Rc::new(RefCell::new(Label { redraws: 0 }));
        let _binding = store.bind(&["k"], &label);

        store.delete("k");
        assert_eq!(label.borrow().redraws, 1);
    }

    #[test]
    fn dropping_binding_unhooks() {
        let mut store = Store::new();
        let label = Rc::new(RefCell::new(Label { redraws: 0 }));
        let binding = store.bind(&["k"], &label);

        store.set("k", json!(1)).unwrap();
        drop(binding);
        store.set("k", json!(2)).unwrap();
        assert_eq!(label.borrow().redraws, 1);
    }

    #[test]
    fn dropped_view_stops_redrawing() {
        let mut store = Store::new();
        let label = Rc::new(RefCell::new(Label { redraws: 0 }));
        let _binding = store.bind(&["k"], &label);

        drop(label);
        // Must not panic or upgrade a dead view.
        store.set("k", json!(1)).unwrap();
    }

    #[test]
    fn bind_all_sees_every_key() {
        let mut store = Store::new();
        let label = Rc::new(RefCell::new(Label { redraws: 0 }));
        let _binding = store.bind_all(&label);

        store.set("a", json!(1)).unwrap();
        store.set("b", json!(2)).unwrap();
        store.delete("a");
        assert_eq!(label.borrow().redraws, 3);
    }

    #[test]
    fn binding_does_not_keep_view_alive() {
        let mut store = Store::new();
        let label = Rc::new(RefCell::new(Label { redraws: 0 }));
        let _binding = store.bind(&["k"], &label);

        let weak = Rc::downgrade(&label);
        drop(label);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn destroy_severs_bindings() {
        let mut store = Store::new();
        let label = Rc::new(RefCell::new(Label { redraws: 0 }));
        let _binding = store.bind_all(&label);

        store.destroy();
        store.set("k", json!(1)).unwrap();
        assert_eq!(label.borrow().redraws, 0);
    }
}
