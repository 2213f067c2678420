//! End-to-end test: a store driving two bound views through a realistic
//! mutation sequence — bulk merge, counters with caps, toggles, type
//! protection, and teardown.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use statewire_store::{Change, Clamp, Store, StoreError, View, tombstone};

/// A fake widget that records what it was redrawn with.
struct StatusBar {
    redraws: u32,
    last_volume: i64,
}

impl View for StatusBar {
    fn redraw(&mut self) {
        self.redraws += 1;
    }
}

struct Sidebar {
    redraws: u32,
}

impl View for Sidebar {
    fn redraw(&mut self) {
        self.redraws += 1;
    }
}

fn session_store() -> Store {
    Store::from_entries([
        ("volume".to_owned(), json!(50)),
        ("muted".to_owned(), json!(false)),
        ("theme".to_owned(), json!("dark")),
        ("sidebar.open".to_owned(), json!(true)),
    ])
}

#[test]
fn views_track_their_slices() {
    let mut store = session_store();

    let status = Rc::new(RefCell::new(StatusBar {
        redraws: 0,
        last_volume: 0,
    }));
    let sidebar = Rc::new(RefCell::new(Sidebar { redraws: 0 }));

    let _status_binding = store.bind(&["volume", "muted"], &status);
    let _sidebar_binding = store.bind(&["sidebar.open"], &sidebar);

    // Volume up, capped at 100.
    store.increment("volume", 60.0, Clamp::at_most(100.0)).unwrap();
    assert_eq!(store.get_as::<i64>("volume"), Some(100));
    assert_eq!(status.borrow().redraws, 1);
    assert_eq!(sidebar.borrow().redraws, 0);

    // Mute toggle hits the status bar only.
    assert!(store.toggle("muted").unwrap());
    assert_eq!(status.borrow().redraws, 2);
    assert_eq!(sidebar.borrow().redraws, 0);

    // Sidebar collapse hits the sidebar only.
    store.set("sidebar.open", json!(false)).unwrap();
    assert_eq!(status.borrow().redraws, 2);
    assert_eq!(sidebar.borrow().redraws, 1);

    // Theme change is bound to nobody.
    store.set("theme", json!("light")).unwrap();
    assert_eq!(status.borrow().redraws, 2);
    assert_eq!(sidebar.borrow().redraws, 1);
}

#[test]
fn subscriber_reads_change_payloads() {
    let mut store = session_store();
    let volumes: Rc<RefCell<Vec<i64>>> = Rc::new(RefCell::new(Vec::new()));
    let volumes_clone = Rc::clone(&volumes);
    let _sub = store.subscribe("volume", move |change: &Change| {
        if let Some(v) = change.value.as_ref().and_then(serde_json::Value::as_i64) {
            volumes_clone.borrow_mut().push(v);
        }
    });

    store.increment("volume", 10.0, Clamp::none()).unwrap();
    store.decrement("volume", 30.0, Clamp::at_least(0.0)).unwrap();
    store.set("volume", json!(75)).unwrap();

    assert_eq!(*volumes.borrow(), vec![60, 30, 75]);
}

#[test]
fn bulk_merge_notifies_per_key() {
    let mut store = session_store();
    let status = Rc::new(RefCell::new(StatusBar {
        redraws: 0,
        last_volume: 0,
    }));
    let _binding = store.bind(&["volume", "muted"], &status);

    store
        .merge([
            ("volume".to_owned(), json!(20)),
            ("muted".to_owned(), json!(true)),
            ("theme".to_owned(), tombstone()),
        ])
        .unwrap();

    assert_eq!(status.borrow().redraws, 2);
    assert!(!store.contains_key("theme"));
    assert_eq!(store.len(), 3);
}

#[test]
fn type_protection_guards_the_session() {
    let mut store = session_store();
    store.protect_types = true;

    let err = store.set("volume", json!("loud")).unwrap_err();
    assert!(matches!(err, StoreError::TypeProtected { ref key, .. } if key == "volume"));

    // The store is unchanged and still usable for well-typed writes.
    assert_eq!(store.get_as::<i64>("volume"), Some(50));
    store.set("volume", json!(51)).unwrap();
}

#[test]
fn snapshot_survives_a_session_reset() {
    let mut store = session_store();
    let snap = store.snapshot();

    store.merge([("volume".to_owned(), json!(0)), ("muted".to_owned(), json!(true))]).unwrap();
    store.delete("theme");

    store.restore(snap);
    assert_eq!(store.get_as::<i64>("volume"), Some(50));
    assert_eq!(store.get_as::<bool>("muted"), Some(false));
    assert_eq!(store.get_as::<String>("theme"), Some("dark".to_owned()));
}

#[test]
fn teardown_releases_everything() {
    let mut store = session_store();
    let status = Rc::new(RefCell::new(StatusBar {
        redraws: 0,
        last_volume: 0,
    }));
    let _binding = store.bind_all(&status);
    let external_channel = store.changed.clone();

    store.destroy();

    // Mutations are inert and nobody is redrawn, even through the cloned
    // channel handle.
    store.set("volume", json!(99)).unwrap();
    store.toggle("muted").unwrap();
    assert!(store.is_empty());
    assert_eq!(status.borrow().redraws, 0);
    assert_eq!(external_channel.connection_count(), 0);
}

#[test]
fn status_bar_pulls_state_inside_redraw_cycle() {
    // The render loop pattern: a change marks the view dirty, the frame
    // callback pulls fresh state. Pulling happens outside the mutation
    // call, so no re-entrant borrow is involved.
    let mut store = session_store();
    let status = Rc::new(RefCell::new(StatusBar {
        redraws: 0,
        last_volume: 0,
    }));
    let _binding = store.bind(&["volume"], &status);

    store.increment("volume", 5.0, Clamp::none()).unwrap();
    let volume = store.get_as::<i64>("volume").unwrap();
    status.borrow_mut().last_volume = volume;

    assert_eq!(status.borrow().redraws, 1);
    assert_eq!(status.borrow().last_volume, 55);
}
