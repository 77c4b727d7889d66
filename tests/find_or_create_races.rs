//! Concurrent find-or-create: many racing callers, at most one record per
//! key. The serial lane behind the resolvers is what makes this hold.

use shellac::{ActiveRecord, AttributeMap, Entity, ObjectStack, Value};
use std::sync::{Arc, Barrier};

struct Artist;

impl Entity for Artist {
    fn entity_name() -> &'static str {
        "artist"
    }

    fn primary_key() -> Option<&'static str> {
        Some("remote_id")
    }
}

const RACERS: usize = 8;

#[test]
fn racing_primary_key_creates_yield_one_record() {
    let stack = ObjectStack::new();
    let scope = stack.main_scope();
    let barrier = Arc::new(Barrier::new(RACERS));

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let scope = scope.clone();
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                Artist::with_primary_key_in(Value::Int(42), true, &scope)
                    .unwrap()
                    .unwrap()
            })
        })
        .collect();

    let records: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(Artist::count_in(&scope), 1);
    // Every racer resolved to the same instance
    for record in &records[1..] {
        assert_eq!(*record, records[0]);
    }
    assert_eq!(records[0].get("remote_id"), Some(Value::Int(42)));
}

#[test]
fn racing_distinct_keys_create_one_record_each() {
    let stack = ObjectStack::new();
    let scope = stack.main_scope();
    let barrier = Arc::new(Barrier::new(RACERS));

    let handles: Vec<_> = (0..RACERS)
        .map(|i| {
            let scope = scope.clone();
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                // Two racers per key
                let key = Value::Int((i / 2) as i64);
                Artist::with_primary_key_in(key, true, &scope)
                    .unwrap()
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(Artist::count_in(&scope), (RACERS / 2) as u64);
    for i in 0..RACERS / 2 {
        let found = Artist::with_primary_key_in(Value::Int(i as i64), false, &scope)
            .unwrap()
            .unwrap();
        assert_eq!(found.get("remote_id"), Some(Value::Int(i as i64)));
    }
}

#[test]
fn racing_attribute_matches_yield_one_record() {
    let stack = ObjectStack::new();
    let scope = stack.main_scope();
    let barrier = Arc::new(Barrier::new(RACERS));

    let attributes: AttributeMap = [
        ("name".to_string(), Value::from("Bowie")),
        ("era".to_string(), Value::from("Berlin")),
    ]
    .into_iter()
    .collect();

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let scope = scope.clone();
            let barrier = Arc::clone(&barrier);
            let attributes = attributes.clone();
            std::thread::spawn(move || {
                barrier.wait();
                Artist::with_attributes_in(&attributes, true, &scope)
                    .unwrap()
                    .unwrap()
            })
        })
        .collect();

    let records: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(Artist::count_in(&scope), 1);
    for record in &records[1..] {
        assert_eq!(*record, records[0]);
    }
    assert_eq!(records[0].get("era"), Some(Value::from("Berlin")));
}

#[test]
fn racing_creates_across_scopes_stay_isolated() {
    let stack = ObjectStack::new();
    let main = stack.main_scope();
    let background = stack.new_background_scope();
    let barrier = Arc::new(Barrier::new(2));

    let scopes = [main.clone(), background.clone()];
    let handles: Vec<_> = scopes
        .iter()
        .map(|scope| {
            let scope = scope.clone();
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                Artist::with_primary_key_in(Value::Int(1), true, &scope)
                    .unwrap()
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // One per scope: find-or-create is scope-local, not stack-global
    assert_eq!(Artist::count_in(&main), 1);
    assert_eq!(Artist::count_in(&background), 1);
}
