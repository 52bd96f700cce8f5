use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cfg_broker::prelude::*;

#[test]
fn test_veto_leaves_value_and_origin_untouched() {
    let broker = Broker::new();
    let param = broker.create_param("p", 0i64).build().unwrap();
    assert!(param.set_value_by(3, Originator::new("first")));

    param.on_pre_write(|_| false);
    assert!(!param.set_value_by(9, Originator::new("second")));
    assert_eq!(param.get_value(), 3);
    assert_eq!(param.value_origin().name(), "first");
}

#[test]
fn test_post_write_fires_only_on_commit() {
    let broker = Broker::new();
    let param = broker.create_param("p", 0i64).build().unwrap();

    let commits = Rc::new(RefCell::new(Vec::new()));
    let log = commits.clone();
    param.on_post_write(move |e| log.borrow_mut().push((e.old_value, e.new_value)));

    let gate = Rc::new(Cell::new(true));
    let gate2 = gate.clone();
    param.on_pre_write(move |_| gate2.get());

    assert!(param.set_value(3));
    gate.set(false);
    assert!(!param.set_value(9));
    gate.set(true);
    assert!(param.set_value(5));

    // The vetoed write at 9 left no trace.
    assert_eq!(*commits.borrow(), vec![(0, 3), (3, 5)]);
}

#[test]
fn test_post_write_ordering_across_writes() {
    let broker = Broker::new();
    let param = broker.create_param("p", 0i64).build().unwrap();

    let calls = Rc::new(RefCell::new(Vec::new()));
    let log = calls.clone();
    param.on_post_write(move |e| log.borrow_mut().push(("C1", e.old_value, e.new_value)));
    let log = calls.clone();
    param.on_post_write(move |e| log.borrow_mut().push(("C2", e.old_value, e.new_value)));

    param.set_value(3);
    param.set_value(9);

    assert_eq!(
        *calls.borrow(),
        vec![
            ("C1", 0, 3),
            ("C2", 0, 3),
            ("C1", 3, 9),
            ("C2", 3, 9),
        ]
    );
}

#[test]
fn test_pre_write_sees_old_and_new() {
    let broker = Broker::new();
    let param = broker.create_param("p", 5i64).build().unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    param.on_pre_write(move |e| {
        log.borrow_mut().push((e.old_value, e.new_value, e.originator.name().to_string()));
        true
    });

    param.set_value_by(7, Originator::new("writer"));
    assert_eq!(*seen.borrow(), vec![(5, 7, "writer".to_string())]);
}

#[test]
fn test_reentrant_write_from_pre_write_does_not_recurse() {
    let broker = Broker::new();
    let param = Rc::new(broker.create_param("p", 0i64).build().unwrap());

    let inner_result = Rc::new(Cell::new(true));
    let inner = param.clone();
    let result = inner_result.clone();
    param.on_pre_write(move |e| {
        if e.new_value == 3 {
            // The nested write must be vetoed, not recursed into.
            result.set(inner.set_value(99));
        }
        true
    });

    assert!(param.set_value(3), "outer write proceeds on its own verdict");
    assert_eq!(param.get_value(), 3);
    assert!(!inner_result.get(), "nested write was rejected");
}

#[test]
fn test_write_from_post_write_commits_without_recursion() {
    let broker = Broker::new();
    let param = Rc::new(broker.create_param("p", 0i64).build().unwrap());

    let fired = Rc::new(Cell::new(0));
    let inner = param.clone();
    let count = fired.clone();
    param.on_post_write(move |e| {
        count.set(count.get() + 1);
        if e.new_value == 3 {
            // Commits, but its own post-write dispatch is skipped.
            assert!(inner.set_value(4));
        }
    });

    assert!(param.set_value(3));
    assert_eq!(param.get_value(), 4);
    assert_eq!(fired.get(), 1);
}

#[test]
fn test_read_pipeline_order_and_snapshot() {
    let broker = Broker::new();
    let param = broker.create_param("p", 5i64).build().unwrap();

    let order = Rc::new(RefCell::new(Vec::new()));
    let log = order.clone();
    param.on_pre_read(move |e: &ReadEvent<i64>| log.borrow_mut().push(("pre", e.value)));
    let log = order.clone();
    param.on_post_read(move |e: &ReadEvent<i64>| log.borrow_mut().push(("post", e.value)));

    assert_eq!(param.get_value(), 5);
    assert_eq!(*order.borrow(), vec![("pre", 5), ("post", 5)]);
}

#[test]
fn test_pre_read_write_is_visible_in_returned_snapshot() {
    let broker = Broker::new();
    let param = Rc::new(broker.create_param("p", 5i64).build().unwrap());

    let inner = param.clone();
    let armed = Rc::new(Cell::new(true));
    let armed2 = armed.clone();
    param.on_pre_read(move |_| {
        if armed2.replace(false) {
            assert!(inner.set_value(6));
        }
    });

    // The snapshot is taken after pre-read observers settle.
    assert_eq!(param.get_value(), 6);
}

#[test]
fn test_callback_registered_during_dispatch_waits_for_next() {
    let broker = Broker::new();
    let param = Rc::new(broker.create_param("p", 0i64).build().unwrap());

    let late_calls = Rc::new(Cell::new(0));
    let armed = Rc::new(Cell::new(true));
    let inner = param.clone();
    let late = late_calls.clone();
    param.on_post_write(move |_| {
        if armed.replace(false) {
            let late = late.clone();
            inner.on_post_write(move |_| late.set(late.get() + 1));
        }
    });

    param.set_value(1);
    assert_eq!(late_calls.get(), 0, "registered mid-dispatch, not invoked yet");
    param.set_value(2);
    assert_eq!(late_calls.get(), 1);
}

#[test]
fn test_unregister_by_id() {
    let broker = Broker::new();
    let param = broker.create_param("p", 0i64).build().unwrap();

    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    let id = param.on_post_write(move |_| c.set(c.get() + 1));

    param.set_value(1);
    assert!(param.unregister_post_write(id));
    param.set_value(2);
    assert_eq!(count.get(), 1);
    assert!(!param.unregister_post_write(id));
}

#[test]
fn test_unregister_all_callbacks() {
    let broker = Broker::new();
    let param = broker.create_param("p", 0i64).build().unwrap();
    assert!(!param.unregister_all_callbacks());

    param.on_pre_read(|_| {});
    param.on_pre_write(|_| true);
    assert!(param.has_callbacks());
    assert!(param.unregister_all_callbacks());
    assert!(!param.has_callbacks());
}

#[test]
fn test_veto_gate_clamps_range() {
    let broker = Broker::new();
    let param = broker.create_param("p", 0i64).build().unwrap();
    param.on_pre_write(|e| (0..=100).contains(&e.new_value));

    assert!(param.set_value(100));
    assert!(!param.set_value(101));
    assert!(!param.set_value(-1));
    assert_eq!(param.get_value(), 100);
}
