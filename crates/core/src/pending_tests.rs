// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::node_id::NodeId;
use crate::signal::SignalKind;
use std::time::Duration;

fn fire(tag: &'static str) -> PendingAction {
    Box::new(move || Signal::internal(SignalKind::ResurrectionFired, tag, NodeId::from_string("n_1_0").unwrap(), 0))
}

#[test]
fn schedule_then_replace_by_name_fires_only_the_later_one() {
    // S6 / property 6: schedule("h", t1), then schedule("h", t2 < t1) => only t2's action fires.
    let handler = PendingHandler::new();
    let base = Instant::now();
    let t1 = base + Duration::from_millis(1000);
    let t2 = base + Duration::from_millis(200);

    handler.schedule("h", t1, fire("a1"));
    handler.schedule("h", t2, fire("a2"));

    // Nothing ready before t2.
    assert!(handler.pop_ready(base + Duration::from_millis(100)).is_empty());

    let ready = handler.pop_ready(base + Duration::from_millis(250));
    assert_eq!(ready.len(), 1);
    let sig = (ready.into_iter().next().unwrap().1)();
    assert_eq!(sig.task_name.as_deref(), Some("a2"));

    // a1 never fires, even far in the future: it was superseded, not queued twice.
    assert!(handler.pop_ready(base + Duration::from_millis(5000)).is_empty());
}

#[test]
fn fires_in_due_at_order_with_insertion_order_tiebreak() {
    let handler = PendingHandler::new();
    let base = Instant::now();
    handler.schedule("b", base + Duration::from_millis(10), fire("b"));
    handler.schedule("a", base + Duration::from_millis(10), fire("a"));
    handler.schedule("c", base + Duration::from_millis(5), fire("c"));

    let ready = handler.pop_ready(base + Duration::from_millis(100));
    let names: Vec<_> = ready
        .into_iter()
        .map(|(_, action)| action().task_name.unwrap())
        .collect();
    assert_eq!(names, vec!["c", "b", "a"]);
}

#[test]
fn remove_is_idempotent_and_prevents_firing() {
    let handler = PendingHandler::new();
    let base = Instant::now();
    handler.schedule("h", base + Duration::from_millis(10), fire("h"));
    handler.remove("h");
    handler.remove("h"); // idempotent
    handler.remove("does-not-exist");
    assert!(handler.pop_ready(base + Duration::from_millis(100)).is_empty());
}

#[test]
fn contains_reflects_live_entries_only() {
    let handler = PendingHandler::new();
    let base = Instant::now();
    handler.schedule("h", base + Duration::from_millis(10), fire("h"));
    assert!(handler.contains("h"));
    handler.remove("h");
    assert!(!handler.contains("h"));
}
