// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_task_starts_in_new_state_with_no_claim_history() {
    let t = Task::new("job-a", Instant::now());
    assert_eq!(t.local_state, TaskState::New);
    assert!(t.unclaimed_signal_offset.is_none());
    assert!(t.current_executor.is_none());
}

#[test]
fn transition_to_updates_state_and_timer() {
    let start = Instant::now();
    let mut t = Task::new("job-a", start);
    let later = start + Duration::from_secs(5);
    t.transition_to(TaskState::Initiating, later);
    assert_eq!(t.local_state, TaskState::Initiating);
    assert_eq!(t.state_started, later);
}

#[test]
fn all_nine_states_are_distinct() {
    let mut seen = std::collections::HashSet::new();
    for s in TaskState::ALL {
        assert!(seen.insert(s), "duplicate state in TaskState::ALL");
    }
    assert_eq!(seen.len(), 9);
}

#[test]
fn builder_produces_usable_definition() {
    let def = TaskDefinition::builder()
        .name("heartbeat-sweep")
        .period(Duration::from_secs(30))
        .build();
    assert_eq!(def.name, "heartbeat-sweep");
    assert_eq!(def.period, Duration::from_secs(30));
}
