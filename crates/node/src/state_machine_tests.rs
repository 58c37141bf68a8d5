// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use coordinator_core::{FakeClock, NodeId, PendingHandler, Signal, SignalKind, Task, TaskDefinition, TaskState};

use super::*;

fn node(s: &str) -> NodeId {
    NodeId::from_string(s).unwrap()
}

struct Fixture {
    clock: FakeClock,
    pending: PendingHandler,
    def: TaskDefinition,
    node_id: NodeId,
    table: HashMap<TaskState, StateHandlers<FakeClock>>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            clock: FakeClock::new(),
            pending: PendingHandler::new(),
            def: TaskDefinition::builder()
                .name("reindex")
                .period(Duration::from_secs(60))
                .claimed_signal_period(Duration::from_secs(10))
                .resurrection(Duration::from_secs(120))
                .build(),
            node_id: node("host_1_0"),
            table: build_dispatch_table::<FakeClock>(),
        }
    }

    fn dispatch(&self, task: &mut Task, origin: Origin, signal: &Signal) -> Vec<PublishRequest> {
        let mut ctx = HandlerCtx {
            task,
            def: &self.def,
            node_id: &self.node_id,
            clock: &self.clock,
            pending: &self.pending,
            wait_in_new_state: Duration::from_millis(500),
        };
        dispatch(&self.table, &mut ctx, origin, signal)
    }
}

#[test]
fn initiating_internal_schedules_claim_attempt_and_resurrection() {
    let fx = Fixture::new();
    let mut task = Task::new("reindex", fx.clock.now());
    let signal = Signal::internal(SignalKind::InitiatingInternal, "reindex", fx.node_id.clone(), 0);

    fx.dispatch(&mut task, Origin::Internal, &signal);

    assert_eq!(task.local_state, TaskState::Initiating);
    assert!(fx.pending.contains("claim-attempt:reindex"));
    assert!(fx.pending.contains("resurrection:reindex"));
}

#[test]
fn claim_attempt_fired_publishes_claiming_and_moves_to_claiming() {
    let fx = Fixture::new();
    let mut task = Task::new("reindex", fx.clock.now());
    task.transition_to(TaskState::Initiating, fx.clock.now());

    let fired = Signal::internal(SignalKind::ClaimAttemptFired, "reindex", fx.node_id.clone(), 0);
    let published = fx.dispatch(&mut task, Origin::Internal, &fired);

    assert_eq!(task.local_state, TaskState::Claiming);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].kind, SignalKind::Claiming);
}

#[test]
fn winning_own_claiming_echo_moves_to_claimed_by_node() {
    let fx = Fixture::new();
    let mut task = Task::new("reindex", fx.clock.now());
    task.transition_to(TaskState::Claiming, fx.clock.now());
    task.unclaimed_signal_offset = None;

    let echo = Signal::bus(SignalKind::Claiming, Some("reindex".into()), fx.node_id.clone(), None, 0);
    let published = fx.dispatch(&mut task, Origin::Own, &echo);

    assert_eq!(task.local_state, TaskState::ClaimedByNode);
    assert_eq!(task.current_executor.as_ref(), Some(&fx.node_id));
    assert_eq!(published[0].kind, SignalKind::Claimed);
    assert!(fx.pending.contains("handling:reindex"));
    assert!(fx.pending.contains("claimed-heartbeat:reindex"));
    assert!(!fx.pending.contains("resurrection:reindex"));
}

#[test]
fn losing_own_claiming_echo_returns_to_initiating() {
    let fx = Fixture::new();
    let mut task = Task::new("reindex", fx.clock.now());
    task.transition_to(TaskState::Claiming, fx.clock.now());
    task.unclaimed_signal_offset = Some(41);

    // our attempt referenced offset 41, but the echo's reference is stale
    // relative to a baseline a peer has already moved past.
    let echo = Signal::bus(
        SignalKind::Claiming,
        Some("reindex".into()),
        fx.node_id.clone(),
        Some(40),
        0,
    );
    let published = fx.dispatch(&mut task, Origin::Own, &echo);

    assert_eq!(task.local_state, TaskState::Initiating);
    assert!(published.is_empty());
}

#[test]
fn foreign_claimed_while_claimed_by_node_is_a_protocol_error() {
    let fx = Fixture::new();
    let mut task = Task::new("reindex", fx.clock.now());
    task.transition_to(TaskState::ClaimedByNode, fx.clock.now());

    let forged = Signal::bus(SignalKind::Claimed, Some("reindex".into()), node("rogue_2_0"), None, 0);
    fx.dispatch(&mut task, Origin::Foreign, &forged);

    assert_eq!(task.local_state, TaskState::Error);
}

#[test]
fn foreign_heartbeat_while_claimed_by_node_resets_via_unclaimed() {
    let fx = Fixture::new();
    let mut task = Task::new("reindex", fx.clock.now());
    task.transition_to(TaskState::ClaimedByNode, fx.clock.now());

    let peer_heartbeat = Signal::bus(SignalKind::Heartbeat, Some("reindex".into()), node("peer_3_0"), None, 0);
    let published = fx.dispatch(&mut task, Origin::Foreign, &peer_heartbeat);

    assert_eq!(task.local_state, TaskState::Unclaiming);
    assert_eq!(published[0].kind, SignalKind::Unclaimed);
}

#[test]
fn stale_own_claiming_echo_outside_claiming_state_is_discarded_not_error() {
    let fx = Fixture::new();
    let mut task = Task::new("reindex", fx.clock.now());
    task.transition_to(TaskState::ClaimedByNode, fx.clock.now());

    let stale_echo = Signal::bus(SignalKind::Claiming, Some("reindex".into()), fx.node_id.clone(), None, 0);
    fx.dispatch(&mut task, Origin::Own, &stale_echo);

    assert_eq!(task.local_state, TaskState::ClaimedByNode);
}

#[test]
fn foreign_unclaimed_while_claimed_by_other_returns_to_initiating() {
    let fx = Fixture::new();
    let mut task = Task::new("reindex", fx.clock.now());
    task.transition_to(TaskState::ClaimedByOther, fx.clock.now());
    task.current_executor = Some(node("peer_3_0"));

    let release = Signal::bus(SignalKind::Unclaimed, Some("reindex".into()), node("peer_3_0"), None, 7);
    fx.dispatch(&mut task, Origin::Foreign, &release);

    assert_eq!(task.local_state, TaskState::Initiating);
    assert_eq!(task.unclaimed_signal_offset, None);
    assert!(task.current_executor.is_none());
}

#[test]
fn resurrection_fired_while_claimed_by_other_re_enters_contention() {
    let fx = Fixture::new();
    let mut task = Task::new("reindex", fx.clock.now());
    task.transition_to(TaskState::ClaimedByOther, fx.clock.now());
    task.current_executor = Some(node("peer_3_0"));

    let silence = Signal::internal(SignalKind::ResurrectionFired, "reindex", fx.node_id.clone(), 0);
    fx.dispatch(&mut task, Origin::Internal, &silence);

    assert_eq!(task.local_state, TaskState::Initiating);
    assert!(task.current_executor.is_none());
}

#[test]
fn own_unclaim_echo_returns_from_unclaiming_to_initiating() {
    let fx = Fixture::new();
    let mut task = Task::new("reindex", fx.clock.now());
    task.transition_to(TaskState::Unclaiming, fx.clock.now());

    let echo = Signal::bus(SignalKind::Unclaimed, Some("reindex".into()), fx.node_id.clone(), None, 9);
    fx.dispatch(&mut task, Origin::Own, &echo);

    assert_eq!(task.local_state, TaskState::Initiating);
    assert!(fx.pending.contains("claim-attempt:reindex"));
}

#[test]
fn handling_completed_returns_to_claimed_by_node_and_reschedules() {
    let fx = Fixture::new();
    let mut task = Task::new("reindex", fx.clock.now());
    task.transition_to(TaskState::HandlingByNode, fx.clock.now());

    let completed = Signal::internal(SignalKind::HandlingCompletedInternal, "reindex", fx.node_id.clone(), 0);
    fx.dispatch(&mut task, Origin::Internal, &completed);

    assert_eq!(task.local_state, TaskState::ClaimedByNode);
    assert!(fx.pending.contains("handling:reindex"));
}

#[test]
fn error_state_ignores_everything() {
    let fx = Fixture::new();
    let mut task = Task::new("reindex", fx.clock.now());
    task.transition_to(TaskState::Error, fx.clock.now());

    let anything = Signal::bus(SignalKind::Claimed, Some("reindex".into()), node("peer_3_0"), None, 0);
    let published = fx.dispatch(&mut task, Origin::Foreign, &anything);

    assert_eq!(task.local_state, TaskState::Error);
    assert!(published.is_empty());
}
