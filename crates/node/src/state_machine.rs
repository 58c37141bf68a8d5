// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The claim protocol's dispatch table: one entry per task state, each a
//! triplet of handlers keyed by signal origin (internal/own/foreign).
//! Unlisted (state, origin, kind) combinations fall through to the base
//! policy, which moves the task to `ERROR` — every handler below is an
//! explicit override of that default.

use std::collections::HashMap;
use std::time::Duration;

use coordinator_core::{
    reference_matches, ClaimedInfo, Clock, NodeId, Origin, PendingHandler, Signal, SignalKind, Task, TaskDefinition,
    TaskState,
};

/// A signal to publish to the sync topic as a consequence of one dispatch.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub kind: SignalKind,
    pub reference: Option<u64>,
}

impl PublishRequest {
    fn new(kind: SignalKind, reference: Option<u64>) -> Self {
        Self { kind, reference }
    }
}

/// Everything one handler invocation needs. Handlers are plain functions
/// rather than closures, so every dependency travels through this context
/// instead of being captured.
pub struct HandlerCtx<'a, C: Clock> {
    pub task: &'a mut Task,
    pub def: &'a TaskDefinition,
    pub node_id: &'a NodeId,
    pub clock: &'a C,
    pub pending: &'a PendingHandler,
    pub wait_in_new_state: Duration,
}

impl<'a, C: Clock> HandlerCtx<'a, C> {
    fn starter_name(&self) -> String {
        format!("claim-attempt:{}", self.task.name)
    }
    fn heartbeat_name(&self) -> String {
        format!("claimed-heartbeat:{}", self.task.name)
    }
    fn resurrection_name(&self) -> String {
        format!("resurrection:{}", self.task.name)
    }
    fn handling_name(&self) -> String {
        format!("handling:{}", self.task.name)
    }

    fn schedule_claim_attempt(&self, after: Duration) {
        let name = self.starter_name();
        let task_name = self.task.name.clone();
        let node_id = self.node_id.clone();
        let due = self.clock.now() + after;
        let epoch = self.clock.epoch_ms();
        self.pending.schedule(
            name,
            due,
            Box::new(move || Signal::internal(SignalKind::ClaimAttemptFired, task_name, node_id, epoch)),
        );
    }

    fn schedule_resurrection(&self) {
        let name = self.resurrection_name();
        let task_name = self.task.name.clone();
        let node_id = self.node_id.clone();
        let due = self.clock.now() + self.def.resurrection;
        let epoch = self.clock.epoch_ms();
        self.pending.schedule(
            name,
            due,
            Box::new(move || Signal::internal(SignalKind::ResurrectionFired, task_name, node_id, epoch)),
        );
    }

    fn schedule_handling(&self, after: Duration) {
        let name = self.handling_name();
        let task_name = self.task.name.clone();
        let node_id = self.node_id.clone();
        let due = self.clock.now() + after;
        let epoch = self.clock.epoch_ms();
        self.pending.schedule(
            name,
            due,
            Box::new(move || Signal::internal(SignalKind::HandlingFired, task_name, node_id, epoch)),
        );
    }

    fn schedule_claimed_heartbeat(&self) {
        let name = self.heartbeat_name();
        let task_name = self.task.name.clone();
        let node_id = self.node_id.clone();
        let due = self.clock.now() + self.def.claimed_signal_period;
        let epoch = self.clock.epoch_ms();
        self.pending.schedule(
            name,
            due,
            Box::new(move || Signal::internal(SignalKind::ClaimedHeartbeatFired, task_name, node_id, epoch)),
        );
    }

    fn remove_starter(&self) {
        self.pending.remove(&self.starter_name());
    }
    fn remove_heartbeat(&self) {
        self.pending.remove(&self.heartbeat_name());
    }
    fn remove_resurrection(&self) {
        self.pending.remove(&self.resurrection_name());
    }

    /// Step 1/2: (re-)enter contention for this task. Used both for a
    /// freshly registered task and for one returning to contention after a
    /// release, a lost race, or a peer going silent.
    fn enter_initiating_and_compete(&mut self) {
        self.task.transition_to(TaskState::Initiating, self.clock.now());
        self.schedule_claim_attempt(self.wait_in_new_state);
        self.schedule_resurrection();
    }
}

pub type Handler<C> = fn(&mut HandlerCtx<C>, &Signal) -> Vec<PublishRequest>;

pub struct StateHandlers<C: Clock> {
    pub on_internal: Handler<C>,
    pub on_own: Handler<C>,
    pub on_foreign: Handler<C>,
}

/// Base policy: an (origin, kind) pair no state explicitly accepts.
fn to_error<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    tracing::warn!(
        task = %ctx.task.name,
        state = %ctx.task.local_state,
        kind = %signal.kind,
        "unexpected signal for current state, moving task to ERROR",
    );
    ctx.task.transition_to(TaskState::Error, ctx.clock.now());
    vec![]
}

/// A node observing its own `CLAIMING` when the task has already moved on
/// (race resolved, then a late echo arrives) is routine, not a bug.
fn discard_stale_claiming_echo<C: Clock>(ctx: &mut HandlerCtx<C>, _signal: &Signal) -> Vec<PublishRequest> {
    tracing::debug!(task = %ctx.task.name, "discarding stale own CLAIMING echo");
    vec![]
}

/// Shared by every state where a peer's claim activity is routine
/// background noise for a task this node doesn't currently own: `NEW`
/// racing a peer, `INITIATING`, `UNCLAIMING` about to re-compete, and the
/// two `*_BY_OTHER` states.
fn observe_foreign_claim_activity<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::Unclaimed => {
            ctx.task.unclaimed_signal_offset = signal.current_offset;
            ctx.task.current_executor = None;
            ctx.task.last_claimed_info = None;
            // the peer told us it's done, so the liveness deadline we were
            // watching it under no longer applies; re-entering contention
            // arms a fresh one as its own anti-starvation backstop.
            ctx.remove_resurrection();
            ctx.enter_initiating_and_compete();
        }
        SignalKind::Claiming => {
            // a peer attempting; wait for it to resolve via CLAIMED/UNCLAIMED.
        }
        SignalKind::Claimed => {
            ctx.task.current_executor = Some(signal.origin_id.clone());
            ctx.task.last_claimed_info = Some(ClaimedInfo {
                executor: signal.origin_id.clone(),
                offset: signal.current_offset.unwrap_or_default(),
            });
            ctx.schedule_resurrection();
            ctx.task.transition_to(TaskState::ClaimedByOther, ctx.clock.now());
        }
        SignalKind::Handling => {
            ctx.task.current_executor = Some(signal.origin_id.clone());
            ctx.task.last_claimed_info = Some(ClaimedInfo {
                executor: signal.origin_id.clone(),
                offset: signal.current_offset.unwrap_or_default(),
            });
            ctx.schedule_resurrection();
            ctx.task.transition_to(TaskState::HandlingByOther, ctx.clock.now());
        }
        SignalKind::Heartbeat => {
            ctx.task.current_executor = Some(signal.origin_id.clone());
            ctx.schedule_resurrection();
            if ctx.task.local_state != TaskState::HandlingByOther {
                ctx.task.transition_to(TaskState::ClaimedByOther, ctx.clock.now());
            }
        }
        _ => {}
    }
    vec![]
}

/// A peer CLAIMING or reasserting a claim against a task this node believes
/// it owns is reset defensively (release and re-compete); a peer asserting
/// it already holds or is running the task is a hard mutual-exclusion
/// violation.
fn foreign_violation_while_owner<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::Claiming | SignalKind::Heartbeat => {
            ctx.remove_starter();
            ctx.remove_heartbeat();
            let reference = ctx.task.unclaimed_signal_offset;
            ctx.task.transition_to(TaskState::Unclaiming, ctx.clock.now());
            vec![PublishRequest::new(SignalKind::Unclaimed, reference)]
        }
        _ => to_error(ctx, signal),
    }
}

fn new_on_internal<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::InitiatingInternal => {
            ctx.enter_initiating_and_compete();
            vec![]
        }
        _ => to_error(ctx, signal),
    }
}
fn new_on_own<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    to_error(ctx, signal)
}
fn new_on_foreign<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    observe_foreign_claim_activity(ctx, signal)
}

fn initiating_on_internal<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::ClaimAttemptFired => {
            let reference = ctx.task.unclaimed_signal_offset;
            ctx.task.transition_to(TaskState::Claiming, ctx.clock.now());
            ctx.task.claiming_timestamp = Some(ctx.clock.now());
            vec![PublishRequest::new(SignalKind::Claiming, reference)]
        }
        SignalKind::ResurrectionFired => {
            // no foreign activity observed for a full resurrection window;
            // don't wait out the starter timer, retry now.
            ctx.schedule_claim_attempt(Duration::ZERO);
            ctx.schedule_resurrection();
            vec![]
        }
        _ => to_error(ctx, signal),
    }
}
fn initiating_on_own<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::Claiming => discard_stale_claiming_echo(ctx, signal),
        _ => to_error(ctx, signal),
    }
}
fn initiating_on_foreign<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    observe_foreign_claim_activity(ctx, signal)
}

fn claiming_on_internal<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    to_error(ctx, signal)
}
fn claiming_on_own<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::Claiming => {
            if reference_matches(signal.reference, ctx.task.unclaimed_signal_offset) {
                ctx.task.current_executor = Some(ctx.node_id.clone());
                ctx.remove_resurrection();
                ctx.schedule_handling(ctx.def.period);
                ctx.schedule_claimed_heartbeat();
                ctx.task.transition_to(TaskState::ClaimedByNode, ctx.clock.now());
                vec![PublishRequest::new(SignalKind::Claimed, signal.current_offset)]
            } else {
                // lost the race: a peer's attempt superseded ours before our
                // own echo returned. Re-enter contention; a forthcoming
                // foreign CLAIMED moves us to CLAIMED_BY_OTHER if someone
                // else won outright.
                ctx.enter_initiating_and_compete();
                vec![]
            }
        }
        _ => to_error(ctx, signal),
    }
}
fn claiming_on_foreign<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::Claiming => vec![], // both racers observe each other; resolved by each side's own echo
        SignalKind::Unclaimed => {
            ctx.task.unclaimed_signal_offset = signal.current_offset;
            ctx.remove_resurrection();
            ctx.enter_initiating_and_compete();
            vec![]
        }
        _ => to_error(ctx, signal),
    }
}

fn claimed_by_node_on_internal<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::HandlingFired => {
            ctx.task.transition_to(TaskState::HandlingByNode, ctx.clock.now());
            vec![PublishRequest::new(SignalKind::Handling, None)]
        }
        SignalKind::ClaimedHeartbeatFired => {
            ctx.schedule_claimed_heartbeat();
            vec![PublishRequest::new(SignalKind::Heartbeat, None)]
        }
        SignalKind::UnclaimInternal => {
            ctx.remove_starter();
            ctx.remove_heartbeat();
            let reference = ctx.task.unclaimed_signal_offset;
            ctx.task.transition_to(TaskState::Unclaiming, ctx.clock.now());
            vec![PublishRequest::new(SignalKind::Unclaimed, reference)]
        }
        _ => to_error(ctx, signal),
    }
}
fn claimed_by_node_on_own<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::Claiming => discard_stale_claiming_echo(ctx, signal),
        SignalKind::Heartbeat | SignalKind::Handling => vec![],
        _ => to_error(ctx, signal),
    }
}
fn claimed_by_node_on_foreign<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    foreign_violation_while_owner(ctx, signal)
}

fn handling_by_node_on_internal<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::HandlingCompletedInternal => {
            ctx.task.transition_to(TaskState::ClaimedByNode, ctx.clock.now());
            ctx.schedule_handling(ctx.def.period);
            vec![]
        }
        SignalKind::ClaimedHeartbeatFired => {
            ctx.schedule_claimed_heartbeat();
            vec![PublishRequest::new(SignalKind::Heartbeat, None)]
        }
        SignalKind::UnclaimInternal => {
            ctx.remove_starter();
            ctx.remove_heartbeat();
            let reference = ctx.task.unclaimed_signal_offset;
            ctx.task.transition_to(TaskState::Unclaiming, ctx.clock.now());
            vec![PublishRequest::new(SignalKind::Unclaimed, reference)]
        }
        _ => to_error(ctx, signal),
    }
}
fn handling_by_node_on_own<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::Claiming => discard_stale_claiming_echo(ctx, signal),
        SignalKind::Heartbeat | SignalKind::Handling => vec![],
        _ => to_error(ctx, signal),
    }
}
fn handling_by_node_on_foreign<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    foreign_violation_while_owner(ctx, signal)
}

fn unclaiming_on_internal<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    to_error(ctx, signal)
}
fn unclaiming_on_own<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::Unclaimed => {
            ctx.task.unclaimed_signal_offset = signal.current_offset;
            ctx.task.current_executor = None;
            ctx.enter_initiating_and_compete();
            vec![]
        }
        SignalKind::Claiming => discard_stale_claiming_echo(ctx, signal),
        _ => to_error(ctx, signal),
    }
}
fn unclaiming_on_foreign<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    observe_foreign_claim_activity(ctx, signal)
}

fn claimed_by_other_on_internal<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::ResurrectionFired => {
            // the peer we believe holds this claim has gone silent past the
            // resurrection window; treat it as orphaned and re-compete.
            ctx.task.current_executor = None;
            ctx.task.last_claimed_info = None;
            ctx.enter_initiating_and_compete();
            vec![]
        }
        _ => to_error(ctx, signal),
    }
}
fn claimed_by_other_on_own<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::Claiming => discard_stale_claiming_echo(ctx, signal),
        _ => to_error(ctx, signal),
    }
}
fn claimed_by_other_on_foreign<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    observe_foreign_claim_activity(ctx, signal)
}

fn handling_by_other_on_internal<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::ResurrectionFired => {
            ctx.task.current_executor = None;
            ctx.task.last_claimed_info = None;
            ctx.enter_initiating_and_compete();
            vec![]
        }
        _ => to_error(ctx, signal),
    }
}
fn handling_by_other_on_own<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    match signal.kind {
        SignalKind::Claiming => discard_stale_claiming_echo(ctx, signal),
        _ => to_error(ctx, signal),
    }
}
fn handling_by_other_on_foreign<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    observe_foreign_claim_activity(ctx, signal)
}

/// `ERROR` is a dead state: every signal is ignored until an operator or a
/// restart clears it.
fn error_handler<C: Clock>(ctx: &mut HandlerCtx<C>, signal: &Signal) -> Vec<PublishRequest> {
    tracing::debug!(task = %ctx.task.name, kind = %signal.kind, "signal observed for a task in ERROR; ignored");
    vec![]
}

/// Builds the dispatch table exhaustively over all nine states.
pub fn build_dispatch_table<C: Clock>() -> HashMap<TaskState, StateHandlers<C>> {
    let mut table = HashMap::new();
    table.insert(
        TaskState::New,
        StateHandlers {
            on_internal: new_on_internal,
            on_own: new_on_own,
            on_foreign: new_on_foreign,
        },
    );
    table.insert(
        TaskState::Initiating,
        StateHandlers {
            on_internal: initiating_on_internal,
            on_own: initiating_on_own,
            on_foreign: initiating_on_foreign,
        },
    );
    table.insert(
        TaskState::Claiming,
        StateHandlers {
            on_internal: claiming_on_internal,
            on_own: claiming_on_own,
            on_foreign: claiming_on_foreign,
        },
    );
    table.insert(
        TaskState::ClaimedByNode,
        StateHandlers {
            on_internal: claimed_by_node_on_internal,
            on_own: claimed_by_node_on_own,
            on_foreign: claimed_by_node_on_foreign,
        },
    );
    table.insert(
        TaskState::HandlingByNode,
        StateHandlers {
            on_internal: handling_by_node_on_internal,
            on_own: handling_by_node_on_own,
            on_foreign: handling_by_node_on_foreign,
        },
    );
    table.insert(
        TaskState::Unclaiming,
        StateHandlers {
            on_internal: unclaiming_on_internal,
            on_own: unclaiming_on_own,
            on_foreign: unclaiming_on_foreign,
        },
    );
    table.insert(
        TaskState::ClaimedByOther,
        StateHandlers {
            on_internal: claimed_by_other_on_internal,
            on_own: claimed_by_other_on_own,
            on_foreign: claimed_by_other_on_foreign,
        },
    );
    table.insert(
        TaskState::HandlingByOther,
        StateHandlers {
            on_internal: handling_by_other_on_internal,
            on_own: handling_by_other_on_own,
            on_foreign: handling_by_other_on_foreign,
        },
    );
    table.insert(
        TaskState::Error,
        StateHandlers {
            on_internal: error_handler,
            on_own: error_handler,
            on_foreign: error_handler,
        },
    );
    debug_assert_eq!(table.len(), TaskState::ALL.len());
    table
}

#[allow(clippy::expect_used)]
pub fn dispatch<C: Clock>(
    table: &HashMap<TaskState, StateHandlers<C>>,
    ctx: &mut HandlerCtx<C>,
    origin: Origin,
    signal: &Signal,
) -> Vec<PublishRequest> {
    let handlers = table
        .get(&ctx.task.local_state)
        .expect("dispatch table is exhaustive over TaskState::ALL");
    let handler = match origin {
        Origin::Internal => handlers.on_internal,
        Origin::Own => handlers.on_own,
        Origin::Foreign => handlers.on_foreign,
    };
    handler(ctx, signal)
}

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;
