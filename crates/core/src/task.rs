// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task entities: the immutable [`TaskDefinition`] supplied at `register`
//! time, and the mutable per-node [`Task`] runtime record the state machine
//! owns.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::node_id::NodeId;

/// The closed set of local states a task can be in on one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    New,
    Initiating,
    Claiming,
    ClaimedByNode,
    HandlingByNode,
    Unclaiming,
    ClaimedByOther,
    HandlingByOther,
    Error,
}

crate::simple_display! {
    TaskState {
        New => "NEW",
        Initiating => "INITIATING",
        Claiming => "CLAIMING",
        ClaimedByNode => "CLAIMED_BY_NODE",
        HandlingByNode => "HANDLING_BY_NODE",
        Unclaiming => "UNCLAIMING",
        ClaimedByOther => "CLAIMED_BY_OTHER",
        HandlingByOther => "HANDLING_BY_OTHER",
        Error => "ERROR",
    }
}

impl TaskState {
    /// All nine states, used to build the dispatch table exhaustively.
    pub const ALL: [TaskState; 9] = [
        TaskState::New,
        TaskState::Initiating,
        TaskState::Claiming,
        TaskState::ClaimedByNode,
        TaskState::HandlingByNode,
        TaskState::Unclaiming,
        TaskState::ClaimedByOther,
        TaskState::HandlingByOther,
        TaskState::Error,
    ];
}

/// A task body. Implementors perform the actual periodic work; the
/// coordination core only ever invokes `run` while the owning task is in
/// `HANDLING_BY_NODE`.
#[async_trait]
pub trait TaskBody: Send + Sync {
    async fn run(&self);
}

#[async_trait]
impl<F, Fut> TaskBody for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: std::future::Future<Output = ()> + Send,
{
    async fn run(&self) {
        (self)().await;
    }
}

/// Input, immutable: supplied once to `register`.
#[derive(Clone)]
pub struct TaskDefinition {
    pub name: String,
    pub body: Arc<dyn TaskBody>,
    /// Desired cadence between executions while claimed.
    pub period: Duration,
    /// Upper bound on one execution; informational for now (enforcement is
    /// the executor's concern, not the state machine's).
    pub max_duration: Duration,
    /// How often the owner reasserts its claim via `HEARTBEAT`.
    pub claimed_signal_period: Duration,
    /// Silence timeout after which a task is presumed orphaned and
    /// re-enters claim contention.
    pub resurrection: Duration,
}

impl fmt::Debug for TaskDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDefinition")
            .field("name", &self.name)
            .field("period", &self.period)
            .field("max_duration", &self.max_duration)
            .field("claimed_signal_period", &self.claimed_signal_period)
            .field("resurrection", &self.resurrection)
            .finish()
    }
}

crate::builder! {
    pub struct TaskDefinitionBuilder => TaskDefinition {
        into { name: String = "task" }
        set { period: Duration = Duration::from_secs(60) }
        set { max_duration: Duration = Duration::from_secs(30) }
        set { claimed_signal_period: Duration = Duration::from_secs(10) }
        set { resurrection: Duration = Duration::from_secs(120) }
        computed { body: Arc<dyn TaskBody> = Arc::new(|| async {}) }
    }
}

/// What a node last learned about the peer currently holding a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedInfo {
    pub executor: NodeId,
    /// The log offset of the `CLAIMED`/`HANDLING` record that produced this.
    pub offset: u64,
}

/// Per-node, mutable runtime state for one task.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    pub local_state: TaskState,
    /// Log offset of the last observed `UNCLAIMED` for this task; only
    /// advances monotonically.
    pub unclaimed_signal_offset: Option<u64>,
    pub claiming_timestamp: Option<Instant>,
    pub state_started: Instant,
    /// Milliseconds since epoch `state_started` corresponds to; carried
    /// separately because `Instant` has no defined relationship to wall time.
    pub state_started_epoch_ms: u64,
    pub last_claimed_info: Option<ClaimedInfo>,
    pub last_startup: Option<Instant>,
    /// Set while `ClaimedByOther`/`HandlingByOther`; the peer holding the claim.
    pub current_executor: Option<NodeId>,
}

impl Task {
    pub fn new(name: impl Into<String>, now: Instant) -> Self {
        Self {
            name: name.into(),
            local_state: TaskState::New,
            unclaimed_signal_offset: None,
            claiming_timestamp: None,
            state_started: now,
            state_started_epoch_ms: 0,
            last_claimed_info: None,
            last_startup: Some(now),
            current_executor: None,
        }
    }

    /// Move to a new local state, resetting `state_started`. Does not
    /// validate the transition; the dispatch table is the sole authority
    /// over which transitions are legal.
    pub fn transition_to(&mut self, state: TaskState, now: Instant) {
        self.local_state = state;
        self.state_started = now;
    }

    /// Stamp the wall-clock time `state_started` corresponds to. Kept
    /// separate from `transition_to` so the dispatch handlers (which only
    /// see an `Instant`) don't need epoch time threaded through them; the
    /// watcher calls this once per dispatch after observing a state change.
    pub fn stamp_state_started_epoch_ms(&mut self, epoch_ms: u64) {
        self.state_started_epoch_ms = epoch_ms;
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
