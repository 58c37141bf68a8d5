// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal: the immutable record carried over the sync topic, and the
//! closed set of signal kinds.

use serde::{Deserialize, Serialize};

use crate::node_id::NodeId;

/// The closed set of signal kinds.
///
/// Bus kinds travel over the sync topic and are observed by every peer.
/// Internal kinds never leave the node: they are either produced directly
/// by [`crate::task::TaskState`] transitions (`_I` suffix in the distilled
/// protocol) or by the pending handler's timers firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    // --- bus kinds ---
    Claiming,
    Claimed,
    Unclaimed,
    Handling,
    Heartbeat,
    DoHeartbeat,

    // --- internal kinds ---
    /// `INITIATING_I`: drives a freshly registered task from `NEW` to `INITIATING`.
    InitiatingInternal,
    /// `UNCLAIM_I`: voluntary release, requested by the node owning a task.
    UnclaimInternal,
    /// Pending handler fire: the claim-attempt timer expired.
    ClaimAttemptFired,
    /// Pending handler fire: time to run the task body.
    HandlingFired,
    /// Pending handler fire: time to reassert the claim via `HEARTBEAT`.
    ClaimedHeartbeatFired,
    /// Pending handler fire: the task has been silent past its resurrection timeout.
    ResurrectionFired,
    /// Posted by the task executor when a `HANDLING_BY_NODE` execution
    /// finishes, re-entering the watcher loop's single-writer queue.
    HandlingCompletedInternal,
}

impl SignalKind {
    /// Internal kinds never traverse the log; they are either suffixed `_I`
    /// in the distilled protocol or generated directly by the scheduler.
    pub fn is_internal(self) -> bool {
        matches!(
            self,
            SignalKind::InitiatingInternal
                | SignalKind::UnclaimInternal
                | SignalKind::ClaimAttemptFired
                | SignalKind::HandlingFired
                | SignalKind::ClaimedHeartbeatFired
                | SignalKind::ResurrectionFired
                | SignalKind::HandlingCompletedInternal
        )
    }

    /// True for the kinds that are meaningful on the bus (i.e. ever get
    /// published to the sync topic).
    pub fn is_bus_kind(self) -> bool {
        !self.is_internal()
    }
}

crate::simple_display! {
    SignalKind {
        Claiming => "CLAIMING",
        Claimed => "CLAIMED",
        Unclaimed => "UNCLAIMED",
        Handling => "HANDLING",
        Heartbeat => "HEARTBEAT",
        DoHeartbeat => "DOHEARTBEAT",
        InitiatingInternal => "INITIATING_I",
        UnclaimInternal => "UNCLAIM_I",
        ClaimAttemptFired => "claim-attempt-fired",
        HandlingFired => "handling-fired",
        ClaimedHeartbeatFired => "claimed-heartbeat-fired",
        ResurrectionFired => "resurrection-fired",
        HandlingCompletedInternal => "handling-completed-internal",
    }
}

/// One record on the sync topic (or a locally synthesized internal signal
/// using the same shape so the dispatcher can treat both uniformly).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// Absent for node-level signals such as `DOHEARTBEAT`.
    pub task_name: Option<String>,
    pub kind: SignalKind,
    /// `nodeProcThreadId`: the id of the node that authored this signal.
    pub origin_id: NodeId,
    /// The log offset a `CLAIMING` signal responds to, or `None`.
    ///
    /// Comparisons against this must use real equality (`None` matches only
    /// `None`; `Some(a) == Some(b)` iff `a == b`), never identity.
    pub reference: Option<u64>,
    /// Stamped by the watcher when the signal is observed; `None` before it
    /// has been appended to the log (e.g. while still in the sender's queue).
    pub current_offset: Option<u64>,
    pub timestamp_ms: u64,
}

impl Signal {
    pub fn internal(kind: SignalKind, task_name: impl Into<String>, origin_id: NodeId, timestamp_ms: u64) -> Self {
        debug_assert!(kind.is_internal(), "Signal::internal used with a bus kind");
        Self {
            task_name: Some(task_name.into()),
            kind,
            origin_id,
            reference: None,
            current_offset: None,
            timestamp_ms,
        }
    }

    pub fn bus(
        kind: SignalKind,
        task_name: Option<String>,
        origin_id: NodeId,
        reference: Option<u64>,
        timestamp_ms: u64,
    ) -> Self {
        debug_assert!(kind.is_bus_kind(), "Signal::bus used with an internal kind");
        Self {
            task_name,
            kind,
            origin_id,
            reference,
            current_offset: None,
            timestamp_ms,
        }
    }
}

/// How a signal relates to the node processing it, per the dispatcher's
/// classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Emitted locally by the node or pending handler; never traversed the log.
    Internal,
    /// The echo of a signal this node itself published.
    Own,
    /// Authored by a peer.
    Foreign,
}

/// Classify a signal relative to this node's identity.
///
/// `reference` equality elsewhere in the protocol must use real equality
/// (`None == None`, or both `Some` and equal) — this function only decides
/// internal/own/foreign, it does not itself compare offsets.
pub fn classify(signal: &Signal, local_node_id: &NodeId) -> Origin {
    if signal.kind.is_internal() {
        Origin::Internal
    } else if &signal.origin_id == local_node_id {
        Origin::Own
    } else {
        Origin::Foreign
    }
}

/// Real equality between two optional offsets, per the note in design notes
/// about the boolean-equality glitch the source exhibits: `None` matches
/// only `None`, and `Some` matches only an equal `Some`. Never compare via
/// identity.
pub fn reference_matches(reference: Option<u64>, baseline: Option<u64>) -> bool {
    reference == baseline
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
