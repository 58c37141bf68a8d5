// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `NodeTaskInformation`: the periodic snapshot a node broadcasts of its own
//! task inventory, consumed by the Node-Info Handler on every peer.

use serde::{Deserialize, Serialize};

use crate::node_id::NodeId;
use crate::task::TaskState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_name: String,
    pub state: TaskState,
    /// Milliseconds since epoch the task entered `state`.
    pub state_started_ms: u64,
}

/// `{ nodeId, [ {taskName, state, timestamps} ... ] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTaskInformation {
    pub node_id: NodeId,
    pub tasks: Vec<TaskSnapshot>,
}

impl NodeTaskInformation {
    pub fn new(node_id: NodeId) -> Self {
        Self { node_id, tasks: Vec::new() }
    }
}

#[cfg(test)]
#[path = "node_info_tests.rs"]
mod tests;
