// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node heartbeat and node-info handling.
//!
//! Two distinct things share this module because they're two ends of the
//! same wire record: the heartbeat loop periodically publishes this node's
//! [`NodeTaskInformation`] snapshot (`DOHEARTBEAT`'s payload), and
//! [`NodeInfoHandler`] is what every node (including the publisher itself)
//! uses to remember the latest snapshot seen from each peer. Node-info is
//! purely informational — it never participates in claim arbitration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use coordinator_core::{NodeId, NodeTaskInformation};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::registry::TaskRegistry;
use crate::sender::Sender;

#[derive(Default)]
pub struct NodeInfoHandler {
    peers: Mutex<HashMap<NodeId, NodeTaskInformation>>,
}

impl NodeInfoHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, info: NodeTaskInformation) {
        self.peers.lock().insert(info.node_id.clone(), info);
    }

    pub fn peer_snapshot(&self, node_id: &NodeId) -> Option<NodeTaskInformation> {
        self.peers.lock().get(node_id).cloned()
    }

    pub fn all_peers(&self) -> Vec<NodeTaskInformation> {
        self.peers.lock().values().cloned().collect()
    }
}

/// Runs until `token` is cancelled, publishing this node's task snapshot
/// every `period` — but only when it differs from the last one sent, so a
/// quiescent node doesn't spam the topic with identical records.
pub async fn run_heartbeat_loop(
    period: Duration,
    node_id: NodeId,
    registry: Arc<TaskRegistry>,
    sender: Arc<Sender>,
    token: CancellationToken,
) {
    let mut last_published: Option<NodeTaskInformation> = None;
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(period) => {
                let snapshot = registry.snapshot(node_id.clone());
                if last_published.as_ref() == Some(&snapshot) {
                    continue;
                }
                match sender.publish_node_info(snapshot.clone()).await {
                    Ok(()) => last_published = Some(snapshot),
                    Err(err) => tracing::warn!(error = %err, "failed to publish node heartbeat"),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
