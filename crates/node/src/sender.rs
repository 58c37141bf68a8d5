// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sender: the single path every loop on this node goes through to publish
//! onto the sync topic. Callers may invoke it concurrently from the
//! watcher, the heartbeat loop, or the registration path; an internal mutex
//! serializes the actual writes so ordering against the bus is well defined
//! from this node's point of view.

use std::sync::Arc;

use coordinator_bus::{BusError, BusRecord, LogBus};
use coordinator_core::{NodeId, NodeTaskInformation, Signal, SignalKind};
use tokio::sync::Mutex as AsyncMutex;

pub struct Sender {
    bus: Arc<dyn LogBus>,
    node_id: NodeId,
    write_lock: AsyncMutex<()>,
}

impl Sender {
    pub fn new(bus: Arc<dyn LogBus>, node_id: NodeId) -> Self {
        Self {
            bus,
            node_id,
            write_lock: AsyncMutex::new(()),
        }
    }

    /// Publishes one bus-kind signal for `task_name`, authored by this node.
    pub async fn publish_signal(
        &self,
        kind: SignalKind,
        task_name: impl Into<String>,
        reference: Option<u64>,
        epoch_ms: u64,
    ) -> Result<u64, BusError> {
        let task_name = task_name.into();
        let signal = Signal::bus(kind, Some(task_name.clone()), self.node_id.clone(), reference, epoch_ms);
        let _guard = self.write_lock.lock().await;
        self.bus.publish(task_name, BusRecord::Signal(signal)).await
    }

    /// Publishes the node-wide `DOHEARTBEAT` / node-info announcement. Keyed
    /// by node id rather than a task name since it isn't about one task.
    pub async fn publish_node_info(&self, info: NodeTaskInformation) -> Result<u64, BusError> {
        let key = self.node_id.to_string();
        let _guard = self.write_lock.lock().await;
        self.bus.publish(key, BusRecord::NodeInfo(info)).await
    }
}

#[cfg(test)]
#[path = "sender_tests.rs"]
mod tests;
