// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Node`]: the public entry point. Wires the registry, pending handler,
//! sender, signals watcher, and node heartbeat together under one
//! supervisor, and drives the startup/shutdown sequence.

use std::collections::HashMap;
use std::sync::Arc;

use coordinator_bus::LogBus;
use coordinator_core::{Clock, NodeId, NodeTaskInformation, PendingHandler, Signal, SignalKind, SystemClock, TaskDefinition, TaskState};
use tokio::sync::{mpsc, oneshot};

use crate::config::Config;
use crate::error::NodeError;
use crate::heartbeat::{run_heartbeat_loop, NodeInfoHandler};
use crate::registry::TaskRegistry;
use crate::sender::Sender;
use crate::state_machine::{build_dispatch_table, StateHandlers};
use crate::supervisor::Supervisor;
use crate::watcher::{run_watcher_loop, WatcherDeps};

/// A coordination node. One process hosts one `Node`; it competes for
/// ownership of every task registered on it against whatever peers also
/// hold a `Node` over the same sync topic.
pub struct Node<C: Clock = SystemClock> {
    node_id: NodeId,
    config: Config,
    clock: C,
    bus: Arc<dyn LogBus>,
    registry: Arc<TaskRegistry>,
    pending: Arc<PendingHandler>,
    sender: Arc<Sender>,
    node_info: Arc<NodeInfoHandler>,
    supervisor: Supervisor,
    dispatch_table: Arc<HashMap<TaskState, StateHandlers<C>>>,
    internal_tx: mpsc::UnboundedSender<Signal>,
    internal_rx: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<Signal>>>,
}

impl Node<SystemClock> {
    pub fn new(config: Config, bus: Arc<dyn LogBus>) -> Self {
        Self::with_clock(config, bus, SystemClock)
    }
}

impl<C: Clock + 'static> Node<C> {
    pub fn with_clock(config: Config, bus: Arc<dyn LogBus>, clock: C) -> Self {
        let node_id = NodeId::generate();
        let sender = Arc::new(Sender::new(bus.clone(), node_id.clone()));
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        Self {
            node_id,
            config,
            clock,
            bus,
            registry: Arc::new(TaskRegistry::new()),
            pending: Arc::new(PendingHandler::new()),
            sender,
            node_info: Arc::new(NodeInfoHandler::new()),
            supervisor: Supervisor::new(),
            dispatch_table: Arc::new(build_dispatch_table::<C>()),
            internal_tx,
            internal_rx: parking_lot::Mutex::new(Some(internal_rx)),
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Registers a task and immediately drives it from `NEW` toward
    /// `INITIATING`. Safe to call before or after [`Node::run`].
    pub fn register(&self, def: TaskDefinition) -> Result<(), NodeError> {
        let name = def.name.clone();
        self.registry.register(def, self.clock.now())?;
        let signal = Signal::internal(SignalKind::InitiatingInternal, name, self.node_id.clone(), self.clock.epoch_ms());
        let _ = self.internal_tx.send(signal);
        Ok(())
    }

    pub fn node_information(&self) -> NodeTaskInformation {
        self.registry.snapshot(self.node_id.clone())
    }

    pub fn peer_information(&self) -> Vec<NodeTaskInformation> {
        self.node_info.all_peers()
    }

    /// Starts every supervised loop and blocks until they have all reported
    /// running and the signals watcher has subscribed to the sync topic.
    /// Returns once startup is complete; the loops keep running in the
    /// background until [`Node::shutdown`].
    #[allow(clippy::expect_used)]
    pub async fn run(&self) -> Result<(), NodeError> {
        let clock = self.clock.clone();
        let pending = self.pending.clone();
        let internal_tx = self.internal_tx.clone();
        let token = self.supervisor.token();
        self.supervisor.spawn("pending-handler", async move {
            tokio::select! {
                _ = token.cancelled() => pending.stop(),
                _ = pending.run(&clock, move |signal| {
                    let _ = internal_tx.send(signal);
                }) => {}
            }
        });
        self.supervisor.wait_all_running().await;

        let heartbeat_token = self.supervisor.token();
        self.supervisor.spawn(
            "node-heartbeat",
            run_heartbeat_loop(
                self.config.heartbeat_period(),
                self.node_id.clone(),
                self.registry.clone(),
                self.sender.clone(),
                heartbeat_token,
            ),
        );

        let internal_rx = self
            .internal_rx
            .lock()
            .take()
            .expect("Node::run called more than once");
        let deps = WatcherDeps {
            clock: self.clock.clone(),
            node_id: self.node_id.clone(),
            bus: self.bus.clone(),
            from_offset: 0,
            registry: self.registry.clone(),
            sender: self.sender.clone(),
            pending: self.pending.clone(),
            node_info: self.node_info.clone(),
            wait_in_new_state: self.config.wait_in_new_state(),
            dispatch_table: self.dispatch_table.clone(),
            internal_tx: self.internal_tx.clone(),
        };
        let (starting_tx, starting_rx) = oneshot::channel();
        let watcher_token = self.supervisor.token();
        self.supervisor
            .spawn("signals-watcher", run_watcher_loop(deps, internal_rx, watcher_token, starting_tx));
        let _ = starting_rx.await;

        // Historical signals are replayed automatically: the watcher
        // subscribed from offset 0 above, so its backlog drain is exactly
        // `readOldSignals` before it starts tailing live records.
        Ok(())
    }

    /// Releases every task this node currently holds, gives the watcher one
    /// poll interval to publish those releases, then stops every supervised
    /// loop. Idempotent.
    pub async fn shutdown(&self) -> Result<(), NodeError> {
        for name in self.registry.task_names() {
            let holds_it = self
                .registry
                .with_task_mut(&name, |task, _| {
                    matches!(task.local_state, TaskState::ClaimedByNode | TaskState::HandlingByNode)
                })
                .unwrap_or(false);
            if holds_it {
                let signal = Signal::internal(SignalKind::UnclaimInternal, name, self.node_id.clone(), self.clock.epoch_ms());
                let _ = self.internal_tx.send(signal);
            }
        }
        tokio::time::sleep(self.config.consumer_poll_time()).await;
        self.supervisor.shutdown().await;
        Ok(())
    }

    /// Stops every supervised loop without releasing held tasks — unlike
    /// [`Node::shutdown`], no `UNCLAIMED` is published for anything this
    /// node held. Simulates a crash for exercising peer resurrection.
    #[cfg(any(test, feature = "test-support"))]
    pub async fn simulate_crash(&self) {
        self.supervisor.shutdown().await;
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
