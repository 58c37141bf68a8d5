// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signals Watcher: the single task on this node that ever mutates a
//! [`Task`](coordinator_core::Task)'s state. It selects over two sources —
//! the sync topic subscription (`readOldSignals` then live tail) and an
//! internal channel fed by the pending handler's timer fires and by
//! `register`/`shutdown` — and feeds every signal through the same dispatch
//! table in the order it was observed, preserving the single-writer
//! invariant the claim protocol depends on.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use coordinator_bus::{BusRecord, LogBus};
use coordinator_core::{classify, Clock, NodeId, Origin, PendingHandler, Signal, SignalKind, TaskState};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::heartbeat::NodeInfoHandler;
use crate::registry::TaskRegistry;
use crate::sender::Sender;
use crate::state_machine::{dispatch, HandlerCtx, StateHandlers};

/// Everything the watcher loop needs, bundled so `Node::run` has one value
/// to pass to [`run_watcher_loop`].
pub struct WatcherDeps<C: Clock> {
    pub clock: C,
    pub node_id: NodeId,
    pub bus: Arc<dyn LogBus>,
    pub from_offset: u64,
    pub registry: Arc<TaskRegistry>,
    pub sender: Arc<Sender>,
    pub pending: Arc<PendingHandler>,
    pub node_info: Arc<NodeInfoHandler>,
    pub wait_in_new_state: Duration,
    pub dispatch_table: Arc<HashMap<TaskState, StateHandlers<C>>>,
    /// Looped back into the watcher's own `internal_rx`; used to post
    /// [`SignalKind::HandlingCompletedInternal`] once a spawned task
    /// executor finishes.
    pub internal_tx: mpsc::UnboundedSender<Signal>,
}

/// Runs until `token` is cancelled. Sends on `starting_tx` once the bus
/// subscription has been established and historical signals are about to
/// be replayed — the watcher's startup milestone `Node::run` waits on.
pub async fn run_watcher_loop<C: Clock + 'static>(
    deps: WatcherDeps<C>,
    mut internal_rx: mpsc::UnboundedReceiver<Signal>,
    token: CancellationToken,
    starting_tx: oneshot::Sender<()>,
) {
    let WatcherDeps {
        clock,
        node_id,
        bus,
        from_offset,
        registry,
        sender,
        pending,
        node_info,
        wait_in_new_state,
        dispatch_table,
        internal_tx,
    } = deps;

    let mut sub = bus.subscribe_from(from_offset);
    let _ = starting_tx.send(());

    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            internal = internal_rx.recv() => {
                let Some(signal) = internal else { return };
                handle_signal(
                    &clock, &node_id, &registry, &sender, &pending, &dispatch_table,
                    &internal_tx, wait_in_new_state, Origin::Internal, signal,
                ).await;
            }
            envelope = sub.recv() => {
                let Some(envelope) = envelope else { return };
                match envelope.record {
                    BusRecord::NodeInfo(info) => node_info.observe(info),
                    BusRecord::Signal(signal) => {
                        let origin = classify(&signal, &node_id);
                        handle_signal(
                            &clock, &node_id, &registry, &sender, &pending, &dispatch_table,
                            &internal_tx, wait_in_new_state, origin, signal,
                        ).await;
                    }
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_signal<C: Clock + 'static>(
    clock: &C,
    node_id: &NodeId,
    registry: &TaskRegistry,
    sender: &Sender,
    pending: &PendingHandler,
    dispatch_table: &HashMap<TaskState, StateHandlers<C>>,
    internal_tx: &mpsc::UnboundedSender<Signal>,
    wait_in_new_state: Duration,
    origin: Origin,
    signal: Signal,
) {
    let Some(task_name) = signal.task_name.clone() else {
        tracing::warn!(kind = %signal.kind, "signal with no task name reached the watcher dispatch path");
        return;
    };

    let outcome = registry.with_task_mut(&task_name, |task, def| {
        let previous_state = task.local_state;
        let mut ctx = HandlerCtx {
            task,
            def,
            node_id,
            clock,
            pending,
            wait_in_new_state,
        };
        let published = dispatch(dispatch_table, &mut ctx, origin, &signal);
        if ctx.task.local_state != previous_state {
            ctx.task.stamp_state_started_epoch_ms(clock.epoch_ms());
        }
        (published, previous_state != TaskState::HandlingByNode && ctx.task.local_state == TaskState::HandlingByNode)
    });

    let Some((published, entered_handling)) = outcome else {
        tracing::debug!(task = %task_name, kind = %signal.kind, "signal for an unregistered task ignored");
        return;
    };

    for req in published {
        if let Err(err) = sender
            .publish_signal(req.kind, task_name.clone(), req.reference, clock.epoch_ms())
            .await
        {
            tracing::warn!(task = %task_name, error = %err, "failed to publish signal");
        }
    }

    if entered_handling {
        spawn_task_executor(clock.clone(), node_id.clone(), registry, internal_tx.clone(), task_name);
    }
}

/// Runs a task's body to completion and posts
/// [`SignalKind::HandlingCompletedInternal`] back into the watcher's own
/// queue — the only signal that moves a task out of `HANDLING_BY_NODE`.
/// Detached rather than awaited inline: the watcher must stay free to keep
/// dispatching other tasks' signals while this one's body runs.
fn spawn_task_executor<C: Clock + 'static>(
    clock: C,
    node_id: NodeId,
    registry: &TaskRegistry,
    internal_tx: mpsc::UnboundedSender<Signal>,
    task_name: String,
) {
    let Some(def) = registry.definition(&task_name) else {
        tracing::warn!(task = %task_name, "no definition found for task entering HANDLING_BY_NODE");
        return;
    };

    tokio::spawn(async move {
        def.body.run().await;
        let completed = Signal::internal(SignalKind::HandlingCompletedInternal, task_name.clone(), node_id, clock.epoch_ms());
        if internal_tx.send(completed).is_err() {
            tracing::debug!(task = %task_name, "watcher gone before HANDLING_BY_NODE completion could be posted");
        }
    });
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
