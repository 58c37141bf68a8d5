// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised loops: the node's background tasks (pending handler, signals
//! watcher, sender, heartbeat) all run under one [`Supervisor`], which
//! tracks whether each has started and drives a uniform shutdown.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Handle {
    name: &'static str,
    running: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

/// Drives the lifecycle of a fixed set of background loops uniformly:
/// `run()`'s start sequence waits for each to report running before moving
/// on, and `shutdown()` cancels the shared token and joins every loop.
#[derive(Default)]
pub struct Supervisor {
    token: CancellationToken,
    handles: Mutex<Vec<Handle>>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// A token loop bodies should select against to notice shutdown.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawns `fut` as a supervised loop. `fut` is expected to run until
    /// `token()` is cancelled, then return.
    pub fn spawn(&self, name: &'static str, fut: impl Future<Output = ()> + Send + 'static) {
        let running = Arc::new(AtomicBool::new(true));
        let running_for_task = running.clone();
        let join = tokio::spawn(async move {
            fut.await;
            running_for_task.store(false, Ordering::SeqCst);
        });
        self.handles.lock().push(Handle { name, running, join });
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.handles
            .lock()
            .iter()
            .find(|h| h.name == name)
            .is_some_and(|h| h.running.load(Ordering::SeqCst))
    }

    pub fn all_running(&self) -> bool {
        let handles = self.handles.lock();
        !handles.is_empty() && handles.iter().all(|h| h.running.load(Ordering::SeqCst))
    }

    /// Polls until every spawned loop has reported running. Spawned loops
    /// set their flag before doing any blocking work, so in practice this
    /// resolves after at most a handful of scheduler ticks.
    pub async fn wait_all_running(&self) {
        while !self.all_running() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Cancels the shared token and joins every supervised loop. Idempotent:
    /// a second call finds no handles left and returns immediately.
    pub async fn shutdown(&self) {
        self.token.cancel();
        let handles: Vec<Handle> = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let name = handle.name;
            if let Err(err) = handle.join.await {
                tracing::warn!(loop_name = name, error = %err, "supervised loop panicked");
            }
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
