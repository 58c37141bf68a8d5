// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;

#[tokio::test]
async fn spawned_loop_is_observed_running_then_stops_on_shutdown() {
    let supervisor = Supervisor::new();
    let token = supervisor.token();
    let ticks = Arc::new(AtomicUsize::new(0));
    let ticks_for_task = ticks.clone();

    supervisor.spawn("test-loop", async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(Duration::from_millis(1)) => {
                    ticks_for_task.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
    });

    supervisor.wait_all_running().await;
    assert!(supervisor.is_running("test-loop"));

    tokio::time::sleep(Duration::from_millis(5)).await;
    supervisor.shutdown().await;

    assert!(!supervisor.is_running("test-loop"));
    assert!(ticks.load(Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let supervisor = Supervisor::new();
    supervisor.spawn("noop", async {});
    supervisor.shutdown().await;
    supervisor.shutdown().await;
}
