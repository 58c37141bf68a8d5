// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::{Duration, Instant};

use coordinator_bus::BroadcastLogBus;
use coordinator_core::TaskDefinition;

use super::*;

fn fast_config() -> Config {
    Config::from_toml_str(
        r#"
        sync_topic_name = "tasks"
        wait_in_new_state_ms = 5
        consumer_poll_time_ms = 5
        heartbeat_period_ms = 200
        "#,
    )
    .unwrap()
}

fn state_of(node: &Node, task_name: &str) -> Option<TaskState> {
    node.node_information()
        .tasks
        .into_iter()
        .find(|t| t.task_name == task_name)
        .map(|t| t.state)
}

#[tokio::test]
async fn exactly_one_node_claims_a_contested_task() {
    let bus: Arc<dyn coordinator_bus::LogBus> = Arc::new(BroadcastLogBus::new("tasks"));
    let node_a = Node::new(fast_config(), bus.clone());
    let node_b = Node::new(fast_config(), bus.clone());

    node_a
        .register(TaskDefinition::builder().name("sweep").build())
        .unwrap();
    node_b
        .register(TaskDefinition::builder().name("sweep").build())
        .unwrap();

    node_a.run().await.unwrap();
    node_b.run().await.unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    let mut resolved = None;
    while Instant::now() < deadline {
        let a = state_of(&node_a, "sweep");
        let b = state_of(&node_b, "sweep");
        match (a, b) {
            (Some(TaskState::ClaimedByNode), Some(TaskState::ClaimedByOther)) => {
                resolved = Some(("a", "b"));
                break;
            }
            (Some(TaskState::ClaimedByOther), Some(TaskState::ClaimedByNode)) => {
                resolved = Some(("b", "a"));
                break;
            }
            _ => tokio::time::sleep(Duration::from_millis(5)).await,
        }
    }

    assert!(resolved.is_some(), "task was never claimed by exactly one node");

    node_a.shutdown().await.unwrap();
    node_b.shutdown().await.unwrap();
}

#[tokio::test]
async fn peer_reclaims_task_after_owner_goes_silent() {
    let bus: Arc<dyn coordinator_bus::LogBus> = Arc::new(BroadcastLogBus::new("tasks"));
    let node_a = Node::new(fast_config(), bus.clone());
    node_a.register(TaskDefinition::builder().name("sweep").build()).unwrap();
    node_a.run().await.unwrap();

    let deadline = Instant::now() + Duration::from_secs(1);
    while Instant::now() < deadline && state_of(&node_a, "sweep") != Some(TaskState::ClaimedByNode) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(state_of(&node_a, "sweep"), Some(TaskState::ClaimedByNode));

    let node_b = Node::new(fast_config(), bus.clone());
    node_b
        .register(TaskDefinition::builder().name("sweep").resurrection(Duration::from_millis(100)).build())
        .unwrap();
    node_b.run().await.unwrap();

    let deadline = Instant::now() + Duration::from_secs(1);
    while Instant::now() < deadline && state_of(&node_b, "sweep") != Some(TaskState::ClaimedByOther) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(state_of(&node_b, "sweep"), Some(TaskState::ClaimedByOther));

    // node_a disappears without ever publishing UNCLAIMED.
    node_a.simulate_crash().await;

    let deadline = Instant::now() + Duration::from_secs(2);
    let mut reclaimed = None;
    while Instant::now() < deadline {
        reclaimed = state_of(&node_b, "sweep");
        if reclaimed == Some(TaskState::ClaimedByNode) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(reclaimed, Some(TaskState::ClaimedByNode), "peer never resurrected the silently-abandoned task");

    node_b.shutdown().await.unwrap();
}

#[tokio::test]
async fn register_after_run_still_drives_the_task_to_initiating() {
    let bus: Arc<dyn coordinator_bus::LogBus> = Arc::new(BroadcastLogBus::new("tasks"));
    let node = Node::new(fast_config(), bus);
    node.run().await.unwrap();
    node.register(TaskDefinition::builder().name("late").build()).unwrap();

    let deadline = Instant::now() + Duration::from_secs(1);
    let mut seen = None;
    while Instant::now() < deadline {
        seen = state_of(&node, "late");
        if seen.is_some() && seen != Some(TaskState::New) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(matches!(
        seen,
        Some(TaskState::Initiating) | Some(TaskState::Claiming) | Some(TaskState::ClaimedByNode)
    ));

    node.shutdown().await.unwrap();
}
