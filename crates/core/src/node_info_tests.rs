// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn serializes_to_human_readable_json() {
    let mut info = NodeTaskInformation::new(NodeId::from_string("host_1_0").unwrap());
    info.tasks.push(TaskSnapshot {
        task_name: "sweep".into(),
        state: TaskState::ClaimedByNode,
        state_started_ms: 42,
    });
    let json = serde_json::to_string(&info).unwrap();
    assert!(json.contains("host_1_0"));
    assert!(json.contains("sweep"));

    let back: NodeTaskInformation = serde_json::from_str(&json).unwrap();
    assert_eq!(back, info);
}
