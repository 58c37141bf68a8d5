// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn generate_ids_are_unique_within_process() {
    let a = NodeId::generate();
    let b = NodeId::generate();
    assert_ne!(a, b);
}

#[test]
fn generate_has_three_underscore_separated_parts() {
    let id = NodeId::generate();
    let parts: Vec<&str> = id.as_str().split('_').collect();
    assert_eq!(parts.len(), 3, "expected host_pid_counter, got {:?}", id);
}

#[test]
fn from_string_rejects_empty() {
    assert!(matches!(NodeId::from_string(""), Err(NodeIdError::Empty)));
}

#[test]
fn from_string_roundtrips_display() {
    let id = NodeId::from_string("host_123_0").unwrap();
    assert_eq!(id.to_string(), "host_123_0");
}
