// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;

#[test]
fn loads_tasks_with_defaults() {
    let tasks = load_from_str(
        r#"
        [[task]]
        name = "sweep"

        [[task]]
        name = "reconcile"
        period_ms = 1000
        "#,
    )
    .unwrap();

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].name, "sweep");
    assert_eq!(tasks[0].period, Duration::from_millis(default_period_ms()));
    assert_eq!(tasks[1].name, "reconcile");
    assert_eq!(tasks[1].period, Duration::from_millis(1000));
}

#[test]
fn empty_manifest_yields_no_tasks() {
    let tasks = load_from_str("").unwrap();
    assert!(tasks.is_empty());
}

#[test]
fn malformed_toml_is_rejected() {
    let err = load_from_str("not valid toml [[[").unwrap_err();
    assert!(matches!(err, ManifestError::Parse(_)));
}
