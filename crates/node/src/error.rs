// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy: configuration errors are fatal at `run()`; transient I/O
//! is retried internally by the sender/watcher and never escapes to this
//! type; protocol violations are handled per-task (the task moves to
//! `ERROR`, nothing propagates here). [`NodeError`] is what a caller of the
//! public API can actually observe.

use coordinator_bus::BusError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("sync topic error: {0}")]
    Bus(#[from] BusError),

    #[error("a task named {0:?} is already registered")]
    DuplicateTask(String),

    #[error("internal bookkeeping assertion failed: {0}")]
    Assertion(String),
}
