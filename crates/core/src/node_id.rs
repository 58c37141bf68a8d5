// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node identity: stable for a process lifetime, unique across a cluster
//! with overwhelming probability.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

static NODE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// `hostname_pid_counter`. The counter disambiguates multiple nodes started
/// in the same process (mainly for tests and in-process simulations); in
/// production a process hosts exactly one node and the counter is always 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Generate a fresh id for this process using the real hostname and pid.
    pub fn generate() -> Self {
        let hostname = hostname_best_effort();
        let pid = std::process::id();
        let counter = NODE_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{hostname}_{pid}_{counter}"))
    }

    /// Parse an id previously produced by [`NodeId::generate`] or rehydrated
    /// from a wire document. No validation beyond non-emptiness: the format
    /// is host-dependent and not meant to be re-parsed into parts.
    pub fn from_string(s: impl Into<String>) -> Result<Self, NodeIdError> {
        let s = s.into();
        if s.is_empty() {
            return Err(NodeIdError::Empty);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NodeIdError {
    #[error("node id must not be empty")]
    Empty,
}

fn hostname_best_effort() -> String {
    // No portable libc-free hostname query in std; fall back to a stable
    // per-process placeholder if the environment doesn't expose one so a
    // node id can still be formed deterministically offline.
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .unwrap_or_else(|| "unknown-host".to_string())
}

#[cfg(test)]
#[path = "node_id_tests.rs"]
mod tests;
