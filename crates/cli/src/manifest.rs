// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task manifest: the TOML file naming which tasks this node registers.
//! Task bodies are not expressible in a manifest, so each entry produces a
//! task that simply sleeps for its configured duration while claimed —
//! enough to exercise the claim protocol; embedders wanting real work
//! construct [`coordinator_core::TaskDefinition`] directly instead of going
//! through this loader.

use std::path::Path;
use std::time::Duration;

use coordinator_core::TaskDefinition;
use serde::Deserialize;
use thiserror::Error;

fn default_period_ms() -> u64 {
    60_000
}
fn default_max_duration_ms() -> u64 {
    30_000
}
fn default_claimed_signal_period_ms() -> u64 {
    10_000
}
fn default_resurrection_ms() -> u64 {
    120_000
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    name: String,
    #[serde(default = "default_period_ms")]
    period_ms: u64,
    #[serde(default = "default_max_duration_ms")]
    max_duration_ms: u64,
    #[serde(default = "default_claimed_signal_period_ms")]
    claimed_signal_period_ms: u64,
    #[serde(default = "default_resurrection_ms")]
    resurrection_ms: u64,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default, rename = "task")]
    tasks: Vec<ManifestEntry>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not read manifest {0}: {1}")]
    Read(std::path::PathBuf, #[source] std::io::Error),
    #[error("could not parse manifest: {0}")]
    Parse(#[source] toml::de::Error),
}

pub fn load_from_path(path: &Path) -> Result<Vec<TaskDefinition>, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|e| ManifestError::Read(path.to_path_buf(), e))?;
    load_from_str(&text)
}

fn load_from_str(s: &str) -> Result<Vec<TaskDefinition>, ManifestError> {
    let manifest: Manifest = toml::from_str(s).map_err(ManifestError::Parse)?;
    Ok(manifest
        .tasks
        .into_iter()
        .map(|entry| {
            let period = Duration::from_millis(entry.period_ms);
            TaskDefinition {
                name: entry.name,
                body: std::sync::Arc::new(move || async move { tokio::time::sleep(period).await }),
                period,
                max_duration: Duration::from_millis(entry.max_duration_ms),
                claimed_signal_period: Duration::from_millis(entry.claimed_signal_period_ms),
                resurrection: Duration::from_millis(entry.resurrection_ms),
            }
        })
        .collect())
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
