// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Thin binary that loads configuration, constructs a [`Node`] over an
//! in-process [`BroadcastLogBus`], registers the tasks named in a manifest,
//! and runs until interrupted.

mod exit_error;
mod manifest;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use coordinator_bus::{BroadcastLogBus, LogBus};
use coordinator_node::{load_from_path as load_config, Node};
use exit_error::ExitError;

/// Run a coordination node.
#[derive(Debug, Parser)]
#[command(name = "coordinator", version)]
struct Cli {
    /// Path to the node's TOML configuration file.
    #[arg(long, default_value = "coordinator.toml")]
    config: PathBuf,

    /// Path to the task manifest this node registers on startup.
    #[arg(long, default_value = "tasks.toml")]
    tasks: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "coordinator exited with an error");
            eprintln!("error: {err}");
            ExitCode::from(err.code as u8)
        }
    }
}

async fn run() -> Result<(), ExitError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = load_config(&cli.config).map_err(|e| ExitError::new(2, format!("loading config: {e}")))?;
    let tasks = manifest::load_from_path(&cli.tasks).map_err(|e| ExitError::new(2, format!("loading task manifest: {e}")))?;

    let bus: Arc<dyn LogBus> = Arc::new(BroadcastLogBus::new(config.sync_topic_name.clone()));
    let node = Node::new(config, bus);

    for task in tasks {
        let name = task.name.clone();
        node.register(task)
            .map_err(|e| ExitError::new(1, format!("registering task {name:?}: {e}")))?;
    }

    tracing::info!(node_id = %node.node_id(), "starting node");
    node.run().await.map_err(|e| ExitError::new(1, format!("starting node: {e}")))?;

    tokio::signal::ctrl_c().await.map_err(|e| ExitError::new(1, format!("waiting for shutdown signal: {e}")))?;

    tracing::info!("shutting down");
    node.shutdown().await.map_err(|e| ExitError::new(1, format!("shutting down node: {e}")))?;
    Ok(())
}
