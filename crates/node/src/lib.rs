// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Coordination node: registers tasks, drives each one's claim-protocol
//! state machine in response to signals observed on a shared sync topic,
//! and periodically broadcasts this node's own task inventory to its peers.
//!
//! [`Node`] is the only type most callers need. Everything else here is
//! exposed for callers assembling a node from its parts (alternate
//! clocks, custom dispatch tables, standalone use of the registry).

mod config;
mod error;
mod heartbeat;
mod lifecycle;
mod registry;
mod sender;
mod state_machine;
mod supervisor;
mod watcher;

pub use config::{load_from_path, Config, ConfigError};
pub use error::NodeError;
pub use heartbeat::NodeInfoHandler;
pub use lifecycle::Node;
pub use registry::TaskRegistry;
pub use sender::Sender;
pub use state_machine::{build_dispatch_table, dispatch, HandlerCtx, PublishRequest, StateHandlers};
pub use supervisor::Supervisor;
