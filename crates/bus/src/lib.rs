// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The sync topic: a partitioned, offset-addressable, at-least-once
//! append-only log used as a broadcast bus. [`LogBus`] is the container
//! interface the coordination core depends on; [`BroadcastLogBus`] is the
//! in-process implementation used by tests and single-box deployments.

pub mod broadcast;
pub mod error;
pub mod record;
pub mod traits;

pub use broadcast::BroadcastLogBus;
pub use error::BusError;
pub use record::{BusRecord, Envelope};
pub use traits::{BusSubscription, LogBus};
