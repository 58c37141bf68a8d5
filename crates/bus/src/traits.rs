// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container interface for the sync topic: producer/consumer over a
//! partitioned, offset-addressable, at-least-once log. Everything above
//! this trait (watcher, sender, state machine) is agnostic to whether the
//! implementation is the in-process [`crate::broadcast::BroadcastLogBus`]
//! or a real network client.

use async_trait::async_trait;

use crate::error::BusError;
use crate::record::{BusRecord, Envelope};

/// A subscription positioned at a starting offset: first drains whatever
/// history is still retained at or after that offset (`readOldSignals`),
/// then tails newly published records.
#[async_trait]
pub trait BusSubscription: Send {
    /// Waits for the next record. Returns `None` once the topic is closed
    /// and no further records will ever arrive.
    async fn recv(&mut self) -> Option<Envelope>;
}

#[async_trait]
pub trait LogBus: Send + Sync {
    fn topic_name(&self) -> &str;

    /// Append a record under `key`, returning the offset it was assigned.
    /// Fire-and-forget at the protocol level: the only acknowledgement a
    /// caller should trust is later observing its own echo through a
    /// subscription.
    async fn publish(&self, key: String, record: BusRecord) -> Result<u64, BusError>;

    /// Subscribe starting at `from_offset` (inclusive). Passing `0` replays
    /// the entire retained history before tailing live records.
    fn subscribe_from(&self, from_offset: u64) -> Box<dyn BusSubscription>;
}
