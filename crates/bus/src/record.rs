// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wire shape of one record on the sync topic.

use coordinator_core::{NodeTaskInformation, Signal};
use serde::{Deserialize, Serialize};

/// Record value for signals: `{taskName, kind, originId, reference?, timestamp}`.
/// Record value for node-info: a serialized `NodeTaskInformation` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BusRecord {
    Signal(Signal),
    NodeInfo(NodeTaskInformation),
}

/// One record as observed by a subscriber: stamped with the log offset it
/// was assigned when appended.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub offset: u64,
    /// Partitioning key: `taskName` for task signals, `uniqueNodeId` for
    /// node-info documents.
    pub key: String,
    pub record: BusRecord,
}

impl Envelope {
    /// Return the record with `current_offset` stamped on the contained
    /// signal, matching the watcher's contract of stamping each observed
    /// signal with its log offset. No-op for `NodeInfo` records.
    pub fn stamped(mut self) -> Self {
        if let BusRecord::Signal(signal) = &mut self.record {
            signal.current_offset = Some(self.offset);
        }
        self
    }
}
