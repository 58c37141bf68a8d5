// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process stand-in for the real network log client. Keeps the same
//! contract a partitioned, offset-addressable, at-least-once broker would
//! give the coordination core: every subscriber observes every record from
//! its chosen start offset onward, in append order. Because all keys share
//! one underlying log, the per-key total order the protocol actually
//! depends on is trivially satisfied (a single global order is a stronger
//! guarantee than per-partition order, never a weaker one).

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::BusError;
use crate::record::{BusRecord, Envelope};
use crate::traits::{BusSubscription, LogBus};

struct Inner {
    log: Vec<Envelope>,
    tx: broadcast::Sender<Envelope>,
    next_offset: u64,
    closed: bool,
}

/// An in-memory broadcast bus. Used by tests, simulations, and single-box
/// deployments that don't need a real external broker.
pub struct BroadcastLogBus {
    topic: String,
    inner: Mutex<Inner>,
}

impl BroadcastLogBus {
    pub fn new(topic: impl Into<String>) -> Self {
        let (tx, _rx) = broadcast::channel(1024);
        Self {
            topic: topic.into(),
            inner: Mutex::new(Inner { log: Vec::new(), tx, next_offset: 0, closed: false }),
        }
    }

    /// Stop accepting new publishes. Existing subscribers keep draining
    /// their backlog but `recv` returns `None` once both the backlog and
    /// the live channel are exhausted.
    pub fn close(&self) {
        self.inner.lock().closed = true;
    }
}

#[async_trait]
impl LogBus for BroadcastLogBus {
    fn topic_name(&self) -> &str {
        &self.topic
    }

    async fn publish(&self, key: String, record: BusRecord) -> Result<u64, BusError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(BusError::Closed);
        }
        let offset = inner.next_offset;
        inner.next_offset += 1;
        let envelope = Envelope { offset, key, record }.stamped();
        inner.log.push(envelope.clone());
        // Fire-and-forget: no active subscribers is not an error.
        let _ = inner.tx.send(envelope);
        Ok(offset)
    }

    fn subscribe_from(&self, from_offset: u64) -> Box<dyn BusSubscription> {
        let inner = self.inner.lock();
        let backlog: VecDeque<Envelope> =
            inner.log.iter().filter(|e| e.offset >= from_offset).cloned().collect();
        let live = inner.tx.subscribe();
        let closed = inner.closed;
        drop(inner);
        Box::new(BroadcastSubscription { backlog, live, closed })
    }
}

struct BroadcastSubscription {
    backlog: VecDeque<Envelope>,
    live: broadcast::Receiver<Envelope>,
    closed: bool,
}

#[async_trait]
impl BusSubscription for BroadcastSubscription {
    async fn recv(&mut self) -> Option<Envelope> {
        if let Some(envelope) = self.backlog.pop_front() {
            return Some(envelope);
        }
        if self.closed {
            return None;
        }
        loop {
            match self.live.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "broadcast_tests.rs"]
mod tests;
