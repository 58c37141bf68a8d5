// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending Handler: a monotonic timer queue of named future actions with
//! replace-by-name semantics.
//!
//! The queue itself is clock-agnostic data structure (it only ever compares
//! `Instant`s callers hand it), which keeps [`PendingHandler::pop_ready`]
//! trivially deterministic to unit test against a [`crate::clock::FakeClock`].
//! [`PendingHandler::run`] is the production async wrapper that sleeps
//! between checks using an injected [`crate::clock::Clock`].

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::clock::Clock;
use crate::signal::Signal;

/// A scheduled action: produces the internal signal to feed into the state
/// machine once it fires.
pub type PendingAction = Box<dyn FnOnce() -> Signal + Send>;

struct Entry {
    seq: u64,
    due_at: Instant,
    action: PendingAction,
}

#[derive(Clone)]
struct HeapKey {
    due_at: Instant,
    seq: u64,
    name: Arc<str>,
}

impl PartialEq for HeapKey {
    fn eq(&self, other: &Self) -> bool {
        self.due_at == other.due_at && self.seq == other.seq
    }
}
impl Eq for HeapKey {}
impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due_at, self.seq).cmp(&(other.due_at, other.seq))
    }
}

struct Inner {
    entries: HashMap<Arc<str>, Entry>,
    heap: BinaryHeap<Reverse<HeapKey>>,
    next_seq: u64,
}

/// Named timer queue. Cheap to clone (an `Arc` handle internally via its
/// callers); construct one per node.
pub struct PendingHandler {
    inner: Mutex<Inner>,
    notify: Notify,
    stop: AtomicBool,
}

impl Default for PendingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingHandler {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                heap: BinaryHeap::new(),
                next_seq: 0,
            }),
            notify: Notify::new(),
            stop: AtomicBool::new(false),
        }
    }

    /// Replace-by-name: if `name` already has a pending entry it is
    /// superseded (its old action will never fire); otherwise a new entry
    /// is inserted.
    pub fn schedule(&self, name: impl Into<Arc<str>>, due_at: Instant, action: PendingAction) {
        let name = name.into();
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(name.clone(), Entry { seq, due_at, action });
        inner.heap.push(Reverse(HeapKey { due_at, seq, name }));
        drop(inner);
        self.notify.notify_one();
    }

    /// Idempotent: removing an unknown name is a no-op.
    pub fn remove(&self, name: &str) {
        self.inner.lock().entries.remove(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().entries.contains_key(name)
    }

    /// The `dueAt` of the earliest still-live entry, discarding stale heap
    /// keys left behind by `remove`/replacement along the way.
    fn earliest_due(&self) -> Option<Instant> {
        let mut inner = self.inner.lock();
        loop {
            let top = inner.heap.peek()?.0.clone();
            match inner.entries.get(&top.name) {
                Some(e) if e.seq == top.seq => return Some(e.due_at),
                _ => {
                    inner.heap.pop();
                }
            }
        }
    }

    /// Pop and return every entry whose `dueAt <= now`, in fire order
    /// (earliest `dueAt` first, ties by insertion order). Pure data
    /// structure operation; does not touch the clock or sleep.
    #[allow(clippy::expect_used)]
    pub fn pop_ready(&self, now: Instant) -> Vec<(Arc<str>, PendingAction)> {
        let mut inner = self.inner.lock();
        let mut fired = Vec::new();
        loop {
            let Some(top) = inner.heap.peek().map(|r| r.0.clone()) else {
                break;
            };
            match inner.entries.get(&top.name) {
                Some(e) if e.seq != top.seq => {
                    inner.heap.pop();
                    continue;
                }
                Some(e) if e.due_at > now => break,
                Some(_) => {
                    inner.heap.pop();
                    let entry = inner
                        .entries
                        .remove(&top.name)
                        .expect("entry presence just checked above");
                    fired.push((top.name, entry.action));
                }
                None => {
                    inner.heap.pop();
                }
            }
        }
        fired
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Cooperative loop: waits until the earliest `dueAt`, fires every
    /// ready action by handing its produced signal to `on_fire`, then
    /// rescans. Waits are interruptible by new schedules via `Notify` so an
    /// earlier-due insertion preempts an in-progress wait.
    pub async fn run<C: Clock>(&self, clock: &C, on_fire: impl Fn(Signal)) {
        while !self.is_stopped() {
            match self.earliest_due() {
                None => {
                    tokio::select! {
                        _ = self.notify.notified() => {}
                    }
                }
                Some(due_at) => {
                    let now = clock.now();
                    if due_at <= now {
                        for (_, action) in self.pop_ready(now) {
                            on_fire(action());
                        }
                    } else {
                        let wait = due_at.saturating_duration_since(now);
                        tokio::select! {
                            _ = tokio::time::sleep(wait) => {}
                            _ = self.notify.notified() => {}
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
