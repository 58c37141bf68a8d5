// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task registry: shared storage for every task registered on this
//! node. The registry itself is just a guarded map — the single-writer
//! guarantee comes from the watcher being the only caller that ever mutates
//! a [`Task`] through [`TaskRegistry::with_task_mut`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use coordinator_core::{NodeId, NodeTaskInformation, Task, TaskDefinition, TaskSnapshot};
use parking_lot::Mutex;

use crate::error::NodeError;

struct Entry {
    task: Task,
    def: Arc<TaskDefinition>,
}

#[derive(Default)]
pub struct TaskRegistry {
    entries: Mutex<HashMap<String, Entry>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, def: TaskDefinition, now: Instant) -> Result<(), NodeError> {
        let mut entries = self.entries.lock();
        if entries.contains_key(&def.name) {
            return Err(NodeError::DuplicateTask(def.name));
        }
        let task = Task::new(def.name.clone(), now);
        entries.insert(
            task.name.clone(),
            Entry {
                task,
                def: Arc::new(def),
            },
        );
        Ok(())
    }

    pub fn task_names(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    pub fn definition(&self, name: &str) -> Option<Arc<TaskDefinition>> {
        self.entries.lock().get(name).map(|e| e.def.clone())
    }

    /// Applies `f` to the task's mutable record and its immutable
    /// definition together, the only sanctioned way to mutate a [`Task`].
    pub fn with_task_mut<R>(&self, name: &str, f: impl FnOnce(&mut Task, &TaskDefinition) -> R) -> Option<R> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(name)?;
        Some(f(&mut entry.task, &entry.def))
    }

    pub fn snapshot(&self, node_id: NodeId) -> NodeTaskInformation {
        let entries = self.entries.lock();
        let mut info = NodeTaskInformation::new(node_id);
        for entry in entries.values() {
            info.tasks.push(TaskSnapshot {
                task_name: entry.task.name.clone(),
                state: entry.task.local_state,
                state_started_ms: entry.task.state_started_epoch_ms,
            });
        }
        info
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
