//! Local mirror of the server's task list.
//!
//! Pure data: no I/O, no rendering. The synchronizer feeds it server
//! responses and reads the summary back.

use std::fmt;

use taskdash_services::{Task, TaskId};

/// Done/total counts derived from the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountSummary {
    pub done: usize,
    pub total: usize,
}

impl CountSummary {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl fmt::Display for CountSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.done, self.total)
    }
}

/// Ordered task list with unique ids.
///
/// Order is arrival order: fetch order after a load, then append order.
#[derive(Debug, Clone, Default)]
pub struct TaskListState {
    tasks: Vec<Task>,
}

impl TaskListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.get(id).is_some()
    }

    /// Replace everything with a fresh server listing.
    ///
    /// Later duplicates of an id are dropped.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks.clear();
        for task in tasks {
            if !self.insert(task.clone()) {
                tracing::warn!("Server listed task {} more than once", task.id);
            }
        }
    }

    /// Append `task` unless its id is already present.
    pub fn insert(&mut self, task: Task) -> bool {
        if self.contains(&task.id) {
            return false;
        }
        self.tasks.push(task);
        true
    }

    pub fn set_done(&mut self, id: &TaskId, is_done: bool) -> bool {
        match self.tasks.iter_mut().find(|t| &t.id == id) {
            Some(task) => {
                task.is_done = is_done;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|t| &t.id == id)?;
        Some(self.tasks.remove(index))
    }

    pub fn summary(&self) -> CountSummary {
        CountSummary {
            done: self.tasks.iter().filter(|t| t.is_done).count(),
            total: self.tasks.len(),
        }
    }
}
