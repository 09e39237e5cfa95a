//! Rendered task list: rows, their controls, the add control and the header.
//!
//! The view knows nothing about the network. It mirrors what a browser list
//! would show, so the synchronizer can be exercised without one.

use std::time::{Duration, Instant};

use taskdash_services::{Task, TaskId};

use crate::state::CountSummary;

/// Visual lifecycle of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPhase {
    /// Just added, entrance animation still showing
    Entering,
    Present,
    /// Exit transition playing while the delete request is pending
    Removing,
}

/// One rendered task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub text: String,
    pub done: bool,
    pub phase: RowPhase,
    pub toggle_enabled: bool,
    pub delete_enabled: bool,
    rendered_at: Instant,
}

impl TaskRow {
    /// True while the row's own request is in flight.
    pub fn is_busy(&self) -> bool {
        !self.toggle_enabled || !self.delete_enabled
    }

    fn line(&self) -> String {
        let check = if self.done { 'x' } else { ' ' };
        let marker = match self.phase {
            RowPhase::Entering => " +",
            RowPhase::Present => "",
            RowPhase::Removing => " -",
        };
        format!("[{}] {:>4}  {}{}", check, self.id, self.text, marker)
    }
}

/// The text input and its add button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddControl {
    pub input: String,
    pub enabled: bool,
    /// Set when an empty submission was refused
    pub invalid: bool,
}

impl Default for AddControl {
    fn default() -> Self {
        Self {
            input: String::new(),
            enabled: true,
            invalid: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskListView {
    label: String,
    header: String,
    rows: Vec<TaskRow>,
    add: AddControl,
}

impl TaskListView {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            header: label.clone(),
            label,
            rows: Vec::new(),
            add: AddControl::default(),
        }
    }

    pub fn rows(&self) -> &[TaskRow] {
        &self.rows
    }

    pub fn row(&self, id: &TaskId) -> Option<&TaskRow> {
        self.rows.iter().find(|r| &r.id == id)
    }

    fn row_mut(&mut self, id: &TaskId) -> Option<&mut TaskRow> {
        self.rows.iter_mut().find(|r| &r.id == id)
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn add_control(&self) -> &AddControl {
        &self.add
    }

    /// Insert a row for `task` unless one with the same id is already shown.
    ///
    /// Returns whether a row was created.
    pub fn render(&mut self, task: &Task, skip_animation: bool) -> bool {
        if self.row(&task.id).is_some() {
            return false;
        }

        self.rows.push(TaskRow {
            id: task.id.clone(),
            text: task.text.clone(),
            done: task.is_done,
            phase: if skip_animation {
                RowPhase::Present
            } else {
                RowPhase::Entering
            },
            toggle_enabled: true,
            delete_enabled: true,
            rendered_at: Instant::now(),
        });
        true
    }

    /// Make the rows match a full listing.
    ///
    /// Rows not in `tasks` are dropped, missing ones are rendered without
    /// animation, surviving rows take the server's text and done flag, and
    /// row order follows `tasks`. Busy flags on surviving rows are kept.
    pub fn reconcile_all(&mut self, tasks: &[Task]) {
        self.rows.retain(|row| tasks.iter().any(|t| t.id == row.id));

        for task in tasks {
            if let Some(row) = self.row_mut(&task.id) {
                row.text.clone_from(&task.text);
                row.done = task.is_done;
            } else {
                self.render(task, true);
            }
        }

        self.rows.sort_by_key(|row| {
            tasks
                .iter()
                .position(|t| t.id == row.id)
                .unwrap_or(usize::MAX)
        });
    }

    pub fn set_done(&mut self, id: &TaskId, done: bool) {
        if let Some(row) = self.row_mut(id) {
            row.done = done;
        }
    }

    /// Disable or re-enable both action controls on a row.
    pub fn set_busy(&mut self, id: &TaskId, busy: bool) {
        if let Some(row) = self.row_mut(id) {
            row.toggle_enabled = !busy;
            row.delete_enabled = !busy;
        }
    }

    /// Start the exit transition; controls are disabled until it resolves.
    pub fn begin_exit(&mut self, id: &TaskId) -> bool {
        match self.row_mut(id) {
            Some(row) => {
                row.phase = RowPhase::Removing;
                row.toggle_enabled = false;
                row.delete_enabled = false;
                true
            }
            None => false,
        }
    }

    /// Reverse an exit transition after a failed delete.
    pub fn restore(&mut self, id: &TaskId) {
        if let Some(row) = self.row_mut(id) {
            row.phase = RowPhase::Present;
            row.toggle_enabled = true;
            row.delete_enabled = true;
        }
    }

    pub fn remove(&mut self, id: &TaskId) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| &row.id != id);
        self.rows.len() != before
    }

    /// End entrance animations that have been showing for at least `after`.
    pub fn settle_entrances(&mut self, now: Instant, after: Duration) {
        for row in &mut self.rows {
            if row.phase == RowPhase::Entering
                && now.saturating_duration_since(row.rendered_at) >= after
            {
                row.phase = RowPhase::Present;
            }
        }
    }

    pub fn update_header(&mut self, summary: CountSummary) {
        self.header = if summary.is_empty() {
            self.label.clone()
        } else {
            format!("{} ({})", self.label, summary)
        };
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.add.input = text.into();
        self.add.invalid = false;
    }

    pub fn mark_input_invalid(&mut self) {
        self.add.invalid = true;
    }

    pub fn begin_submit(&mut self) {
        self.add.enabled = false;
        self.add.invalid = false;
    }

    pub fn end_submit(&mut self) {
        self.add.enabled = true;
    }

    pub fn clear_input(&mut self) {
        self.add.input.clear();
    }

    /// Plain-text rendering: header, then one line per row.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.header.clone());
        if self.rows.is_empty() {
            lines.push("  (nothing to do)".to_string());
        }
        lines.extend(self.rows.iter().map(TaskRow::line));
        lines
    }
}
