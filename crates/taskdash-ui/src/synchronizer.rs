//! Task list synchronizer: keeps the local list and its rendering in step
//! with the remote store.
//!
//! Every operation is confirmation-first. The board lock is only held between
//! suspension points, so operations on different rows can be in flight at the
//! same time while a row's own controls stay disabled until its request
//! resolves.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use taskdash_core::UiConfig;
use taskdash_services::{Task, TaskCreateRequest, TaskId, TaskRemote};

use crate::notify::{Notification, Notifier};
use crate::state::{CountSummary, TaskListState};
use crate::view::{AddControl, TaskListView, TaskRow};

/// What an operation ended up doing. Failures have already been logged and
/// notified by the time this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The server confirmed and local state was updated
    Applied,
    /// Refused locally (empty text); no request was sent
    Rejected,
    /// The control is disabled because a request is already in flight
    Busy,
    /// No row with that id
    Missing,
    /// The request failed; state is as it was before the call
    Failed,
}

/// Timing knobs for the transitions around requests.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub header_label: String,
    /// Exit transition length before the delete request goes out
    pub delete_delay: Duration,
    /// How long new rows keep their entrance state
    pub entrance: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&UiConfig::default())
    }
}

impl From<&UiConfig> for SyncOptions {
    fn from(config: &UiConfig) -> Self {
        Self {
            header_label: config.header_label.clone(),
            delete_delay: Duration::from_millis(config.delete_delay_ms),
            entrance: Duration::from_millis(config.entrance_ms),
        }
    }
}

struct Board {
    state: TaskListState,
    view: TaskListView,
}

impl Board {
    fn refresh_header(&mut self) {
        self.view.update_header(self.state.summary());
    }
}

pub struct TaskListSynchronizer<R: TaskRemote> {
    remote: Arc<R>,
    notifier: Arc<dyn Notifier>,
    options: SyncOptions,
    board: Mutex<Board>,
}

impl<R: TaskRemote> TaskListSynchronizer<R> {
    pub fn new(remote: Arc<R>, notifier: Arc<dyn Notifier>, options: SyncOptions) -> Self {
        let view = TaskListView::new(options.header_label.clone());
        Self {
            remote,
            notifier,
            options,
            board: Mutex::new(Board {
                state: TaskListState::new(),
                view,
            }),
        }
    }

    /// Snapshot of the local task list.
    pub fn tasks(&self) -> Vec<Task> {
        self.board.lock().state.tasks().to_vec()
    }

    /// Snapshot of the rendered rows.
    pub fn rows(&self) -> Vec<TaskRow> {
        self.board.lock().view.rows().to_vec()
    }

    pub fn row(&self, id: &TaskId) -> Option<TaskRow> {
        self.board.lock().view.row(id).cloned()
    }

    pub fn header(&self) -> String {
        self.board.lock().view.header().to_string()
    }

    pub fn summary(&self) -> CountSummary {
        self.board.lock().state.summary()
    }

    pub fn add_control(&self) -> AddControl {
        self.board.lock().view.add_control().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.board.lock().view.lines()
    }

    /// Type into the add input.
    pub fn set_input(&self, text: impl Into<String>) {
        self.board.lock().view.set_input(text);
    }

    /// End entrance animations that have run their course.
    pub fn settle_entrances(&self) {
        self.board
            .lock()
            .view
            .settle_entrances(Instant::now(), self.options.entrance);
    }

    fn fail(&self, action: &str, error: &taskdash_core::NetworkError) {
        tracing::error!("Failed to {}: {}", action, error);
        self.notifier.notify(Notification::error(format!(
            "Could not {}. {}",
            action,
            error.user_message()
        )));
    }

    /// Fetch the full list and render it without entrance animation.
    ///
    /// On failure the current list is left as it is.
    pub async fn load(&self) -> Outcome {
        match self.remote.list_tasks().await {
            Ok(tasks) => {
                let mut board = self.board.lock();
                let board = &mut *board;
                board.state.replace_all(tasks);
                board.view.reconcile_all(board.state.tasks());
                board.refresh_header();
                tracing::info!("Loaded {} tasks", board.state.tasks().len());
                Outcome::Applied
            }
            Err(e) => {
                self.fail("load tasks", &e);
                Outcome::Failed
            }
        }
    }

    /// Submit whatever is in the add input.
    pub async fn submit_input(&self) -> Outcome {
        let text = self.board.lock().view.add_control().input.clone();
        self.add(&text).await
    }

    /// Create a task from `text`.
    ///
    /// Blank text only flags the input. The add control stays disabled while
    /// the request is out and is re-enabled whatever the result.
    pub async fn add(&self, text: &str) -> Outcome {
        let text = text.trim().to_string();
        {
            let mut board = self.board.lock();
            if text.is_empty() {
                board.view.mark_input_invalid();
                tracing::debug!("Ignoring empty task text");
                return Outcome::Rejected;
            }
            if !board.view.add_control().enabled {
                tracing::debug!("Add already in flight");
                return Outcome::Busy;
            }
            board.view.begin_submit();
        }

        let result = self.remote.add_task(TaskCreateRequest { text }).await;

        let mut board = self.board.lock();
        board.view.end_submit();

        match result {
            Ok(task) => {
                tracing::info!("Added task {}", task.id);
                board.view.render(&task, false);
                if !board.state.insert(task.clone()) {
                    tracing::debug!("Task {} was already listed", task.id);
                }
                board.view.clear_input();
                board.refresh_header();
                drop(board);
                self.notifier.notify(Notification::success("Task added"));
                Outcome::Applied
            }
            Err(e) => {
                drop(board);
                self.fail("add task", &e);
                Outcome::Failed
            }
        }
    }

    /// Flip a task's done flag on the server and mirror the server's answer.
    pub async fn toggle(&self, id: &TaskId) -> Outcome {
        let previous = {
            let mut board = self.board.lock();
            let Some(row) = board.view.row(id) else {
                return Outcome::Missing;
            };
            if row.is_busy() {
                return Outcome::Busy;
            }
            let previous = board.state.get(id).map_or(row.done, |t| t.is_done);
            board.view.set_busy(id, true);
            previous
        };

        let result = self.remote.toggle_task(id).await;

        let mut board = self.board.lock();
        board.view.set_busy(id, false);

        match result {
            Ok(response) => {
                let done = response.resolve(previous);
                board.state.set_done(id, done);
                board.view.set_done(id, done);
                board.refresh_header();
                drop(board);
                tracing::info!("Task {} is now {}", id, if done { "done" } else { "open" });
                if done {
                    self.notifier.notify(Notification::success("Task completed"));
                }
                Outcome::Applied
            }
            Err(e) => {
                drop(board);
                self.fail("update task", &e);
                Outcome::Failed
            }
        }
    }

    /// Play the exit transition, then delete on the server.
    ///
    /// A failed delete reverses the transition and keeps the task.
    pub async fn delete(&self, id: &TaskId) -> Outcome {
        {
            let mut board = self.board.lock();
            match board.view.row(id) {
                None => return Outcome::Missing,
                Some(row) if row.is_busy() => return Outcome::Busy,
                Some(_) => {}
            }
            board.view.begin_exit(id);
        }

        tokio::time::sleep(self.options.delete_delay).await;
        let result = self.remote.delete_task(id).await;

        let mut board = self.board.lock();
        match result {
            Ok(()) => {
                board.view.remove(id);
                board.state.remove(id);
                board.refresh_header();
                drop(board);
                tracing::info!("Removed task {}", id);
                self.notifier.notify(Notification::info("Task deleted"));
                Outcome::Applied
            }
            Err(e) => {
                board.view.restore(id);
                drop(board);
                self.fail("delete task", &e);
                Outcome::Failed
            }
        }
    }
}
