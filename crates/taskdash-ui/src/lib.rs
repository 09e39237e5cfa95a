//! Headless task list: local state, its rendering, and the synchronizer that
//! keeps both in step with the dashboard backend.

pub mod notify;
pub mod state;
pub mod synchronizer;
pub mod view;

pub use notify::{ChannelNotifier, LogNotifier, Notification, NotificationLevel, Notifier};
pub use state::{CountSummary, TaskListState};
pub use synchronizer::{Outcome, SyncOptions, TaskListSynchronizer};
pub use view::{AddControl, RowPhase, TaskListView, TaskRow};
