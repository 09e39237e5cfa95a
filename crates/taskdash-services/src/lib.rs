pub mod cookie;
pub mod task;
pub mod task_client;

pub use cookie::get_cookie;
pub use task::{Task, TaskCreateRequest, TaskId, ToggleResponse};
pub use task_client::{TaskClient, TaskRemote, CSRF_HEADER};
