use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod repo;
pub mod repo_types;

pub use repo_types::{EditTask, Task, TaskFields, TaskFilter};

pub fn router() -> Router<AppState> {
    handlers::task_routes()
}
