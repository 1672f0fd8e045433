use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod repo;
pub mod repo_types;

pub use repo_types::{EditJob, Job, JobFields, JobFilter, NewJob};

pub fn router() -> Router<AppState> {
    handlers::job_routes()
}
