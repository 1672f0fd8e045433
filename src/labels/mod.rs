use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod repo;
pub mod repo_types;

pub use repo_types::{EditLabel, JobLabel, JobLabelFilter, Label, LabelFields, LabelFilter, NewLabel};

pub fn router() -> Router<AppState> {
    handlers::label_routes()
}
