use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod repo;
pub mod repo_types;

pub use repo_types::{Alert, AlertFields, AlertFilter, AlertKind, EditAlert, NewAlert};

pub fn router() -> Router<AppState> {
    handlers::alert_routes()
}
