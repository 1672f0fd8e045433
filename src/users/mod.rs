use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod repo;
pub mod repo_types;

pub use repo_types::{EditUser, NewUser, User, UserFilter};

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
