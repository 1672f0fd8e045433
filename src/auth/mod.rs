use crate::state::AppState;
use axum::Router;

mod dto;
pub mod claims;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod services;

pub use claims::{Claims, Identity};
pub use extractors::AuthUser;
pub use jwt::{IssuedSession, SessionKeys};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
