use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod repo;
pub mod repo_types;

pub use repo_types::{EditVehicle, NewVehicle, Vehicle, VehicleFields, VehicleFilter};

pub fn router() -> Router<AppState> {
    handlers::vehicle_routes()
}
