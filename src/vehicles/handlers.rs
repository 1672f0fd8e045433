use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::repo_types::{EditVehicle, NewVehicle, Vehicle, VehicleFilter};
use crate::{
    auth::AuthUser,
    cascade,
    db::Id,
    error::AppResult,
    query::SortQuery,
    state::AppState,
};

pub fn vehicle_routes() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(list_vehicles))
        .route("/vehicles/create", post(create_vehicle))
        .route("/vehicles/edit", post(edit_vehicle))
        .route("/vehicles/:id", get(get_vehicle).delete(delete_vehicle))
}

#[instrument(skip_all)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(mut filter): Query<VehicleFilter>,
    Query(sort): Query<SortQuery>,
) -> AppResult<Json<Vec<Vehicle>>> {
    if !claims.is_admin {
        filter.user_id = Some(claims.sub);
    }
    Ok(Json(Vehicle::list(&state.db, &filter, sort.key()).await?))
}

#[instrument(skip(state, claims))]
pub async fn get_vehicle(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Id>,
) -> AppResult<Json<Vehicle>> {
    let vehicle = Vehicle::get_by_id(&state.db, id).await?;
    claims.ensure_can_act_for(vehicle.user_id, "vehicle")?;
    Ok(Json(vehicle))
}

#[instrument(skip_all)]
pub async fn create_vehicle(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<NewVehicle>,
) -> AppResult<(StatusCode, Json<Vehicle>)> {
    let owner = claims.resolve_owner(payload.user_id, "vehicles")?;
    let id = Vehicle::create(&state.db, &payload.fields, owner).await?;
    Ok((StatusCode::CREATED, Json(Vehicle::get_by_id(&state.db, id).await?)))
}

#[instrument(skip_all)]
pub async fn edit_vehicle(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<EditVehicle>,
) -> AppResult<Json<Vehicle>> {
    let existing = Vehicle::get_by_id(&state.db, payload.id).await?;
    claims.ensure_can_act_for(existing.user_id, "vehicle")?;
    Vehicle::update(&state.db, &payload, claims.owner_scope()).await?;
    info!(vehicle_id = existing.id, "vehicle updated");
    Ok(Json(Vehicle::get_by_id(&state.db, existing.id).await?))
}

#[instrument(skip(state, claims))]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Id>,
) -> AppResult<String> {
    let report = cascade::delete_vehicle(&state.db, id, claims.owner_scope()).await?;
    info!(vehicle_id = id, removed = report.removed, failed = report.failed, "vehicle deleted");
    Ok(format!("vehicle {id} has been deleted"))
}
