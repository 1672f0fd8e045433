use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::repo_types::{Alert, AlertFilter, EditAlert, NewAlert};
use crate::{
    auth::AuthUser,
    db::Id,
    error::AppResult,
    jobs::handlers::ToggleQuery,
    query::SortQuery,
    state::AppState,
};

pub fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/alerts", get(list_alerts))
        .route("/alerts/create", post(create_alert))
        .route("/alerts/edit", post(edit_alert))
        .route("/alerts/:id", get(get_alert).delete(delete_alert))
        .route("/alerts/:id/read", patch(read_alert))
}

#[instrument(skip_all)]
pub async fn list_alerts(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(mut filter): Query<AlertFilter>,
    Query(sort): Query<SortQuery>,
) -> AppResult<Json<Vec<Alert>>> {
    if !claims.is_admin {
        filter.user_id = Some(claims.sub);
    }
    Ok(Json(Alert::list(&state.db, &filter, sort.key()).await?))
}

#[instrument(skip(state, claims))]
pub async fn get_alert(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Id>,
) -> AppResult<Json<Alert>> {
    let alert = Alert::get_by_id(&state.db, id).await?;
    claims.ensure_can_act_for(alert.user_id, "alert")?;
    Ok(Json(alert))
}

#[instrument(skip_all)]
pub async fn create_alert(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<NewAlert>,
) -> AppResult<(StatusCode, Json<Alert>)> {
    let owner = claims.resolve_owner(payload.user_id, "alerts")?;
    let id = Alert::create(&state.db, &payload.fields, owner).await?;
    Ok((StatusCode::CREATED, Json(Alert::get_by_id(&state.db, id).await?)))
}

#[instrument(skip_all)]
pub async fn edit_alert(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<EditAlert>,
) -> AppResult<Json<Alert>> {
    let existing = Alert::get_by_id(&state.db, payload.id).await?;
    claims.ensure_can_act_for(existing.user_id, "alert")?;
    Alert::update(&state.db, &payload, existing.user_id, claims.owner_scope()).await?;
    info!(alert_id = existing.id, "alert updated");
    Ok(Json(Alert::get_by_id(&state.db, existing.id).await?))
}

#[instrument(skip(state, claims))]
pub async fn read_alert(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Id>,
    Query(toggle): Query<ToggleQuery>,
) -> AppResult<Json<Alert>> {
    let alert = Alert::get_by_id(&state.db, id).await?;
    claims.ensure_can_act_for(alert.user_id, "alert")?;
    Alert::set_read(&state.db, id, !toggle.undo, claims.owner_scope()).await?;
    Ok(Json(Alert::get_by_id(&state.db, id).await?))
}

#[instrument(skip(state, claims))]
pub async fn delete_alert(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Id>,
) -> AppResult<String> {
    let alert = Alert::get_by_id(&state.db, id).await?;
    claims.ensure_can_act_for(alert.user_id, "alert")?;
    Alert::delete(&state.db, id, claims.owner_scope()).await?;
    info!(alert_id = id, "alert deleted");
    Ok(format!("alert {id} has been deleted"))
}
