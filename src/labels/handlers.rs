use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::repo_types::{EditLabel, Label, LabelFilter, NewLabel};
use crate::{
    auth::{AuthUser, Claims},
    cascade,
    db::Id,
    error::{AppError, AppResult},
    query::SortQuery,
    state::AppState,
};

pub fn label_routes() -> Router<AppState> {
    Router::new()
        .route("/labels", get(list_labels))
        .route("/labels/create", post(create_label))
        .route("/labels/edit", post(edit_label))
        .route("/labels/:id", get(get_label).delete(delete_label))
}

/// Shared labels can only be changed by admins.
fn ensure_can_modify(claims: &Claims, label: &Label) -> AppResult<()> {
    match label.user_id {
        Some(owner) => claims.ensure_can_act_for(owner, "label"),
        None if claims.is_admin => Ok(()),
        None => Err(AppError::Unauthorized("shared labels are admin-only".into())),
    }
}

#[instrument(skip_all)]
pub async fn list_labels(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Query(filter): Query<LabelFilter>,
    Query(sort): Query<SortQuery>,
) -> AppResult<Json<Vec<Label>>> {
    Ok(Json(Label::list(&state.db, &filter, sort.key()).await?))
}

#[instrument(skip(state, _claims))]
pub async fn get_label(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(id): Path<Id>,
) -> AppResult<Json<Label>> {
    Ok(Json(Label::get_by_id(&state.db, id).await?))
}

#[instrument(skip_all)]
pub async fn create_label(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<NewLabel>,
) -> AppResult<(StatusCode, Json<Label>)> {
    let owner = if payload.shared {
        if !claims.is_admin {
            return Err(AppError::Unauthorized("shared labels are admin-only".into()));
        }
        None
    } else {
        Some(claims.resolve_owner(payload.user_id, "labels")?)
    };
    let id = Label::create(&state.db, &payload.fields, owner).await?;
    Ok((StatusCode::CREATED, Json(Label::get_by_id(&state.db, id).await?)))
}

#[instrument(skip_all)]
pub async fn edit_label(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<EditLabel>,
) -> AppResult<Json<Label>> {
    let existing = Label::get_by_id(&state.db, payload.id).await?;
    ensure_can_modify(&claims, &existing)?;
    Label::update(&state.db, &payload, claims.owner_scope()).await?;
    info!(label_id = existing.id, "label updated");
    Ok(Json(Label::get_by_id(&state.db, existing.id).await?))
}

#[instrument(skip(state, claims))]
pub async fn delete_label(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Id>,
) -> AppResult<String> {
    let existing = Label::get_by_id(&state.db, id).await?;
    ensure_can_modify(&claims, &existing)?;
    let report = cascade::delete_label(&state.db, id, claims.owner_scope()).await?;
    info!(label_id = id, removed = report.removed, failed = report.failed, "label deleted");
    Ok(format!("label {id} has been deleted"))
}
