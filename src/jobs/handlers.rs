use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::repo_types::{EditJob, Job, JobFilter, NewJob};
use crate::{
    auth::AuthUser,
    cascade,
    db::Id,
    error::{AppError, AppResult},
    labels::{JobLabel, JobLabelFilter, Label},
    query::SortQuery,
    state::AppState,
};

pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/create", post(create_job))
        .route("/jobs/edit", post(edit_job))
        .route("/jobs/:job_id", get(get_job).delete(delete_job))
        .route("/jobs/:job_id/complete", patch(complete_job))
        .route(
            "/jobs/:job_id/labels/:label_id",
            post(assign_label).delete(unassign_label),
        )
}

#[derive(Debug, Deserialize)]
pub struct ToggleQuery {
    /// `?undo=true` reverses the toggle.
    #[serde(default)]
    pub undo: bool,
}

#[instrument(skip_all)]
pub async fn list_jobs(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(mut filter): Query<JobFilter>,
    Query(sort): Query<SortQuery>,
) -> AppResult<Json<Vec<Job>>> {
    if !claims.is_admin {
        filter.user_id = Some(claims.sub);
    }
    Ok(Json(Job::list(&state.db, &filter, sort.key()).await?))
}

#[instrument(skip(state, claims))]
pub async fn get_job(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(job_id): Path<Id>,
) -> AppResult<Json<Job>> {
    let job = Job::get_by_id(&state.db, job_id).await?;
    claims.ensure_can_act_for(job.user_id, "job")?;
    Ok(Json(job))
}

#[instrument(skip_all)]
pub async fn create_job(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<NewJob>,
) -> AppResult<(StatusCode, Json<Job>)> {
    let owner = claims.resolve_owner(payload.user_id, "jobs")?;
    let id = Job::create(&state.db, &payload.fields, owner).await?;
    Ok((StatusCode::CREATED, Json(Job::get_by_id(&state.db, id).await?)))
}

#[instrument(skip_all)]
pub async fn edit_job(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<EditJob>,
) -> AppResult<Json<Job>> {
    let existing = Job::get_by_id(&state.db, payload.id).await?;
    claims.ensure_can_act_for(existing.user_id, "job")?;
    Job::update(&state.db, &payload, existing.user_id, claims.owner_scope()).await?;
    info!(job_id = existing.id, "job updated");
    Ok(Json(Job::get_by_id(&state.db, existing.id).await?))
}

#[instrument(skip(state, claims))]
pub async fn complete_job(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(job_id): Path<Id>,
    Query(toggle): Query<ToggleQuery>,
) -> AppResult<Json<Job>> {
    let job = Job::get_by_id(&state.db, job_id).await?;
    claims.ensure_can_act_for(job.user_id, "job")?;
    Job::set_complete(&state.db, job_id, !toggle.undo, claims.owner_scope()).await?;
    Ok(Json(Job::get_by_id(&state.db, job_id).await?))
}

#[instrument(skip(state, claims))]
pub async fn delete_job(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(job_id): Path<Id>,
) -> AppResult<String> {
    let report = cascade::delete_job(&state.db, job_id, claims.owner_scope()).await?;
    info!(job_id, removed = report.removed, failed = report.failed, "job deleted");
    Ok(format!("job {job_id} has been deleted"))
}

/// Loads both ends of an assignment and checks the caller may touch them.
async fn assignment_ends(state: &AppState, claims: &crate::auth::Claims, job_id: Id, label_id: Id) -> AppResult<()> {
    let job = Job::get_by_id(&state.db, job_id).await?;
    claims.ensure_can_act_for(job.user_id, "job")?;
    let label = Label::get_by_id(&state.db, label_id).await?;
    if let Some(owner) = label.user_id {
        if owner != job.user_id {
            return Err(AppError::Validation("label belongs to another user".into()));
        }
    }
    Ok(())
}

#[instrument(skip(state, claims))]
pub async fn assign_label(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path((job_id, label_id)): Path<(Id, Id)>,
) -> AppResult<StatusCode> {
    assignment_ends(&state, &claims, job_id, label_id).await?;
    let existing = JobLabel::list(
        &state.db,
        &JobLabelFilter { job_id: Some(job_id), label_id: Some(label_id) },
    )
    .await?;
    if !existing.is_empty() {
        return Ok(StatusCode::OK);
    }
    JobLabel::assign(&state.db, job_id, label_id).await?;
    info!(job_id, label_id, "label assigned");
    Ok(StatusCode::CREATED)
}

#[instrument(skip(state, claims))]
pub async fn unassign_label(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path((job_id, label_id)): Path<(Id, Id)>,
) -> AppResult<StatusCode> {
    assignment_ends(&state, &claims, job_id, label_id).await?;
    JobLabel::unassign(&state.db, job_id, label_id).await?;
    info!(job_id, label_id, "label unassigned");
    Ok(StatusCode::NO_CONTENT)
}
