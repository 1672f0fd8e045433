use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::repo_types::{EditTask, Task, TaskFields, TaskFilter};
use crate::{
    auth::{AuthUser, Claims},
    db::Id,
    error::{AppError, AppResult},
    jobs::{handlers::ToggleQuery, Job},
    query::SortQuery,
    state::AppState,
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs/:job_id/tasks", get(list_tasks))
        .route("/jobs/:job_id/tasks/create", post(create_task))
        .route("/jobs/:job_id/tasks/edit", post(edit_task))
        .route("/jobs/:job_id/tasks/:task_id", get(get_task).delete(delete_task))
        .route("/jobs/:job_id/tasks/:task_id/complete", patch(complete_task))
}

/// The parent job, after checking the caller owns it.
async fn owned_job(state: &AppState, claims: &Claims, job_id: Id) -> AppResult<Job> {
    let job = Job::get_by_id(&state.db, job_id).await?;
    claims.ensure_can_act_for(job.user_id, "job")?;
    Ok(job)
}

async fn task_in_job(state: &AppState, job_id: Id, task_id: Id) -> AppResult<Task> {
    let task = Task::get_by_id(&state.db, task_id).await?;
    if task.job_id != job_id {
        return Err(AppError::NotFound("task"));
    }
    Ok(task)
}

#[instrument(skip(state, claims, filter, sort))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(job_id): Path<Id>,
    Query(mut filter): Query<TaskFilter>,
    Query(sort): Query<SortQuery>,
) -> AppResult<Json<Vec<Task>>> {
    owned_job(&state, &claims, job_id).await?;
    filter.job_id = job_id;
    Ok(Json(Task::list(&state.db, &filter, sort.key()).await?))
}

#[instrument(skip(state, claims))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path((job_id, task_id)): Path<(Id, Id)>,
) -> AppResult<Json<Task>> {
    owned_job(&state, &claims, job_id).await?;
    Ok(Json(task_in_job(&state, job_id, task_id).await?))
}

#[instrument(skip(state, claims, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(job_id): Path<Id>,
    Json(payload): Json<TaskFields>,
) -> AppResult<(StatusCode, Json<Task>)> {
    owned_job(&state, &claims, job_id).await?;
    let id = Task::create(&state.db, job_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(Task::get_by_id(&state.db, id).await?)))
}

#[instrument(skip(state, claims, payload))]
pub async fn edit_task(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(job_id): Path<Id>,
    Json(payload): Json<EditTask>,
) -> AppResult<Json<Task>> {
    owned_job(&state, &claims, job_id).await?;
    task_in_job(&state, job_id, payload.id).await?;
    Task::update(&state.db, &payload, Some(job_id)).await?;
    info!(task_id = payload.id, "task updated");
    Ok(Json(Task::get_by_id(&state.db, payload.id).await?))
}

#[instrument(skip(state, claims))]
pub async fn complete_task(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path((job_id, task_id)): Path<(Id, Id)>,
    Query(toggle): Query<ToggleQuery>,
) -> AppResult<Json<Task>> {
    owned_job(&state, &claims, job_id).await?;
    task_in_job(&state, job_id, task_id).await?;
    Task::set_complete(&state.db, task_id, !toggle.undo, Some(job_id)).await?;
    Ok(Json(Task::get_by_id(&state.db, task_id).await?))
}

#[instrument(skip(state, claims))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path((job_id, task_id)): Path<(Id, Id)>,
) -> AppResult<String> {
    owned_job(&state, &claims, job_id).await?;
    task_in_job(&state, job_id, task_id).await?;
    Task::delete(&state.db, task_id, Some(job_id)).await?;
    info!(task_id, job_id, "task deleted");
    Ok(format!("task {task_id} has been deleted"))
}
