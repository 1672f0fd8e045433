use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::repo_types::{EditUser, NewUser, User, UserFilter};
use crate::{
    auth::{
        password::{hash_password, validate_password, verify_password},
        services::is_valid_email,
        AuthUser,
    },
    error::{AppError, AppResult},
    query::SortQuery,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/create", post(signup))
        .route("/users/edit", post(edit_user))
        .route("/users/password", post(change_password))
        .route("/users/:username", get(get_user).delete(delete_user))
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: Option<String>,
    pub description: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: String,
}

fn normalize_email(email: Option<String>) -> AppResult<Option<String>> {
    match email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()) {
        Some(e) if !is_valid_email(&e) => Err(AppError::Validation("invalid email".into())),
        other => Ok(other),
    }
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Query(filter): Query<UserFilter>,
    Query(sort): Query<SortQuery>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(User::list(&state.db, &filter, sort.key()).await?))
}

#[instrument(skip(state, _claims))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(username): Path<String>,
) -> AppResult<Json<User>> {
    Ok(Json(User::find_by_username(&state.db, &username).await?))
}

/// Public sign-up. The first account ever created becomes an admin.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let username = payload.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::Validation("username is required".into()));
    }
    let email = normalize_email(payload.email)?;

    match User::find_by_username(&state.db, &username).await {
        Ok(_) => {
            warn!(%username, "username already registered");
            return Err(AppError::Validation("username already taken".into()));
        }
        Err(AppError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    let password_hash = match payload.password.filter(|p| !p.is_empty()) {
        Some(p) => {
            validate_password(&p).map_err(|m| AppError::Validation(m.into()))?;
            Some(hash_password(&p)?)
        }
        None => None,
    };

    let is_admin = !User::any_admin(&state.db).await?;
    let id = User::create(
        &state.db,
        &NewUser {
            username,
            email,
            description: payload.description,
            password_hash,
            is_admin,
        },
    )
    .await?;
    if is_admin {
        info!(user_id = id, "first user promoted to admin");
    }
    Ok((StatusCode::CREATED, Json(User::get_by_id(&state.db, id).await?)))
}

#[instrument(skip_all)]
pub async fn edit_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(mut payload): Json<EditUser>,
) -> AppResult<Json<User>> {
    let existing = User::get_by_id(&state.db, payload.id).await?;
    claims.ensure_can_act_for(existing.id, "user")?;

    payload.username = payload.username.trim().to_string();
    if payload.username.is_empty() {
        return Err(AppError::Validation("username is required".into()));
    }
    payload.email = normalize_email(payload.email.take())?;
    let is_admin = if claims.is_admin {
        payload.is_admin.unwrap_or(existing.is_admin)
    } else {
        existing.is_admin
    };

    User::update(&state.db, &payload, is_admin, claims.owner_scope()).await?;
    info!(user_id = existing.id, "user updated");
    Ok(Json(User::get_by_id(&state.db, existing.id).await?))
}

#[instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    let user = User::get_by_id(&state.db, claims.sub).await?;
    if let Some(hash) = user.password_hash.as_deref().filter(|h| !h.is_empty()) {
        let current = payload.current_password.as_deref().unwrap_or_default();
        if !verify_password(current, hash)? {
            return Err(AppError::Unauthorized("current password is incorrect".into()));
        }
    }
    validate_password(&payload.new_password).map_err(|m| AppError::Validation(m.into()))?;

    User::set_password(&state.db, user.id, &hash_password(&payload.new_password)?).await?;
    info!(user_id = user.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, claims))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(username): Path<String>,
) -> AppResult<String> {
    let user = User::find_by_username(&state.db, &username).await?;
    claims.ensure_can_act_for(user.id, "user")?;
    User::delete(&state.db, user.id, claims.owner_scope()).await?;
    info!(user_id = user.id, "user deleted");
    Ok(format!("user {username} has been deleted"))
}
