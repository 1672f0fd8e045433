use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::{info, instrument};

use super::{
    claims::Claims,
    dto::{LoginRequest, PublicUser, RefreshQuery, SessionResponse},
    extractors::AuthUser,
    jwt::IssuedSession,
    services::check_credentials,
};
use crate::{error::AppError, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth", post(login))
        .route("/verify", get(verify))
        .route("/refresh", get(refresh))
        .route("/logout", get(logout))
}

fn session_response(jar: CookieJar, session: IssuedSession) -> Response {
    let body = SessionResponse {
        expires_at: session.expires_at,
        user: PublicUser {
            id: session.claims.sub,
            username: session.claims.username.clone(),
            is_admin: session.claims.is_admin,
        },
        token: session.token,
    };
    (jar.add(session.cookie), Json(body)).into_response()
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username is required".into()));
    }

    let identity = check_credentials(
        &state.db,
        username,
        &payload.password,
        state.config.allow_passwordless,
    )
    .await
    .map_err(|e| match e {
        // a failed login is a missing session, not a forbidden action
        AppError::Unauthorized(msg) => AppError::Unauthenticated(msg),
        other => other,
    })?;

    let session = state.keys.issue(&identity)?;
    info!(user_id = identity.id, "user logged in");
    Ok(session_response(jar, session))
}

#[instrument(skip_all)]
pub async fn verify(AuthUser(claims): AuthUser) -> Json<Claims> {
    Json(claims)
}

#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    jar: CookieJar,
    Query(query): Query<RefreshQuery>,
) -> Result<Response, AppError> {
    match state.keys.refresh(&claims, query.force)? {
        Some(session) => {
            info!(user_id = claims.sub, exp = session.claims.exp, "session refreshed");
            Ok(session_response(jar, session))
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    info!("session cookie revoked");
    (jar.add(state.keys.revoke_cookie()), "logged out")
}
