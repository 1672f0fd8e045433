use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wrenchturn::{app::build_app, state::AppState};

async fn spawn_app() -> Router {
    let state = AppState::fake().await.expect("Failed to create app state");
    build_app(state)
}

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    body: Value,
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    Reply { status, cookie, body }
}

async fn signup(app: &Router, username: &str, password: Option<&str>) -> Value {
    let reply = send(
        app,
        "POST",
        "/users/create",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.body
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let reply = send(
        app,
        "POST",
        "/auth",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    reply.body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_signup_and_login() {
    let app = spawn_app().await;

    let first = signup(&app, "alice", Some("Password123")).await;
    assert_eq!(first["isAdmin"], json!(true));
    assert!(first.get("passwordHash").is_none());
    let second = signup(&app, "bob", None).await;
    assert_eq!(second["isAdmin"], json!(false));

    let dup = send(&app, "POST", "/users/create", None, Some(json!({ "username": "bob" }))).await;
    assert_eq!(dup.status, StatusCode::BAD_REQUEST);

    let wrong = send(
        &app,
        "POST",
        "/auth",
        None,
        Some(json!({ "username": "alice", "password": "nope" })),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let ghost = send(&app, "POST", "/auth", None, Some(json!({ "username": "ghost" }))).await;
    assert_eq!(ghost.status, StatusCode::NOT_FOUND);

    let ok = send(
        &app,
        "POST",
        "/auth",
        None,
        Some(json!({ "username": "alice", "password": "Password123" })),
    )
    .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["user"]["username"], json!("alice"));
    let cookie = ok.cookie.expect("session cookie");
    assert!(cookie.starts_with("wrenchturn-jwt="));
    assert!(cookie.contains("HttpOnly"));

    // passwordless account signs in on username alone
    login(&app, "bob", "").await;
}

#[tokio::test]
async fn test_session_endpoints() {
    let app = spawn_app().await;
    signup(&app, "alice", Some("Password123")).await;
    let token = login(&app, "alice", "Password123").await;

    let anon = send(&app, "GET", "/verify", None, None).await;
    assert_eq!(anon.status, StatusCode::UNAUTHORIZED);

    let verified = send(&app, "GET", "/verify", Some(&token), None).await;
    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.body["username"], json!("alice"));
    assert_eq!(verified.body["is_admin"], json!(true));

    let by_cookie = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/verify")
                .header(header::COOKIE, format!("wrenchturn-jwt={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(by_cookie.status(), StatusCode::OK);

    let not_due = send(&app, "GET", "/refresh", Some(&token), None).await;
    assert_eq!(not_due.status, StatusCode::NO_CONTENT);

    let forced = send(&app, "GET", "/refresh?force=true", Some(&token), None).await;
    assert_eq!(forced.status, StatusCode::OK);
    assert_ne!(forced.body["token"], json!(token));

    let garbage = send(&app, "GET", "/refresh?force=true", Some("garbage"), None).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);

    let logout = send(&app, "GET", "/logout", None, None).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert!(logout.cookie.unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn test_ownership_is_enforced() {
    let app = spawn_app().await;
    signup(&app, "alice", Some("Password123")).await;
    signup(&app, "bob", Some("Password456")).await;
    let alice = login(&app, "alice", "Password123").await;
    let bob = login(&app, "bob", "Password456").await;

    let created = send(
        &app,
        "POST",
        "/vehicles/create",
        Some(&bob),
        Some(json!({ "name": "Bob's truck", "make": "Ford" })),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let vehicle_id = created.body["id"].as_i64().unwrap();

    let mine = send(&app, "POST", "/vehicles/create", Some(&alice), Some(json!({ "name": "Civic" }))).await;
    let alice_vehicle = mine.body["id"].as_i64().unwrap();

    let foreign = send(&app, "GET", &format!("/vehicles/{alice_vehicle}"), Some(&bob), None).await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);
    let foreign_delete = send(&app, "DELETE", &format!("/vehicles/{alice_vehicle}"), Some(&bob), None).await;
    assert_eq!(foreign_delete.status, StatusCode::FORBIDDEN);

    let missing = send(&app, "GET", "/vehicles/9999", Some(&bob), None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    // bob only sees his own vehicles; the admin sees everything
    let listed = send(&app, "GET", "/vehicles", Some(&bob), None).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
    let all = send(&app, "GET", "/vehicles?sort=az", Some(&alice), None).await;
    assert_eq!(all.body.as_array().unwrap().len(), 2);

    let edited = send(
        &app,
        "POST",
        "/vehicles/edit",
        Some(&alice),
        Some(json!({ "id": vehicle_id, "name": "Renamed by admin" })),
    )
    .await;
    assert_eq!(edited.status, StatusCode::OK);
    assert_eq!(edited.body["name"], json!("Renamed by admin"));
    assert_eq!(edited.body["userId"], json!(created.body["userId"]));
}

#[tokio::test]
async fn test_vehicle_delete_cascades() {
    let app = spawn_app().await;
    signup(&app, "alice", Some("Password123")).await;
    let token = login(&app, "alice", "Password123").await;
    let t = Some(token.as_str());

    let v = send(&app, "POST", "/vehicles/create", t, Some(json!({ "name": "V" }))).await;
    let v = v.body["id"].as_i64().unwrap();
    let j = send(&app, "POST", "/jobs/create", t, Some(json!({ "name": "J", "vehicleId": v }))).await;
    assert_eq!(j.status, StatusCode::CREATED);
    let j = j.body["id"].as_i64().unwrap();

    let task = send(&app, "POST", &format!("/jobs/{j}/tasks/create"), t, Some(json!({ "name": "T" }))).await;
    assert_eq!(task.status, StatusCode::CREATED);
    let task_id = task.body["id"].as_i64().unwrap();
    let done = send(&app, "PATCH", &format!("/jobs/{j}/tasks/{task_id}/complete"), t, None).await;
    assert_eq!(done.body["isComplete"], json!(true));

    let alert = send(&app, "POST", "/alerts/create", t, Some(json!({ "name": "A", "jobId": j }))).await;
    assert_eq!(alert.status, StatusCode::CREATED);
    let l = send(&app, "POST", "/labels/create", t, Some(json!({ "name": "L", "color": "#ff0000" }))).await;
    let l = l.body["id"].as_i64().unwrap();
    let assigned = send(&app, "POST", &format!("/jobs/{j}/labels/{l}"), t, None).await;
    assert_eq!(assigned.status, StatusCode::CREATED);

    let labelled = send(&app, "GET", &format!("/jobs?label={l}"), t, None).await;
    assert_eq!(labelled.body.as_array().unwrap().len(), 1);

    let deleted = send(&app, "DELETE", &format!("/vehicles/{v}"), t, None).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let jobs = send(&app, "GET", &format!("/jobs?vehicle={v}"), t, None).await;
    assert!(jobs.body.as_array().unwrap().is_empty());
    let gone = send(&app, "GET", &format!("/jobs/{j}"), t, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    let alerts = send(&app, "GET", &format!("/alerts?job={j}"), t, None).await;
    assert!(alerts.body.as_array().unwrap().is_empty());
    let label = send(&app, "GET", &format!("/labels/{l}"), t, None).await;
    assert_eq!(label.status, StatusCode::OK);
    let labelled = send(&app, "GET", &format!("/jobs?label={l}"), t, None).await;
    assert!(labelled.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_errors() {
    let app = spawn_app().await;
    signup(&app, "alice", Some("Password123")).await;
    let token = login(&app, "alice", "Password123").await;
    let t = Some(token.as_str());

    let weak = send(
        &app,
        "POST",
        "/users/create",
        None,
        Some(json!({ "username": "carol", "password": "short" })),
    )
    .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);

    let bad_vehicle = send(&app, "POST", "/jobs/create", t, Some(json!({ "name": "J", "vehicleId": 404 }))).await;
    assert_eq!(bad_vehicle.status, StatusCode::BAD_REQUEST);

    let bad_color = send(&app, "POST", "/labels/create", t, Some(json!({ "name": "L", "color": "red" }))).await;
    assert_eq!(bad_color.status, StatusCode::BAD_REQUEST);

    let reminder = send(
        &app,
        "POST",
        "/alerts/create",
        t,
        Some(json!({ "name": "Inspection", "type": "reminder" })),
    )
    .await;
    assert_eq!(reminder.status, StatusCode::BAD_REQUEST);

    let bob = signup(&app, "bob", None).await;
    let taken = send(
        &app,
        "POST",
        "/users/edit",
        t,
        Some(json!({ "id": bob["id"], "username": "alice" })),
    )
    .await;
    assert_eq!(taken.status, StatusCode::BAD_REQUEST);
}
