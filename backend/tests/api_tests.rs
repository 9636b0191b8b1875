// tests/api_tests.rs

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use sqlx::postgres::PgPoolOptions;
use testsystem::{
    config::Config,
    reviewer::Reviewers,
    routes,
    state::AppState,
    utils::jwt::{ADMIN_ROLE, sign_jwt},
};
use tower::ServiceExt;

const SECRET: &str = "test_secret_for_router_tests";

/// Router over a pool that never connects: only paths rejected before any
/// query runs can be exercised here.
fn offline_app() -> axum::Router {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://nobody@127.0.0.1:1/none")
        .expect("lazy pool");

    let config = Config {
        database_url: String::new(),
        jwt_secret: SECRET.to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
        time_for_attempt: 90,
        attempts_max: 3,
        reviewer_database_url: None,
        nosql_reviewer_url: None,
        reviewer_timeout: Duration::from_secs(1),
    };

    routes::create_router(AppState {
        pool,
        config,
        reviewers: Reviewers::unconfigured(),
    })
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn unknown_path_is_404() {
    let response = offline_app()
        .oneshot(get("/random_path_that_does_not_exist", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_requires_token() {
    let response = offline_app().oneshot(get("/api/session", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = offline_app()
        .oneshot(get("/api/session", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_students() {
    let token = sign_jwt(5, "user", SECRET, 60).unwrap();

    let response = offline_app()
        .oneshot(get("/api/admin/users", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_token_signed_elsewhere_is_rejected() {
    let token = sign_jwt(1, ADMIN_ROLE, "some_other_secret", 60).unwrap();

    let response = offline_app()
        .oneshot(get("/api/admin/users/stats?login=x", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_fails_validation_before_touching_db() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"username": "yo", "password": "password123"}"#))
        .unwrap();

    let response = offline_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
