// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, rk, session},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * `/api/auth` is public.
/// * `/api/rks` and `/api/session` need a valid token.
/// * `/api/admin` additionally needs the admin role.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let rk_routes = Router::new()
        .route("/", get(rk::list_rks))
        .route("/{id}/start", post(rk::start_session));

    let session_routes = Router::new()
        .route("/", get(session::current_session))
        .route("/questions/{id}", put(session::submit_answer))
        .route("/finish", post(session::finish_session));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_students))
        .route("/users/stats", get(admin::user_stats))
        .route(
            "/session-questions/{id}/records",
            get(admin::session_question_records),
        )
        .route("/rks", get(admin::list_rks).post(admin::create_rk))
        .route("/rks/{id}", put(admin::update_rk))
        .route("/rks/{id}/questions", get(admin::list_rk_questions))
        .route("/questions", post(admin::create_question))
        .route(
            "/questions/{id}",
            put(admin::update_question).delete(admin::delete_question),
        )
        .route("/questions/{id}/answers", post(admin::create_answer))
        .route(
            "/questions/{id}/right-answers",
            post(admin::create_right_answer),
        )
        // Auth runs first, then the admin check
        .layer(middleware::from_fn(admin_middleware));

    let protected = Router::new()
        .nest("/api/rks", rk_routes)
        .nest("/api/session", session_routes)
        .nest("/api/admin", admin_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
