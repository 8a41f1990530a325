// src/routes.rs

use axum::{
    Router, http::Method,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{assessment, mastery},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges the mastery and assessment sub-routers.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (stores, session registry).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let mastery_routes = Router::new()
        .route("/requests", post(mastery::request_certification))
        .route("/requests/{id}/approve", post(mastery::approve))
        .route("/status", get(mastery::status));

    let assessment_routes = Router::new()
        .route("/{request_id}/start", post(assessment::start))
        .route(
            "/{request_id}",
            get(assessment::view).delete(assessment::abandon),
        )
        .route("/{request_id}/answer", post(assessment::answer));

    Router::new()
        .nest("/api/mastery", mastery_routes)
        .nest("/api/assessment", assessment_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
