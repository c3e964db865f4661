//! HTTP router for the admin server.

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::auth::{self, AppState};

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the application router.
///
/// Every request, including static files and the site fallback, passes
/// through the access gate first.
pub fn router(state: Arc<AppState>, site_root: &str, static_root: &str) -> Router {
    let not_found_page = Path::new(site_root).join("404.html");
    let site = ServeDir::new(site_root).not_found_service(ServeFile::new(not_found_page));

    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/logout", post(auth::logout))
        .nest_service("/static", ServeDir::new(static_root))
        .fallback_service(site)
        .layer(from_fn_with_state(state.clone(), auth::gate_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
