//! Route modules

pub mod config;
pub mod extraction;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
///
/// `api_prefix` is the configured API_V1_STR (default `/api/v1`).
pub fn app(state: AppState, api_prefix: &str) -> Router {
    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(read_root))
        .route("/health", get(health_check))
        .nest(
            &format!("{}/extraction", api_prefix),
            extraction::router(),
        )
        .nest(&format!("{}/config", api_prefix), config::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct RootResponse {
    message: String,
}

/// GET /
async fn read_root(State(state): State<AppState>) -> Json<RootResponse> {
    let project_name = state.settings().read().await.project_name.clone();
    Json(RootResponse {
        message: format!("Welcome to {} API", project_name),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
