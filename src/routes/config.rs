//! Configuration routes
//!
//! Admin surface for the Gemini API key:
//! - GET /gemini-key - whether a key is configured, plus a masked preview
//! - POST /gemini-key - rotate the key: rewrite .env, update the running config

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::config::{find_env_file, mask_key, rotate_key_in_file};
use crate::error::Result;
use crate::state::AppState;

/// Create the config router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/gemini-key", get(get_gemini_key_status))
        .route("/gemini-key", post(update_gemini_key))
}

#[derive(Serialize)]
struct GeminiKeyStatus {
    is_set: bool,
    key: Option<String>,
}

/// GET /gemini-key
async fn get_gemini_key_status(State(state): State<AppState>) -> Json<GeminiKeyStatus> {
    let key = state.settings().read().await.gemini_api_key.clone();
    let is_set = !key.is_empty();

    Json(GeminiKeyStatus {
        is_set,
        key: is_set.then(|| mask_key(&key)),
    })
}

#[derive(Deserialize)]
pub struct GeminiKeyUpdate {
    pub key: String,
}

#[derive(Serialize)]
struct GeminiKeyUpdated {
    message: String,
    status: String,
}

/// POST /gemini-key
///
/// Rewrites the GEMINI_API_KEY line in the .env file, then swaps the
/// in-memory key under the settings write lock so the next upload uses the
/// new credential. The file rewrite is not guarded against concurrent
/// rotations; last writer wins.
async fn update_gemini_key(
    State(state): State<AppState>,
    Json(update): Json<GeminiKeyUpdate>,
) -> Result<Json<GeminiKeyUpdated>> {
    let new_key = update.key.trim().to_string();

    let env_path = find_env_file(state.env_path());
    rotate_key_in_file(&env_path, &new_key)?;

    state.settings().write().await.gemini_api_key = new_key;
    tracing::info!("Gemini API key rotated, running configuration reloaded");

    Ok(Json(GeminiKeyUpdated {
        message: "API Key updated. Configuration reloaded.".to_string(),
        status: "reloaded".to_string(),
    }))
}
