pub mod chat;
pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the API router.
///
/// The chat route lives at the configured `chat.endpoint_path`.
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route(&state.config.chat.endpoint_path, post(chat::stream_chat))
}
