//! Chat endpoint: one POST per user turn, answered with raw chunked text.
//!
//! - `POST {endpoint_path}` (default `/api/stream`)

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use futures_util::{Stream, StreamExt};

use wf_domain::turn::ChatApiRequest;

use crate::runtime::{handle_turn, TextStream, TurnError, TurnInput};
use crate::state::AppState;

/// Fixed body returned when a turn cannot start.
pub const ERROR_BODY: &str = "Error processing request";

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

impl IntoResponse for TurnError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, TEXT_PLAIN_UTF8)],
            ERROR_BODY,
        )
            .into_response()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/stream
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn stream_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatApiRequest>,
) -> Response {
    if body.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "message must not be empty" })),
        )
            .into_response();
    }

    let input = TurnInput {
        message: body.message,
        profile: body.user_answers,
        history: body.conversation_history,
    };

    match handle_turn(&state, input).await {
        Ok(stream) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, TEXT_PLAIN_UTF8),
                (header::CACHE_CONTROL, "no-cache"),
                (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            ],
            Body::from_stream(flush_before_abort(stream)),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Hand control back to the runtime before surfacing a fault.
///
/// hyper aborts the connection on a body error without flushing what it has
/// buffered, so fragments yielded in the same poll burst as the fault (and
/// the status line, if nothing was flushed yet) would never reach the client.
/// The extra `Pending` lets the connection flush first.
fn flush_before_abort(
    mut stream: TextStream,
) -> impl Stream<Item = Result<String, TurnError>> + Send + 'static {
    async_stream::stream! {
        while let Some(item) = stream.next().await {
            if item.is_err() {
                tokio::task::yield_now().await;
            }
            yield item;
        }
    }
}
