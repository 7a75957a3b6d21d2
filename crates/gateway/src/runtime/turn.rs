//! Stream session controller: phase 1, an optional tool call, then phase 2.
//!
//! Entry point: [`handle_turn`] opens phase 1 and returns the outbound text
//! stream. Everything after the first model delta happens lazily, as the
//! HTTP body is polled.

use futures_util::StreamExt;
use tracing::Instrument;

use wf_domain::stream::{BoxStream, ModelDelta};
use wf_domain::tool::Message;
use wf_domain::turn::{HistoryEntry, UserProfile};
use wf_providers::ChatRequest;

use crate::state::AppState;

use super::accumulator::{Outcome, ToolCallAccumulator};
use super::{history, prompt};

/// Sent instead of phase 2 when the tool call cannot be run.
pub const TOOL_APOLOGY: &str =
    "Sorry, I couldn't look up that information just now. Could you try asking again?";

/// Outbound text fragments, in model order.
pub type TextStream = BoxStream<'static, Result<String, TurnError>>;

/// Faults that end a turn.
#[derive(thiserror::Error, Debug)]
pub enum TurnError {
    /// The model provider failed to open or to deliver a stream.
    #[error(transparent)]
    Provider(#[from] wf_domain::error::Error),
}

/// Input to a single turn.
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    pub message: String,
    pub profile: Option<UserProfile>,
    pub history: Vec<HistoryEntry>,
}

/// Run one chat turn.
///
/// Resolves once phase 1 is open and its first delta has arrived, so a
/// provider that fails immediately is reported as `Err` before any bytes are
/// sent. Later faults surface as an `Err` item in the returned stream.
pub async fn handle_turn(state: &AppState, input: TurnInput) -> Result<TextStream, TurnError> {
    let request_id = uuid::Uuid::new_v4();
    let provider = state.provider.clone();
    let executor = state.tools.clone();
    let temperature = state.config.llm.temperature;

    let turn_span = tracing::info_span!(
        "turn",
        %request_id,
        provider = %provider.provider_id(),
        history_len = input.history.len(),
    );

    let window = history::window(&input.history, state.config.chat.history_window);
    let mut messages = prompt::compose(input.profile.as_ref(), window, &input.message);
    let tools = executor.definitions();
    tracing::debug!(parent: &turn_span, messages = messages.len(), "prompt composed");

    // ── Phase 1 ──────────────────────────────────────────────────────
    let phase1_span = tracing::info_span!(
        parent: &turn_span,
        "llm.call",
        phase = 1u8,
        model = %provider.default_model(),
    );
    let req = ChatRequest {
        messages: messages.clone(),
        tools: tools.clone(),
        temperature,
        model: None,
    };
    let mut phase1 = match provider.chat_stream(req).instrument(phase1_span.clone()).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(parent: &turn_span, error = %e, "phase 1 failed to open");
            return Err(e.into());
        }
    };

    let first = phase1.next().instrument(phase1_span.clone()).await;
    if let Some(Err(e)) = first {
        tracing::error!(parent: &turn_span, error = %e, "phase 1 failed before first delta");
        return Err(e.into());
    }

    let stream = async_stream::stream! {
        let mut acc = ToolCallAccumulator::new();
        let mut prefetched = Some(first);

        loop {
            let item = match prefetched.take() {
                Some(item) => item,
                None => phase1.next().instrument(phase1_span.clone()).await,
            };
            let Some(item) = item else { break };
            match item {
                Ok(delta) => {
                    if let Some(text) = acc.ingest(delta) {
                        yield Ok(text);
                    }
                    if acc.is_complete() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(parent: &turn_span, error = %e, phase = 1u8, "model stream failed");
                    yield Err(TurnError::from(e));
                    return;
                }
            }
        }
        drop(phase1);

        if acc.ignored_fragments() > 0 {
            tracing::debug!(
                parent: &turn_span,
                ignored = acc.ignored_fragments(),
                "dropped fragments outside the active tool slot",
            );
        }

        let call = match acc.finish() {
            Outcome::NoToolCall => {
                tracing::debug!(parent: &turn_span, "turn finished without a tool call");
                return;
            }
            Outcome::Incomplete(call) => {
                tracing::warn!(
                    parent: &turn_span,
                    call_id = %call.call_id,
                    function = %call.function_name,
                    "tool call never completed",
                );
                yield Ok(TOOL_APOLOGY.to_string());
                return;
            }
            Outcome::Complete(call) => call,
        };

        // ── Tool call ────────────────────────────────────────────────
        let tool_call = match call.into_tool_call() {
            Ok(tc) => tc,
            Err(e) => {
                tracing::warn!(parent: &turn_span, error = %e, "unparseable tool arguments");
                yield Ok(TOOL_APOLOGY.to_string());
                return;
            }
        };

        let tool_span = tracing::info_span!(
            parent: &turn_span,
            "tool.call",
            tool_name = %tool_call.tool_name,
            call_id = %tool_call.call_id,
        );
        let output = match tool_span.in_scope(|| executor.execute(&tool_call)) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(parent: &tool_span, error = %e, "tool call rejected");
                yield Ok(TOOL_APOLOGY.to_string());
                return;
            }
        };
        tracing::debug!(parent: &tool_span, is_error = output.is_error, "tool finished");

        messages.push(Message::assistant_tool_call(&tool_call));
        messages.push(Message::tool_result(
            tool_call.call_id.as_str(),
            output.to_message_content(),
            output.is_error,
        ));

        // ── Phase 2 ──────────────────────────────────────────────────
        let phase2_span = tracing::info_span!(
            parent: &turn_span,
            "llm.call",
            phase = 2u8,
            model = %provider.default_model(),
        );
        let req = ChatRequest {
            messages,
            tools,
            temperature,
            model: None,
        };
        let mut phase2 = match provider.chat_stream(req).instrument(phase2_span.clone()).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(parent: &turn_span, error = %e, "phase 2 failed to open");
                yield Err(TurnError::from(e));
                return;
            }
        };

        let mut ignored = 0usize;
        while let Some(item) = phase2.next().instrument(phase2_span.clone()).await {
            match item {
                Ok(ModelDelta::Content(text)) => {
                    if !text.is_empty() {
                        yield Ok(text);
                    }
                }
                // One tool call per turn: a second request is never honoured.
                Ok(ModelDelta::ToolCallFragment { .. }) => ignored += 1,
                Ok(ModelDelta::Finish(reason)) => {
                    tracing::debug!(parent: &phase2_span, %reason, "phase 2 finished");
                }
                Err(e) => {
                    tracing::error!(parent: &turn_span, error = %e, phase = 2u8, "model stream failed");
                    yield Err(TurnError::from(e));
                    return;
                }
            }
        }
        if ignored > 0 {
            tracing::warn!(parent: &turn_span, ignored, "phase 2 asked for another tool call");
        }
    };

    Ok(Box::pin(stream))
}
