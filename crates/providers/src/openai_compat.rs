//! OpenAI-compatible adapter.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM, LM Studio, Together,
//! and any other endpoint that follows the OpenAI chat completions contract.

use std::time::Duration;

use crate::traits::{ChatRequest, LlmProvider};
use crate::util::{from_reqwest, resolve_api_key};
use serde_json::Value;
use wf_domain::config::LlmConfig;
use wf_domain::error::{Error, Result};
use wf_domain::stream::{BoxStream, FinishReason, ModelDelta};
use wf_domain::tool::{ContentPart, Message, MessageContent, Role, ToolDefinition};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A streaming chat adapter for any OpenAI-compatible API endpoint.
pub struct OpenAiCompatProvider {
    id: String,
    base_url: String,
    api_key: String,
    auth_header: String,
    auth_prefix: String,
    default_model: String,
    temperature: Option<f32>,
    request_timeout: Duration,
    idle_timeout: Option<Duration>,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new provider from the `[llm]` config section.
    ///
    /// Fails when no API key can be resolved.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;
        let request_timeout = Duration::from_millis(cfg.request_timeout_ms);

        // No whole-request timeout: it would also cap how long a healthy
        // stream may run. Opening is bounded in `chat_stream` instead.
        let client = reqwest::Client::builder()
            .connect_timeout(request_timeout)
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.provider_id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            auth_header: cfg
                .auth
                .header
                .clone()
                .unwrap_or_else(|| "Authorization".into()),
            auth_prefix: cfg.auth.prefix.clone().unwrap_or_else(|| "Bearer ".into()),
            default_model: cfg.model.clone(),
            temperature: cfg.temperature,
            request_timeout,
            idle_timeout: cfg.stream_idle_timeout_ms.map(Duration::from_millis),
            client,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    // ── Internal: build authenticated request builder ──────────────

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        let header_value = format!("{}{}", self.auth_prefix, self.api_key);
        self.client
            .post(url)
            .header(&self.auth_header, &header_value)
            .header("Content-Type", "application/json")
    }

    // ── Internal: build the JSON body ─────────────────────────────

    fn build_chat_body(&self, req: &ChatRequest) -> Value {
        let messages: Vec<Value> = req.messages.iter().map(msg_to_openai).collect();
        let model = req
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": true,
        });

        if !req.tools.is_empty() {
            let tools: Vec<Value> = req.tools.iter().map(tool_to_openai).collect();
            body["tools"] = Value::Array(tools);
        }
        if let Some(temp) = req.temperature.or(self.temperature) {
            body["temperature"] = serde_json::json!(temp);
        }
        body
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message serialization helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub(crate) fn msg_to_openai(msg: &Message) -> Value {
    match msg.role {
        Role::Tool => tool_result_to_openai(msg),
        Role::Assistant => assistant_to_openai(msg),
        _ => serde_json::json!({
            "role": msg.role.as_str(),
            "content": msg.content.extract_all_text(),
        }),
    }
}

fn assistant_to_openai(msg: &Message) -> Value {
    let mut obj = serde_json::json!({"role": "assistant"});
    let mut text_parts: Vec<&str> = Vec::new();
    let mut tool_calls: Vec<Value> = Vec::new();

    match &msg.content {
        MessageContent::Text(t) => text_parts.push(t),
        MessageContent::Parts(parts) => {
            for part in parts {
                match part {
                    ContentPart::Text { text } => text_parts.push(text),
                    ContentPart::ToolUse { id, name, input } => {
                        tool_calls.push(serde_json::json!({
                            "id": id,
                            "type": "function",
                            "function": {
                                "name": name,
                                "arguments": input.to_string(),
                            }
                        }));
                    }
                    ContentPart::ToolResult { .. } => {}
                }
            }
        }
    }

    obj["content"] = if text_parts.is_empty() {
        Value::Null
    } else {
        Value::String(text_parts.join("\n"))
    };
    if !tool_calls.is_empty() {
        obj["tool_calls"] = Value::Array(tool_calls);
    }
    obj
}

fn tool_result_to_openai(msg: &Message) -> Value {
    let found = match &msg.content {
        MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
            ContentPart::ToolResult {
                tool_use_id,
                content,
                ..
            } => Some((tool_use_id.as_str(), content.as_str())),
            _ => None,
        }),
        MessageContent::Text(t) => Some(("", t.as_str())),
    };
    let (id, content) = found.unwrap_or(("", ""));
    serde_json::json!({
        "role": "tool",
        "tool_call_id": id,
        "content": content,
    })
}

fn tool_to_openai(tool: &ToolDefinition) -> Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SSE streaming helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decode one `data:` payload into zero or more deltas.
///
/// A single chunk may carry text, several tool-call entries and a finish
/// reason at once; they are returned in that order.
pub(crate) fn parse_sse_data(data: &str) -> Vec<Result<ModelDelta>> {
    if data.trim() == "[DONE]" {
        return Vec::new();
    }

    let v: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => return vec![Err(Error::Json(e))],
    };

    // Some gateways report failures in-band.
    if let Some(err) = v.get("error") {
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from)
            .unwrap_or_else(|| err.to_string());
        return vec![Err(Error::Provider {
            provider: "openai_compat".into(),
            message,
        })];
    }

    let choice = match v
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
    {
        Some(c) => c,
        // Usage-only or keep-alive chunk.
        None => return Vec::new(),
    };

    let mut out = Vec::new();
    let delta = choice.get("delta").unwrap_or(&Value::Null);

    if let Some(text) = delta.get("content").and_then(|v| v.as_str()) {
        if !text.is_empty() {
            out.push(Ok(ModelDelta::Content(text.to_string())));
        }
    }

    if let Some(tc_arr) = delta.get("tool_calls").and_then(|v| v.as_array()) {
        for tc in tc_arr {
            let index = tc
                .get("index")
                .and_then(|v| v.as_u64())
                .map_or(0, |i| u32::try_from(i).unwrap_or(u32::MAX));
            let func = tc.get("function");
            out.push(Ok(ModelDelta::ToolCallFragment {
                index,
                call_id: tc.get("id").and_then(|v| v.as_str()).map(String::from),
                name: func
                    .and_then(|f| f.get("name"))
                    .and_then(|v| v.as_str())
                    .map(String::from),
                args_chunk: func
                    .and_then(|f| f.get("arguments"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
            }));
        }
    } else if let Some(func) = delta.get("function_call") {
        // Legacy single-function form: no id, always slot 0.
        out.push(Ok(ModelDelta::ToolCallFragment {
            index: 0,
            call_id: None,
            name: func.get("name").and_then(|v| v.as_str()).map(String::from),
            args_chunk: func
                .get("arguments")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
        }));
    }

    if let Some(fr) = choice.get("finish_reason").and_then(|f| f.as_str()) {
        out.push(Ok(ModelDelta::Finish(FinishReason::from(fr))));
    }

    out
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn chat_stream(
        &self,
        req: ChatRequest,
    ) -> Result<BoxStream<'static, Result<ModelDelta>>> {
        let url = self.chat_url();
        let body = self.build_chat_body(&req);
        let provider_id = self.id.clone();

        tracing::debug!(
            provider = %self.id,
            url = %url,
            messages = req.messages.len(),
            tools = req.tools.len(),
            "openai_compat stream request"
        );

        let send = self.authed_post(&url).json(&body).send();
        let resp = tokio::time::timeout(self.request_timeout, send)
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "{provider_id}: no response headers within {} ms",
                    self.request_timeout.as_millis()
                ))
            })?
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let err_text = resp.text().await.map_err(from_reqwest)?;
            return Err(Error::Provider {
                provider: provider_id,
                message: format!("HTTP {} - {}", status.as_u16(), err_text),
            });
        }

        Ok(crate::sse::sse_response_stream(
            resp,
            provider_id,
            self.idle_timeout,
            parse_sse_data,
        ))
    }

    fn provider_id(&self) -> &str {
        &self.id
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use wf_domain::tool::ToolCall;

    fn ok(v: Vec<Result<ModelDelta>>) -> Vec<ModelDelta> {
        v.into_iter().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn parses_content_delta() {
        let d = ok(parse_sse_data(
            r#"{"choices":[{"index":0,"delta":{"content":"Bonjour"},"finish_reason":null}]}"#,
        ));
        assert_eq!(d, vec![ModelDelta::content("Bonjour")]);
    }

    #[test]
    fn done_sentinel_yields_nothing() {
        assert!(parse_sse_data("[DONE]").is_empty());
    }

    #[test]
    fn parses_tool_call_announcement_and_fragment() {
        let first = ok(parse_sse_data(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_abc","type":"function","function":{"name":"getCountryInfo","arguments":""}}]}}]}"#,
        ));
        assert_eq!(
            first,
            vec![ModelDelta::ToolCallFragment {
                index: 0,
                call_id: Some("call_abc".into()),
                name: Some("getCountryInfo".into()),
                args_chunk: String::new(),
            }]
        );

        let next = ok(parse_sse_data(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"coun"}}]}}]}"#,
        ));
        assert_eq!(
            next,
            vec![ModelDelta::ToolCallFragment {
                index: 0,
                call_id: None,
                name: None,
                args_chunk: "{\"coun".into(),
            }]
        );
    }

    #[test]
    fn oversized_tool_index_saturates_instead_of_wrapping() {
        // 2^32 would truncate to slot 0.
        let d = ok(parse_sse_data(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":4294967296,"function":{"arguments":"x"}}]}}]}"#,
        ));
        match &d[..] {
            [ModelDelta::ToolCallFragment { index, .. }] => assert_eq!(*index, u32::MAX),
            other => panic!("unexpected deltas: {other:?}"),
        }
    }

    #[test]
    fn parses_finish_reason() {
        let d = ok(parse_sse_data(
            r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#,
        ));
        assert_eq!(d, vec![ModelDelta::Finish(FinishReason::ToolCalls)]);
    }

    #[test]
    fn content_and_finish_in_one_chunk_keep_order() {
        let d = ok(parse_sse_data(
            r#"{"choices":[{"delta":{"content":"bye"},"finish_reason":"stop"}]}"#,
        ));
        assert_eq!(
            d,
            vec![
                ModelDelta::content("bye"),
                ModelDelta::Finish(FinishReason::Stop)
            ]
        );
    }

    #[test]
    fn parses_legacy_function_call() {
        let d = ok(parse_sse_data(
            r#"{"choices":[{"delta":{"function_call":{"name":"getCountryInfo","arguments":"{}"}}}]}"#,
        ));
        assert_eq!(
            d,
            vec![ModelDelta::ToolCallFragment {
                index: 0,
                call_id: None,
                name: Some("getCountryInfo".into()),
                args_chunk: "{}".into(),
            }]
        );
    }

    #[test]
    fn usage_only_chunk_is_ignored() {
        assert!(parse_sse_data(r#"{"choices":[],"usage":{"total_tokens":5}}"#).is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let d = parse_sse_data("{not json");
        assert_eq!(d.len(), 1);
        assert!(matches!(d[0], Err(Error::Json(_))));
    }

    #[test]
    fn in_band_error_is_a_provider_error() {
        let d = parse_sse_data(r#"{"error":{"message":"rate limited"}}"#);
        match &d[0] {
            Err(Error::Provider { message, .. }) => assert_eq!(message, "rate limited"),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn tool_round_trip_messages_serialize_to_openai_shape() {
        let call = ToolCall {
            call_id: "call_1".into(),
            tool_name: "getCountryInfo".into(),
            arguments: serde_json::json!({"country": "Japan"}),
        };
        let assistant = msg_to_openai(&Message::assistant_tool_call(&call));
        assert_eq!(assistant["role"], "assistant");
        assert!(assistant["content"].is_null());
        assert_eq!(assistant["tool_calls"][0]["id"], "call_1");
        assert_eq!(
            assistant["tool_calls"][0]["function"]["arguments"],
            r#"{"country":"Japan"}"#
        );

        let result = msg_to_openai(&Message::tool_result("call_1", r#"{"capital":"Tokyo"}"#, false));
        assert_eq!(result["role"], "tool");
        assert_eq!(result["tool_call_id"], "call_1");
        assert_eq!(result["content"], r#"{"capital":"Tokyo"}"#);
    }

    #[test]
    fn plain_messages_serialize_role_and_text() {
        let v = msg_to_openai(&Message::system("be helpful"));
        assert_eq!(v, serde_json::json!({"role": "system", "content": "be helpful"}));
    }
}
