//! Tool call accumulation over a phase-1 model stream.
//!
//! ```text
//!   Idle ──(fragment naming a function)──▶ Accumulating ──(finish: tool_calls)──▶ Complete
//!    │                                        │
//!    └── text forwarded in every state ───────┘
//! ```
//!
//! One slot per request: once a call is being accumulated, fragments for any
//! other call slot are dropped.

use wf_domain::stream::{FinishReason, ModelDelta};
use wf_domain::tool::ToolCall;

/// Text sent to the client the moment a tool call starts.
pub const TOOL_PLACEHOLDER: &str = "Getting your information...";

fn placeholder_fragment() -> String {
    format!("{TOOL_PLACEHOLDER}\n\n")
}

/// A tool invocation under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToolCall {
    pub call_id: String,
    pub function_name: String,
    pub argument_buffer: String,
    slot: u32,
    generated_id: bool,
}

impl PendingToolCall {
    /// Parse the accumulated argument text into a [`ToolCall`].
    ///
    /// An empty buffer is read as `{}`.
    pub fn into_tool_call(self) -> Result<ToolCall, serde_json::Error> {
        let raw = if self.argument_buffer.trim().is_empty() {
            "{}"
        } else {
            self.argument_buffer.as_str()
        };
        let arguments = serde_json::from_str(raw)?;
        Ok(ToolCall {
            call_id: self.call_id,
            tool_name: self.function_name,
            arguments,
        })
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Accumulating(PendingToolCall),
    Complete(PendingToolCall),
}

/// How phase 1 ended, from the accumulator's point of view.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No tool call was started.
    NoToolCall,
    /// A tool call finished with `finish_reason: tool_calls`.
    Complete(PendingToolCall),
    /// A tool call started but the stream ended without the terminal signal.
    Incomplete(PendingToolCall),
}

/// Per-request tool call accumulator.
#[derive(Debug)]
pub struct ToolCallAccumulator {
    state: State,
    ignored_fragments: usize,
}

impl Default for ToolCallAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            ignored_fragments: 0,
        }
    }

    /// Feed one delta. Returns text to forward to the client, if any.
    pub fn ingest(&mut self, delta: ModelDelta) -> Option<String> {
        match delta {
            ModelDelta::Content(text) => (!text.is_empty()).then_some(text),

            ModelDelta::ToolCallFragment {
                index,
                call_id,
                name,
                args_chunk,
            } => self.on_fragment(index, call_id, name, args_chunk),

            ModelDelta::Finish(reason) => {
                if reason == FinishReason::ToolCalls {
                    let state = std::mem::replace(&mut self.state, State::Idle);
                    self.state = match state {
                        State::Accumulating(call) => State::Complete(call),
                        other => {
                            if matches!(other, State::Idle) {
                                tracing::debug!("tool_calls finish without a tool call");
                            }
                            other
                        }
                    };
                }
                None
            }
        }
    }

    fn on_fragment(
        &mut self,
        index: u32,
        call_id: Option<String>,
        name: Option<String>,
        args_chunk: String,
    ) -> Option<String> {
        match &mut self.state {
            State::Idle => {
                let Some(function_name) = name.filter(|n| !n.is_empty()) else {
                    self.ignored_fragments += 1;
                    tracing::debug!(index, "argument fragment before any function name");
                    return None;
                };
                let (call_id, generated_id) = match call_id.filter(|id| !id.is_empty()) {
                    Some(id) => (id, false),
                    None => (format!("call_{}", uuid::Uuid::new_v4().simple()), true),
                };
                tracing::debug!(%call_id, function = %function_name, "tool call started");
                self.state = State::Accumulating(PendingToolCall {
                    call_id,
                    function_name,
                    argument_buffer: args_chunk,
                    slot: index,
                    generated_id,
                });
                Some(placeholder_fragment())
            }

            State::Accumulating(call) => {
                let same_slot = index == call.slot;
                let same_call = match call_id.as_deref() {
                    None | Some("") => true,
                    Some(id) => id == call.call_id || call.generated_id,
                };
                if same_slot && same_call {
                    if call.generated_id {
                        if let Some(id) = call_id.filter(|id| !id.is_empty()) {
                            call.call_id = id;
                            call.generated_id = false;
                        }
                    }
                    call.argument_buffer.push_str(&args_chunk);
                } else {
                    self.ignored_fragments += 1;
                    tracing::debug!(index, "ignoring fragment for a second tool call");
                }
                None
            }

            State::Complete(_) => {
                self.ignored_fragments += 1;
                None
            }
        }
    }

    /// True once the terminal `tool_calls` signal has been seen.
    pub fn is_complete(&self) -> bool {
        matches!(self.state, State::Complete(_))
    }

    /// Fragments dropped under the single-slot policy.
    pub fn ignored_fragments(&self) -> usize {
        self.ignored_fragments
    }

    /// Consume the accumulator at end of phase 1.
    pub fn finish(self) -> Outcome {
        match self.state {
            State::Idle => Outcome::NoToolCall,
            State::Accumulating(call) => Outcome::Incomplete(call),
            State::Complete(call) => Outcome::Complete(call),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(index: u32, id: Option<&str>, name: Option<&str>, args: &str) -> ModelDelta {
        ModelDelta::ToolCallFragment {
            index,
            call_id: id.map(String::from),
            name: name.map(String::from),
            args_chunk: args.into(),
        }
    }

    fn drive(acc: &mut ToolCallAccumulator, deltas: Vec<ModelDelta>) -> Vec<String> {
        deltas.into_iter().filter_map(|d| acc.ingest(d)).collect()
    }

    #[test]
    fn plain_text_is_forwarded_and_no_tool_call() {
        let mut acc = ToolCallAccumulator::new();
        let out = drive(
            &mut acc,
            vec![
                ModelDelta::content("Hello "),
                ModelDelta::content("there"),
                ModelDelta::finish(FinishReason::Stop),
            ],
        );
        assert_eq!(out, vec!["Hello ", "there"]);
        assert_eq!(acc.finish(), Outcome::NoToolCall);
    }

    #[test]
    fn fragments_concatenate_and_placeholder_emitted_once() {
        let mut acc = ToolCallAccumulator::new();
        let out = drive(
            &mut acc,
            vec![
                frag(0, Some("call_1"), Some("getCountryInfo"), ""),
                frag(0, None, None, "{\"cou"),
                frag(0, None, None, "ntry\":"),
                frag(0, None, None, "\"France\"}"),
                ModelDelta::finish(FinishReason::ToolCalls),
            ],
        );
        assert_eq!(out, vec![placeholder_fragment()]);
        assert!(acc.is_complete());
        match acc.finish() {
            Outcome::Complete(call) => {
                assert_eq!(call.call_id, "call_1");
                assert_eq!(call.function_name, "getCountryInfo");
                assert_eq!(call.argument_buffer, r#"{"country":"France"}"#);
                let tc = call.into_tool_call().unwrap();
                assert_eq!(tc.arguments["country"], "France");
            }
            other => panic!("expected complete, got {other:?}"),
        }
    }

    #[test]
    fn text_forwarded_while_accumulating() {
        let mut acc = ToolCallAccumulator::new();
        let out = drive(
            &mut acc,
            vec![
                ModelDelta::content("One moment."),
                frag(0, Some("c"), Some("getCountryInfo"), "{}"),
                ModelDelta::content(" Still here."),
            ],
        );
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], "One moment.");
        assert!(out[1].starts_with(TOOL_PLACEHOLDER));
        assert_eq!(out[2], " Still here.");
    }

    #[test]
    fn second_call_is_ignored() {
        let mut acc = ToolCallAccumulator::new();
        let out = drive(
            &mut acc,
            vec![
                frag(0, Some("a"), Some("getCountryInfo"), "{\"country\":\"Peru\"}"),
                frag(1, Some("b"), Some("getCountryInfo"), "{\"country\":\"Chile\"}"),
                frag(1, None, None, "junk"),
                ModelDelta::finish(FinishReason::ToolCalls),
            ],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(acc.ignored_fragments(), 2);
        match acc.finish() {
            Outcome::Complete(call) => {
                assert_eq!(call.call_id, "a");
                assert_eq!(call.argument_buffer, "{\"country\":\"Peru\"}");
            }
            other => panic!("expected complete, got {other:?}"),
        }
    }

    #[test]
    fn missing_call_id_gets_fallback() {
        let mut acc = ToolCallAccumulator::new();
        acc.ingest(frag(0, None, Some("getCountryInfo"), "{}"));
        acc.ingest(ModelDelta::finish(FinishReason::ToolCalls));
        match acc.finish() {
            Outcome::Complete(call) => assert!(call.call_id.starts_with("call_")),
            other => panic!("expected complete, got {other:?}"),
        }
    }

    #[test]
    fn late_provider_id_replaces_fallback() {
        let mut acc = ToolCallAccumulator::new();
        acc.ingest(frag(0, None, Some("getCountryInfo"), ""));
        acc.ingest(frag(0, Some("call_real"), None, "{}"));
        acc.ingest(ModelDelta::finish(FinishReason::ToolCalls));
        match acc.finish() {
            Outcome::Complete(call) => {
                assert_eq!(call.call_id, "call_real");
                assert_eq!(call.argument_buffer, "{}");
            }
            other => panic!("expected complete, got {other:?}"),
        }
    }

    #[test]
    fn stream_end_without_signal_is_incomplete() {
        let mut acc = ToolCallAccumulator::new();
        acc.ingest(frag(0, Some("x"), Some("getCountryInfo"), "{\"country\":"));
        acc.ingest(ModelDelta::finish(FinishReason::Stop));
        assert!(!acc.is_complete());
        assert!(matches!(acc.finish(), Outcome::Incomplete(_)));
    }

    #[test]
    fn nameless_fragment_in_idle_is_dropped() {
        let mut acc = ToolCallAccumulator::new();
        assert_eq!(acc.ingest(frag(0, None, None, "{")), None);
        assert_eq!(acc.ignored_fragments(), 1);
        assert_eq!(acc.finish(), Outcome::NoToolCall);
    }

    #[test]
    fn unparseable_arguments_fail_to_convert() {
        let mut acc = ToolCallAccumulator::new();
        acc.ingest(frag(0, Some("x"), Some("getCountryInfo"), "{\"country\": Fra"));
        acc.ingest(ModelDelta::finish(FinishReason::ToolCalls));
        match acc.finish() {
            Outcome::Complete(call) => assert!(call.into_tool_call().is_err()),
            other => panic!("expected complete, got {other:?}"),
        }
    }

    #[test]
    fn empty_arguments_parse_as_empty_object() {
        let mut acc = ToolCallAccumulator::new();
        acc.ingest(frag(0, Some("x"), Some("getCountryInfo"), ""));
        acc.ingest(ModelDelta::finish(FinishReason::ToolCalls));
        match acc.finish() {
            Outcome::Complete(call) => {
                let tc = call.into_tool_call().unwrap();
                assert_eq!(tc.arguments, serde_json::json!({}));
            }
            other => panic!("expected complete, got {other:?}"),
        }
    }
}
