use std::fmt;
use std::pin::Pin;

/// A boxed async stream, used for model delta streams and outbound bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn futures_core::Stream<Item = T> + Send + 'a>>;

/// One incremental fragment of a streamed model response.
///
/// Provider adapters decode their wire payloads into this type exactly once;
/// nothing downstream inspects loosely-typed JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelDelta {
    /// A piece of assistant text.
    Content(String),

    /// A piece of a tool invocation.
    ///
    /// `index` identifies the call slot within the response. The first
    /// fragment of a call usually carries `call_id` and `name`; later
    /// fragments only carry `args_chunk`.
    ToolCallFragment {
        index: u32,
        call_id: Option<String>,
        name: Option<String>,
        args_chunk: String,
    },

    /// The model stopped generating.
    Finish(FinishReason),
}

impl ModelDelta {
    pub fn content(text: impl Into<String>) -> Self {
        ModelDelta::Content(text.into())
    }

    pub fn finish(reason: FinishReason) -> Self {
        ModelDelta::Finish(reason)
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    /// The model wants a tool executed before it continues.
    ToolCalls,
    Length,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::ToolCalls => "tool_calls",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for FinishReason {
    fn from(s: &str) -> Self {
        match s {
            "stop" => FinishReason::Stop,
            // Legacy function-calling responses finish with "function_call".
            "tool_calls" | "function_call" => FinishReason::ToolCalls,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reason_parses_known_values() {
        assert_eq!(FinishReason::from("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::from("tool_calls"), FinishReason::ToolCalls);
        assert_eq!(FinishReason::from("function_call"), FinishReason::ToolCalls);
        assert_eq!(FinishReason::from("length"), FinishReason::Length);
    }

    #[test]
    fn finish_reason_keeps_unknown_values() {
        let reason = FinishReason::from("eos");
        assert_eq!(reason, FinishReason::Other("eos".into()));
        assert_eq!(reason.to_string(), "eos");
    }
}
