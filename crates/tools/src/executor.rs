use serde_json::Value;
use wf_domain::tool::{ToolCall, ToolDefinition};

/// Result of a tool invocation, ready to be sent back to the model.
///
/// `is_error` marks a structured error payload (e.g. an unknown country).
/// Such payloads are still valid model input, not faults.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub content: Value,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: Value) -> Self {
        Self { content, is_error: false }
    }

    pub fn error(content: Value) -> Self {
        Self { content, is_error: true }
    }

    /// Serialized form used as the tool-result message body.
    pub fn to_message_content(&self) -> String {
        self.content.to_string()
    }
}

/// Faults that prevent a tool from running at all.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

/// Synchronous tool execution seam used by the stream controller.
pub trait ToolExecutor: Send + Sync {
    /// Definitions advertised to the model.
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Run a completed tool call.
    fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolError>;
}
