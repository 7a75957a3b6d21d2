use serde::{Deserialize, Serialize};

/// Chat endpoint behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Number of most recent prior turns forwarded to the model.
    #[serde(default = "d_20")]
    pub history_window: usize,
    /// Route the streaming chat endpoint is mounted on.
    #[serde(default = "d_endpoint_path")]
    pub endpoint_path: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: d_20(),
            endpoint_path: d_endpoint_path(),
        }
    }
}

pub const DEFAULT_HISTORY_WINDOW: usize = 20;

fn d_20() -> usize {
    DEFAULT_HISTORY_WINDOW
}
fn d_endpoint_path() -> String {
    "/api/stream".into()
}
