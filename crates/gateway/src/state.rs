use std::sync::Arc;

use wf_domain::config::Config;
use wf_providers::LlmProvider;
use wf_tools::ToolExecutor;

/// Shared application state passed to all API handlers.
///
/// Everything here is read-only after startup; requests share nothing
/// mutable.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Model-completion provider used for both phases of a turn.
    pub provider: Arc<dyn LlmProvider>,
    /// Tools advertised to the model and run mid-stream.
    pub tools: Arc<dyn ToolExecutor>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        provider: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolExecutor>,
    ) -> Self {
        Self {
            config,
            provider,
            tools,
        }
    }
}
