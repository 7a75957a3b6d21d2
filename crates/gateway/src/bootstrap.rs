//! AppState construction, shared by `serve` and any command that needs the
//! runtime without an HTTP listener.

use std::sync::Arc;

use anyhow::Context;

use wf_domain::config::{Config, ConfigSeverity};
use wf_providers::{LlmProvider, OpenAiCompatProvider};
use wf_tools::{CountryInfoTool, ToolExecutor};

use crate::state::AppState;

/// Validate config, build the provider and tools, and return a wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── LLM provider ─────────────────────────────────────────────────
    let provider: Arc<dyn LlmProvider> = Arc::new(
        OpenAiCompatProvider::from_config(&config.llm)
            .context("initializing LLM provider")?,
    );
    tracing::info!(
        provider = %provider.provider_id(),
        model = %provider.default_model(),
        base_url = %config.llm.base_url,
        idle_timeout_ms = ?config.llm.stream_idle_timeout_ms,
        "LLM provider ready"
    );

    // ── Tools ────────────────────────────────────────────────────────
    let tools: Arc<dyn ToolExecutor> = Arc::new(CountryInfoTool);
    tracing::info!(
        tools = ?tools.definitions().iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
        "tools registered"
    );

    Ok(AppState::new(config, provider, tools))
}
