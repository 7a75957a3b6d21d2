use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Model completion provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider identifier used in logs and error messages.
    #[serde(default = "d_provider_id")]
    pub provider_id: String,
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Sampling temperature. `None` lets the provider choose.
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Timeout for establishing the stream (connect + response headers).
    #[serde(default = "d_120000u")]
    pub request_timeout_ms: u64,
    /// Maximum silence between two deltas of an open stream.
    /// `None` (the default) waits indefinitely.
    #[serde(default)]
    pub stream_idle_timeout_ms: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider_id: d_provider_id(),
            base_url: d_base_url(),
            model: d_model(),
            auth: AuthConfig::default(),
            temperature: None,
            request_timeout_ms: d_120000u(),
            stream_idle_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Header name. Defaults to `Authorization`.
    #[serde(default)]
    pub header: Option<String>,
    /// Header value prefix. Defaults to `Bearer `.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Env var containing the key. Defaults to `OPENAI_API_KEY`.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer `env`).
    #[serde(default)]
    pub key: Option<String>,
}

impl AuthConfig {
    pub fn env_var(&self) -> &str {
        self.env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }
}

pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

// ── serde default helpers ───────────────────────────────────────────

fn d_provider_id() -> String {
    "openai".into()
}
fn d_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_model() -> String {
    "gpt-4o-mini".into()
}
fn d_120000u() -> u64 {
    120_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_config_defaults() {
        let cfg = LlmConfig::default();
        assert_eq!(cfg.base_url, "https://api.openai.com/v1");
        assert_eq!(cfg.auth.env_var(), "OPENAI_API_KEY");
        assert!(cfg.stream_idle_timeout_ms.is_none());
    }

    #[test]
    fn llm_config_partial_toml() {
        let cfg: LlmConfig = toml::from_str(
            r#"
            base_url = "http://localhost:11434/v1"
            model = "llama3.1"
            stream_idle_timeout_ms = 30000
            [auth]
            env = "OLLAMA_KEY"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.model, "llama3.1");
        assert_eq!(cfg.auth.env_var(), "OLLAMA_KEY");
        assert_eq!(cfg.stream_idle_timeout_ms, Some(30_000));
        assert_eq!(cfg.request_timeout_ms, 120_000);
    }
}
