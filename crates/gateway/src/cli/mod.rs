pub mod ask;
pub mod chat;
pub mod config;

use clap::{Parser, Subcommand};

use wf_domain::config::Config;

/// Wayfarer: a travel assistant that streams answers from a hosted model.
#[derive(Debug, Parser)]
#[command(name = "wayfarer", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Chat interactively with a running gateway.
    Chat {
        /// Chat endpoint URL (defaults to the configured host, port and path).
        #[arg(long)]
        url: Option<String>,
        /// Your name, sent with every message.
        #[arg(long)]
        name: Option<String>,
        /// Favourite country.
        #[arg(long)]
        country: Option<String>,
        /// Favourite continent.
        #[arg(long)]
        continent: Option<String>,
        /// Favourite city.
        #[arg(long)]
        city: Option<String>,
    },
    /// Send a single message and print the reply.
    Ask {
        /// The message to send.
        message: String,
        /// Chat endpoint URL (defaults to the configured host, port and path).
        #[arg(long)]
        url: Option<String>,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `WF_CONFIG` (or
/// `config.toml` by default). A missing file yields the defaults.
///
/// Returns the parsed [`Config`] and the path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("WF_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        Config::default()
    };

    Ok((config, config_path))
}

/// The chat endpoint of the locally configured gateway.
///
/// A wildcard bind address is reached over loopback.
pub fn default_chat_url(config: &Config) -> String {
    let host = match config.server.host.as_str() {
        "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
        other => other,
    };
    format!(
        "http://{host}:{}{}",
        config.server.port, config.chat.endpoint_path
    )
}
