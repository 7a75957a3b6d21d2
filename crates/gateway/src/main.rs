use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use wf_domain::turn::UserProfile;
use wf_gateway::bootstrap;
use wf_gateway::cli::{self, Cli, Command, ConfigCommand};
use wf_gateway::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to serve when no subcommand is given.
        None | Some(Command::Serve) => {
            let (config, _config_path) = cli::load_config()?;
            init_tracing();
            let state = bootstrap::build_app_state(Arc::new(config))?;
            server::run_server(state).await
        }
        Some(Command::Chat {
            url,
            name,
            country,
            continent,
            city,
        }) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            let url = url.unwrap_or_else(|| cli::default_chat_url(&config));
            let profile = UserProfile {
                name,
                country,
                continent,
                city,
            };
            cli::chat::chat(url, profile).await
        }
        Some(Command::Ask { message, url }) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            let url = url.unwrap_or_else(|| cli::default_chat_url(&config));
            cli::ask::ask(url, message).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = cli::load_config()?;
            let valid = cli::config::validate(&config, &config_path);
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _config_path) = cli::load_config()?;
            cli::config::show(&config)
        }
        Some(Command::Version) => {
            println!("wayfarer {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Initialize structured JSON tracing (only for the `serve` command).
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wf_gateway=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Initialize compact stderr-only tracing for CLI client commands.
///
/// Defaults to `warn` level so diagnostic output does not pollute stdout.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
