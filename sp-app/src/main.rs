//! ShellPilot main binary: natural-language shell command assistant.

mod commands;
mod config;
mod prompt;
mod usage;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "shellpilot",
    version,
    about = "Generate and safely run shell commands from natural language",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Path to the config file (default: ~/.shellpilot/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,

    /// Natural-language request (shorthand for `shellpilot run ...`).
    #[arg(trailing_var_arg = true)]
    request: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a command for the request and run it through the safety gate.
    Run {
        #[arg(required = true)]
        request: Vec<String>,
    },
    /// Show configuration and readiness summary.
    Status,
    /// Show backend-call usage statistics.
    Usage,
    /// Enable the assistant.
    Enable,
    /// Disable the assistant.
    Disable,
    /// Write the default config template (idempotent).
    Init,
    /// Validate config and perform one backend handshake call.
    Doctor,
    /// Remove all configuration and usage data.
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;
    install_panic_hook();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Command::Run { request }) => {
            commands::run(config_path, &request.join(" ")).await
        }
        Some(Command::Status) => commands::status(config_path).await,
        Some(Command::Usage) => commands::usage_stats(config_path).await,
        Some(Command::Enable) => commands::set_enabled(config_path, true).await,
        Some(Command::Disable) => commands::set_enabled(config_path, false).await,
        Some(Command::Init) => commands::init(config_path).await,
        Some(Command::Doctor) => commands::doctor(config_path).await,
        Some(Command::Reset) => commands::reset(config_path).await,
        None if !cli.request.is_empty() => {
            commands::run(config_path, &cli.request.join(" ")).await
        }
        None => {
            println!("Usage: shellpilot <your request>");
            println!("Example: shellpilot find all rust files in the current directory");
            println!("Run 'shellpilot --help' for management commands.");
            Ok(())
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        // Quiet by default: this is an interactive CLI, stdout is the UI.
        Err(_) => EnvFilter::new("warn"),
    };
    let log_format = std::env::var("SHELLPILOT_LOG_FORMAT")
        .unwrap_or_else(|_| "compact".to_string())
        .to_ascii_lowercase();

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true)
                .init();
        }
        "pretty" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .pretty()
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .compact()
                .init();
        }
        other => {
            return Err(anyhow::anyhow!(
                "unsupported SHELLPILOT_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            ));
        }
    }
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_to_string(panic_info.payload());
        tracing::error!(
            panic_location = %location,
            panic_payload = %payload,
            "panic captured"
        );
        default_hook(panic_info);
    }));
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        return msg.to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}
