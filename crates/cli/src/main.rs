//! mcremote CLI: the main entry point.
//!
//! Commands:
//! - `serve`   Run the MCP tool server on stdio (default)
//! - `tools`   List the registered tools
//! - `config`  Show, locate, or validate the configuration

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

mod commands;

#[derive(Parser)]
#[command(
    name = "mcremote",
    about = "mcremote: remote-control a Minecraft bot over MCP",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve tool calls over stdin/stdout
    Serve {
        /// Override the game-client backend
        #[arg(short, long)]
        backend: Option<String>,
    },

    /// List the available tools
    Tools,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Load and validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout is reserved for protocol frames
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command.unwrap_or(Commands::Serve { backend: None }) {
        Commands::Serve { backend } => commands::serve::run(backend).await,
        Commands::Tools => commands::tools::run().await,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await,
            ConfigAction::Path => commands::config_cmd::path().await,
            ConfigAction::Validate => commands::config_cmd::validate().await,
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error in main(): {e}");
            ExitCode::FAILURE
        }
    }
}
