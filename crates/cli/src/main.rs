//! Palaver CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write the default config to ~/.palaver/config.toml
//! - `chat`    — Interactive session with slash commands
//! - `ask`     — Submit one prompt or document and print the reply
//! - `config`  — Show, locate or validate the configuration
//! - `tokens`  — Count tokens the way the budget enforcer does

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "palaver",
    about = "Palaver — token-budgeted conversations with remote LLMs",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.palaver/config.toml
    #[arg(short, long, global = true, env = "PALAVER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config directory and a default config file
    Onboard {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Start an interactive chat session
    Chat,

    /// Send a single prompt (or a plain-text document) and print the reply
    Ask {
        /// The prompt text
        #[arg(short, long, conflicts_with = "file")]
        message: Option<String>,

        /// Submit the contents of a plain-text file instead
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Count tokens in a piece of text
    Tokens {
        text: String,

        /// Model whose encoding to use (defaults to the configured model)
        #[arg(short, long)]
        model: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API key redacted)
    Show,
    /// Print the config file path
    Path,
    /// Load and validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Onboard { force } => commands::onboard::run(config_path, force).await?,
        Commands::Chat => commands::chat::run(config_path).await?,
        Commands::Ask { message, file } => commands::ask::run(config_path, message, file).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
        },
        Commands::Tokens { text, model } => commands::tokens::run(config_path, text, model).await?,
    }

    Ok(())
}
