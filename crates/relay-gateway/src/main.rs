//! relay-gateway: Chat Relay Gateway Main Binary
//!
//! Main entry point for the relay-gateway HTTP server.
//!
//! Usage:
//!   relay-gateway                  - Start the HTTP server
//!   relay-gateway --config <path>  - Start with an explicit config file
//!   relay-gateway --help           - Show help

use std::path::PathBuf;
use std::sync::Arc;

use relay_core::config::DEFAULT_CONFIG_FILE;
use relay_core::{ChatMemory, ChatService, Config, OpenAiClient};
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq)]
enum RunMode {
    /// Serve HTTP, optionally with an explicit config file
    Server { config_path: Option<PathBuf> },
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args(std::env::args().skip(1))?;

    let config_path = match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("relay-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server { config_path } => config_path,
    };

    // Load .env file (may carry RUST_LOG)
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("info".parse()?)
        )
        .init();

    let config = match &config_path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            Config::from_toml_file(path)
        }
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    if config.llm.api_key.is_empty() {
        tracing::warn!("No API key configured; upstream calls will be rejected");
    }

    run_server(config).await
}

/// Parse command line arguments
fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<RunMode> {
    let mut config_path = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            "--config" | "-C" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("{} requires a path", arg))?;
                config_path = Some(PathBuf::from(path));
            }
            other => anyhow::bail!("Unknown argument: {} (see --help)", other),
        }
    }

    Ok(RunMode::Server { config_path })
}

/// Print help message
fn print_help() {
    println!("relay-gateway - Chat relay gateway for OpenAI-compatible APIs");
    println!();
    println!("Usage:");
    println!("  relay-gateway                  Start the HTTP server");
    println!("  relay-gateway --config <path>  Load settings from a TOML file");
    println!("  relay-gateway --help           Show this help message");
    println!("  relay-gateway --version        Show version");
    println!();
    println!("Without --config, ./{} is used when present.", DEFAULT_CONFIG_FILE);
    println!();
    println!("Environment Variables:");
    println!("  LLM_API_KEY          API key (or OPENAI_API_KEY)");
    println!("  LLM_MODEL            Chat model (default: gpt-4o-mini)");
    println!("  LLM_IMAGE_MODEL      Image model (default: dall-e-3)");
    println!("  LLM_BASE_URL         API endpoint (default: https://api.openai.com/v1)");
    println!("  LLM_TIMEOUT_SECS     Request timeout (default: 120)");
    println!("  LLM_SYSTEM_PROMPT    Default system prompt (empty disables it)");
    println!("  API_HOST             Bind address (default: 0.0.0.0)");
    println!("  API_PORT             HTTP port (default: 3000)");
    println!("  API_ALLOWED_ORIGINS  Comma-separated CORS origins (default: any)");
    println!("  MEMORY_RETRIEVE_SIZE History replayed per memory chat (default: 100)");
    println!("  MEMORY_MAX_MESSAGES  Messages kept per chat, 0 = unlimited (default: 0)");
}

/// Build the shared state and serve until Ctrl+C
async fn run_server(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting relay-gateway...");
    tracing::info!("Model: {} ({})", config.llm.model, config.llm.base_url);

    let client = OpenAiClient::new(config.llm_config())
        .map_err(|e| anyhow::anyhow!("Failed to create LLM client: {}", e))?;

    let memory = Arc::new(ChatMemory::with_max_messages(config.memory.max_messages));
    let chat = ChatService::new(Arc::new(client), Arc::clone(&memory))
        .with_system_prompt(config.llm.system_prompt.clone());

    tracing::info!("Press Ctrl+C to exit");
    relay_api::start_server(config, chat, shutdown_signal()).await?;

    tracing::info!(
        "Shutdown complete ({} conversation(s) discarded)",
        memory.conversation_count()
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    tracing::info!("Shutting down...");
}
