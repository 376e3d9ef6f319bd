//! sales-agent - A command-line sales insight assistant.
//!
//! Forwards natural-language questions to a hosted LLM, enriching them with
//! order data from the Sales API when the question is about sales, and
//! prints the model's answer.

mod cli;
mod config;
mod error;
mod llm;
mod relay;
mod sales;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use relay::{Relay, SalesIntent};
use sales::SalesClient;
use std::path::{Path, PathBuf};
use std::process::Command as ProcessCommand;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sales-agent")]
#[command(author, version, about = "A command-line sales insight assistant")]
#[command(long_about = "Ask questions about your sales in plain language.\n\nRun without a prompt for an interactive session; type 'exit' to quit.")]
struct Cli {
    /// One-shot mode - answer this prompt and exit
    #[arg(value_name = "PROMPT")]
    prompt: Option<String>,

    /// Config file (default: ~/.config/sales-agent/config.toml)
    #[arg(short = 'c', long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Environment file holding the API key (default: ./.env)
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Override the configured model
    #[arg(short = 'm', long, value_name = "MODEL")]
    model: Option<String>,

    /// When to consult the Sales API (overrides the config file)
    #[arg(long, value_enum, value_name = "WHEN")]
    sales: Option<SalesIntent>,

    /// Log progress to stderr
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open configuration file in $EDITOR
    Config {
        /// Only print the config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(Commands::Config { path }) = cli.command {
        return handle_config(cli.config.as_deref(), path);
    }

    load_env_file(cli.env_file.as_deref())?;

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(model) = cli.model {
        config.backend.set_model(model);
    }
    if let Some(intent) = cli.sales {
        config.sales.intent = intent;
    }
    tracing::debug!(
        "Configuration loaded: backend {} ({}), sales intent {:?}",
        config.backend_type(),
        config.model_name(),
        config.sales.intent
    );

    let relay = build_relay(&config, |var| std::env::var(var).ok())?;

    match cli.prompt {
        Some(prompt) => {
            let mut stdout = tokio::io::stdout();
            if let Err(e) = cli::run_once(&relay, &prompt, &mut stdout).await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = tokio::io::stdout();
            let mut stderr = tokio::io::stderr();
            let show_prompt = atty::is(atty::Stream::Stdin);
            cli::run_session(&relay, stdin, &mut stdout, &mut stderr, show_prompt).await?;
        }
    }

    Ok(())
}

/// Initialize logging to stderr, keeping stdout for replies.
fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sales_agent={},reqwest=warn", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load variables from an environment file into the process environment.
///
/// An explicit path must exist; the default `.env` is optional.
fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenv::from_path(path)
                .with_context(|| format!("Failed to load environment file: {}", path.display()))?;
        }
        None => {
            if let Ok(path) = dotenv::dotenv() {
                info!("Loaded environment from {}", path.display());
            }
        }
    }
    Ok(())
}

/// Resolve the API key and wire the backend and Sales client together.
///
/// Fails on a missing key before any network traffic.
fn build_relay<F>(config: &Config, env: F) -> Result<Relay<llm::Backend, SalesClient>>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = config.api_key(env)?;

    let http = reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(concat!("sales-agent/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    let backend = llm::create_backend(config, api_key, http.clone());
    info!(
        "Using backend: {} (model: {})",
        backend.name(),
        backend.model()
    );
    let sales = SalesClient::new(&config.sales, http);

    Ok(Relay::new(backend, sales, config.sales.intent))
}

/// Handle the config command.
fn handle_config(path: Option<&Path>, print_only: bool) -> Result<()> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::config_path()?,
    };

    if print_only {
        println!("{}", config_path.display());
        return Ok(());
    }

    // Create default config if it doesn't exist
    if !config_path.exists() {
        Config::default().save(&config_path)?;
        println!("Created default config at {}", config_path.display());
    }

    // Open in editor
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = ProcessCommand::new(&editor)
        .arg(&config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        eprintln!("Editor exited with non-zero status");
    }

    Ok(())
}
