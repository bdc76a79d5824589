//! Jarvis CLI: the main entry point.
//!
//! Loads `.env` and configuration, builds the engine, tools and to-do
//! store, then runs the interactive shell on stdin/stdout until `exit`.

use std::sync::Arc;

use clap::Parser;
use jarvis::InteractiveShell;
use jarvis_agent::AgentLoop;
use jarvis_config::{API_KEY_VARS, AppConfig};
use jarvis_core::session::Session;
use jarvis_memory::FileTodoStore;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "jarvis",
    about = "Jarvis, a tool-using personal assistant for the terminal",
    version
)]
struct Cli {}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _cli = Cli::parse();

    // A missing .env is the common case.
    dotenvy::dotenv().ok();

    // Logs go to stderr so the transcript on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables (or put it in .env):");
        for var in API_KEY_VARS {
            eprintln!("    {var}");
        }
        eprintln!();
        eprintln!("  Or add `api_key` to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let engine = jarvis_providers::router::build_from_config(&config)?;
    let tools = Arc::new(jarvis_tools::default_registry(&config)?);

    let agent = AgentLoop::new(engine, &config.model, tools)
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens)
        .with_max_iterations(config.agent.max_iterations);

    let store = Arc::new(FileTodoStore::new(&config.storage.todo_file));
    let session = Session::new(store).with_assistant_name(&config.agent.assistant_name);

    let mut shell = InteractiveShell::new(
        agent,
        session,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    );
    shell.run().await?;

    Ok(())
}
