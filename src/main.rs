//! CLI entry point: launches the desktop window, or runs one headless
//! translation for scripting.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use voicebridge::catalog;
use voicebridge::config::AppConfig;
use voicebridge::history::HistoryLog;
use voicebridge::providers::Providers;
use voicebridge::session::SessionController;
use voicebridge::ui;

#[derive(Parser)]
#[command(name = "voicebridge", version, about = "Desktop speech and text translator")]
struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Launch the desktop window (the default).
    Run,
    /// Translate text once, print the result, and log it to history.
    Translate {
        text: String,
        /// Source language display name.
        #[arg(long, default_value = catalog::AUTO_DISPLAY)]
        from: String,
        /// Target language display name.
        #[arg(long, default_value = "French")]
        to: String,
    },
    /// Print the language catalog.
    Languages,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match cli.command {
        Some(Command::Languages) => {
            for entry in catalog::all() {
                println!("{:<22} {}", entry.display_name, entry.code);
            }
            Ok(())
        }
        Some(Command::Translate { text, from, to }) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            runtime.block_on(translate_once(&config, &text, &from, &to))
        }
        Some(Command::Run) | None => run_window(config),
    }
}

/// Headless one-shot translation through the same workflow the UI drives.
async fn translate_once(config: &AppConfig, text: &str, from: &str, to: &str) -> Result<()> {
    let source = catalog::resolve_source(from)?;
    let target = catalog::resolve_target(to)?;

    let history = Arc::new(HistoryLog::open(&config.history.resolved_path())?);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let controller =
        SessionController::new(Providers::from_config(config), history, config, events_tx)?;

    {
        let state = controller.state();
        let mut state = state.lock();
        state.source = source;
        state.target = target;
        state.input = text.to_string();
    }

    controller.run_text_translation().await?;
    events_rx.close();

    let output = controller.state().lock().output.clone();
    println!("{output}");
    Ok(())
}

fn run_window(config: AppConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    // Keep the runtime entered so UI-thread dispatches can spawn tasks.
    let _guard = runtime.enter();

    let history_path = config.history.resolved_path();
    let history = Arc::new(HistoryLog::open(&history_path)?);
    tracing::info!(history = %history_path.display(), "session starting");

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let controller =
        SessionController::new(Providers::from_config(&config), history, &config, events_tx)?;

    let result = ui::run(Arc::clone(&controller), events_rx);

    runtime.block_on(controller.shutdown());
    result.map_err(|e| anyhow::anyhow!("window error: {e}"))
}
