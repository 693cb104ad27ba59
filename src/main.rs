//! RAG chat server, terminal client and corpus indexer.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ragchat::config::{AppConfig, Cli, Command};
use ragchat::{rag, server, widget};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before clap reads env-backed flags
    let _ = dotenv();

    let cli = Cli::parse();
    init_tracing(&cli);

    let config = AppConfig::from_cli(&cli)?;

    match cli.command {
        None | Some(Command::Serve) => server::start_server(Arc::new(config)).await,
        Some(Command::Chat { .. }) => widget::run_terminal_chat(&config).await,
        Some(Command::Ingest { .. }) => {
            let report = rag::ingest::run_ingest(&config.retrieval).await?;
            println!(
                "Indexed {} passages from {} documents ({} skipped) into {}",
                report.passages, report.documents, report.skipped, config.retrieval.index_path
            );
            Ok(())
        }
    }
}

/// Initialize tracing (M-LOG-STRUCTURED).
///
/// The terminal client keeps the default level at `warn` so log lines do not
/// interleave with the conversation.
fn init_tracing(cli: &Cli) {
    let default_level = match cli.command {
        Some(Command::Chat { .. }) => "warn",
        _ => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}
