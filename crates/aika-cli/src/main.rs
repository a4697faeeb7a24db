use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use aika_application::AikaApp;
use aika_infrastructure::{AikaPaths, ConfigService, FileKeyValueStore, StaticCredentialVerifier};
use aika_interaction::HttpBackend;
use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod helper;
mod repl;
mod view;

#[derive(Parser)]
#[command(name = "aika")]
#[command(about = "AIKA - chat with the compliance knowledge base", long_about = None)]
struct Cli {
    /// Directory for conversations, upload records and the stored sign-in
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Backend URL (overrides config file and AIKA_API_URL)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Also log to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Installs the global subscriber: a daily log file, plus stderr if verbose.
///
/// The returned guard flushes the file writer when dropped.
fn init_logging(logs_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create logs directory {}", logs_dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
        logs_dir, "aika.log",
    ));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);
    let stderr_layer = verbose.then(|| fmt::layer().with_writer(std::io::stderr).with_target(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut paths = AikaPaths::resolve()?;
    if let Some(data_dir) = cli.data_dir {
        paths = paths.with_data_dir(data_dir);
    }
    let _guard = init_logging(&paths.logs_dir(), cli.verbose)?;

    let mut config = ConfigService::new(paths.config_file())
        .load()
        .with_context(|| format!("Failed to load {}", paths.config_file().display()))?;
    if let Some(url) = cli.api_url {
        config.api.base_url = aika_core::config::normalize_base_url(&url);
    }
    tracing::info!(base_url = %config.api.base_url, data_dir = %paths.data_dir().display(), "Starting AIKA");

    let storage = Arc::new(FileKeyValueStore::open(paths.storage_dir())?);
    let verifier = Arc::new(
        StaticCredentialVerifier::default()
            .with_delay(Duration::from_millis(config.auth.login_delay_ms)),
    );
    let backend = Arc::new(HttpBackend::from_settings(&config.api)?);
    let app = Arc::new(AikaApp::new(storage, verifier, backend, &config)?);

    repl::Repl::new(app, paths)?.run().await
}
