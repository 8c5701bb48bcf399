//! Deck GW - remote button deck server for OBS Studio

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deck_gw::app::{self, App};
use deck_gw::config::AppConfig;
use deck_gw::obs::{ObsCredentials, WebSocketConnector};
use deck_gw::paths::AppPaths;

/// Deck GW - drive OBS Studio from remote button decks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to the detected app directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// HTTP port, overrides server.port
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Data directory, overrides storage.data_dir
    #[arg(long, env = "DECK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// OBS WebSocket address (host, host:port or ws://host:port)
    #[arg(long, env = "OBS_WEBSOCKET_URL")]
    obs_url: Option<String>,

    /// OBS WebSocket password
    #[arg(long, env = "OBS_WEBSOCKET_PASSWORD")]
    obs_password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let detected = AppPaths::detect();
    let config_path = args.config.clone().unwrap_or_else(|| detected.config.clone());

    let mut config = AppConfig::load(&config_path).await?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    let paths = detected.with_data_dir(args.data_dir.clone().or_else(|| config.storage.data_dir.clone()));
    paths.ensure_directories()?;

    let _log_guard = init_logging(&args.log_level, &paths)?;

    info!("Starting Deck GW v{}...", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration file: {} ({} mode)",
        config_path.display(),
        if paths.is_portable { "portable" } else { "installed" }
    );

    let store = app::open_store(config.storage.backend, &paths)?;
    let saved = match ObsCredentials::load(store.as_ref()) {
        Ok(saved) => saved,
        Err(e) => {
            warn!("⚠️  Ignoring saved OBS settings: {}", e);
            None
        }
    };
    let credentials = app::startup_credentials(args.obs_url, args.obs_password, saved, &config.obs);

    let mut app = App::build(config, store, Arc::new(WebSocketConnector))?;
    app.start_background(credentials);

    app.serve(shutdown_signal()).await?;

    info!("Deck GW shutdown complete");
    Ok(())
}

/// Console output plus a daily-rotated log file in the logs directory
fn init_logging(level: &str, paths: &AppPaths) -> Result<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::daily(&paths.logs_dir, "deck-gw.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
