//! toolreg-server binary.
//!
//! Loads settings from the environment (and `.env`, or the file given with
//! `--env-file`), opens the SQLite store, and serves the registry API over
//! HTTP until Ctrl-C.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use toolreg_server::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tool registry API server")]
struct Cli {
  /// Env file read before the process environment.
  #[arg(long, default_value = ".env")]
  env_file: PathBuf,

  /// Address to bind.
  #[arg(long, default_value = "0.0.0.0")]
  host: String,

  /// Port to bind.
  #[arg(long, default_value_t = 8000)]
  port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let settings =
    Settings::load(Some(cli.env_file.as_path())).context("failed to load settings")?;

  // Initialise tracing.
  let default_level = if settings.debug {
    LevelFilter::INFO
  } else {
    LevelFilter::WARN
  };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy(),
    )
    .init();

  let address = format!("{}:{}", cli.host, cli.port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  toolreg_server::serve(settings, listener, shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!("failed to listen for Ctrl-C: {e}");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutdown requested");
}
