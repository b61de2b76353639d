//! slotbook HTTP server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the
//! SQLite store and serves the JSON API.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use slotbook_server::{ServerConfig, app, booking_service, init_tracing, notifier, open_store};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about = "slotbook reservation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  init_tracing();

  let cli = Cli::parse();
  let config = ServerConfig::load(&cli.config)?;

  let store = open_store(&config).await?;
  let notifier = notifier(&config)?;
  tracing::info!(transport = ?config.mail.transport, "mail transport configured");

  let app = app(booking_service(&config, store, notifier));
  let address = config.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
