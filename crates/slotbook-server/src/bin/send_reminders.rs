//! Daily reminder job.
//!
//! Sends a reminder to everyone holding an active reservation tomorrow (or
//! on `--date`). Prints `sent=N errors=N total=N` and exits non-zero if any
//! send failed. Meant to be run from cron, e.g. `0 12 * * *`.

use std::{path::PathBuf, process::ExitCode};

use chrono::{NaiveDate, Utc};
use clap::Parser;
use slotbook_core::reminder::send_reminders;
use slotbook_mail::MailNotifier;
use slotbook_server::{ServerConfig, init_tracing, notifier, open_store};

#[derive(Parser)]
#[command(author, version, about = "Send reminder emails for tomorrow's reservations")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Send reminders for this date (YYYY-MM-DD) instead of tomorrow.
  #[arg(long)]
  date: Option<NaiveDate>,

  /// Render the messages to the log instead of sending them.
  #[arg(long)]
  dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
  init_tracing();

  match run(Cli::parse()).await {
    Ok(true) => ExitCode::SUCCESS,
    Ok(false) => ExitCode::FAILURE,
    Err(e) => {
      tracing::error!(error = ?e, "reminder job failed");
      eprintln!("error: {e:#}");
      ExitCode::FAILURE
    }
  }
}

/// Returns whether every reminder was delivered.
async fn run(cli: Cli) -> anyhow::Result<bool> {
  let config = ServerConfig::load(&cli.config)?;

  let date = match cli.date {
    Some(date) => date,
    None => config.tomorrow(Utc::now())?,
  };

  let store = open_store(&config).await?;
  let notifier = if cli.dry_run {
    MailNotifier::log_only(&config.mail)
  } else {
    notifier(&config)?
  };

  tracing::info!(%date, dry_run = cli.dry_run, "sending reminders");
  let summary = send_reminders(&store, &notifier, date, config.reminder_options()).await?;

  println!("{summary}");
  tracing::info!(%summary, "reminder job finished");
  Ok(summary.is_success())
}
