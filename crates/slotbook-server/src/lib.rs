//! Process wiring shared by the `server` and `send-reminders` binaries:
//! configuration, tracing, store and notifier construction, and the HTTP
//! application.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::Router;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use serde::Deserialize;
use slotbook_core::{
  booking::{BookingService, Timeouts},
  notify::Notifier,
  reminder::{ReminderOptions, day_after},
  store::Store,
};
use slotbook_mail::{MailConfig, MailNotifier};
use slotbook_store_sqlite::SqliteStore;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` layered under
/// `SLOTBOOK_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  #[serde(default = "default_store_timeout_secs")]
  pub store_timeout_secs:   u64,
  #[serde(default = "default_notify_timeout_secs")]
  pub notify_timeout_secs:  u64,
  #[serde(default = "default_reminder_concurrency")]
  pub reminder_concurrency: usize,
  /// Offset used to decide what "tomorrow" is. Local time when unset.
  pub utc_offset_hours:     Option<i32>,
  #[serde(default)]
  pub mail:                 MailConfig,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("slotbook.db") }
fn default_store_timeout_secs() -> u64 { 5 }
fn default_notify_timeout_secs() -> u64 { 10 }
fn default_reminder_concurrency() -> usize { 4 }

impl ServerConfig {
  /// Read `path` (optional) and the `SLOTBOOK_*` environment.
  ///
  /// Nested keys use a double underscore: `SLOTBOOK_MAIL__SMTP_HOST`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SLOTBOOK")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn timeouts(&self) -> Timeouts {
    Timeouts {
      store:  Duration::from_secs(self.store_timeout_secs),
      notify: Duration::from_secs(self.notify_timeout_secs),
    }
  }

  pub fn reminder_options(&self) -> ReminderOptions {
    ReminderOptions {
      concurrency:  self.reminder_concurrency,
      load_timeout: Duration::from_secs(self.store_timeout_secs),
      send_timeout: Duration::from_secs(self.notify_timeout_secs),
    }
  }

  /// The day after `now` in the configured offset (or local time).
  pub fn tomorrow(&self, now: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    match self.utc_offset_hours {
      Some(hours) => {
        let offset = hours
          .checked_mul(3600)
          .and_then(FixedOffset::east_opt)
          .with_context(|| format!("utc_offset_hours out of range: {hours}"))?;
        Ok(day_after(&now.with_timezone(&offset)))
      }
      None => Ok(day_after(&now.with_timezone(&Local))),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Wiring ───────────────────────────────────────────────────────────────────

/// Install the global tracing subscriber (`RUST_LOG`, default `info`).
pub fn init_tracing() {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();
}

pub async fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let store_path = config.store_path();
  SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))
}

pub fn notifier(config: &ServerConfig) -> anyhow::Result<MailNotifier> {
  MailNotifier::from_config(&config.mail).context("failed to configure mail transport")
}

pub fn booking_service<S, N>(config: &ServerConfig, store: S, notifier: N) -> BookingService<S, N>
where
  S: Store + 'static,
  N: Notifier,
{
  BookingService::new(Arc::new(store), Arc::new(notifier), config.timeouts())
}

/// The HTTP application: the JSON API with request tracing.
pub fn app<S, N>(service: BookingService<S, N>) -> Router
where
  S: Store + 'static,
  N: Notifier,
{
  slotbook_api::api_router(service).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use chrono::TimeZone as _;
  use slotbook_mail::TransportKind;
  use tower::ServiceExt as _;

  use super::*;

  fn temp_config(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("slotbook-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
  }

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/slotbook.toml")).unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.store_timeout_secs, 5);
    assert_eq!(cfg.notify_timeout_secs, 10);
    assert_eq!(cfg.reminder_concurrency, 4);
    assert!(cfg.utc_offset_hours.is_none());
    assert_eq!(cfg.mail.transport, TransportKind::Log);
  }

  #[test]
  fn file_values_are_read() {
    let path = temp_config(
      "full.toml",
      r#"
        port = 9000
        store_path = "~/slotbook/data.db"
        utc_offset_hours = 9

        [mail]
        transport = "smtp"
        smtp_host = "smtp.example.com"
        from = "Lab <lab@example.com>"
        signature = "Visual Search Lab"
      "#,
    );

    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.utc_offset_hours, Some(9));
    assert_eq!(cfg.mail.transport, TransportKind::Smtp);
    assert_eq!(cfg.mail.smtp_host.as_deref(), Some("smtp.example.com"));
    assert_eq!(cfg.mail.smtp_port, 587);
    assert_eq!(cfg.mail.signature, "Visual Search Lab");
    assert!(cfg.store_path().ends_with("slotbook/data.db"));
  }

  #[test]
  fn tomorrow_follows_the_configured_offset() {
    let mut cfg = ServerConfig::load(Path::new("/nonexistent/slotbook.toml")).unwrap();
    // 01:00 on 8 August in Tokyo, still 7 August in UTC.
    let now = Utc.with_ymd_and_hms(2025, 8, 7, 16, 0, 0).unwrap();

    cfg.utc_offset_hours = Some(9);
    assert_eq!(cfg.tomorrow(now).unwrap(), NaiveDate::from_ymd_opt(2025, 8, 9).unwrap());

    cfg.utc_offset_hours = Some(0);
    assert_eq!(cfg.tomorrow(now).unwrap(), NaiveDate::from_ymd_opt(2025, 8, 8).unwrap());

    cfg.utc_offset_hours = Some(30);
    assert!(cfg.tomorrow(now).is_err());
  }

  #[tokio::test]
  async fn app_serves_the_api() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/slotbook.toml")).unwrap();
    let store = SqliteStore::open_in_memory().await.unwrap();
    let service = booking_service(&cfg, store, MailNotifier::log_only(&cfg.mail));

    let req = Request::builder().uri("/slots/all").body(Body::empty()).unwrap();
    let resp = app(service).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value, serde_json::json!([]));
  }
}
