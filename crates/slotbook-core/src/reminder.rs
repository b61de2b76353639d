//! The daily reminder run.
//!
//! Loads every active reservation for a date and sends one reminder per
//! reservation. A failed send is logged and counted; it never stops the
//! remaining sends.

use std::{fmt, time::Duration};

use chrono::{DateTime, Days, NaiveDate, TimeZone};
use futures::{StreamExt as _, stream};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{Error, Result, notify::Notifier, store::ReservationStore};

/// Outcome counts of one reminder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderSummary {
  pub sent:   usize,
  pub errors: usize,
  pub total:  usize,
}

impl ReminderSummary {
  pub fn is_success(&self) -> bool { self.errors == 0 }
}

impl fmt::Display for ReminderSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "sent={} errors={} total={}", self.sent, self.errors, self.total)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderOptions {
  /// Maximum number of sends in flight at once.
  pub concurrency:  usize,
  /// Bound on loading the day's reservations.
  pub load_timeout: Duration,
  /// Bound on each individual send; expiry counts as an error.
  pub send_timeout: Duration,
}

impl Default for ReminderOptions {
  fn default() -> Self {
    Self {
      concurrency:  4,
      load_timeout: Duration::from_secs(5),
      send_timeout: Duration::from_secs(10),
    }
  }
}

/// The calendar day after `now`, in `now`'s own time zone.
pub fn day_after<Tz: TimeZone>(now: &DateTime<Tz>) -> NaiveDate {
  let today = now.date_naive();
  today.checked_add_days(Days::new(1)).unwrap_or(today)
}

/// Send reminders for every active reservation on `date`.
///
/// Only a failure to load the reservations is returned as an error;
/// individual send failures are folded into the summary.
pub async fn send_reminders<S, N>(
  store: &S,
  notifier: &N,
  date: NaiveDate,
  options: ReminderOptions,
) -> Result<ReminderSummary>
where
  S: ReservationStore,
  N: Notifier,
{
  let reservations = tokio::time::timeout(
    options.load_timeout,
    store.list_active_reservations_for_date(date),
  )
  .await
  .map_err(|_| Error::StorageUnavailable("loading reservations timed out".into()))?
  .map_err(Into::<Error>::into)?;

  let total = reservations.len();
  debug!(%date, total, "sending reminders");

  let delivered: Vec<bool> = stream::iter(&reservations)
    .map(|detail| async move {
      let id = detail.reservation.id;
      match tokio::time::timeout(options.send_timeout, notifier.send_reminder(detail)).await {
        Ok(Ok(())) => {
          debug!(reservation_id = id, "reminder sent");
          true
        }
        Ok(Err(e)) => {
          warn!(reservation_id = id, email = %detail.email, error = %e, "reminder failed to send");
          false
        }
        Err(_) => {
          warn!(reservation_id = id, email = %detail.email, "reminder send timed out");
          false
        }
      }
    })
    .buffer_unordered(options.concurrency.max(1))
    .collect()
    .await;

  let sent = delivered.iter().filter(|ok| **ok).count();
  let summary = ReminderSummary { sent, errors: total - sent, total };
  info!(%date, sent = summary.sent, errors = summary.errors, total, "reminder run finished");
  Ok(summary)
}
