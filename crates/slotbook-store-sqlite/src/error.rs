//! Error type for `slotbook-store-sqlite`.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its expected domain.
  #[error("invalid column value: {0}")]
  InvalidValue(String),

  #[error("slot not found: {0}")]
  SlotNotFound(i64),

  #[error("reservation not found: {0}")]
  ReservationNotFound(i64),

  #[error("slot {0} is not available for booking")]
  SlotUnavailable(i64),

  #[error(
    "participant {participant_id} already has an active reservation for slot {slot_id}"
  )]
  DuplicateActiveReservation { slot_id: i64, participant_id: i64 },

  #[error("a slot already exists on {date} at {start_time}")]
  DuplicateSlot { date: NaiveDate, start_time: NaiveTime },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for slotbook_core::Error {
  fn from(e: Error) -> Self {
    use slotbook_core::Error as Core;
    match e {
      Error::SlotNotFound(id) => Core::SlotNotFound(id),
      Error::ReservationNotFound(id) => Core::ReservationNotFound(id),
      Error::SlotUnavailable(id) => Core::SlotUnavailable(id),
      Error::DuplicateActiveReservation { slot_id, participant_id } => {
        Core::DuplicateActiveReservation { slot_id, participant_id }
      }
      Error::DuplicateSlot { date, start_time } => Core::DuplicateSlot { date, start_time },
      Error::Database(tokio_rusqlite::Error::ConnectionClosed) => {
        Core::StorageUnavailable("database connection closed".into())
      }
      other => Core::Storage(Box::new(other)),
    }
  }
}

/// `true` if `e` is a UNIQUE (or partial unique index) violation.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.code == rusqlite::ErrorCode::ConstraintViolation
        && f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}
