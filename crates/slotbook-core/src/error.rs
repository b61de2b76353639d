//! Error types for `slotbook-core`.
//!
//! Every storage backend converts its own error type into [`Error`] so that
//! the booking service and the HTTP layer can tell a conflict from an outage.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed input: missing fields, bad email syntax, unparseable dates.
  #[error("{0}")]
  Validation(String),

  #[error("slot not found: {0}")]
  SlotNotFound(i64),

  #[error("reservation not found: {0}")]
  ReservationNotFound(i64),

  #[error("participant not found: {0}")]
  ParticipantNotFound(i64),

  #[error("slot {0} is not available for booking")]
  SlotUnavailable(i64),

  #[error(
    "participant {participant_id} already has an active reservation for slot {slot_id}"
  )]
  DuplicateActiveReservation { slot_id: i64, participant_id: i64 },

  #[error("a slot already exists on {date} at {start_time}")]
  DuplicateSlot { date: NaiveDate, start_time: NaiveTime },

  /// The backing store did not answer in time or is closed.
  #[error("storage unavailable: {0}")]
  StorageUnavailable(String),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// `true` for the semantic conflicts a client can resolve by choosing
  /// different input (as opposed to validation failures or outages).
  pub fn is_conflict(&self) -> bool {
    matches!(
      self,
      Self::SlotUnavailable(_)
        | Self::DuplicateActiveReservation { .. }
        | Self::DuplicateSlot { .. }
    )
  }

  /// `true` when the referenced row does not exist.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::SlotNotFound(_)
        | Self::ReservationNotFound(_)
        | Self::ParticipantNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
