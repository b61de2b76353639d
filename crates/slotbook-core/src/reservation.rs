//! Reservations and the booking input/output types.
//!
//! A reservation binds one participant to one slot. Its status only ever
//! moves from `Active` to `Cancelled`; rows are never deleted, so re-booking
//! after a cancellation creates a fresh row.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{participant::Participant, slot::Slot};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
  Active,
  Cancelled,
}

impl ReservationStatus {
  pub fn is_active(&self) -> bool { matches!(self, Self::Active) }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
  pub id:             i64,
  pub slot_id:        i64,
  pub participant_id: i64,
  pub status:         ReservationStatus,
  /// Server-assigned at insert time.
  pub reserved_at:    DateTime<Utc>,
}

/// A reservation joined with its participant's contact details and its
/// slot's date and time. This is the shape listed to administrators and
/// handed to the reminder job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationDetail {
  #[serde(flatten)]
  pub reservation: Reservation,
  pub name:        String,
  pub email:       String,
  pub date:        NaiveDate,
  pub start_time:  NaiveTime,
}

// ─── Booking ─────────────────────────────────────────────────────────────────

/// Validated input for [`ReservationStore::book`](crate::store::ReservationStore::book).
///
/// Construct through [`NewBooking::new`], which trims and validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
  pub slot_id:           i64,
  pub participant_name:  String,
  pub participant_email: String,
}

impl NewBooking {
  pub fn new(
    slot_id: i64,
    participant_name: &str,
    participant_email: &str,
  ) -> crate::Result<Self> {
    let (participant_name, participant_email) =
      crate::validate::name_and_email(participant_name, participant_email)?;
    Ok(Self { slot_id, participant_name, participant_email })
  }
}

/// Everything the booking transaction committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
  pub reservation: Reservation,
  pub participant: Participant,
  pub slot:        Slot,
}
