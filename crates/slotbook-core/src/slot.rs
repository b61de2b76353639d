//! Slots: bookable date/time units with a visibility flag.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A published experiment session.
///
/// `(date, start_time)` is unique across all slots. The only mutation after
/// creation is flipping `is_available`; slots are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
  pub id:           i64,
  pub date:         NaiveDate,
  pub start_time:   NaiveTime,
  pub is_available: bool,
}

/// A slot together with the number of *active* reservations held on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSummary {
  #[serde(flatten)]
  pub slot:              Slot,
  pub reservation_count: i64,
}

/// Input for creating a slot. New slots start out available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NewSlot {
  pub date:       NaiveDate,
  pub start_time: NaiveTime,
}
