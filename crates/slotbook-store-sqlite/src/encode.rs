//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD`, times of day as `HH:MM:SS` (so string
//! order is chronological order), and timestamps as RFC 3339 strings.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use slotbook_core::{
  participant::Participant,
  reservation::{Reservation, ReservationDetail, ReservationStatus},
  slot::{Slot, SlotSummary},
};

use crate::{Error, Result};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";

// ─── NaiveDate / NaiveTime ───────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FMT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FMT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format(TIME_FMT).to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, TIME_FMT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Fixed-width microsecond precision keeps string order chronological.
pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ReservationStatus ───────────────────────────────────────────────────────

pub fn encode_status(s: ReservationStatus) -> &'static str {
  match s {
    ReservationStatus::Active => "active",
    ReservationStatus::Cancelled => "cancelled",
  }
}

pub fn decode_status(s: &str) -> Result<ReservationStatus> {
  match s {
    "active" => Ok(ReservationStatus::Active),
    "cancelled" => Ok(ReservationStatus::Cancelled),
    other => Err(Error::InvalidValue(format!("unknown reservation status: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawSlot::from_row`].
pub const SLOT_COLUMNS: &str = "s.id, s.date, s.start_time, s.is_available";

/// Raw values read directly from a `slots` row.
pub struct RawSlot {
  pub id:           i64,
  pub date:         String,
  pub start_time:   String,
  pub is_available: bool,
}

impl RawSlot {
  /// Read the four [`SLOT_COLUMNS`] starting at column 0.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      date:         row.get(1)?,
      start_time:   row.get(2)?,
      is_available: row.get(3)?,
    })
  }

  pub fn into_slot(self) -> Result<Slot> {
    Ok(Slot {
      id:           self.id,
      date:         decode_date(&self.date)?,
      start_time:   decode_time(&self.start_time)?,
      is_available: self.is_available,
    })
  }
}

/// A slot row followed by an aggregate count column.
pub struct RawSlotSummary {
  pub slot:              RawSlot,
  pub reservation_count: i64,
}

impl RawSlotSummary {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      slot:              RawSlot::from_row(row)?,
      reservation_count: row.get(4)?,
    })
  }

  pub fn into_summary(self) -> Result<SlotSummary> {
    Ok(SlotSummary {
      slot:              self.slot.into_slot()?,
      reservation_count: self.reservation_count,
    })
  }
}

/// Column list matching [`RawReservation::from_row`].
pub const RESERVATION_COLUMNS: &str =
  "r.id, r.slot_id, r.participant_id, r.status, r.reserved_at";

pub struct RawReservation {
  pub id:             i64,
  pub slot_id:        i64,
  pub participant_id: i64,
  pub status:         String,
  pub reserved_at:    String,
}

impl RawReservation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      slot_id:        row.get(1)?,
      participant_id: row.get(2)?,
      status:         row.get(3)?,
      reserved_at:    row.get(4)?,
    })
  }

  pub fn into_reservation(self) -> Result<Reservation> {
    Ok(Reservation {
      id:             self.id,
      slot_id:        self.slot_id,
      participant_id: self.participant_id,
      status:         decode_status(&self.status)?,
      reserved_at:    decode_dt(&self.reserved_at)?,
    })
  }
}

/// A reservation row joined with participant and slot columns.
pub struct RawReservationDetail {
  pub reservation: RawReservation,
  pub name:        String,
  pub email:       String,
  pub date:        String,
  pub start_time:  String,
}

impl RawReservationDetail {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      reservation: RawReservation::from_row(row)?,
      name:        row.get(5)?,
      email:       row.get(6)?,
      date:        row.get(7)?,
      start_time:  row.get(8)?,
    })
  }

  pub fn into_detail(self) -> Result<ReservationDetail> {
    Ok(ReservationDetail {
      reservation: self.reservation.into_reservation()?,
      name:        self.name,
      email:       self.email,
      date:        decode_date(&self.date)?,
      start_time:  decode_time(&self.start_time)?,
    })
  }
}

pub fn participant_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Participant> {
  Ok(Participant {
    id:    row.get(0)?,
    name:  row.get(1)?,
    email: row.get(2)?,
  })
}
