//! [`SqliteStore`]: the SQLite implementation of the slotbook stores.

use std::path::Path;

use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior, types::Value};
use slotbook_core::{
  participant::{Participant, ParticipantSummary},
  reservation::{Booking, NewBooking, Reservation, ReservationDetail, ReservationStatus},
  slot::{NewSlot, Slot, SlotSummary},
  store::{Backend, ParticipantStore, ReservationStore, SlotStore},
};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{
    RESERVATION_COLUMNS, RawReservation, RawReservationDetail, RawSlot, RawSlotSummary,
    SLOT_COLUMNS, encode_date, encode_dt, encode_status, encode_time, participant_from_row,
  },
  error::is_unique_violation,
  schema::SCHEMA,
};

// ─── SQL ─────────────────────────────────────────────────────────────────────

const UPSERT_PARTICIPANT: &str = "
  INSERT INTO participants (name, email) VALUES (?1, ?2)
  ON CONFLICT (email) DO UPDATE SET name = excluded.name
  RETURNING id";

const HAS_ACTIVE: &str = "
  SELECT EXISTS (
    SELECT 1 FROM reservations
    WHERE slot_id = ?1 AND participant_id = ?2 AND status = 'active'
  )";

const INSERT_RESERVATION: &str = "
  INSERT INTO reservations (slot_id, participant_id, status, reserved_at)
  VALUES (?1, ?2, ?3, ?4)";

fn slot_summary_sql(filter: &str) -> String {
  format!(
    "SELECT {SLOT_COLUMNS}, COUNT(r.id) AS reservation_count
     FROM slots s
     LEFT JOIN reservations r ON r.slot_id = s.id AND r.status = 'active'
     {filter}
     GROUP BY s.id
     ORDER BY s.date ASC, s.start_time ASC"
  )
}

fn reservation_detail_sql(filter: &str, order: &str) -> String {
  format!(
    "SELECT {RESERVATION_COLUMNS}, p.name, p.email, s.date, s.start_time
     FROM reservations r
     JOIN participants p ON p.id = r.participant_id
     JOIN slots        s ON s.id = r.slot_id
     WHERE r.status = 'active' {filter}
     ORDER BY {order}"
  )
}

/// Insert an active reservation on `conn` (a plain connection or an open
/// transaction), mapping a unique-index violation to the domain error.
fn insert_active(
  conn: &rusqlite::Connection,
  slot_id: i64,
  participant_id: i64,
) -> tokio_rusqlite::Result<Result<RawReservation>> {
  let status      = encode_status(ReservationStatus::Active);
  let reserved_at = encode_dt(Utc::now());

  let inserted = conn.execute(
    INSERT_RESERVATION,
    rusqlite::params![slot_id, participant_id, status, reserved_at],
  );
  match inserted {
    Ok(_) => Ok(Ok(RawReservation {
      id: conn.last_insert_rowid(),
      slot_id,
      participant_id,
      status: status.to_owned(),
      reserved_at,
    })),
    Err(e) if is_unique_violation(&e) => {
      Ok(Err(Error::DuplicateActiveReservation { slot_id, participant_id }))
    }
    Err(e) => Err(e.into()),
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// The slot, participant and reservation stores backed by one SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store. Used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn slot_summaries(
    &self,
    filter: &'static str,
    date: Option<Value>,
  ) -> Result<Vec<SlotSummary>> {
    let raws: Vec<RawSlotSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&slot_summary_sql(filter))?;
        let rows = match date {
          Some(d) => stmt.query_map(rusqlite::params![d], RawSlotSummary::from_row)?,
          None => stmt.query_map([], RawSlotSummary::from_row)?,
        }
        .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSlotSummary::into_summary).collect()
  }

  async fn reservation_details(
    &self,
    filter: &'static str,
    order: &'static str,
    arg: Option<Value>,
  ) -> Result<Vec<ReservationDetail>> {
    let raws: Vec<RawReservationDetail> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&reservation_detail_sql(filter, order))?;
        let rows = match arg {
          Some(a) => stmt.query_map(rusqlite::params![a], RawReservationDetail::from_row)?,
          None => stmt.query_map([], RawReservationDetail::from_row)?,
        }
        .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReservationDetail::into_detail).collect()
  }
}

impl Backend for SqliteStore {
  type Error = Error;
}

// ─── SlotStore ───────────────────────────────────────────────────────────────

impl SlotStore for SqliteStore {
  async fn create_slot(&self, slot: NewSlot) -> Result<Slot> {
    let date_str = encode_date(slot.date);
    let time_str = encode_time(slot.start_time);

    let raw: Result<RawSlot> = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO slots (date, start_time, is_available) VALUES (?1, ?2, 1)",
          rusqlite::params![date_str, time_str],
        );
        match inserted {
          Ok(_) => Ok(Ok(RawSlot {
            id:           conn.last_insert_rowid(),
            date:         date_str,
            start_time:   time_str,
            is_available: true,
          })),
          Err(e) if is_unique_violation(&e) => Ok(Err(Error::DuplicateSlot {
            date:       slot.date,
            start_time: slot.start_time,
          })),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    let created = raw?.into_slot()?;
    debug!(slot_id = created.id, date = %created.date, "slot created");
    Ok(created)
  }

  async fn get_slot(&self, id: i64) -> Result<Option<Slot>> {
    let raw: Option<RawSlot> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SLOT_COLUMNS} FROM slots s WHERE s.id = ?1"),
              rusqlite::params![id],
              RawSlot::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSlot::into_slot).transpose()
  }

  async fn find_slot_by_date_time(
    &self,
    date: NaiveDate,
    start_time: NaiveTime,
  ) -> Result<Option<Slot>> {
    let date_str = encode_date(date);
    let time_str = encode_time(start_time);

    let raw: Option<RawSlot> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SLOT_COLUMNS} FROM slots s WHERE s.date = ?1 AND s.start_time = ?2"
              ),
              rusqlite::params![date_str, time_str],
              RawSlot::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSlot::into_slot).transpose()
  }

  async fn list_available_slots(&self) -> Result<Vec<Slot>> {
    let raws: Vec<RawSlot> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SLOT_COLUMNS} FROM slots s
           WHERE s.is_available = 1
           ORDER BY s.date ASC, s.start_time ASC"
        ))?;
        let rows = stmt
          .query_map([], RawSlot::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSlot::into_slot).collect()
  }

  async fn list_slots_with_reservation_count(&self) -> Result<Vec<SlotSummary>> {
    self.slot_summaries("", None).await
  }

  async fn list_slots_for_date(&self, date: NaiveDate) -> Result<Vec<SlotSummary>> {
    self
      .slot_summaries("WHERE s.date = ?1", Some(Value::Text(encode_date(date))))
      .await
  }

  async fn toggle_availability(&self, id: i64) -> Result<bool> {
    let flipped: Option<bool> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "UPDATE slots SET is_available = NOT is_available
               WHERE id = ?1
               RETURNING is_available",
              rusqlite::params![id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    flipped.ok_or(Error::SlotNotFound(id))
  }
}

// ─── ParticipantStore ────────────────────────────────────────────────────────

impl ParticipantStore for SqliteStore {
  async fn find_participant_by_email(&self, email: &str) -> Result<Option<Participant>> {
    let email = email.to_owned();

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT id, name, email FROM participants WHERE email = ?1",
                rusqlite::params![email],
                participant_from_row,
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn get_participant(&self, id: i64) -> Result<Option<Participant>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT id, name, email FROM participants WHERE id = ?1",
                rusqlite::params![id],
                participant_from_row,
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn upsert_participant(&self, name: &str, email: &str) -> Result<i64> {
    let name  = name.to_owned();
    let email = email.to_owned();

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.query_row(UPSERT_PARTICIPANT, rusqlite::params![name, email], |row| {
            row.get(0)
          })?)
        })
        .await?,
    )
  }

  async fn list_participants_with_reservation_count(&self) -> Result<Vec<ParticipantSummary>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(
            "SELECT p.id, p.name, p.email, COUNT(r.id) AS reservation_count
             FROM participants p
             LEFT JOIN reservations r ON r.participant_id = p.id AND r.status = 'active'
             GROUP BY p.id
             ORDER BY p.name ASC, p.id ASC",
          )?;
          let rows = stmt
            .query_map([], |row| {
              Ok(ParticipantSummary {
                participant:       participant_from_row(row)?,
                reservation_count: row.get(3)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn list_participant_reservations(
    &self,
    participant_id: i64,
  ) -> Result<Vec<ReservationDetail>> {
    self
      .reservation_details(
        "AND r.participant_id = ?1",
        "s.date ASC, s.start_time ASC, r.id ASC",
        Some(Value::Integer(participant_id)),
      )
      .await
  }
}

// ─── ReservationStore ────────────────────────────────────────────────────────

impl ReservationStore for SqliteStore {
  async fn get_reservation(&self, id: i64) -> Result<Option<Reservation>> {
    let raw: Option<RawReservation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {RESERVATION_COLUMNS} FROM reservations r WHERE r.id = ?1"),
              rusqlite::params![id],
              RawReservation::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReservation::into_reservation).transpose()
  }

  async fn has_active_reservation(&self, slot_id: i64, participant_id: i64) -> Result<bool> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.query_row(
            HAS_ACTIVE,
            rusqlite::params![slot_id, participant_id],
            |row| row.get(0),
          )?)
        })
        .await?,
    )
  }

  async fn insert_active_reservation(
    &self,
    slot_id: i64,
    participant_id: i64,
  ) -> Result<Reservation> {
    let raw = self
      .conn
      .call(move |conn| insert_active(conn, slot_id, participant_id))
      .await??;
    raw.into_reservation()
  }

  async fn cancel_reservation(&self, id: i64) -> Result<Reservation> {
    let cancelled = encode_status(ReservationStatus::Cancelled);

    let raw: Option<RawReservation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "UPDATE reservations SET status = ?2
               WHERE id = ?1
               RETURNING id, slot_id, participant_id, status, reserved_at",
              rusqlite::params![id, cancelled],
              RawReservation::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.ok_or(Error::ReservationNotFound(id))?.into_reservation()
  }

  async fn list_active_reservations(&self) -> Result<Vec<ReservationDetail>> {
    self
      .reservation_details("", "s.date ASC, s.start_time ASC, r.id ASC", None)
      .await
  }

  async fn list_active_reservations_for_date(
    &self,
    date: NaiveDate,
  ) -> Result<Vec<ReservationDetail>> {
    self
      .reservation_details(
        "AND s.date = ?1",
        "s.start_time ASC, r.id ASC",
        Some(Value::Text(encode_date(date))),
      )
      .await
  }

  async fn list_active_reservations_for_slot(
    &self,
    slot_id: i64,
  ) -> Result<Vec<ReservationDetail>> {
    self
      .reservation_details(
        "AND r.slot_id = ?1",
        "r.reserved_at ASC, r.id ASC",
        Some(Value::Integer(slot_id)),
      )
      .await
  }

  async fn book(&self, booking: &NewBooking) -> Result<Booking> {
    let slot_id = booking.slot_id;
    let name    = booking.participant_name.clone();
    let email   = booking.participant_email.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front, so no other writer can
        // slip in between the checks below and the insert.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let participant_id: i64 =
          tx.query_row(UPSERT_PARTICIPANT, rusqlite::params![name, email], |row| row.get(0))?;

        let slot = tx
          .query_row(
            &format!("SELECT {SLOT_COLUMNS} FROM slots s WHERE s.id = ?1"),
            rusqlite::params![slot_id],
            RawSlot::from_row,
          )
          .optional()?;
        let Some(slot) = slot else {
          return Ok(Err(Error::SlotNotFound(slot_id)));
        };
        if !slot.is_available {
          return Ok(Err(Error::SlotUnavailable(slot_id)));
        }

        let has_active: bool =
          tx.query_row(HAS_ACTIVE, rusqlite::params![slot_id, participant_id], |row| row.get(0))?;
        if has_active {
          return Ok(Err(Error::DuplicateActiveReservation { slot_id, participant_id }));
        }

        let reservation = match insert_active(&tx, slot_id, participant_id)? {
          Ok(r) => r,
          Err(e) => return Ok(Err(e)),
        };

        tx.commit()?;

        let participant = Participant { id: participant_id, name, email };
        Ok(Ok((reservation, participant, slot)))
      })
      .await?;

    let (reservation, participant, slot) = outcome?;
    debug!(
      reservation_id = reservation.id,
      slot_id,
      participant_id = participant.id,
      "reservation booked"
    );
    Ok(Booking {
      reservation: reservation.into_reservation()?,
      participant,
      slot: slot.into_slot()?,
    })
  }
}
