//! Store traits for slots, participants and reservations.
//!
//! The traits are implemented by storage backends (e.g.
//! `slotbook-store-sqlite`). Higher layers (`slotbook-api`, the reminder
//! job) depend on these abstractions, not on a concrete backend.
//!
//! All three stores share one error type through [`Backend`]. That error
//! must convert into [`crate::Error`], and uniqueness violations must come
//! back as the matching domain variant rather than as a generic storage
//! failure.

use std::future::Future;

use chrono::{NaiveDate, NaiveTime};

use crate::{
  participant::{Participant, ParticipantSummary},
  reservation::{Booking, NewBooking, Reservation, ReservationDetail},
  slot::{NewSlot, Slot, SlotSummary},
};

// ─── Base ────────────────────────────────────────────────────────────────────

/// The shared root of the store traits.
///
/// All methods on the sub-traits return `Send` futures so they can be used
/// from multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Backend: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;
}

// ─── Slots ───────────────────────────────────────────────────────────────────

pub trait SlotStore: Backend {
  /// Persist a new, available slot. Fails with a duplicate-slot error if
  /// `(date, start_time)` is already taken.
  fn create_slot(
    &self,
    slot: NewSlot,
  ) -> impl Future<Output = Result<Slot, Self::Error>> + Send + '_;

  /// Retrieve a slot by id. Returns `None` if not found.
  fn get_slot(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Slot>, Self::Error>> + Send + '_;

  fn find_slot_by_date_time(
    &self,
    date: NaiveDate,
    start_time: NaiveTime,
  ) -> impl Future<Output = Result<Option<Slot>, Self::Error>> + Send + '_;

  /// Slots with `is_available = true`, ordered by `(date, start_time)`.
  fn list_available_slots(
    &self,
  ) -> impl Future<Output = Result<Vec<Slot>, Self::Error>> + Send + '_;

  /// Every slot with its active reservation count, ordered by
  /// `(date, start_time)`.
  fn list_slots_with_reservation_count(
    &self,
  ) -> impl Future<Output = Result<Vec<SlotSummary>, Self::Error>> + Send + '_;

  /// Slots on one date with their active reservation counts, ordered by
  /// start time.
  fn list_slots_for_date(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<SlotSummary>, Self::Error>> + Send + '_;

  /// Flip `is_available` and return the new value.
  fn toggle_availability(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Participants ────────────────────────────────────────────────────────────

pub trait ParticipantStore: Backend {
  /// Look up a participant by exact email. Absence is not an error.
  fn find_participant_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + 'a;

  fn get_participant(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + '_;

  /// Insert a participant, or overwrite the name of the one that already
  /// owns `email`. Returns the participant id.
  ///
  /// Must be atomic: concurrent upserts of a new email yield one row.
  fn upsert_participant<'a>(
    &'a self,
    name: &'a str,
    email: &'a str,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// All participants with their active reservation counts, ordered by name.
  fn list_participants_with_reservation_count(
    &self,
  ) -> impl Future<Output = Result<Vec<ParticipantSummary>, Self::Error>> + Send + '_;

  /// A participant's active reservations, ordered by slot date and time.
  fn list_participant_reservations(
    &self,
    participant_id: i64,
  ) -> impl Future<Output = Result<Vec<ReservationDetail>, Self::Error>> + Send + '_;
}

// ─── Reservations ────────────────────────────────────────────────────────────

pub trait ReservationStore: Backend {
  fn get_reservation(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Reservation>, Self::Error>> + Send + '_;

  /// `true` iff an active reservation exists for the pair.
  fn has_active_reservation(
    &self,
    slot_id: i64,
    participant_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Insert an active reservation stamped with the current time.
  ///
  /// The at-most-one-active-per-pair rule is enforced by the store itself;
  /// a violation surfaces as a duplicate-active-reservation error.
  fn insert_active_reservation(
    &self,
    slot_id: i64,
    participant_id: i64,
  ) -> impl Future<Output = Result<Reservation, Self::Error>> + Send + '_;

  /// Mark a reservation cancelled. Cancelling an already-cancelled
  /// reservation succeeds and leaves it unchanged.
  fn cancel_reservation(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Reservation, Self::Error>> + Send + '_;

  /// Active reservations with participant and slot details, ordered by
  /// `(date, start_time)`.
  fn list_active_reservations(
    &self,
  ) -> impl Future<Output = Result<Vec<ReservationDetail>, Self::Error>> + Send + '_;

  /// Active reservations on one date, ordered by start time.
  fn list_active_reservations_for_date(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<ReservationDetail>, Self::Error>> + Send + '_;

  /// Active reservations on one slot, oldest first.
  fn list_active_reservations_for_slot(
    &self,
    slot_id: i64,
  ) -> impl Future<Output = Result<Vec<ReservationDetail>, Self::Error>> + Send + '_;

  /// The booking transaction, all-or-nothing:
  ///
  /// 1. upsert the participant by email,
  /// 2. require the slot to exist and be available,
  /// 3. require no active reservation for `(slot, participant)`,
  /// 4. insert the active reservation.
  ///
  /// Concurrent calls for the same pair produce exactly one active row; the
  /// others fail with a duplicate-active-reservation error.
  fn book<'a>(
    &'a self,
    booking: &'a NewBooking,
  ) -> impl Future<Output = Result<Booking, Self::Error>> + Send + 'a;
}

// ─── Aggregate ───────────────────────────────────────────────────────────────

/// Convenience bound for code that needs all three stores.
pub trait Store: SlotStore + ParticipantStore + ReservationStore {}

impl<T> Store for T where T: SlotStore + ParticipantStore + ReservationStore {}
