//! In-memory store and notifiers for unit tests.
//!
//! Every operation takes one lock for its whole duration, which gives the
//! same all-or-nothing behaviour the SQLite backend gets from a transaction.

use std::{
  sync::{Mutex, MutexGuard},
  time::Duration,
};

use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::mpsc;

use crate::{
  Error, Result,
  notify::Notifier,
  participant::{Participant, ParticipantSummary},
  reservation::{Booking, NewBooking, Reservation, ReservationDetail, ReservationStatus},
  slot::{NewSlot, Slot, SlotSummary},
  store::{Backend, ParticipantStore, ReservationStore, SlotStore},
};

#[derive(Default)]
struct State {
  slots:        Vec<Slot>,
  participants: Vec<Participant>,
  reservations: Vec<Reservation>,
}

impl State {
  fn active_count(&self, pred: impl Fn(&Reservation) -> bool) -> i64 {
    self
      .reservations
      .iter()
      .filter(|r| r.status.is_active() && pred(r))
      .count() as i64
  }

  fn detail(&self, r: &Reservation) -> ReservationDetail {
    let p = &self.participants[(r.participant_id - 1) as usize];
    let s = &self.slots[(r.slot_id - 1) as usize];
    ReservationDetail {
      reservation: r.clone(),
      name:        p.name.clone(),
      email:       p.email.clone(),
      date:        s.date,
      start_time:  s.start_time,
    }
  }

  fn active_details(&self, pred: impl Fn(&ReservationDetail) -> bool) -> Vec<ReservationDetail> {
    let mut out: Vec<_> = self
      .reservations
      .iter()
      .filter(|r| r.status.is_active())
      .map(|r| self.detail(r))
      .filter(|d| pred(d))
      .collect();
    out.sort_by_key(|d| (d.date, d.start_time, d.reservation.id));
    out
  }

  fn upsert(&mut self, name: &str, email: &str) -> i64 {
    if let Some(p) = self.participants.iter_mut().find(|p| p.email == email) {
      p.name = name.to_owned();
      return p.id;
    }
    let id = self.participants.len() as i64 + 1;
    self.participants.push(Participant {
      id,
      name: name.to_owned(),
      email: email.to_owned(),
    });
    id
  }

  fn insert_active(&mut self, slot_id: i64, participant_id: i64) -> Result<Reservation> {
    let exists = self.reservations.iter().any(|r| {
      r.slot_id == slot_id && r.participant_id == participant_id && r.status.is_active()
    });
    if exists {
      return Err(Error::DuplicateActiveReservation { slot_id, participant_id });
    }
    let reservation = Reservation {
      id: self.reservations.len() as i64 + 1,
      slot_id,
      participant_id,
      status: ReservationStatus::Active,
      reserved_at: Utc::now(),
    };
    self.reservations.push(reservation.clone());
    Ok(reservation)
  }
}

#[derive(Default)]
pub struct FakeStore {
  state: Mutex<State>,
  delay: Mutex<Option<Duration>>,
  reply_delay: Mutex<Option<Duration>>,
}

impl FakeStore {
  fn lock(&self) -> MutexGuard<'_, State> { self.state.lock().unwrap() }

  /// Make `book` sleep before touching state.
  pub fn set_delay(&self, delay: Duration) { *self.delay.lock().unwrap() = Some(delay); }

  /// Make `book` commit and then sleep before replying.
  pub fn set_reply_delay(&self, delay: Duration) {
    *self.reply_delay.lock().unwrap() = Some(delay);
  }

  pub fn participant_count(&self) -> usize { self.lock().participants.len() }

  pub fn reservation_count(&self) -> usize { self.lock().reservations.len() }
}

impl Backend for FakeStore {
  type Error = Error;
}

impl SlotStore for FakeStore {
  async fn create_slot(&self, slot: NewSlot) -> Result<Slot> {
    let mut st = self.lock();
    if st
      .slots
      .iter()
      .any(|s| s.date == slot.date && s.start_time == slot.start_time)
    {
      return Err(Error::DuplicateSlot { date: slot.date, start_time: slot.start_time });
    }
    let created = Slot {
      id:           st.slots.len() as i64 + 1,
      date:         slot.date,
      start_time:   slot.start_time,
      is_available: true,
    };
    st.slots.push(created.clone());
    Ok(created)
  }

  async fn get_slot(&self, id: i64) -> Result<Option<Slot>> {
    Ok(self.lock().slots.iter().find(|s| s.id == id).cloned())
  }

  async fn find_slot_by_date_time(
    &self,
    date: NaiveDate,
    start_time: NaiveTime,
  ) -> Result<Option<Slot>> {
    Ok(
      self
        .lock()
        .slots
        .iter()
        .find(|s| s.date == date && s.start_time == start_time)
        .cloned(),
    )
  }

  async fn list_available_slots(&self) -> Result<Vec<Slot>> {
    let mut out: Vec<_> =
      self.lock().slots.iter().filter(|s| s.is_available).cloned().collect();
    out.sort_by_key(|s| (s.date, s.start_time));
    Ok(out)
  }

  async fn list_slots_with_reservation_count(&self) -> Result<Vec<SlotSummary>> {
    let st = self.lock();
    let mut out: Vec<_> = st
      .slots
      .iter()
      .map(|s| SlotSummary {
        slot:              s.clone(),
        reservation_count: st.active_count(|r| r.slot_id == s.id),
      })
      .collect();
    out.sort_by_key(|s| (s.slot.date, s.slot.start_time));
    Ok(out)
  }

  async fn list_slots_for_date(&self, date: NaiveDate) -> Result<Vec<SlotSummary>> {
    let all = self.list_slots_with_reservation_count().await?;
    Ok(all.into_iter().filter(|s| s.slot.date == date).collect())
  }

  async fn toggle_availability(&self, id: i64) -> Result<bool> {
    let mut st = self.lock();
    let slot = st
      .slots
      .iter_mut()
      .find(|s| s.id == id)
      .ok_or(Error::SlotNotFound(id))?;
    slot.is_available = !slot.is_available;
    Ok(slot.is_available)
  }
}

impl ParticipantStore for FakeStore {
  async fn find_participant_by_email(&self, email: &str) -> Result<Option<Participant>> {
    Ok(self.lock().participants.iter().find(|p| p.email == email).cloned())
  }

  async fn get_participant(&self, id: i64) -> Result<Option<Participant>> {
    Ok(self.lock().participants.iter().find(|p| p.id == id).cloned())
  }

  async fn upsert_participant(&self, name: &str, email: &str) -> Result<i64> {
    Ok(self.lock().upsert(name, email))
  }

  async fn list_participants_with_reservation_count(&self) -> Result<Vec<ParticipantSummary>> {
    let st = self.lock();
    let mut out: Vec<_> = st
      .participants
      .iter()
      .map(|p| ParticipantSummary {
        participant:       p.clone(),
        reservation_count: st.active_count(|r| r.participant_id == p.id),
      })
      .collect();
    out.sort_by(|a, b| a.participant.name.cmp(&b.participant.name));
    Ok(out)
  }

  async fn list_participant_reservations(
    &self,
    participant_id: i64,
  ) -> Result<Vec<ReservationDetail>> {
    Ok(
      self
        .lock()
        .active_details(|d| d.reservation.participant_id == participant_id),
    )
  }
}

impl ReservationStore for FakeStore {
  async fn get_reservation(&self, id: i64) -> Result<Option<Reservation>> {
    Ok(self.lock().reservations.iter().find(|r| r.id == id).cloned())
  }

  async fn has_active_reservation(&self, slot_id: i64, participant_id: i64) -> Result<bool> {
    Ok(
      self
        .lock()
        .active_count(|r| r.slot_id == slot_id && r.participant_id == participant_id)
        > 0,
    )
  }

  async fn insert_active_reservation(
    &self,
    slot_id: i64,
    participant_id: i64,
  ) -> Result<Reservation> {
    self.lock().insert_active(slot_id, participant_id)
  }

  async fn cancel_reservation(&self, id: i64) -> Result<Reservation> {
    let mut st = self.lock();
    let r = st
      .reservations
      .iter_mut()
      .find(|r| r.id == id)
      .ok_or(Error::ReservationNotFound(id))?;
    r.status = ReservationStatus::Cancelled;
    Ok(r.clone())
  }

  async fn list_active_reservations(&self) -> Result<Vec<ReservationDetail>> {
    Ok(self.lock().active_details(|_| true))
  }

  async fn list_active_reservations_for_date(
    &self,
    date: NaiveDate,
  ) -> Result<Vec<ReservationDetail>> {
    Ok(self.lock().active_details(|d| d.date == date))
  }

  async fn list_active_reservations_for_slot(
    &self,
    slot_id: i64,
  ) -> Result<Vec<ReservationDetail>> {
    Ok(self.lock().active_details(|d| d.reservation.slot_id == slot_id))
  }

  async fn book(&self, booking: &NewBooking) -> Result<Booking> {
    let delay = *self.delay.lock().unwrap();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }

    let booked = {
      let mut st = self.lock();
      let slot = st
        .slots
        .iter()
        .find(|s| s.id == booking.slot_id)
        .cloned()
        .ok_or(Error::SlotNotFound(booking.slot_id))?;
      if !slot.is_available {
        return Err(Error::SlotUnavailable(slot.id));
      }
      let participant_id = st.upsert(&booking.participant_name, &booking.participant_email);
      let reservation = st.insert_active(slot.id, participant_id)?;
      let participant = st.participants[(participant_id - 1) as usize].clone();
      Booking { reservation, participant, slot }
    };

    let reply_delay = *self.reply_delay.lock().unwrap();
    if let Some(delay) = reply_delay {
      tokio::time::sleep(delay).await;
    }
    Ok(booked)
  }
}

// ─── Notifiers ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("smtp relay refused the message")]
pub struct SendFailed;

/// Reports every send on a channel as `"<kind>:<email>"`.
pub struct RecordingNotifier {
  tx: mpsc::UnboundedSender<String>,
}

impl RecordingNotifier {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl Notifier for RecordingNotifier {
  type Error = SendFailed;

  async fn send_confirmation(
    &self,
    participant: &Participant,
    _slot: &Slot,
  ) -> Result<(), SendFailed> {
    let _ = self.tx.send(format!("confirmation:{}", participant.email));
    Ok(())
  }

  async fn send_reminder(&self, reservation: &ReservationDetail) -> Result<(), SendFailed> {
    let _ = self.tx.send(format!("reminder:{}", reservation.email));
    Ok(())
  }
}

/// Fails every send.
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
  type Error = SendFailed;

  async fn send_confirmation(&self, _: &Participant, _: &Slot) -> Result<(), SendFailed> {
    Err(SendFailed)
  }

  async fn send_reminder(&self, _: &ReservationDetail) -> Result<(), SendFailed> {
    Err(SendFailed)
  }
}

/// Fails reminders for addresses in `fail_for`, succeeds for the rest.
pub struct SelectiveNotifier {
  pub fail_for: Vec<String>,
}

impl Notifier for SelectiveNotifier {
  type Error = SendFailed;

  async fn send_confirmation(&self, _: &Participant, _: &Slot) -> Result<(), SendFailed> {
    Ok(())
  }

  async fn send_reminder(&self, reservation: &ReservationDetail) -> Result<(), SendFailed> {
    if self.fail_for.iter().any(|e| *e == reservation.email) {
      Err(SendFailed)
    } else {
      Ok(())
    }
  }
}
