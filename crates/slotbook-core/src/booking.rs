//! The booking service, the one place reservations are created.
//!
//! [`BookingService::book`] validates input, runs the store's atomic booking
//! transaction under a timeout, and only then hands the confirmation to the
//! [`Notifier`] on a detached task. The reservation stands whatever happens
//! to the email.

use std::{future::Future, sync::Arc, time::Duration};

use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  notify::Notifier,
  reservation::{Booking, NewBooking, Reservation},
  store::Store,
  validate,
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Upper bounds on external calls made by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
  /// Applied to every backing-store call; expiry is reported as
  /// [`Error::StorageUnavailable`].
  pub store:  Duration,
  /// Applied to each confirmation send; expiry is only logged.
  pub notify: Duration,
}

impl Default for Timeouts {
  fn default() -> Self {
    Self {
      store:  Duration::from_secs(5),
      notify: Duration::from_secs(10),
    }
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Orchestrates participant upsert and reservation creation.
///
/// Cloning is cheap; the store and notifier are reference-counted.
pub struct BookingService<S, N> {
  store:    Arc<S>,
  notifier: Arc<N>,
  timeouts: Timeouts,
}

impl<S, N> Clone for BookingService<S, N> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      notifier: Arc::clone(&self.notifier),
      timeouts: self.timeouts,
    }
  }
}

impl<S, N> BookingService<S, N>
where
  S: Store + 'static,
  N: Notifier,
{
  pub fn new(store: Arc<S>, notifier: Arc<N>, timeouts: Timeouts) -> Self {
    Self { store, notifier, timeouts }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn timeouts(&self) -> Timeouts { self.timeouts }

  /// Book `slot_id` for the participant identified by `participant_email`.
  ///
  /// Fails with [`Error::Validation`] for bad input, [`Error::SlotNotFound`],
  /// [`Error::SlotUnavailable`] or [`Error::DuplicateActiveReservation`].
  ///
  /// A store timeout is reported as [`Error::StorageUnavailable`] but does
  /// not roll the booking back: the store may still commit it, in which case
  /// no confirmation is sent and a retry conflicts.
  pub async fn book(
    &self,
    slot_id: i64,
    participant_name: &str,
    participant_email: &str,
  ) -> Result<Booking> {
    let input = NewBooking::new(slot_id, participant_name, participant_email)?;

    let booking = match self.run("book", self.store.book(&input)).await {
      Ok(b) => b,
      Err(e) => {
        if e.is_conflict() || e.is_not_found() {
          info!(slot_id, error = %e, "booking rejected");
        } else if matches!(e, Error::StorageUnavailable(_)) {
          warn!(slot_id, participant_email, error = %e, "booking outcome unknown");
        } else {
          warn!(slot_id, error = %e, "booking failed");
        }
        return Err(e);
      }
    };

    info!(
      reservation_id = booking.reservation.id,
      slot_id,
      participant_id = booking.participant.id,
      "reservation created"
    );

    self.spawn_confirmation(&booking);
    Ok(booking)
  }

  /// Cancel a reservation. No notification is sent.
  pub async fn cancel(&self, reservation_id: i64) -> Result<Reservation> {
    let reservation = self
      .run("cancel_reservation", self.store.cancel_reservation(reservation_id))
      .await?;
    info!(reservation_id, slot_id = reservation.slot_id, "reservation cancelled");
    Ok(reservation)
  }

  /// Register (or rename) a participant without booking anything.
  pub async fn register_participant(&self, name: &str, email: &str) -> Result<i64> {
    let (name, email) = validate::name_and_email(name, email)?;
    let id = self
      .run("upsert_participant", self.store.upsert_participant(&name, &email))
      .await?;
    debug!(participant_id = id, "participant upserted");
    Ok(id)
  }

  /// Flip a slot's availability and return the new value.
  pub async fn toggle_availability(&self, slot_id: i64) -> Result<bool> {
    let available = self
      .run("toggle_availability", self.store.toggle_availability(slot_id))
      .await?;
    info!(slot_id, is_available = available, "slot availability toggled");
    Ok(available)
  }

  /// Drive a store future under the store timeout, converting its error
  /// into the domain taxonomy.
  pub async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T>
  where
    F: Future<Output = Result<T, S::Error>>,
  {
    match tokio::time::timeout(self.timeouts.store, fut).await {
      Ok(res) => res.map_err(Into::into),
      Err(_) => {
        warn!(op, timeout = ?self.timeouts.store, "store call timed out");
        Err(Error::StorageUnavailable(format!("{op} timed out")))
      }
    }
  }

  fn spawn_confirmation(&self, booking: &Booking) {
    let notifier       = Arc::clone(&self.notifier);
    let limit          = self.timeouts.notify;
    let participant    = booking.participant.clone();
    let slot           = booking.slot.clone();
    let reservation_id = booking.reservation.id;

    tokio::spawn(async move {
      match tokio::time::timeout(limit, notifier.send_confirmation(&participant, &slot)).await {
        Ok(Ok(())) => debug!(reservation_id, "confirmation sent"),
        Ok(Err(e)) => warn!(reservation_id, error = %e, "confirmation failed to send"),
        Err(_) => warn!(reservation_id, timeout = ?limit, "confirmation send timed out"),
      }
    });
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use chrono::{NaiveDate, NaiveTime};
  use futures::future::join_all;

  use super::*;
  use crate::{
    fake::{FailingNotifier, FakeStore, RecordingNotifier},
    slot::NewSlot,
    store::{ParticipantStore, ReservationStore, SlotStore},
  };

  fn fast() -> Timeouts {
    Timeouts {
      store:  Duration::from_millis(200),
      notify: Duration::from_millis(200),
    }
  }

  async fn seeded() -> (Arc<FakeStore>, i64) {
    let store = Arc::new(FakeStore::default());
    let slot = store
      .create_slot(NewSlot {
        date:       NaiveDate::from_ymd_opt(2025, 8, 8).unwrap(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
      })
      .await
      .unwrap();
    (store, slot.id)
  }

  #[tokio::test]
  async fn book_creates_active_reservation() {
    let (store, slot_id) = seeded().await;
    let (notifier, _rx) = RecordingNotifier::new();
    let svc = BookingService::new(store.clone(), Arc::new(notifier), fast());

    let booking = svc.book(slot_id, "Taro", "taro@example.com").await.unwrap();
    assert!(booking.reservation.status.is_active());
    assert_eq!(booking.participant.name, "Taro");
    assert!(
      store
        .has_active_reservation(slot_id, booking.participant.id)
        .await
        .unwrap()
    );
  }

  #[tokio::test]
  async fn book_sends_confirmation_after_commit() {
    let (store, slot_id) = seeded().await;
    let (notifier, mut rx) = RecordingNotifier::new();
    let svc = BookingService::new(store, Arc::new(notifier), fast());

    svc.book(slot_id, "Taro", "taro@example.com").await.unwrap();

    let sent = tokio::time::timeout(Duration::from_secs(1), rx.recv())
      .await
      .expect("confirmation dispatched")
      .unwrap();
    assert_eq!(sent, "confirmation:taro@example.com");
  }

  #[tokio::test]
  async fn book_succeeds_when_notification_fails() {
    let (store, slot_id) = seeded().await;
    let svc = BookingService::new(store.clone(), Arc::new(FailingNotifier), fast());

    let booking = svc.book(slot_id, "Taro", "taro@example.com").await.unwrap();
    // Give the detached task a chance to run and fail.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let stored = store.get_reservation(booking.reservation.id).await.unwrap();
    assert!(stored.unwrap().status.is_active());
  }

  #[tokio::test]
  async fn second_booking_for_same_pair_is_rejected() {
    let (store, slot_id) = seeded().await;
    let svc = BookingService::new(store.clone(), Arc::new(FailingNotifier), fast());

    svc.book(slot_id, "Taro", "taro@example.com").await.unwrap();
    let err = svc.book(slot_id, "Taro", "taro@example.com").await.unwrap_err();
    assert!(matches!(err, Error::DuplicateActiveReservation { .. }));
    assert_eq!(store.reservation_count(), 1);
  }

  #[tokio::test]
  async fn rebooking_after_cancel_succeeds() {
    let (store, slot_id) = seeded().await;
    let svc = BookingService::new(store.clone(), Arc::new(FailingNotifier), fast());

    let first = svc.book(slot_id, "Taro", "taro@example.com").await.unwrap();
    svc.cancel(first.reservation.id).await.unwrap();
    let second = svc.book(slot_id, "Taro", "taro@example.com").await.unwrap();

    assert_ne!(first.reservation.id, second.reservation.id);
    assert_eq!(first.participant.id, second.participant.id);
  }

  #[tokio::test]
  async fn hidden_slot_cannot_be_booked() {
    let (store, slot_id) = seeded().await;
    let svc = BookingService::new(store, Arc::new(FailingNotifier), fast());

    assert!(!svc.toggle_availability(slot_id).await.unwrap());
    let err = svc.book(slot_id, "Taro", "taro@example.com").await.unwrap_err();
    assert!(matches!(err, Error::SlotUnavailable(id) if id == slot_id));
  }

  #[tokio::test]
  async fn unknown_slot_is_not_found() {
    let (store, _) = seeded().await;
    let svc = BookingService::new(store, Arc::new(FailingNotifier), fast());

    let err = svc.book(999, "Taro", "taro@example.com").await.unwrap_err();
    assert!(matches!(err, Error::SlotNotFound(999)));
  }

  #[tokio::test]
  async fn invalid_email_never_reaches_the_store() {
    let (store, slot_id) = seeded().await;
    let svc = BookingService::new(store.clone(), Arc::new(FailingNotifier), fast());

    let err = svc.book(slot_id, "Taro", "taro-at-example").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(store.find_participant_by_email("taro-at-example").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn rebooking_overwrites_participant_name() {
    let (store, slot_id) = seeded().await;
    let other = store
      .create_slot(NewSlot {
        date:       NaiveDate::from_ymd_opt(2025, 8, 8).unwrap(),
        start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
      })
      .await
      .unwrap();
    let svc = BookingService::new(store.clone(), Arc::new(FailingNotifier), fast());

    svc.book(slot_id, "Taro", "taro@example.com").await.unwrap();
    svc.book(other.id, "Taro Yamada", "taro@example.com").await.unwrap();

    let p = store
      .find_participant_by_email("taro@example.com")
      .await
      .unwrap()
      .unwrap();
    assert_eq!(p.name, "Taro Yamada");
    assert_eq!(store.participant_count(), 1);
  }

  #[tokio::test]
  async fn concurrent_bookings_yield_one_active_reservation() {
    let (store, slot_id) = seeded().await;
    let svc = BookingService::new(store.clone(), Arc::new(FailingNotifier), fast());

    let attempts = (0..8).map(|_| {
      let svc = svc.clone();
      tokio::spawn(async move { svc.book(slot_id, "Taro", "taro@example.com").await })
    });
    let results: Vec<_> = join_all(attempts)
      .await
      .into_iter()
      .map(|r| r.unwrap())
      .collect();

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let dup = results
      .iter()
      .filter(|r| matches!(r, Err(Error::DuplicateActiveReservation { .. })))
      .count();
    assert_eq!(ok, 1);
    assert_eq!(dup, 7);
    assert_eq!(store.participant_count(), 1);
  }

  #[tokio::test]
  async fn slow_store_reports_storage_unavailable() {
    let (store, slot_id) = seeded().await;
    store.set_delay(Duration::from_millis(500));
    let svc = BookingService::new(store, Arc::new(FailingNotifier), Timeouts {
      store:  Duration::from_millis(20),
      notify: Duration::from_millis(20),
    });

    let err = svc.book(slot_id, "Taro", "taro@example.com").await.unwrap_err();
    assert!(matches!(err, Error::StorageUnavailable(_)));
  }

  #[tokio::test]
  async fn timed_out_booking_may_still_commit() {
    let (store, slot_id) = seeded().await;
    store.set_reply_delay(Duration::from_millis(500));
    let (notifier, mut rx) = RecordingNotifier::new();
    let svc = BookingService::new(store.clone(), Arc::new(notifier), Timeouts {
      store:  Duration::from_millis(20),
      notify: Duration::from_millis(20),
    });

    let err = svc.book(slot_id, "Taro", "taro@example.com").await.unwrap_err();
    assert!(matches!(err, Error::StorageUnavailable(_)));
    assert_eq!(store.reservation_count(), 1);
    assert!(rx.try_recv().is_err());

    let (fresh, _rx) = RecordingNotifier::new();
    let retry = BookingService::new(store, Arc::new(fresh), fast());
    assert!(matches!(
      retry.book(slot_id, "Taro", "taro@example.com").await,
      Err(Error::DuplicateActiveReservation { .. })
    ));
  }

  #[tokio::test]
  async fn register_participant_validates() {
    let (store, _) = seeded().await;
    let svc = BookingService::new(store, Arc::new(FailingNotifier), fast());

    assert!(matches!(
      svc.register_participant("", "a@example.com").await,
      Err(Error::Validation(_))
    ));
    let id = svc.register_participant("Hanako", "hanako@example.com").await.unwrap();
    let again = svc.register_participant("Hanako S.", "hanako@example.com").await.unwrap();
    assert_eq!(id, again);
  }
}
