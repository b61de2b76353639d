//! The notification gateway seen from the core.
//!
//! Transports live in `slotbook-mail`. The core only decides *when* to
//! notify: confirmations go out after a booking commits, reminders from the
//! daily job. Neither path lets a delivery failure change stored state.

use std::future::Future;

use crate::{participant::Participant, reservation::ReservationDetail, slot::Slot};

pub trait Notifier: Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Tell `participant` that their reservation on `slot` is confirmed.
  fn send_confirmation<'a>(
    &'a self,
    participant: &'a Participant,
    slot: &'a Slot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remind the holder of `reservation` about their upcoming session.
  fn send_reminder<'a>(
    &'a self,
    reservation: &'a ReservationDetail,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
