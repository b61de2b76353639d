//! A notifier that renders messages and writes them to the log.
//!
//! Used in development and by `send-reminders --dry-run`.

use std::convert::Infallible;

use slotbook_core::{
  notify::Notifier,
  participant::Participant,
  reservation::ReservationDetail,
  slot::Slot,
};
use tracing::info;

use crate::templates::{Rendered, Templates};

#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
  templates: Templates,
}

impl LogNotifier {
  pub fn new(templates: Templates) -> Self { Self { templates } }

  fn emit(&self, kind: &'static str, to: &str, message: &Rendered) {
    info!(
      kind,
      to,
      subject = %message.subject,
      body = %message.body,
      "mail not sent (log transport)"
    );
  }
}

impl Notifier for LogNotifier {
  type Error = Infallible;

  async fn send_confirmation(
    &self,
    participant: &Participant,
    slot: &Slot,
  ) -> Result<(), Infallible> {
    let message = self.templates.confirmation(participant, slot);
    self.emit("confirmation", &participant.email, &message);
    Ok(())
  }

  async fn send_reminder(&self, reservation: &ReservationDetail) -> Result<(), Infallible> {
    let message = self.templates.reminder(reservation);
    self.emit("reminder", &reservation.email, &message);
    Ok(())
  }
}
