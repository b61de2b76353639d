//! Notification transports for slotbook.
//!
//! [`MailNotifier`] picks a transport from [`MailConfig`]: SMTP for real
//! delivery or the log-only notifier for development and dry runs.

pub mod config;
pub mod error;
pub mod log;
pub mod smtp;
pub mod templates;

use slotbook_core::{
  notify::Notifier,
  participant::Participant,
  reservation::ReservationDetail,
  slot::Slot,
};

pub use config::{MailConfig, TransportKind};
pub use error::{Error, Result};
pub use log::LogNotifier;
pub use smtp::SmtpNotifier;

/// The configured transport.
#[derive(Clone)]
pub enum MailNotifier {
  Smtp(SmtpNotifier),
  Log(LogNotifier),
}

impl MailNotifier {
  pub fn from_config(config: &MailConfig) -> Result<Self> {
    match config.transport {
      TransportKind::Smtp => Ok(Self::Smtp(SmtpNotifier::new(config)?)),
      TransportKind::Log => Ok(Self::log_only(config)),
    }
  }

  /// A log-only notifier with the configured templates, whatever the
  /// configured transport.
  pub fn log_only(config: &MailConfig) -> Self { Self::Log(LogNotifier::new(config.templates())) }
}

impl Notifier for MailNotifier {
  type Error = Error;

  async fn send_confirmation(&self, participant: &Participant, slot: &Slot) -> Result<()> {
    match self {
      Self::Smtp(n) => n.send_confirmation(participant, slot).await,
      Self::Log(n) => Ok(
        n.send_confirmation(participant, slot)
          .await
          .unwrap_or_else(|never| match never {}),
      ),
    }
  }

  async fn send_reminder(&self, reservation: &ReservationDetail) -> Result<()> {
    match self {
      Self::Smtp(n) => n.send_reminder(reservation).await,
      Self::Log(n) => Ok(
        n.send_reminder(reservation)
          .await
          .unwrap_or_else(|never| match never {}),
      ),
    }
  }
}
