//! SMTP notifier using Lettre.
//!
//! Sends plain-text UTF-8 mail over a STARTTLS relay. Lettre's
//! [`SmtpTransport`] is blocking, so each send runs on the blocking pool.

use lettre::{
  Message, SmtpTransport, Transport as _,
  message::{Mailbox, header::ContentType},
  transport::smtp::authentication::Credentials,
};
use slotbook_core::{
  notify::Notifier,
  participant::Participant,
  reservation::ReservationDetail,
  slot::Slot,
};
use tracing::debug;

use crate::{
  config::MailConfig,
  error::{Error, Result, parse_mailbox},
  templates::{Rendered, Templates},
};

#[derive(Clone)]
pub struct SmtpNotifier {
  transport: SmtpTransport,
  sender:    Sender,
  templates: Templates,
}

/// The envelope fields shared by every outgoing message.
#[derive(Debug, Clone)]
struct Sender {
  from:     Mailbox,
  reply_to: Option<Mailbox>,
}

impl Sender {
  fn from_config(config: &MailConfig) -> Result<Self> {
    Ok(Self {
      from:     parse_mailbox(&config.from)?,
      reply_to: config.reply_to.as_deref().map(parse_mailbox).transpose()?,
    })
  }

  fn message(&self, to: &str, rendered: Rendered) -> Result<Message> {
    let mut builder = Message::builder()
      .from(self.from.clone())
      .to(parse_mailbox(to)?)
      .subject(rendered.subject)
      .header(ContentType::TEXT_PLAIN);
    if let Some(reply_to) = &self.reply_to {
      builder = builder.reply_to(reply_to.clone());
    }
    Ok(builder.body(rendered.body)?)
  }
}

impl SmtpNotifier {
  /// Build a notifier from the `[mail]` section. No connection is made
  /// until the first send.
  pub fn new(config: &MailConfig) -> Result<Self> {
    let host = config
      .smtp_host
      .as_deref()
      .ok_or_else(|| Error::Config("smtp_host is required for the smtp transport".into()))?;

    let mut builder = SmtpTransport::starttls_relay(host)?.port(config.smtp_port);
    match (&config.smtp_username, &config.smtp_password) {
      (Some(user), Some(pass)) => {
        builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
      }
      (None, None) => {}
      _ => {
        return Err(Error::Config(
          "smtp_username and smtp_password must be set together".into(),
        ));
      }
    }

    Ok(Self {
      transport: builder.build(),
      sender:    Sender::from_config(config)?,
      templates: config.templates(),
    })
  }

  async fn deliver(&self, to: &str, rendered: Rendered) -> Result<()> {
    let message = self.sender.message(to, rendered)?;
    let transport = self.transport.clone();

    let response = tokio::task::spawn_blocking(move || transport.send(&message)).await??;
    debug!(to, code = %response.code(), "mail accepted by relay");
    Ok(())
  }
}

impl Notifier for SmtpNotifier {
  type Error = Error;

  async fn send_confirmation(&self, participant: &Participant, slot: &Slot) -> Result<()> {
    let rendered = self.templates.confirmation(participant, slot);
    self.deliver(&participant.email, rendered).await
  }

  async fn send_reminder(&self, reservation: &ReservationDetail) -> Result<()> {
    let rendered = self.templates.reminder(reservation);
    self.deliver(&reservation.email, rendered).await
  }
}
