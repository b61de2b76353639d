//! The `[mail]` configuration section.

use serde::Deserialize;

use crate::templates::Templates;

/// Which transport delivers messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
  Smtp,
  /// Render and log only. The default, so a fresh checkout never sends mail.
  #[default]
  Log,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
  #[serde(default)]
  pub transport:       TransportKind,
  pub smtp_host:       Option<String>,
  #[serde(default = "default_smtp_port")]
  pub smtp_port:       u16,
  pub smtp_username:   Option<String>,
  pub smtp_password:   Option<String>,
  #[serde(default = "default_from")]
  pub from:            String,
  pub reply_to:        Option<String>,
  /// Free text inserted into every message: meeting link, preparation notes.
  #[serde(default)]
  pub session_details: String,
  #[serde(default)]
  pub signature:       String,
}

fn default_smtp_port() -> u16 { 587 }

fn default_from() -> String { "Lab <lab@example.com>".to_string() }

impl Default for MailConfig {
  fn default() -> Self {
    Self {
      transport:       TransportKind::default(),
      smtp_host:       None,
      smtp_port:       default_smtp_port(),
      smtp_username:   None,
      smtp_password:   None,
      from:            default_from(),
      reply_to:        None,
      session_details: String::new(),
      signature:       String::new(),
    }
  }
}

impl MailConfig {
  pub fn templates(&self) -> Templates {
    Templates::new(self.session_details.clone(), self.signature.clone())
  }
}
