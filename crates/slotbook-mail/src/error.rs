//! Error type for `slotbook-mail`.
//!
//! Every variant is a notification failure. Callers log these and move on;
//! nothing here ever rolls back a reservation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("mail configuration error: {0}")]
  Config(String),

  #[error("invalid mailbox {address:?}: {source}")]
  Address {
    address: String,
    #[source]
    source:  lettre::address::AddressError,
  },

  #[error("failed to build message: {0}")]
  Build(#[from] lettre::error::Error),

  #[error("smtp error: {0}")]
  Smtp(#[from] lettre::transport::smtp::Error),

  #[error("mail task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parse a mailbox such as `"Lab <lab@example.com>"` or `"lab@example.com"`.
pub(crate) fn parse_mailbox(address: &str) -> Result<lettre::message::Mailbox> {
  address.parse().map_err(|source| Error::Address {
    address: address.to_owned(),
    source,
  })
}
