//! Participants, identified by email address.

use serde::{Deserialize, Serialize};

/// A person taking part in an experiment.
///
/// `email` is the identity key and is compared exactly as stored. `name` is
/// overwritten by every booking made with the same email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
  pub id:    i64,
  pub name:  String,
  pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSummary {
  #[serde(flatten)]
  pub participant:       Participant,
  /// Active reservations only.
  pub reservation_count: i64,
}
