//! Input validation shared by the HTTP layer and the booking service.

use crate::{Error, Result};

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;
const MAX_NAME_LEN: usize = 200;

/// Check that `email` looks like a deliverable address.
///
/// This is a structural check (one `@`, sane local part, dotted domain of
/// alphanumeric/hyphen labels), not a full RFC 5322 parser.
pub fn is_valid_email(email: &str) -> bool {
  if email.len() < 3 || email.len() > MAX_EMAIL_LEN {
    return false;
  }

  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  if domain.contains('@') {
    return false;
  }

  if local.is_empty() || local.len() > MAX_LOCAL_LEN {
    return false;
  }
  if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
    return false;
  }
  let local_ok = |c: char| {
    c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c)
  };
  if !local.chars().all(local_ok) {
    return false;
  }

  let labels: Vec<&str> = domain.split('.').collect();
  if labels.len() < 2 {
    return false;
  }
  labels.iter().all(|label| {
    !label.is_empty()
      && label.len() <= 63
      && !label.starts_with('-')
      && !label.ends_with('-')
      && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
  })
}

/// Trim and validate a participant's name and email.
///
/// Returns the trimmed pair. The email keeps its case: identity is by exact
/// match on the stored string.
pub fn name_and_email(name: &str, email: &str) -> Result<(String, String)> {
  let name = name.trim();
  let email = email.trim();

  if name.is_empty() || email.is_empty() {
    return Err(Error::Validation("Missing required fields".into()));
  }
  if name.chars().count() > MAX_NAME_LEN {
    return Err(Error::Validation("Name is too long".into()));
  }
  if !is_valid_email(email) {
    return Err(Error::Validation("Invalid email address".into()));
  }

  Ok((name.to_owned(), email.to_owned()))
}
