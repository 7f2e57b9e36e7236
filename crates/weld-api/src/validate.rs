//! Request validation and normalization.
//!
//! The reconciliation engine trusts its input, so every inbound field is
//! normalized and format-checked here, at the system boundary. Emails are
//! trimmed and lowercased; phones are trimmed but otherwise preserved in
//! their user-entered form — "123-456" and "123 456" are distinct values.

use once_cell::sync::Lazy;
use regex::Regex;
use weld_core::contact::ContactInput;

use crate::error::ApiError;

pub const MAX_EMAIL_LEN: usize = 320;
pub const MAX_PHONE_LEN: usize = 20;

/// Pragmatic address shape: one `@`, no whitespace, a dotted domain.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("invalid email regex")
});

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^\+?[\d\s\-()]+$").expect("invalid phone regex")
});

/// Normalize and validate a raw request into an engine input.
///
/// Absent fields stay absent; a present field that fails validation rejects
/// the whole request rather than being silently dropped.
pub fn normalize(
  email: Option<String>,
  phone: Option<String>,
) -> Result<ContactInput, ApiError> {
  if email.is_none() && phone.is_none() {
    return Err(ApiError::Validation(
      "at least one of email or phoneNumber is required".to_owned(),
    ));
  }
  let email = email.as_deref().map(normalize_email).transpose()?;
  let phone = phone.as_deref().map(normalize_phone).transpose()?;
  Ok(ContactInput::new(email, phone))
}

fn normalize_email(raw: &str) -> Result<String, ApiError> {
  let email = raw.trim().to_lowercase();
  if email.is_empty() {
    return Err(ApiError::Validation("email must not be blank".to_owned()));
  }
  if email.len() > MAX_EMAIL_LEN {
    return Err(ApiError::Validation(format!(
      "email exceeds {MAX_EMAIL_LEN} characters"
    )));
  }
  if !EMAIL_PATTERN.is_match(&email) {
    return Err(ApiError::Validation(format!(
      "malformed email address: {email:?}"
    )));
  }
  Ok(email)
}

fn normalize_phone(raw: &str) -> Result<String, ApiError> {
  let phone = raw.trim().to_owned();
  if phone.is_empty() {
    return Err(ApiError::Validation(
      "phoneNumber must not be blank".to_owned(),
    ));
  }
  if phone.len() > MAX_PHONE_LEN {
    return Err(ApiError::Validation(format!(
      "phoneNumber exceeds {MAX_PHONE_LEN} characters"
    )));
  }
  if !PHONE_PATTERN.is_match(&phone) {
    return Err(ApiError::Validation(format!(
      "phoneNumber contains disallowed characters: {phone:?}"
    )));
  }
  Ok(phone)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
