//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings; precedence as lowercase
//! text matching its serde form.

use chrono::{DateTime, Utc};
use weld_core::{
  Error, Result,
  contact::{Contact, Precedence},
};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| {
      Error::StoreUnavailable(format!("undecodable timestamp {s:?}: {e}"))
    })
}

// ─── Precedence ──────────────────────────────────────────────────────────────

pub fn encode_precedence(p: Precedence) -> &'static str {
  match p {
    Precedence::Primary => "primary",
    Precedence::Secondary => "secondary",
  }
}

pub fn decode_precedence(s: &str) -> Result<Precedence> {
  match s {
    "primary" => Ok(Precedence::Primary),
    "secondary" => Ok(Precedence::Secondary),
    other => {
      Err(Error::StoreUnavailable(format!("unknown precedence: {other:?}")))
    }
  }
}

// ─── Row mapping ─────────────────────────────────────────────────────────────

/// Column list shared by every contact SELECT; must match
/// [`RawContact::from_row`] positionally.
pub const CONTACT_COLUMNS: &str =
  "id, email, phone, linked_id, precedence, created_at, updated_at, deleted_at";

/// A contact row as it comes off SQLite, before text fields are decoded.
pub struct RawContact {
  pub id:         i64,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub linked_id:  Option<i64>,
  pub precedence: String,
  pub created_at: String,
  pub updated_at: String,
  pub deleted_at: Option<String>,
}

impl RawContact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      email:      row.get(1)?,
      phone:      row.get(2)?,
      linked_id:  row.get(3)?,
      precedence: row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
      deleted_at: row.get(7)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      id:         self.id,
      email:      self.email,
      phone:      self.phone,
      linked_id:  self.linked_id,
      precedence: decode_precedence(&self.precedence)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      deleted_at: self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
