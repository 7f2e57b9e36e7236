//! Contact — one (email, phone) observation of a person, plus its position
//! in the identity graph.
//!
//! Live contacts form a forest of depth exactly one: primaries are roots,
//! secondaries point at a primary via `linked_id`. Within one group the
//! primary is the oldest row by `created_at` (ties broken by the lower id).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned row identity. Monotonic and never reused: a later insert
/// never receives a smaller id.
pub type ContactId = i64;

/// A contact's role in its identity group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precedence {
  Primary,
  Secondary,
}

/// A persisted contact row. `email`, `phone`, `created_at` and `id` are
/// immutable after insert; only `precedence`, `linked_id` and `updated_at`
/// change, and only during a merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
  pub id:         ContactId,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  /// For a secondary, the id of its primary. Always absent on a primary.
  pub linked_id:  Option<ContactId>,
  pub precedence: Precedence,
  /// Store-assigned at insert; never changes.
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  /// Soft-deletion marker. Set by external operator tooling only; the engine
  /// treats it purely as a filter.
  pub deleted_at: Option<DateTime<Utc>>,
}

impl Contact {
  pub fn is_primary(&self) -> bool {
    matches!(self.precedence, Precedence::Primary)
  }

  pub fn is_live(&self) -> bool {
    self.deleted_at.is_none()
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// A validated, normalized reconcile request. At least one field must be
/// present; format validation is the caller's responsibility and is not
/// repeated by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactInput {
  pub email: Option<String>,
  pub phone: Option<String>,
}

impl ContactInput {
  pub fn new(email: Option<String>, phone: Option<String>) -> Self {
    Self { email, phone }
  }
}

/// Input to [`crate::store::StoreTx::insert_contact`]. The id and both
/// timestamps are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewContact {
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub linked_id:  Option<ContactId>,
  pub precedence: Precedence,
}

impl NewContact {
  /// A fresh root for a previously unseen person.
  pub fn primary(email: Option<String>, phone: Option<String>) -> Self {
    Self {
      email,
      phone,
      linked_id: None,
      precedence: Precedence::Primary,
    }
  }

  /// A new observation attached to an existing group.
  pub fn secondary(
    primary_id: ContactId,
    email: Option<String>,
    phone: Option<String>,
  ) -> Self {
    Self {
      email,
      phone,
      linked_id: Some(primary_id),
      precedence: Precedence::Secondary,
    }
  }
}
