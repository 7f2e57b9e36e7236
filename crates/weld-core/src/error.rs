//! Error vocabulary for `weld-core`.
//!
//! Store backends map their native failures into these kinds; the reconciler
//! classifies them to decide whether an attempt may be re-run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Both email and phone were absent. A caller-side bug; never retried.
  #[error("at least one of email or phone must be present")]
  InvalidPrecondition,

  /// An insert or update collided with the `(email, phone, linked_id)`
  /// uniqueness constraint — typically a concurrent writer got there first.
  #[error("contact conflicts with an existing (email, phone, linked id) row")]
  UniqueConflict,

  /// The store aborted the transaction because of a conflicting interleaving.
  #[error("transaction aborted by a conflicting writer")]
  Serialization,

  /// The transaction exceeded its wait-for-start or total-runtime bound.
  #[error("transaction exceeded its time bound")]
  Timeout,

  /// The stored graph violates a structural invariant (dangling link,
  /// secondary used as a root). Never retried.
  #[error("identity graph invariant broken: {0}")]
  InvariantBroken(String),

  /// Transport or connectivity failure talking to the store.
  #[error("store unavailable: {0}")]
  StoreUnavailable(String),
}

impl Error {
  /// Whether the reconciler may re-run the whole attempt from a fresh
  /// snapshot. Conflicts are transient; everything else is surfaced as-is.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::UniqueConflict | Self::Serialization)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
