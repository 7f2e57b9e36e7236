//! Mapping from SQLite failures into the core error vocabulary.

use rusqlite::ErrorCode;
use weld_core::Error;

/// Classify a rusqlite error.
///
/// The identity index is the only unique constraint on the contacts table,
/// so every unique violation is a content conflict. With `busy_timeout` set
/// to the wait-for-start bound, `SQLITE_BUSY`/`SQLITE_LOCKED` means that
/// bound expired before the write lock was granted — a timeout, not a
/// conflicting interleaving; once `BEGIN IMMEDIATE` holds the lock,
/// SQLite's single-writer model leaves no serialization failure to report.
/// An interrupt only ever comes from the deadline progress handler.
pub(crate) fn map_sqlite(err: rusqlite::Error) -> Error {
  match &err {
    rusqlite::Error::SqliteFailure(cause, _) => match cause.code {
      ErrorCode::ConstraintViolation
        if cause.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
      {
        Error::UniqueConflict
      }
      ErrorCode::DatabaseBusy
      | ErrorCode::DatabaseLocked
      | ErrorCode::OperationInterrupted => Error::Timeout,
      _ => Error::StoreUnavailable(err.to_string()),
    },
    _ => Error::StoreUnavailable(err.to_string()),
  }
}
