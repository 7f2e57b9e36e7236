//! The `ContactStore` and `StoreTx` traits.
//!
//! The traits are implemented by storage backends (e.g. `weld-store-sqlite`).
//! The engine runs one whole reconcile attempt inside a single transaction,
//! so the store hands the attempt body a [`StoreTx`] and commits only if the
//! body succeeds. Backends provide their strongest isolation level; the
//! engine relies on the store — not on in-process locks — for all ordering
//! and conflict detection.

use std::{future::Future, time::Duration};

use crate::{
  Result,
  contact::{Contact, ContactId, NewContact},
};

// ─── Transaction options ─────────────────────────────────────────────────────

/// Time bounds for one transaction.
#[derive(Debug, Clone, Copy)]
pub struct TxOptions {
  /// Upper bound on waiting for the transaction to start (lock acquisition).
  pub max_wait: Duration,
  /// Upper bound on total transaction runtime.
  pub timeout:  Duration,
}

impl Default for TxOptions {
  fn default() -> Self {
    Self {
      max_wait: Duration::from_secs(5),
      timeout:  Duration::from_secs(10),
    }
  }
}

// ─── Transaction operations ──────────────────────────────────────────────────

/// Operations available inside one open transaction.
///
/// All reads exclude soft-deleted rows. All result sets are ordered by
/// `created_at` ascending, ties broken by ascending id, so "first" always
/// means "most senior".
pub trait StoreTx {
  /// Live contacts whose email equals `email` or whose phone equals `phone`.
  /// An absent field drops its disjunct — absent is never used as a match
  /// predicate. Errs with [`crate::Error::InvalidPrecondition`] if both are
  /// absent.
  fn find_live_matching(
    &mut self,
    email: Option<&str>,
    phone: Option<&str>,
  ) -> Result<Vec<Contact>>;

  /// Batched fetch by id.
  fn find_live_by_ids(&mut self, ids: &[ContactId]) -> Result<Vec<Contact>>;

  /// The primary plus all live secondaries whose `linked_id` points at it.
  fn find_live_group(&mut self, primary_id: ContactId) -> Result<Vec<Contact>>;

  /// Insert a row. May fail with [`crate::Error::UniqueConflict`] on the
  /// `(email, phone, linked_id)` uniqueness constraint.
  fn insert_contact(&mut self, new: NewContact) -> Result<Contact>;

  /// Flip a primary to secondary under `linked_id`. Rejects a target row
  /// that is not live.
  fn demote(&mut self, id: ContactId, linked_id: ContactId) -> Result<()>;

  /// Bulk re-parent: every live secondary pointing at `from` now points at
  /// `to`. Returns the number of rows moved.
  fn relink_children(&mut self, from: ContactId, to: ContactId) -> Result<usize>;
}

// ─── Store handle ────────────────────────────────────────────────────────────

/// Abstraction over a transactional contact store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (tokio with `axum`).
pub trait ContactStore: Send + Sync {
  /// Run `body` inside one transaction at the backend's strongest isolation
  /// level. The transaction commits iff `body` returns `Ok`; on any error it
  /// is rolled back and no state change is visible.
  fn transact<T, F>(
    &self,
    opts: TxOptions,
    body: F,
  ) -> impl Future<Output = Result<T>> + Send + '_
  where
    F: FnOnce(&mut dyn StoreTx) -> Result<T> + Send + 'static,
    T: Send + 'static;

  /// Trivial round-trip query, used by external health checks.
  fn ping(&self) -> impl Future<Output = Result<()>> + Send + '_;
}
