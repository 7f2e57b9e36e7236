//! [`SqliteStore`] — the SQLite implementation of the contact store.

use std::{
  future::Future,
  path::Path,
  time::Instant,
};

use chrono::Utc;
use rusqlite::TransactionBehavior;
use tracing::debug;
use weld_core::{
  Error, Result,
  contact::{Contact, ContactId, NewContact},
  store::{ContactStore, StoreTx, TxOptions},
};

use crate::{
  encode::{CONTACT_COLUMNS, RawContact, encode_dt, encode_precedence},
  error::map_sqlite,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A contact store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// statements run on the connection's dedicated thread; one reconcile
/// attempt executes there inside one `BEGIN IMMEDIATE` transaction.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
    debug!("contact schema initialised");
    Ok(())
  }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  fn transact<T, F>(
    &self,
    opts: TxOptions,
    body: F,
  ) -> impl Future<Output = Result<T>> + Send + '_
  where
    F: FnOnce(&mut dyn StoreTx) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    async move {
      self
        .conn
        .call(move |conn| Ok(run_transaction(conn, opts, body)))
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?
    }
  }

  fn ping(&self) -> impl Future<Output = Result<()>> + Send + '_ {
    async move {
      self
        .conn
        .call(|conn| {
          conn.query_row("SELECT 1", [], |_| Ok(()))?;
          Ok(())
        })
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))
    }
  }
}

// ─── Transaction plumbing ────────────────────────────────────────────────────

fn run_transaction<T, F>(
  conn: &mut rusqlite::Connection,
  opts: TxOptions,
  body: F,
) -> Result<T>
where
  F: FnOnce(&mut dyn StoreTx) -> Result<T>,
{
  // Wait-for-start bound: a held write lock blocks BEGIN IMMEDIATE for at
  // most this long before surfacing SQLITE_BUSY.
  conn.busy_timeout(opts.max_wait).map_err(map_sqlite)?;

  // Total-runtime bound: statements poll the deadline as they execute and
  // anything overrunning it is interrupted.
  let deadline = Instant::now() + opts.timeout;
  conn.progress_handler(4096, Some(move || Instant::now() >= deadline));

  let outcome = run_body(conn, deadline, body);
  conn.progress_handler(0, None::<fn() -> bool>);
  outcome
}

fn run_body<T, F>(
  conn: &mut rusqlite::Connection,
  deadline: Instant,
  body: F,
) -> Result<T>
where
  F: FnOnce(&mut dyn StoreTx) -> Result<T>,
{
  // IMMEDIATE takes the write lock up front, so the snapshot the attempt
  // reads cannot be invalidated by another writer mid-flight.
  let tx = conn
    .transaction_with_behavior(TransactionBehavior::Immediate)
    .map_err(map_sqlite)?;
  let mut store_tx = SqliteTx { tx };
  let value = body(&mut store_tx)?;

  if Instant::now() >= deadline {
    // Dropping the transaction rolls it back.
    return Err(Error::Timeout);
  }
  let SqliteTx { tx } = store_tx;
  tx.commit().map_err(map_sqlite)?;
  Ok(value)
}

// ─── StoreTx impl ────────────────────────────────────────────────────────────

struct SqliteTx<'conn> {
  tx: rusqlite::Transaction<'conn>,
}

impl SqliteTx<'_> {
  fn select(
    &self,
    sql: &str,
    params: impl rusqlite::Params,
  ) -> Result<Vec<Contact>> {
    let mut stmt = self.tx.prepare(sql).map_err(map_sqlite)?;
    let raws = stmt
      .query_map(params, RawContact::from_row)
      .map_err(map_sqlite)?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(map_sqlite)?;
    raws.into_iter().map(RawContact::into_contact).collect()
  }
}

impl StoreTx for SqliteTx<'_> {
  fn find_live_matching(
    &mut self,
    email: Option<&str>,
    phone: Option<&str>,
  ) -> Result<Vec<Contact>> {
    match (email, phone) {
      (Some(e), Some(p)) => self.select(
        &format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts
           WHERE deleted_at IS NULL AND (email = ?1 OR phone = ?2)
           ORDER BY created_at ASC, id ASC"
        ),
        rusqlite::params![e, p],
      ),
      (Some(e), None) => self.select(
        &format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts
           WHERE deleted_at IS NULL AND email = ?1
           ORDER BY created_at ASC, id ASC"
        ),
        rusqlite::params![e],
      ),
      (None, Some(p)) => self.select(
        &format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts
           WHERE deleted_at IS NULL AND phone = ?1
           ORDER BY created_at ASC, id ASC"
        ),
        rusqlite::params![p],
      ),
      (None, None) => Err(Error::InvalidPrecondition),
    }
  }

  fn find_live_by_ids(&mut self, ids: &[ContactId]) -> Result<Vec<Contact>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
      "SELECT {CONTACT_COLUMNS} FROM contacts
       WHERE deleted_at IS NULL AND id IN ({placeholders})
       ORDER BY created_at ASC, id ASC"
    );
    self.select(&sql, rusqlite::params_from_iter(ids.iter()))
  }

  fn find_live_group(&mut self, primary_id: ContactId) -> Result<Vec<Contact>> {
    self.select(
      &format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE deleted_at IS NULL AND (id = ?1 OR linked_id = ?1)
         ORDER BY created_at ASC, id ASC"
      ),
      rusqlite::params![primary_id],
    )
  }

  fn insert_contact(&mut self, new: NewContact) -> Result<Contact> {
    let now = Utc::now();
    let now_str = encode_dt(now);
    self
      .tx
      .execute(
        "INSERT INTO contacts (email, phone, linked_id, precedence, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
          new.email,
          new.phone,
          new.linked_id,
          encode_precedence(new.precedence),
          now_str,
          now_str,
        ],
      )
      .map_err(map_sqlite)?;

    Ok(Contact {
      id:         self.tx.last_insert_rowid(),
      email:      new.email,
      phone:      new.phone,
      linked_id:  new.linked_id,
      precedence: new.precedence,
      created_at: now,
      updated_at: now,
      deleted_at: None,
    })
  }

  fn demote(&mut self, id: ContactId, linked_id: ContactId) -> Result<()> {
    let changed = self
      .tx
      .execute(
        "UPDATE contacts
         SET precedence = 'secondary', linked_id = ?1, updated_at = ?2
         WHERE id = ?3 AND deleted_at IS NULL",
        rusqlite::params![linked_id, encode_dt(Utc::now()), id],
      )
      .map_err(map_sqlite)?;
    if changed == 0 {
      return Err(Error::InvariantBroken(format!(
        "demote target {id} is not live"
      )));
    }
    Ok(())
  }

  fn relink_children(
    &mut self,
    from: ContactId,
    to: ContactId,
  ) -> Result<usize> {
    self
      .tx
      .execute(
        "UPDATE contacts SET linked_id = ?1, updated_at = ?2
         WHERE linked_id = ?3 AND deleted_at IS NULL",
        rusqlite::params![to, encode_dt(Utc::now()), from],
      )
      .map_err(map_sqlite)
  }
}
