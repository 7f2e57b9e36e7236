//! SQLite backend for the Weld contact store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. A whole reconcile attempt
//! executes inside one `BEGIN IMMEDIATE` transaction on that thread; on
//! SQLite that is serializable, so the engine needs no further coordination.

mod encode;
mod error;
mod schema;
mod store;

pub use store::SqliteStore;

#[cfg(test)]
mod tests;
