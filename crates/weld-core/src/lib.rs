//! Core types and the reconciliation engine for the Weld identity service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.
//!
//! The engine consumes a transactional store through the [`store::ContactStore`]
//! and [`store::StoreTx`] traits and is exercised in tests against an
//! in-memory fake, so its behaviour is fully specified without a backend.

pub mod contact;
pub mod error;
pub mod merge;
pub mod reconcile;
pub mod response;
pub mod store;

pub use error::{Error, Result};
