//! JSON identity-reconciliation API.
//!
//! Exposes an axum [`Router`] backed by any
//! [`weld_core::store::ContactStore`]. Transport concerns (TLS, rate
//! limiting, CORS) are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = weld_api::router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod identify;
pub mod validate;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Json,
  Router,
  extract::{DefaultBodyLimit, State},
  http::StatusCode,
  response::IntoResponse,
  routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use weld_core::{
  reconcile::Reconciler,
  store::{ContactStore, TxOptions},
};

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  #[serde(default = "default_store_path")]
  pub store_path:     PathBuf,
  /// Transaction wait-for-start bound, in milliseconds.
  #[serde(default = "default_tx_max_wait_ms")]
  pub tx_max_wait_ms: u64,
  /// Transaction total-runtime bound, in milliseconds.
  #[serde(default = "default_tx_timeout_ms")]
  pub tx_timeout_ms:  u64,
}

fn default_host() -> String {
  "127.0.0.1".to_owned()
}
fn default_port() -> u16 {
  8080
}
fn default_store_path() -> PathBuf {
  PathBuf::from("weld.db")
}
fn default_tx_max_wait_ms() -> u64 {
  5_000
}
fn default_tx_timeout_ms() -> u64 {
  10_000
}

impl ServerConfig {
  pub fn tx_options(&self) -> TxOptions {
    TxOptions {
      max_wait: Duration::from_millis(self.tx_max_wait_ms),
      timeout:  Duration::from_millis(self.tx_timeout_ms),
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S: ContactStore> {
  pub reconciler: Arc<Reconciler<S>>,
}

impl<S: ContactStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      reconciler: Arc::clone(&self.reconciler),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the identify API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ContactStore + 'static,
{
  Router::new()
    .route("/identify", post(identify::handler::<S>))
    .route("/health", get(health_handler::<S>))
    .with_state(state)
    .layer(DefaultBodyLimit::max(64 * 1024))
}

/// `GET /health` — a trivial store round trip.
async fn health_handler<S>(
  State(state): State<AppState<S>>,
) -> impl IntoResponse
where
  S: ContactStore + 'static,
{
  match state.reconciler.store().ping().await {
    Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
    Err(e) => (
      StatusCode::SERVICE_UNAVAILABLE,
      Json(json!({ "status": "unavailable", "error": e.to_string() })),
    ),
  }
}

// ─── Integration tests ───────────────────────────────────────────────────────
