//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The request failed boundary validation.
  #[error("{0}")]
  Validation(String),

  /// The engine or store rejected the request.
  #[error(transparent)]
  Core(#[from] weld_core::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Core(e) => (status_for(e), e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

/// HTTP status for each engine error kind. Exhausted conflicts are
/// transient, so they map to 503 rather than a client error.
fn status_for(err: &weld_core::Error) -> StatusCode {
  use weld_core::Error;
  match err {
    Error::InvalidPrecondition => StatusCode::BAD_REQUEST,
    Error::UniqueConflict | Error::Serialization => {
      StatusCode::SERVICE_UNAVAILABLE
    }
    Error::Timeout => StatusCode::GATEWAY_TIMEOUT,
    Error::InvariantBroken(_) | Error::StoreUnavailable(_) => {
      StatusCode::INTERNAL_SERVER_ERROR
    }
  }
}
