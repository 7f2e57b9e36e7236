//! Handler for `POST /identify`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/identify` | Body: `{"email": ..., "phoneNumber": ...}`, either may be null |

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use weld_core::{response::ConsolidatedContact, store::ContactStore};

use crate::{AppState, error::ApiError, validate};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyBody {
  #[serde(default)]
  pub email:        Option<String>,
  #[serde(default)]
  pub phone_number: Option<PhoneField>,
}

/// Phone numbers arrive as strings or bare JSON numbers; both are accepted
/// and numbers are stringified.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PhoneField {
  Text(String),
  Number(u64),
}

impl PhoneField {
  fn into_string(self) -> String {
    match self {
      Self::Text(s) => s,
      Self::Number(n) => n.to_string(),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct IdentifyResponse {
  pub contact: ConsolidatedContact,
}

/// `POST /identify`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<IdentifyBody>,
) -> Result<Json<IdentifyResponse>, ApiError>
where
  S: ContactStore + 'static,
{
  let input = validate::normalize(
    body.email,
    body.phone_number.map(PhoneField::into_string),
  )?;
  let contact = state.reconciler.reconcile(input).await?;
  Ok(Json(IdentifyResponse { contact }))
}
