//! The consolidated payload and its builder.

use serde::{Deserialize, Serialize};

use crate::contact::{Contact, ContactId};

/// The public, flattened view of one identity group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedContact {
  pub primary_contact_id:    ContactId,
  pub emails:                Vec<String>,
  pub phone_numbers:         Vec<String>,
  pub secondary_contact_ids: Vec<ContactId>,
}

/// Flatten a group into the public payload.
///
/// The primary's email and phone lead their arrays when present. Secondaries
/// must already be ordered by `created_at` ascending (ties by ascending id);
/// each contributes its email and phone if present and not already listed,
/// and its id unconditionally — ids are unique by construction, so
/// `secondary_contact_ids` is never deduplicated.
pub fn consolidate(
  primary: &Contact,
  secondaries: &[Contact],
) -> ConsolidatedContact {
  let mut emails = Vec::new();
  let mut phone_numbers = Vec::new();
  let mut secondary_contact_ids = Vec::with_capacity(secondaries.len());

  push_unique(&mut emails, primary.email.as_deref());
  push_unique(&mut phone_numbers, primary.phone.as_deref());

  for secondary in secondaries {
    push_unique(&mut emails, secondary.email.as_deref());
    push_unique(&mut phone_numbers, secondary.phone.as_deref());
    secondary_contact_ids.push(secondary.id);
  }

  ConsolidatedContact {
    primary_contact_id: primary.id,
    emails,
    phone_numbers,
    secondary_contact_ids,
  }
}

fn push_unique(list: &mut Vec<String>, value: Option<&str>) {
  if let Some(v) = value
    && !list.iter().any(|existing| existing == v)
  {
    list.push(v.to_owned());
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
