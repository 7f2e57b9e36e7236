//! The reconciliation engine.
//!
//! One call runs one transactional pass over the identity graph: match the
//! request against live contacts, project the matches to their root
//! primaries, merge roots if the request bridges previously independent
//! groups, attach a secondary if the request carries new information, and
//! flatten the resulting group into the consolidated payload.
//!
//! A retryable store conflict (unique violation, serialization abort) re-runs
//! the whole pass once from a fresh snapshot; a second failure surfaces.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::{
  contact::{Contact, ContactId, ContactInput, NewContact, Precedence},
  error::{Error, Result},
  merge,
  response::{self, ConsolidatedContact},
  store::{ContactStore, StoreTx, TxOptions},
};

/// Transaction attempts per call: the initial attempt plus one retry after a
/// retryable conflict.
const MAX_ATTEMPTS: u32 = 2;

/// The engine. Holds the store handle and the per-transaction time bounds;
/// no other state is kept between calls, so one instance serves any number
/// of concurrent requests.
pub struct Reconciler<S> {
  store:   S,
  options: TxOptions,
}

impl<S: ContactStore> Reconciler<S> {
  pub fn new(store: S) -> Self {
    Self::with_options(store, TxOptions::default())
  }

  pub fn with_options(store: S, options: TxOptions) -> Self {
    Self { store, options }
  }

  /// The underlying store handle, e.g. for health probes.
  pub fn store(&self) -> &S {
    &self.store
  }

  /// Reconcile one request and return the consolidated view of the group it
  /// belongs to. At least one input field must be present.
  pub async fn reconcile(
    &self,
    input: ContactInput,
  ) -> Result<ConsolidatedContact> {
    if input.email.is_none() && input.phone.is_none() {
      return Err(Error::InvalidPrecondition);
    }

    let mut attempt = 0;
    loop {
      attempt += 1;
      let request = input.clone();
      let outcome = self
        .store
        .transact(self.options, move |tx| run_attempt(tx, &request))
        .await;

      match outcome {
        Ok(contact) => return Ok(contact),
        Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
          warn!(%err, attempt, "reconcile attempt conflicted; retrying");
        }
        Err(err) => return Err(err),
      }
    }
  }
}

// ─── One attempt ─────────────────────────────────────────────────────────────

/// One full pass over the graph inside an open transaction.
fn run_attempt(
  tx: &mut dyn StoreTx,
  input: &ContactInput,
) -> Result<ConsolidatedContact> {
  // Match.
  let matches =
    tx.find_live_matching(input.email.as_deref(), input.phone.as_deref())?;
  if matches.is_empty() {
    let row = tx.insert_contact(NewContact::primary(
      input.email.clone(),
      input.phone.clone(),
    ))?;
    debug!(id = row.id, "created primary for unseen contact");
    return Ok(response::consolidate(&row, &[]));
  }

  // Resolve roots.
  let roots = root_ids(&matches)?;
  let primaries = tx.find_live_by_ids(&roots)?;
  ensure_all_primaries(&roots, &primaries)?;

  // Merge.
  let (survivor, losers) = merge::select_survivor(&primaries)?;
  let survivor_id = survivor.id;
  if !losers.is_empty() {
    merge::merge_into(tx, survivor_id, losers)?;
  }

  // Attach. Re-read the full group so the decision sees the post-merge state.
  let mut group = tx.find_live_group(survivor_id)?;
  if should_attach(&group, input) {
    let row = tx.insert_contact(NewContact::secondary(
      survivor_id,
      input.email.clone(),
      input.phone.clone(),
    ))?;
    debug!(id = row.id, primary = survivor_id, "attached secondary");
    // The new row is the youngest, so appending preserves group order.
    group.push(row);
  }

  // Respond. The survivor is the oldest row in its group, so it leads.
  let (primary, secondaries) = match group.split_first() {
    Some((head, rest)) if head.id == survivor_id => (head, rest),
    _ => {
      return Err(Error::InvariantBroken(format!(
        "group read for primary {survivor_id} did not lead with it"
      )));
    }
  };
  Ok(response::consolidate(primary, secondaries))
}

/// The distinct root primaries reached by a match set: a primary contributes
/// its own id, a secondary contributes its `linked_id`.
fn root_ids(matches: &[Contact]) -> Result<Vec<ContactId>> {
  let mut roots = BTreeSet::new();
  for contact in matches {
    match contact.precedence {
      Precedence::Primary => {
        roots.insert(contact.id);
      }
      Precedence::Secondary => match contact.linked_id {
        Some(root) => {
          roots.insert(root);
        }
        None => {
          return Err(Error::InvariantBroken(format!(
            "secondary {} has no linked id",
            contact.id
          )));
        }
      },
    }
  }
  Ok(roots.into_iter().collect())
}

/// Every requested root must come back live, and must actually be a primary.
fn ensure_all_primaries(
  requested: &[ContactId],
  fetched: &[Contact],
) -> Result<()> {
  if fetched.len() != requested.len() {
    let found: BTreeSet<ContactId> = fetched.iter().map(|c| c.id).collect();
    let missing: Vec<ContactId> = requested
      .iter()
      .copied()
      .filter(|id| !found.contains(id))
      .collect();
    return Err(Error::InvariantBroken(format!(
      "dangling linked ids: {missing:?}"
    )));
  }
  for contact in fetched {
    if !contact.is_primary() {
      return Err(Error::InvariantBroken(format!(
        "contact {} is linked to as a root but is a secondary",
        contact.id
      )));
    }
  }
  Ok(())
}

/// A request attaches a new secondary iff it carries an email or phone the
/// group has not seen, and no live row already holds exactly the request's
/// `(email, phone)` pair (absent compares equal to absent).
fn should_attach(group: &[Contact], input: &ContactInput) -> bool {
  let exact_duplicate = group
    .iter()
    .any(|c| c.email == input.email && c.phone == input.phone);
  if exact_duplicate {
    return false;
  }

  let new_email = input
    .email
    .as_ref()
    .is_some_and(|e| !group.iter().any(|c| c.email.as_ref() == Some(e)));
  let new_phone = input
    .phone
    .as_ref()
    .is_some_and(|p| !group.iter().any(|c| c.phone.as_ref() == Some(p)));

  new_email || new_phone
}
