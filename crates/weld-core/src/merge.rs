//! Merge planning — collapsing several root primaries into one group.
//!
//! The survivor is the most senior primary: smallest `created_at`, ties
//! broken by the lower id. Every other primary is demoted to a secondary of
//! the survivor and its children are re-parented. Loser order does not
//! affect the final state — re-parenting is idempotent and depth one is
//! preserved at every step.

use tracing::debug;

use crate::{
  contact::{Contact, ContactId},
  error::{Error, Result},
  store::StoreTx,
};

/// Split an ordered primary set into the survivor and the losers.
///
/// `primaries` must already be sorted by `(created_at ASC, id ASC)`, as
/// [`StoreTx::find_live_by_ids`] returns them.
pub fn select_survivor(primaries: &[Contact]) -> Result<(&Contact, &[Contact])> {
  primaries
    .split_first()
    .ok_or_else(|| Error::InvariantBroken("empty primary set".to_owned()))
}

/// Demote every loser under the survivor and re-parent its children.
pub fn merge_into(
  tx: &mut dyn StoreTx,
  survivor: ContactId,
  losers: &[Contact],
) -> Result<()> {
  for loser in losers {
    tx.demote(loser.id, survivor)?;
    let moved = tx.relink_children(loser.id, survivor)?;
    debug!(
      loser = loser.id,
      survivor,
      children = moved,
      "demoted primary into surviving group"
    );
  }
  Ok(())
}
