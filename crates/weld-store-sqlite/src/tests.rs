//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use weld_core::{
  Error,
  contact::{ContactInput, NewContact},
  reconcile::Reconciler,
  store::{ContactStore, TxOptions},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

fn input(email: Option<&str>, phone: Option<&str>) -> ContactInput {
  ContactInput::new(email.map(str::to_owned), phone.map(str::to_owned))
}

async fn live_primary_count(store: &SqliteStore) -> i64 {
  store
    .conn
    .call(|conn| {
      Ok(conn.query_row(
        "SELECT COUNT(*) FROM contacts
         WHERE precedence = 'primary' AND deleted_at IS NULL",
        [],
        |row| row.get(0),
      )?)
    })
    .await
    .unwrap()
}

// ─── End-to-end scenarios ────────────────────────────────────────────────────

#[tokio::test]
async fn new_customer_creates_primary_row() {
  let s = store().await;
  let engine = Reconciler::new(s.clone());

  let payload = engine
    .reconcile(input(Some("doc@hv.edu"), Some("555-0100")))
    .await
    .unwrap();

  assert_eq!(payload.primary_contact_id, 1);
  assert_eq!(payload.emails, ["doc@hv.edu"]);
  assert_eq!(payload.phone_numbers, ["555-0100"]);
  assert!(payload.secondary_contact_ids.is_empty());
  assert_eq!(live_primary_count(&s).await, 1);
}

#[tokio::test]
async fn attach_then_replay_returns_identical_payload() {
  let s = store().await;
  let engine = Reconciler::new(s.clone());

  engine
    .reconcile(input(Some("doc@hv.edu"), Some("555-0100")))
    .await
    .unwrap();
  let first = engine
    .reconcile(input(Some("marty@hv.edu"), Some("555-0100")))
    .await
    .unwrap();

  assert_eq!(first.primary_contact_id, 1);
  assert_eq!(first.emails, ["doc@hv.edu", "marty@hv.edu"]);
  assert_eq!(first.phone_numbers, ["555-0100"]);
  assert_eq!(first.secondary_contact_ids, [2]);

  let replay = engine
    .reconcile(input(Some("marty@hv.edu"), Some("555-0100")))
    .await
    .unwrap();
  assert_eq!(first, replay);

  let rows: i64 = s
    .conn
    .call(|conn| {
      Ok(conn.query_row("SELECT COUNT(*) FROM contacts", [], |r| r.get(0))?)
    })
    .await
    .unwrap();
  assert_eq!(rows, 2);
}

#[tokio::test]
async fn bridging_request_merges_and_leaves_one_primary() {
  let s = store().await;
  let engine = Reconciler::new(s.clone());

  engine
    .reconcile(input(Some("george@hv.edu"), Some("919191")))
    .await
    .unwrap();
  engine
    .reconcile(input(Some("biff@hv.edu"), Some("717171")))
    .await
    .unwrap();

  let payload = engine
    .reconcile(input(Some("george@hv.edu"), Some("717171")))
    .await
    .unwrap();

  assert_eq!(payload.primary_contact_id, 1);
  assert!(payload.emails.contains(&"george@hv.edu".to_owned()));
  assert!(payload.emails.contains(&"biff@hv.edu".to_owned()));
  assert!(payload.phone_numbers.contains(&"919191".to_owned()));
  assert!(payload.phone_numbers.contains(&"717171".to_owned()));
  assert!(payload.secondary_contact_ids.contains(&2));
  assert_eq!(live_primary_count(&s).await, 1);
}

#[tokio::test]
async fn triangular_cascade_collapses_under_the_oldest_primary() {
  let s = store().await;
  let engine = Reconciler::new(s.clone());

  engine.reconcile(input(Some("a@hv.edu"), Some("111"))).await.unwrap();
  engine.reconcile(input(Some("b@hv.edu"), Some("222"))).await.unwrap();
  engine.reconcile(input(Some("c@hv.edu"), Some("333"))).await.unwrap();

  engine.reconcile(input(Some("a@hv.edu"), Some("222"))).await.unwrap();
  let payload = engine
    .reconcile(input(Some("c@hv.edu"), Some("111")))
    .await
    .unwrap();

  assert_eq!(payload.primary_contact_id, 1);
  for email in ["a@hv.edu", "b@hv.edu", "c@hv.edu"] {
    assert!(payload.emails.contains(&email.to_owned()), "missing {email}");
  }
  for phone in ["111", "222", "333"] {
    assert!(
      payload.phone_numbers.contains(&phone.to_owned()),
      "missing {phone}"
    );
  }
  // Exactly the two demoted primaries; the cascade attaches nothing new.
  assert_eq!(payload.secondary_contact_ids, [2, 3]);
  assert_eq!(live_primary_count(&s).await, 1);
}

#[tokio::test]
async fn phone_only_query_reads_without_writing() {
  let s = store().await;
  let engine = Reconciler::new(s.clone());

  engine.reconcile(input(Some("primary@t"), Some("100"))).await.unwrap();
  engine.reconcile(input(Some("secondary@t"), Some("100"))).await.unwrap();

  let payload = engine.reconcile(input(None, Some("100"))).await.unwrap();

  assert_eq!(payload.emails, ["primary@t", "secondary@t"]);
  assert_eq!(payload.phone_numbers, ["100"]);
  assert_eq!(payload.secondary_contact_ids, [2]);

  let rows: i64 = s
    .conn
    .call(|conn| {
      Ok(conn.query_row("SELECT COUNT(*) FROM contacts", [], |r| r.get(0))?)
    })
    .await
    .unwrap();
  assert_eq!(rows, 2);
}

// ─── Uniqueness semantics ────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_secondary_surfaces_unique_conflict() {
  let s = store().await;

  // A conflict needs all three indexed columns non-NULL: two identical
  // fully-populated secondaries under the same primary.
  let err = s
    .transact(TxOptions::default(), |tx| {
      let root = tx.insert_contact(NewContact::primary(
        Some("root@hv.edu".to_owned()),
        Some("100".to_owned()),
      ))?;
      tx.insert_contact(NewContact::secondary(
        root.id,
        Some("dup@hv.edu".to_owned()),
        Some("100".to_owned()),
      ))?;
      tx.insert_contact(NewContact::secondary(
        root.id,
        Some("dup@hv.edu".to_owned()),
        Some("100".to_owned()),
      ))?;
      Ok(())
    })
    .await
    .unwrap_err();

  assert!(matches!(err, Error::UniqueConflict));
  // The failed transaction rolled back in full.
  assert_eq!(live_primary_count(&s).await, 0);
}

#[tokio::test]
async fn null_fields_compare_distinct_until_a_merge_collapses_them() {
  let s = store().await;

  // Two phone-only primaries with identical triples (NULL email) coexist —
  // NULLs are distinct in the unique index.
  s.transact(TxOptions::default(), |tx| {
    tx.insert_contact(NewContact::primary(None, Some("100".to_owned())))?;
    tx.insert_contact(NewContact::primary(None, Some("100".to_owned())))?;
    Ok(())
  })
  .await
  .unwrap();
  assert_eq!(live_primary_count(&s).await, 2);

  // A reconcile over that phone collapses them into one group.
  let engine = Reconciler::new(s.clone());
  let payload = engine.reconcile(input(None, Some("100"))).await.unwrap();
  assert_eq!(payload.primary_contact_id, 1);
  assert_eq!(payload.secondary_contact_ids, [2]);
  assert_eq!(live_primary_count(&s).await, 1);
}

// ─── Soft deletion ───────────────────────────────────────────────────────────

#[tokio::test]
async fn soft_deleted_rows_neither_match_nor_block_reinsertion() {
  let s = store().await;
  let engine = Reconciler::new(s.clone());

  engine
    .reconcile(input(Some("ghost@hv.edu"), Some("100")))
    .await
    .unwrap();
  s.conn
    .call(|conn| {
      conn.execute(
        "UPDATE contacts SET deleted_at = created_at WHERE id = 1",
        [],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  // Same pair again: the tombstone is invisible and does not conflict.
  let payload = engine
    .reconcile(input(Some("ghost@hv.edu"), Some("100")))
    .await
    .unwrap();
  assert_eq!(payload.primary_contact_id, 2);
  assert!(payload.secondary_contact_ids.is_empty());
}

// ─── Mutator edges ───────────────────────────────────────────────────────────

#[tokio::test]
async fn demoting_a_missing_row_is_an_invariant_error() {
  let s = store().await;

  let err = s
    .transact(TxOptions::default(), |tx| tx.demote(42, 1))
    .await
    .unwrap_err();

  assert!(matches!(err, Error::InvariantBroken(_)));
}

#[tokio::test]
async fn relink_children_moves_every_child() {
  let s = store().await;

  let moved = s
    .transact(TxOptions::default(), |tx| {
      let old_root =
        tx.insert_contact(NewContact::primary(Some("old@t".into()), None))?;
      let new_root =
        tx.insert_contact(NewContact::primary(Some("new@t".into()), None))?;
      tx.insert_contact(NewContact::secondary(
        old_root.id,
        Some("c1@t".into()),
        None,
      ))?;
      tx.insert_contact(NewContact::secondary(
        old_root.id,
        Some("c2@t".into()),
        None,
      ))?;
      tx.relink_children(old_root.id, new_root.id)
    })
    .await
    .unwrap();

  assert_eq!(moved, 2);
}

// ─── Liveness and concurrency ────────────────────────────────────────────────

#[tokio::test]
async fn ping_round_trips() {
  let s = store().await;
  s.ping().await.unwrap();
}

#[tokio::test]
async fn concurrent_reconciles_converge_to_one_group() {
  let s = store().await;
  let engine = Arc::new(Reconciler::new(s.clone()));

  let mut handles = Vec::new();
  for i in 0..8 {
    let engine = Arc::clone(&engine);
    handles.push(tokio::spawn(async move {
      let email = format!("user{i}@hv.edu");
      engine.reconcile(input(Some(email.as_str()), Some("100"))).await
    }));
  }
  for handle in handles {
    handle.await.unwrap().unwrap();
  }

  assert_eq!(live_primary_count(&s).await, 1);

  let payload = engine.reconcile(input(None, Some("100"))).await.unwrap();
  assert_eq!(payload.emails.len(), 8);
  assert_eq!(payload.secondary_contact_ids.len(), 7);
}
