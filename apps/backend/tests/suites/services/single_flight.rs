//! At most one run per session commits against a given head.

use std::sync::Arc;

use futures::future::join_all;
use gambit_backend::adapters::MemoryStore;
use gambit_backend::domain::ActorKind;
use gambit_backend::repos::{GameStore, HeadPatch, HeadPredicate};
use gambit_backend::services::{SkipReason, TurnOutcome};

use crate::support::harness::Harness;

fn random(seed: u64) -> ActorKind {
    ActorKind::Random { seed: Some(seed) }
}

#[actix_web::test]
async fn held_lock_skips_the_run() {
    let h = Harness::new();
    let id = h.create(random(1), random(2)).await;
    h.store
        .conditional_update_head(&id, &HeadPredicate::any(), &HeadPatch::new().with_lock("other-run"))
        .await
        .unwrap();

    let outcome = h.flow.advance(id.clone()).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Skipped(SkipReason::AlreadyLocked));
    assert_eq!(h.head(&id).await.lock_token.as_deref(), Some("other-run"));
    assert!(h.records(&id).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_advances_never_double_commit() {
    let store: Arc<dyn GameStore> = Arc::new(MemoryStore::new());
    let h = Harness::builder().store(store).build();
    let id = h.create(random(11), random(12)).await;

    let runs = (0..16).map(|_| {
        let flow = h.flow.clone();
        let id = id.clone();
        tokio::spawn(async move { flow.advance(id).await })
    });
    let outcomes: Vec<TurnOutcome> = join_all(runs)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let mut committed: Vec<u32> = outcomes
        .iter()
        .filter_map(|o| match o {
            TurnOutcome::Committed { move_count, .. } => Some(*move_count),
            _ => None,
        })
        .collect();
    committed.sort_unstable();
    assert!(!committed.is_empty());
    // Every commit advanced a different head.
    let expected: Vec<u32> = (1..=committed.len() as u32).collect();
    assert_eq!(committed, expected);
    assert!(outcomes.iter().all(|o| matches!(
        o,
        TurnOutcome::Committed { .. } | TurnOutcome::Skipped(SkipReason::AlreadyLocked)
    )));

    let records = h.records(&id).await;
    assert_eq!(records.len(), committed.len());
    let head = h.head(&id).await;
    assert_eq!(head.move_count as usize, committed.len());
    assert_eq!(head.lock_token, None);
}
