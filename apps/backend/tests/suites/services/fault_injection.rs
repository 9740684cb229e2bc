//! A store failure at any point of a run never leaves an orphaned lock.

use std::sync::Arc;

use gambit_backend::adapters::MemoryStore;
use gambit_backend::domain::{ActorKind, GameStatus, LatestMoveHead};
use gambit_backend::repos::GameStore;

use crate::support::faulty_store::FaultyStore;
use crate::support::harness::Harness;

fn no_orphan(head: &LatestMoveHead) -> bool {
    head.lock_token.is_none() || head.callback_token.is_some()
}

async fn sweep(white: ActorKind, black: ActorKind) {
    for n in 0.. {
        let faulty = FaultyStore::new(Arc::new(MemoryStore::new()));
        let h = Harness::builder()
            .store(faulty.clone() as Arc<dyn GameStore>)
            .build();
        let id = h.create(white.clone(), black.clone()).await;

        faulty.fail_nth(n);
        let result = h.flow.advance(id.clone()).await;
        let Some(op) = faulty.tripped() else {
            // The run made fewer than `n + 1` store calls; every point is covered.
            assert!(result.is_ok(), "{result:?}");
            assert!(n > 3, "sweep ended after {n} calls: {:?}", faulty.calls());
            break;
        };

        let head = h.head(&id).await;
        assert!(no_orphan(&head), "fault in {op} (call {n}) orphaned {head:?}");
        let session = h.session(&id).await;
        match result {
            Ok(_) => {}
            Err(err) => {
                assert_eq!(session.status, GameStatus::Error, "fault in {op}");
                assert_eq!(session.last_error.unwrap().cause, err.cause());
                assert_eq!(head.lock_token, None, "fault in {op}");
                assert_eq!(head.callback_token, None, "fault in {op}");
            }
        }
    }
}

#[actix_web::test]
async fn automated_turn_survives_faults_at_every_call() {
    sweep(
        ActorKind::Random { seed: Some(5) },
        ActorKind::Random { seed: Some(6) },
    )
    .await;
}

#[actix_web::test]
async fn suspending_turn_survives_faults_at_every_call() {
    sweep(
        ActorKind::External {
            device: "arm-1".to_string(),
            assist: None,
        },
        ActorKind::Player {
            id: "b".to_string(),
        },
    )
    .await;
}

#[actix_web::test]
async fn fault_between_append_and_head_write_is_repaired() {
    let faulty = FaultyStore::new(Arc::new(MemoryStore::new()));
    let h = Harness::builder()
        .store(faulty.clone() as Arc<dyn GameStore>)
        .build();
    let id = h
        .create(
            ActorKind::Random { seed: Some(9) },
            ActorKind::Player {
                id: "b".to_string(),
            },
        )
        .await;

    // Dry run on a twin session to find the commit's head write.
    let scout = Harness::builder()
        .store(faulty.clone() as Arc<dyn GameStore>)
        .build();
    let scout_id = scout
        .create(
            ActorKind::Random { seed: Some(9) },
            ActorKind::Player {
                id: "b".to_string(),
            },
        )
        .await;
    faulty.fail_nth(u32::MAX);
    scout.flow.advance(scout_id).await.unwrap();
    let calls = faulty.calls();
    let append = calls
        .iter()
        .position(|c| *c == "append_move_record")
        .expect("commit appends a record");
    assert_eq!(calls[append + 1], "conditional_update_head");

    faulty.fail_nth((append + 1) as u32);
    h.flow.advance(id.clone()).await.unwrap_err();
    assert_eq!(faulty.tripped(), Some("conditional_update_head"));

    // The record is durable; the head lags behind it and nobody owns it.
    assert_eq!(h.records(&id).await.len(), 1);
    let head = h.head(&id).await;
    assert_eq!(head.move_count, 0);
    assert_eq!(head.lock_token, None);
    assert_eq!(h.session(&id).await.status, GameStatus::Error);

    // Resuming the session rolls the head forward to the logged move.
    h.sessions
        .change_status(&id, GameStatus::Playing, false)
        .await
        .unwrap();
    let report = h.drain(5).await;
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    let head = h.head(&id).await;
    assert_eq!(head.move_count, 1);
    assert_eq!(head.board, h.records(&id).await[0].board);
    assert!(!head.is_owned());
}
