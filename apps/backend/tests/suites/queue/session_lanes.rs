//! The session queue driving real runs.

use std::time::Duration;

use backend_test_support::unique_helpers::unique_session_id;
use gambit_backend::domain::{ActorKind, GameStatus, GameWinner, SessionId, TurnTrigger};
use gambit_backend::events::GameEvent;
use gambit_backend::queue::TriggerSink;

use crate::support::app::{eventually, session_of, test_app};

fn player(id: &str) -> ActorKind {
    ActorKind::Player { id: id.to_string() }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn queued_moves_apply_in_order() {
    let t = test_app().await;
    let id = SessionId::new(unique_session_id()).unwrap();
    t.state
        .sessions
        .create_session(id.clone(), player("w"), player("b"))
        .await
        .unwrap();

    for san in ["f3", "e5", "g4", "Qh4#"] {
        t.state
            .queue
            .enqueue(TurnTrigger::HumanMove {
                session_id: id.clone(),
                san: san.to_string(),
            })
            .await
            .unwrap();
    }

    let state = t.state.clone();
    let done = eventually(Duration::from_secs(5), || {
        let state = state.clone();
        let id = id.clone();
        async move { session_of(&state, &id).await.status == GameStatus::Completed }
    })
    .await;
    assert!(done, "game never completed");

    let head = t.state.store.get_latest_head(&id).await.unwrap().unwrap();
    assert_eq!(head.game_winner, Some(GameWinner::Black));
    assert_eq!(head.san_list, "1. f3 2. e5 3. g4 4. Qh4# ");
    assert!(t.state.queue.dead_letters().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn automated_sessions_run_side_by_side() {
    let t = test_app().await;
    let mut ids = Vec::new();
    for seed in 0..4u64 {
        let id = SessionId::new(unique_session_id()).unwrap();
        t.state
            .sessions
            .create_session(
                id.clone(),
                ActorKind::Random { seed: Some(seed) },
                ActorKind::Engine { level: 0 },
            )
            .await
            .unwrap();
        ids.push(id);
    }

    let state = t.state.clone();
    let all_done = eventually(Duration::from_secs(120), || {
        let state = state.clone();
        let ids = ids.clone();
        async move {
            for id in &ids {
                if session_of(&state, id).await.status != GameStatus::Completed {
                    return false;
                }
            }
            true
        }
    })
    .await;
    assert!(all_done, "not every game finished");

    for id in &ids {
        let head = t.state.store.get_latest_head(id).await.unwrap().unwrap();
        let records = t.state.store.list_move_records(id).await.unwrap();
        assert_eq!(records.len() as u32, head.move_count);
        assert!(!head.is_owned());
    }

    // Idle lanes retire on their own.
    let queue = t.state.queue.clone();
    let retired = eventually(Duration::from_secs(5), || {
        let queue = queue.clone();
        async move { queue.active_lanes() == 0 }
    })
    .await;
    assert!(retired);
    t.state.queue.shutdown();
}

#[tokio::test]
async fn failing_trigger_is_dead_lettered() {
    let t = test_app().await;
    // HumanMove for a session that does not exist fails in Resolve.
    t.state
        .queue
        .enqueue(TurnTrigger::HumanMove {
            session_id: SessionId::new("missing").unwrap(),
            san: "e4".to_string(),
        })
        .await
        .unwrap();

    let queue = t.state.queue.clone();
    let lettered = eventually(Duration::from_secs(5), || {
        let queue = queue.clone();
        async move { queue.dead_letters().len() == 1 }
    })
    .await;
    assert!(lettered);
    let letter = &t.state.queue.dead_letters()[0];
    assert_eq!(letter.kind, "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn queued_illegal_move_is_announced_not_dead_lettered() {
    let t = test_app().await;
    let id = SessionId::new(unique_session_id()).unwrap();
    t.state
        .sessions
        .create_session(id.clone(), player("w"), player("b"))
        .await
        .unwrap();
    let mut events = t.events.subscribe();

    t.state
        .queue
        .enqueue(TurnTrigger::HumanMove {
            session_id: id.clone(),
            san: "e5".to_string(),
        })
        .await
        .unwrap();

    let rejected = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(GameEvent::MoveRejected { san, kind, .. }) => return (san, kind),
                Ok(_) => continue,
                Err(e) => panic!("event stream closed: {e}"),
            }
        }
    })
    .await
    .expect("rejection announced within 5s");
    assert_eq!(rejected, ("e5".to_string(), "ILLEGAL_MOVE".to_string()));

    let queue = t.state.queue.clone();
    let settled = eventually(Duration::from_secs(5), || {
        let queue = queue.clone();
        async move { queue.in_flight() == 0 }
    })
    .await;
    assert!(settled);
    assert!(t.state.queue.dead_letters().is_empty());
    assert_eq!(session_of(&t.state, &id).await.status, GameStatus::Playing);
}
