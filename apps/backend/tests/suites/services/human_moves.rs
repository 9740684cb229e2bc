//! Human seats: moves arrive from outside and are checked before any write.

use gambit_backend::domain::{ActorKind, GameStatus, SessionId, TurnTrigger};
use gambit_backend::events::GameEvent;
use gambit_backend::queue::TriggerSink;
use gambit_backend::errors::domain::{DomainError, ValidationKind};
use gambit_backend::services::TurnOutcome;

use crate::support::harness::{player, Harness};

#[actix_web::test]
async fn human_turn_waits_without_locking() {
    let h = Harness::new();
    let id = h.create(player("w"), player("b")).await;

    let outcome = h.flow.advance(id.clone()).await.unwrap();
    assert_eq!(outcome, TurnOutcome::AwaitingHuman);
    let head = h.head(&id).await;
    assert!(!head.is_owned());
    assert_eq!(head.move_count, 0);
    assert!(h.queue.is_empty());
}

#[actix_web::test]
async fn illegal_move_is_rejected_without_side_effects() {
    let h = Harness::new();
    let id = h.create(player("w"), player("b")).await;
    let before = h.head(&id).await;

    for san in ["e5", "Ke2", "xx"] {
        let err = h.flow.submit_human_move(id.clone(), san).await.unwrap_err();
        assert!(
            matches!(err, DomainError::Validation(ValidationKind::IllegalMove, _)),
            "{san}: {err:?}"
        );
    }

    assert_eq!(h.head(&id).await, before);
    assert_eq!(h.session(&id).await.status, GameStatus::Playing);
    assert!(h.records(&id).await.is_empty());

    let rejected: Vec<String> = h
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::MoveRejected { san, kind, .. } => {
                assert_eq!(kind, "ILLEGAL_MOVE");
                Some(san)
            }
            _ => None,
        })
        .collect();
    assert_eq!(rejected, vec!["e5", "Ke2", "xx"]);
}

#[actix_web::test]
async fn queued_rejection_is_not_a_trigger_failure() {
    let h = Harness::new();
    let id = h.create(player("w"), player("b")).await;
    h.queue
        .enqueue(TurnTrigger::HumanMove {
            session_id: id.clone(),
            san: "e5".to_string(),
        })
        .await
        .unwrap();

    let report = h.drain(5).await;
    assert_eq!(report.processed, 1);
    assert!(report.failures.is_empty());
    assert_eq!(h.session(&id).await.status, GameStatus::Playing);
    assert!(h.session(&id).await.last_error.is_none());
}

#[actix_web::test]
async fn admission_check_matches_the_run_and_writes_nothing() {
    let h = Harness::new();
    let id = h
        .create(player("w"), ActorKind::Engine { level: 0 })
        .await;

    h.flow.check_human_move(&id, "e4").await.unwrap();
    let err = h.flow.check_human_move(&id, "e5").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::IllegalMove, _)));
    assert_eq!(h.head(&id).await.move_count, 0);

    h.flow.submit_human_move(id.clone(), "e4").await.unwrap();
    h.queue.take_all();
    let err = h.flow.check_human_move(&id, "e5").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::OutOfTurn, _)));

    h.sessions
        .change_status(&id, GameStatus::Paused, false)
        .await
        .unwrap();
    let err = h.flow.check_human_move(&id, "e5").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::NotPlaying, _)));

    let err = h
        .flow
        .check_human_move(&SessionId::new("nobody").unwrap(), "e4")
        .await
        .unwrap_err();
    assert_eq!(err.code().as_str(), "SESSION_NOT_FOUND");
    assert!(h
        .take_events()
        .iter()
        .all(|e| !matches!(e, GameEvent::MoveRejected { .. })));
}

#[actix_web::test]
async fn move_for_an_automated_side_is_out_of_turn() {
    let h = Harness::new();
    let id = h
        .create(player("w"), ActorKind::Engine { level: 0 })
        .await;
    h.flow.submit_human_move(id.clone(), "e4").await.unwrap();
    h.queue.take_all();

    let err = h.flow.submit_human_move(id.clone(), "e5").await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::OutOfTurn, _)
    ));
    assert_eq!(h.session(&id).await.status, GameStatus::Playing);
    assert_eq!(h.head(&id).await.move_count, 1);
}

#[actix_web::test]
async fn legal_move_commits_and_hands_over() {
    let h = Harness::new();
    let id = h
        .create(player("w"), ActorKind::Random { seed: Some(3) })
        .await;

    let outcome = h.flow.submit_human_move(id.clone(), "Nf3").await.unwrap();
    assert_eq!(
        outcome,
        TurnOutcome::Committed {
            move_count: 1,
            san: "Nf3".to_string(),
            winner: None,
        }
    );

    // The scheduled advance lets the random seat reply; white then waits.
    let report = h.drain(10).await;
    assert!(report.failures.is_empty());
    let head = h.head(&id).await;
    assert_eq!(head.move_count, 2);
    assert!(!head.is_owned());
    let records = h.records(&id).await;
    assert_eq!(records[0].san.as_deref(), Some("Nf3"));
    assert_eq!(records[0].run_id.is_some(), true);
}

#[actix_web::test]
async fn moves_on_paused_sessions_are_ignored() {
    let h = Harness::new();
    let id = h.create(player("w"), player("b")).await;
    h.sessions
        .change_status(&id, GameStatus::Paused, false)
        .await
        .unwrap();

    let outcome = h.flow.submit_human_move(id.clone(), "e4").await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Skipped(_)));
    assert_eq!(h.head(&id).await.move_count, 0);
}
