//! External seats: park on the device, resume on its callback.

use std::sync::Arc;

use gambit_backend::domain::{ActorKind, ActorResult, GameStatus};
use gambit_backend::events::GameEvent;
use gambit_backend::repos::{HeadPatch, HeadPredicate};
use gambit_backend::services::{SkipReason, TurnOutcome};

use crate::support::harness::{player, Harness};
use crate::support::scripted::FailingLink;

fn arm(assist: Option<u8>) -> ActorKind {
    ActorKind::External {
        device: "arm-1".to_string(),
        assist,
    }
}

#[actix_web::test]
async fn device_turn_suspends_then_commits_on_callback() {
    let h = Harness::new();
    let id = h.create(arm(Some(0)), player("b")).await;

    let TurnOutcome::Suspended { callback_token } = h.flow.advance(id.clone()).await.unwrap()
    else {
        panic!("expected the run to park on the device");
    };

    // Parked: both tokens set, nothing committed.
    let head = h.head(&id).await;
    assert!(head.lock_token.is_some());
    assert_eq!(head.callback_token.as_deref(), Some(callback_token.as_str()));
    assert!(h.records(&id).await.is_empty());

    let requests = h.take_device_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].device, "arm-1");
    assert_eq!(requests[0].callback_token, callback_token);
    let suggested = requests[0].suggested_move.clone().expect("assist suggests a move");
    assert_eq!(head.suggested_move.as_deref(), Some(suggested.as_str()));

    let outcome = h
        .flow
        .resume(&callback_token, ActorResult::Moved { san: suggested.clone() })
        .await
        .unwrap();
    assert!(matches!(outcome, TurnOutcome::Committed { move_count: 1, .. }));

    let head = h.head(&id).await;
    assert_eq!(head.lock_token, None);
    assert_eq!(head.callback_token, None);
    assert_eq!(head.suggested_move, None);
    assert_eq!(head.move_count, 1);
    assert_eq!(h.queue.len(), 1, "next turn scheduled");

    let kinds: Vec<_> = h.take_events().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec!["turn_suspended", "move_committed"]);
}

#[actix_web::test]
async fn duplicate_callback_is_dropped() {
    let h = Harness::new();
    let id = h.create(arm(None), player("b")).await;
    let TurnOutcome::Suspended { callback_token } = h.flow.advance(id.clone()).await.unwrap()
    else {
        panic!("expected suspension");
    };

    let moved = ActorResult::Moved {
        san: "e4".to_string(),
    };
    h.flow.resume(&callback_token, moved.clone()).await.unwrap();
    let again = h.flow.resume(&callback_token, moved).await.unwrap();
    assert_eq!(again, TurnOutcome::Skipped(SkipReason::StaleCallback));
    assert_eq!(h.records(&id).await.len(), 1);
    assert_eq!(h.head(&id).await.move_count, 1);
}

#[actix_web::test]
async fn unknown_and_malformed_tokens_are_stale() {
    let h = Harness::new();
    let id = h.create(arm(None), player("b")).await;
    h.flow.advance(id.clone()).await.unwrap();

    let moved = ActorResult::Moved {
        san: "e4".to_string(),
    };
    for token in [
        "garbage".to_string(),
        format!("{id}#01ARZ3NDEKTSV4RRFFQ69G5FAV"),
        "nobody#01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
    ] {
        let outcome = h.flow.resume(&token, moved.clone()).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Skipped(SkipReason::StaleCallback), "{token}");
    }
    assert!(h.head(&id).await.callback_token.is_some(), "real token untouched");
}

#[actix_web::test]
async fn parked_session_is_not_dispatched_again() {
    let h = Harness::new();
    let id = h.create(arm(None), player("b")).await;
    h.flow.advance(id.clone()).await.unwrap();

    let outcome = h.flow.advance(id.clone()).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Skipped(SkipReason::AlreadyLocked));
    assert_eq!(h.take_device_requests().len(), 1);
}

#[actix_web::test]
async fn device_failure_errors_the_session_and_clears_tokens() {
    let h = Harness::new();
    let id = h.create(arm(None), player("b")).await;
    let TurnOutcome::Suspended { callback_token } = h.flow.advance(id.clone()).await.unwrap()
    else {
        panic!("expected suspension");
    };

    let err = h
        .flow
        .resume(
            &callback_token,
            ActorResult::Failed {
                cause: "gripper jammed".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.cause(), "gripper jammed");

    let session = h.session(&id).await;
    assert_eq!(session.status, GameStatus::Error);
    let last = session.last_error.unwrap();
    assert_eq!(last.kind, "ACTOR_ERROR");
    assert_eq!(last.cause, "gripper jammed");
    let head = h.head(&id).await;
    assert_eq!(head.lock_token, None);
    assert_eq!(head.callback_token, None);
}

#[actix_web::test]
async fn illegal_device_move_errors_the_session() {
    let h = Harness::new();
    let id = h.create(arm(None), player("b")).await;
    let TurnOutcome::Suspended { callback_token } = h.flow.advance(id.clone()).await.unwrap()
    else {
        panic!("expected suspension");
    };

    h.flow
        .resume(
            &callback_token,
            ActorResult::Moved {
                san: "e5".to_string(),
            },
        )
        .await
        .unwrap_err();
    let session = h.session(&id).await;
    assert_eq!(session.status, GameStatus::Error);
    assert_eq!(session.last_error.unwrap().kind, "ILLEGAL_MOVE");
    assert!(!h.head(&id).await.is_owned());
}

#[actix_web::test]
async fn unreachable_device_errors_the_session() {
    let h = Harness::builder()
        .actuators(Arc::new(FailingLink {
            cause: "arm-1 offline".to_string(),
        }))
        .build();
    let id = h.create(arm(None), player("b")).await;

    let err = h.flow.advance(id.clone()).await.unwrap_err();
    assert_eq!(err.cause(), "arm-1 offline");
    let head = h.head(&id).await;
    assert_eq!(head.lock_token, None);
    assert_eq!(head.callback_token, None);
    assert_eq!(h.session(&id).await.status, GameStatus::Error);
    assert!(h
        .take_events()
        .iter()
        .any(|e| matches!(e, GameEvent::SessionErrored { .. })));
}

#[actix_web::test]
async fn resume_after_lock_cleared_takes_fresh_lock() {
    let h = Harness::new();
    let id = h.create(arm(None), player("b")).await;
    let TurnOutcome::Suspended { callback_token } = h.flow.advance(id.clone()).await.unwrap()
    else {
        panic!("expected suspension");
    };

    // Only the lock goes; the device is still holding the callback.
    let head = h
        .store
        .conditional_update_head(
            &id,
            &HeadPredicate::any().callback_equals(callback_token.as_str()),
            &HeadPatch::new().clear_lock(),
        )
        .await
        .unwrap();
    assert_eq!(head.lock_token, None);
    assert!(head.callback_token.is_some());

    let outcome = h
        .flow
        .resume(
            &callback_token,
            ActorResult::Moved {
                san: "d4".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(
        outcome,
        TurnOutcome::Committed {
            move_count: 1,
            san: "d4".to_string(),
            winner: None,
        }
    );

    let head = h.head(&id).await;
    assert_eq!(head.lock_token, None);
    assert_eq!(head.callback_token, None);
    assert_eq!(head.san_list, "1. d4 ");
    assert_eq!(h.records(&id).await.len(), 1);
    assert_eq!(h.session(&id).await.status, GameStatus::Playing);
}
