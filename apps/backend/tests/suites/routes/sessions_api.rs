//! HTTP surface for sessions, moves and callbacks.

use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use backend_test_support::unique_helpers::unique_session_id;
use gambit_backend::domain::{GameStatus, SessionId};
use gambit_backend::routes;
use serde_json::json;

use crate::common::json_body;
use crate::support::app::{eventually, session_of, test_app};

fn players(session_id: &str) -> serde_json::Value {
    json!({
        "session_id": session_id,
        "white": { "type": "player", "id": "alice" },
        "black": { "type": "player", "id": "bob" },
    })
}

#[actix_web::test]
async fn create_then_fetch_session() {
    let app_state = test_app().await.state;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::configure),
    )
    .await;
    let sid = unique_session_id();

    let req = test::TestRequest::post()
        .uri("/api/sessions")
        .set_json(players(&sid))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["id"], sid.as_str());
    assert_eq!(body["status"], "PLAYING");

    let req = test::TestRequest::get()
        .uri(&format!("/api/sessions/{sid}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["head"]["move_count"], 0);
    assert_eq!(body["moves"].as_array().unwrap().len(), 0);

    // Same id again.
    let req = test::TestRequest::post()
        .uri("/api/sessions")
        .set_json(players(&sid))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "SESSION_EXISTS",
        StatusCode::CONFLICT,
        None,
    )
    .await;
}

#[actix_web::test]
async fn unknown_session_is_problem_json_404() {
    let app_state = test_app().await.state;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/sessions/nope")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "SESSION_NOT_FOUND",
        StatusCode::NOT_FOUND,
        Some("nope"),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/sessions/nope/trigger")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn human_move_is_accepted_and_committed() {
    let app_state = test_app().await.state;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::configure),
    )
    .await;
    let sid = unique_session_id();
    let req = test::TestRequest::post()
        .uri("/api/sessions")
        .set_json(players(&sid))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/sessions/{sid}/moves"))
        .set_json(json!({ "san": "e4" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body = json_body(resp).await;
    assert_eq!(body["trigger"], "human_move");

    let id = SessionId::new(&sid).unwrap();
    let store = app_state.store.clone();
    let committed = eventually(Duration::from_secs(5), || {
        let store = store.clone();
        let id = id.clone();
        async move {
            matches!(store.get_latest_head(&id).await, Ok(Some(h)) if h.move_count == 1)
        }
    })
    .await;
    assert!(committed, "e4 never reached the head");

    let req = test::TestRequest::post()
        .uri(&format!("/api/sessions/{sid}/moves"))
        .set_json(json!({ "san": "  " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "ILLEGAL_MOVE",
        StatusCode::UNPROCESSABLE_ENTITY,
        None,
    )
    .await;
}

#[actix_web::test]
async fn status_changes_follow_operator_rules() {
    let app_state = test_app().await.state;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::configure),
    )
    .await;
    let sid = unique_session_id();
    let req = test::TestRequest::post()
        .uri("/api/sessions")
        .set_json(players(&sid))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/sessions/{sid}/status"))
        .set_json(json!({ "status": "PAUSED" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "PAUSED");
    let id = SessionId::new(&sid).unwrap();
    assert_eq!(session_of(&app_state, &id).await.status, GameStatus::Paused);

    for status in ["COMPLETED", "sideways"] {
        let req = test::TestRequest::put()
            .uri(&format!("/api/sessions/{sid}/status"))
            .set_json(json!({ "status": status }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_problem_details_from_service_response(
            resp,
            "VALIDATION_ERROR",
            StatusCode::UNPROCESSABLE_ENTITY,
            None,
        )
        .await;
    }

    let req = test::TestRequest::put()
        .uri(&format!("/api/sessions/{sid}/status"))
        .set_json(json!({ "status": "PLAYING", "force_release": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn callbacks_validate_the_token_shape() {
    let app_state = test_app().await.state;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/callbacks")
        .set_json(json!({
            "callback_token": "no-separator",
            "result": { "status": "moved", "san": "e4" },
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "BAD_REQUEST",
        StatusCode::BAD_REQUEST,
        Some("malformed"),
    )
    .await;

    // Well-formed but unknown: accepted, then dropped by the run.
    let req = test::TestRequest::post()
        .uri("/api/callbacks")
        .set_json(json!({
            "callback_token": "ghost#01ARZ3NDEKTSV4RRFFQ69G5FAV",
            "result": { "status": "failed", "cause": "late" },
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(json_body(resp).await["session_id"], "ghost");
}

#[actix_web::test]
async fn device_round_trip_over_http() {
    let mut t = test_app().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(t.state.clone()))
            .configure(routes::configure),
    )
    .await;
    let sid = unique_session_id();
    let req = test::TestRequest::post()
        .uri("/api/sessions")
        .set_json(json!({
            "session_id": sid,
            "white": { "type": "external", "device": "arm-7", "assist": 0 },
            "black": { "type": "player", "id": "bob" },
        }))
        .to_request();
    test::call_service(&app, req).await;

    let request = tokio::time::timeout(Duration::from_secs(5), t.devices.recv())
        .await
        .expect("device request within 5s")
        .expect("link open");
    assert_eq!(request.device, "arm-7");
    let san = request.suggested_move.clone().expect("assisted");

    let req = test::TestRequest::post()
        .uri("/api/callbacks")
        .set_json(json!({
            "callback_token": request.callback_token,
            "result": { "status": "moved", "san": san },
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let id = SessionId::new(&sid).unwrap();
    let store = t.state.store.clone();
    let settled = eventually(Duration::from_secs(5), || {
        let store = store.clone();
        let id = id.clone();
        async move {
            matches!(
                store.get_latest_head(&id).await,
                Ok(Some(h)) if h.move_count == 1 && !h.is_owned()
            )
        }
    })
    .await;
    assert!(settled, "callback never committed");
}

#[actix_web::test]
async fn moves_that_do_not_fit_the_position_are_refused() {
    let app_state = test_app().await.state;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::configure),
    )
    .await;
    let sid = unique_session_id();
    let req = test::TestRequest::post()
        .uri("/api/sessions")
        .set_json(players(&sid))
        .to_request();
    test::call_service(&app, req).await;

    // Black's reply at the start position.
    let req = test::TestRequest::post()
        .uri(&format!("/api/sessions/{sid}/moves"))
        .set_json(json!({ "san": "e5" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "ILLEGAL_MOVE",
        StatusCode::UNPROCESSABLE_ENTITY,
        Some("'e5' is not legal"),
    )
    .await;
    assert!(app_state.queue.dead_letters().is_empty());

    let req = test::TestRequest::put()
        .uri(&format!("/api/sessions/{sid}/status"))
        .set_json(json!({ "status": "PAUSED" }))
        .to_request();
    test::call_service(&app, req).await;
    let req = test::TestRequest::post()
        .uri(&format!("/api/sessions/{sid}/moves"))
        .set_json(json!({ "san": "e4" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "NOT_PLAYING",
        StatusCode::UNPROCESSABLE_ENTITY,
        None,
    )
    .await;

    let id = SessionId::new(&sid).unwrap();
    let head = app_state.store.get_latest_head(&id).await.unwrap().unwrap();
    assert_eq!(head.move_count, 0);
}

#[actix_web::test]
async fn move_for_a_device_seat_is_out_of_turn() {
    let t = test_app().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(t.state.clone()))
            .configure(routes::configure),
    )
    .await;
    let sid = unique_session_id();
    let req = test::TestRequest::post()
        .uri("/api/sessions")
        .set_json(json!({
            "session_id": sid,
            "white": { "type": "external", "device": "arm-2", "assist": 0 },
            "black": { "type": "player", "id": "bob" },
        }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/sessions/{sid}/moves"))
        .set_json(json!({ "san": "e4" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "OUT_OF_TURN",
        StatusCode::UNPROCESSABLE_ENTITY,
        None,
    )
    .await;
}
