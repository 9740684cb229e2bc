//! Session, move and callback ingress.
//!
//! Anything that advances a game goes onto the session queue and answers
//! `202 Accepted`; the run itself happens on the session's lane.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::{ActorKind, ActorResult, CallbackToken, GameStatus, SessionId, TurnTrigger};
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::queue::TriggerSink;
use crate::repos::require_session;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub session_id: String,
    pub white: ActorKind,
    pub black: ActorKind,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
    /// Clear lock and callback tokens first (operator unstick).
    #[serde(default)]
    pub force_release: bool,
}

#[derive(Debug, Deserialize)]
pub struct HumanMoveRequest {
    pub san: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub callback_token: String,
    pub result: ActorResult,
}

#[derive(Debug, Serialize)]
struct Accepted {
    session_id: String,
    trigger: &'static str,
}

fn accepted(trigger: &TurnTrigger, session_id: &SessionId) -> HttpResponse {
    HttpResponse::Accepted().json(Accepted {
        session_id: session_id.to_string(),
        trigger: trigger.kind(),
    })
}

/// POST /api/sessions
async fn create_session(
    body: web::Json<CreateSessionRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let id = SessionId::new(&body.session_id)?;
    let session = app_state
        .sessions
        .create_session(id, body.white, body.black)
        .await?;
    Ok(HttpResponse::Created().json(session))
}

/// GET /api/sessions/{session_id}
async fn get_session(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = SessionId::new(path.into_inner())?;
    let view = app_state.sessions.get_session_view(&id).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// DELETE /api/sessions/{session_id}
async fn delete_session(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = SessionId::new(path.into_inner())?;
    app_state.sessions.delete_session(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// PUT /api/sessions/{session_id}/status
async fn change_status(
    path: web::Path<String>,
    body: web::Json<ChangeStatusRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = SessionId::new(path.into_inner())?;
    let status = GameStatus::parse(body.status.trim()).map_err(|_| {
        AppError::invalid(
            ErrorCode::ValidationError,
            format!("status must be PLAYING or PAUSED, got '{}'", body.status),
        )
    })?;
    let session = app_state
        .sessions
        .change_status(&id, status, body.force_release)
        .await?;
    Ok(HttpResponse::Ok().json(session))
}

/// POST /api/sessions/{session_id}/trigger
async fn trigger_session(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = SessionId::new(path.into_inner())?;
    require_session(app_state.store.as_ref(), &id).await?;
    let trigger = TurnTrigger::advance(id.clone());
    let response = accepted(&trigger, &id);
    app_state.queue.enqueue(trigger).await?;
    Ok(response)
}

/// POST /api/sessions/{session_id}/moves
///
/// Moves that do not fit the current position are refused here with 422.
async fn submit_move(
    path: web::Path<String>,
    body: web::Json<HumanMoveRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = SessionId::new(path.into_inner())?;
    let san = body.into_inner().san.trim().to_string();
    if san.is_empty() {
        return Err(AppError::invalid(ErrorCode::IllegalMove, "move must not be empty"));
    }
    app_state.flow.check_human_move(&id, &san).await?;
    let trigger = TurnTrigger::HumanMove {
        session_id: id.clone(),
        san,
    };
    let response = accepted(&trigger, &id);
    app_state.queue.enqueue(trigger).await?;
    Ok(response)
}

/// POST /api/callbacks
///
/// Stale tokens are accepted here and dropped by the run.
async fn resume_callback(
    body: web::Json<CallbackRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let token = CallbackToken::parse(&body.callback_token).map_err(|_| {
        AppError::bad_request(ErrorCode::BadRequest, "callback token is malformed")
    })?;
    let id = token.session_id()?;
    let trigger = TurnTrigger::Resume {
        callback_token: token,
        result: body.result,
    };
    let response = accepted(&trigger, &id);
    app_state.queue.enqueue(trigger).await?;
    Ok(response)
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(create_session)))
        .service(
            web::resource("/{session_id}")
                .route(web::get().to(get_session))
                .route(web::delete().to(delete_session)),
        )
        .service(web::resource("/{session_id}/status").route(web::put().to(change_status)))
        .service(web::resource("/{session_id}/trigger").route(web::post().to(trigger_session)))
        .service(web::resource("/{session_id}/moves").route(web::post().to(submit_move)));
}

pub fn configure_callback_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(resume_callback)));
}
