//! Uniform failure handling for every run.

use tracing::{error, warn};

use super::{FlowState, TurnFlowService};
use crate::domain::{GameStatus, LastError, RunId, SessionId};
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::events::{emit, GameEvent};
use crate::repos::{HeadPatch, HeadPredicate};

impl TurnFlowService {
    /// Freeze the session in `Error`, release both tokens and hand the
    /// original error back. Cleanup failures are logged, never returned.
    pub(super) async fn catch_all(
        &self,
        session_id: &SessionId,
        run_id: Option<&RunId>,
        failed_in: FlowState,
        err: DomainError,
    ) -> DomainError {
        error!(
            session_id = %session_id,
            run_id = run_id.map(RunId::as_str),
            state = failed_in.as_str(),
            code = %err.code(),
            cause = %err.cause(),
            "turn run failed"
        );

        // Nothing to freeze if the session itself is gone.
        if matches!(err, DomainError::NotFound(NotFoundKind::Session, _)) {
            return err;
        }

        let release = HeadPatch::new()
            .clear_lock()
            .clear_callback()
            .with_suggested_move(None);
        if let Err(e) = self
            .store
            .conditional_update_head(session_id, &HeadPredicate::any(), &release)
            .await
        {
            warn!(session_id = %session_id, error = %e, "could not release session tokens");
        }

        let last_error = LastError::from_error(&err);
        if let Err(e) = self
            .store
            .update_session_status(session_id, GameStatus::Error, Some(last_error.clone()))
            .await
        {
            warn!(session_id = %session_id, error = %e, "could not record session error");
        }

        emit(
            self.events.as_ref(),
            GameEvent::SessionErrored {
                session_id: session_id.clone(),
                kind: last_error.kind,
                cause: last_error.cause,
            },
        )
        .await;

        err
    }
}
