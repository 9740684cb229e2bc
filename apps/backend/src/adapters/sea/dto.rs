//! Row <-> domain conversions for the sea-orm store.

use sea_orm::ActiveValue::Set;

use crate::domain::{
    ActorKind, GameStatus, GameWinner, LastError, LatestMoveHead, MoveRecord, Session, SessionId,
};
use crate::entities::{latest_moves, move_records, sessions};
use crate::errors::domain::{DomainError, InfraErrorKind};

fn corrupt(what: &str, detail: impl std::fmt::Display) -> DomainError {
    DomainError::infra(
        InfraErrorKind::DataCorruption,
        format!("{what}: {detail}"),
    )
}

fn count_from_db(what: &str, n: i32) -> Result<u32, DomainError> {
    u32::try_from(n).map_err(|_| corrupt(what, format!("negative value {n}")))
}

pub(super) fn count_to_db(n: u32) -> Result<i32, DomainError> {
    i32::try_from(n).map_err(|_| {
        DomainError::infra(
            InfraErrorKind::Other("Overflow".into()),
            format!("move count {n} out of range"),
        )
    })
}

fn actor_from_db(raw: &str) -> Result<ActorKind, DomainError> {
    serde_json::from_str(raw).map_err(|e| corrupt("sessions actor", e))
}

fn actor_to_db(actor: &ActorKind) -> Result<String, DomainError> {
    serde_json::to_string(actor)
        .map_err(|e| DomainError::infra(InfraErrorKind::Other("Serialize".into()), e.to_string()))
}

pub fn session_from_row(row: sessions::Model) -> Result<Session, DomainError> {
    let last_error = row.last_error_kind.map(|kind| LastError {
        kind,
        cause: row.last_error_cause.unwrap_or_default(),
    });
    Ok(Session {
        id: SessionId::new(&row.id).map_err(|e| corrupt("sessions.id", e))?,
        white: actor_from_db(&row.white_actor)?,
        black: actor_from_db(&row.black_actor)?,
        status: GameStatus::parse(&row.status).map_err(|e| corrupt("sessions.status", e))?,
        last_error,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub fn session_to_active(session: &Session) -> Result<sessions::ActiveModel, DomainError> {
    Ok(sessions::ActiveModel {
        id: Set(session.id.as_str().to_string()),
        white_actor: Set(actor_to_db(&session.white)?),
        black_actor: Set(actor_to_db(&session.black)?),
        status: Set(session.status.as_str().to_string()),
        last_error_kind: Set(session.last_error.as_ref().map(|e| e.kind.clone())),
        last_error_cause: Set(session.last_error.as_ref().map(|e| e.cause.clone())),
        created_at: Set(session.created_at),
        updated_at: Set(session.updated_at),
    })
}

pub fn head_from_row(row: latest_moves::Model) -> Result<LatestMoveHead, DomainError> {
    let game_winner = row
        .game_winner
        .as_deref()
        .map(GameWinner::parse)
        .transpose()
        .map_err(|e| corrupt("latest_moves.game_winner", e))?;
    Ok(LatestMoveHead {
        session_id: SessionId::new(&row.session_id)
            .map_err(|e| corrupt("latest_moves.session_id", e))?,
        board: row.board,
        move_count: count_from_db("latest_moves.move_count", row.move_count)?,
        san_list: row.san_list,
        lock_token: row.lock_token,
        callback_token: row.callback_token,
        suggested_move: row.suggested_move,
        game_winner,
        version: row.version,
        updated_at: row.updated_at,
    })
}

pub fn head_to_active(head: &LatestMoveHead) -> Result<latest_moves::ActiveModel, DomainError> {
    Ok(latest_moves::ActiveModel {
        session_id: Set(head.session_id.as_str().to_string()),
        board: Set(head.board.clone()),
        move_count: Set(count_to_db(head.move_count)?),
        san_list: Set(head.san_list.clone()),
        lock_token: Set(head.lock_token.clone()),
        callback_token: Set(head.callback_token.clone()),
        suggested_move: Set(head.suggested_move.clone()),
        game_winner: Set(head.game_winner.map(|w| w.as_str().to_string())),
        version: Set(head.version),
        updated_at: Set(head.updated_at),
    })
}

pub fn record_from_row(row: move_records::Model) -> Result<MoveRecord, DomainError> {
    Ok(MoveRecord {
        session_id: SessionId::new(&row.session_id)
            .map_err(|e| corrupt("move_records.session_id", e))?,
        sequence: count_from_db("move_records.sequence", row.sequence)?,
        recorded_at: row.recorded_at,
        board: row.board,
        move_count: count_from_db("move_records.move_count", row.move_count)?,
        san: row.san,
        run_id: row.run_id,
    })
}

pub fn record_to_active(record: &MoveRecord) -> Result<move_records::ActiveModel, DomainError> {
    Ok(move_records::ActiveModel {
        session_id: Set(record.session_id.as_str().to_string()),
        sequence: Set(count_to_db(record.sequence)?),
        recorded_at: Set(record.recorded_at),
        board: Set(record.board.clone()),
        move_count: Set(count_to_db(record.move_count)?),
        san: Set(record.san.clone()),
        run_id: Set(record.run_id.clone()),
    })
}
