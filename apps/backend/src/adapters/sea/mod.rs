//! sea-orm implementation of the store port (Postgres or SQLite).
//!
//! Head writes follow the optimistic update-then-fetch pattern: a single
//! `UPDATE ... WHERE <predicate>` that also bumps `version`; zero rows
//! affected means either the predicate failed or the head does not exist,
//! which a follow-up read tells apart.

mod dto;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
    UpdateMany,
};
use time::OffsetDateTime;
use tracing::debug;

use crate::domain::{GameStatus, LastError, LatestMoveHead, MoveRecord, Session, SessionId};
use crate::entities::{latest_moves, move_records, sessions};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::infra::db_errors::map_db_err;
use crate::repos::{GameStore, HeadPatch, HeadPredicate, TokenExpect};

#[derive(Debug, Clone)]
pub struct SeaStore {
    db: DatabaseConnection,
}

impl SeaStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn session_missing(id: &SessionId) -> DomainError {
    DomainError::not_found(NotFoundKind::Session, format!("session {id}"))
}

fn filter_token(
    query: UpdateMany<latest_moves::Entity>,
    column: latest_moves::Column,
    expect: &TokenExpect,
) -> UpdateMany<latest_moves::Entity> {
    match expect {
        TokenExpect::Any => query,
        TokenExpect::Absent => query.filter(column.is_null()),
        TokenExpect::Equals(token) => query.filter(column.eq(token.clone())),
    }
}

fn apply_patch(
    mut query: UpdateMany<latest_moves::Entity>,
    patch: &HeadPatch,
) -> Result<UpdateMany<latest_moves::Entity>, DomainError> {
    use latest_moves::Column;

    if let Some(board) = &patch.board {
        query = query.col_expr(Column::Board, Expr::value(board.clone()));
    }
    if let Some(count) = patch.move_count {
        query = query.col_expr(Column::MoveCount, Expr::value(dto::count_to_db(count)?));
    }
    if let Some(san_list) = &patch.san_list {
        query = query.col_expr(Column::SanList, Expr::value(san_list.clone()));
    }
    if let Some(lock) = &patch.lock_token {
        query = query.col_expr(Column::LockToken, Expr::value(lock.clone()));
    }
    if let Some(callback) = &patch.callback_token {
        query = query.col_expr(Column::CallbackToken, Expr::value(callback.clone()));
    }
    if let Some(suggested) = &patch.suggested_move {
        query = query.col_expr(Column::SuggestedMove, Expr::value(suggested.clone()));
    }
    if let Some(winner) = &patch.game_winner {
        query = query.col_expr(
            Column::GameWinner,
            Expr::value(winner.map(|w| w.as_str().to_string())),
        );
    }
    Ok(query)
}

#[async_trait]
impl GameStore for SeaStore {
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        let row = sessions::Entity::find_by_id(id.as_str().to_string())
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        row.map(dto::session_from_row).transpose()
    }

    async fn create_session(
        &self,
        session: &Session,
        head: &LatestMoveHead,
    ) -> Result<(), DomainError> {
        if self.get_session(&session.id).await?.is_some() {
            return Err(DomainError::conflict(
                ConflictKind::SessionExists,
                format!("session {} already exists", session.id),
            ));
        }

        let txn = self.db.begin().await.map_err(map_db_err)?;
        sessions::Entity::insert(dto::session_to_active(session)?)
            .exec_without_returning(&txn)
            .await
            .map_err(map_db_err)?;
        latest_moves::Entity::insert(dto::head_to_active(head)?)
            .exec_without_returning(&txn)
            .await
            .map_err(map_db_err)?;
        txn.commit().await.map_err(map_db_err)?;
        Ok(())
    }

    async fn update_session_status(
        &self,
        id: &SessionId,
        status: GameStatus,
        error: Option<LastError>,
    ) -> Result<Session, DomainError> {
        let (kind, cause) = match error {
            Some(e) => (Some(e.kind), Some(e.cause)),
            None => (None, None),
        };
        let result = sessions::Entity::update_many()
            .col_expr(
                sessions::Column::Status,
                Expr::value(status.as_str().to_string()),
            )
            .col_expr(sessions::Column::LastErrorKind, Expr::value(kind))
            .col_expr(sessions::Column::LastErrorCause, Expr::value(cause))
            .col_expr(
                sessions::Column::UpdatedAt,
                Expr::value(OffsetDateTime::now_utc()),
            )
            .filter(sessions::Column::Id.eq(id.as_str()))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected == 0 {
            return Err(session_missing(id));
        }
        self.get_session(id).await?.ok_or_else(|| session_missing(id))
    }

    async fn get_latest_head(
        &self,
        id: &SessionId,
    ) -> Result<Option<LatestMoveHead>, DomainError> {
        let row = latest_moves::Entity::find_by_id(id.as_str().to_string())
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        row.map(dto::head_from_row).transpose()
    }

    async fn conditional_update_head(
        &self,
        id: &SessionId,
        predicate: &HeadPredicate,
        patch: &HeadPatch,
    ) -> Result<LatestMoveHead, DomainError> {
        use latest_moves::Column;

        let mut query = apply_patch(latest_moves::Entity::update_many(), patch)?
            .col_expr(Column::Version, Expr::col(Column::Version).add(1))
            .col_expr(Column::UpdatedAt, Expr::value(OffsetDateTime::now_utc()))
            .filter(Column::SessionId.eq(id.as_str()));
        query = filter_token(query, Column::LockToken, &predicate.lock);
        query = filter_token(query, Column::CallbackToken, &predicate.callback);
        if let Some(count) = predicate.move_count {
            query = query.filter(Column::MoveCount.eq(dto::count_to_db(count)?));
        }
        if let Some(board) = &predicate.board {
            query = query.filter(Column::Board.eq(board.clone()));
        }

        let result = query.exec(&self.db).await.map_err(map_db_err)?;
        if result.rows_affected == 0 {
            return match self.get_latest_head(id).await? {
                Some(current) => {
                    debug!(
                        session_id = %id,
                        version = current.version,
                        "conditional head update rejected"
                    );
                    Err(DomainError::conflict(
                        ConflictKind::ConditionFailed,
                        format!("head of {id} changed (version {})", current.version),
                    ))
                }
                None => Err(DomainError::not_found(
                    NotFoundKind::Head,
                    format!("head of {id}"),
                )),
            };
        }

        self.get_latest_head(id).await?.ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Head, format!("head of {id}"))
        })
    }

    async fn append_move_record(&self, record: &MoveRecord) -> Result<(), DomainError> {
        move_records::Entity::insert(dto::record_to_active(record)?)
            .exec_without_returning(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn latest_move_record(
        &self,
        id: &SessionId,
    ) -> Result<Option<MoveRecord>, DomainError> {
        let row = move_records::Entity::find()
            .filter(move_records::Column::SessionId.eq(id.as_str()))
            .order_by_desc(move_records::Column::Sequence)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        row.map(dto::record_from_row).transpose()
    }

    async fn list_move_records(&self, id: &SessionId) -> Result<Vec<MoveRecord>, DomainError> {
        move_records::Entity::find()
            .filter(move_records::Column::SessionId.eq(id.as_str()))
            .order_by_asc(move_records::Column::Sequence)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(dto::record_from_row)
            .collect()
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), DomainError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        move_records::Entity::delete_many()
            .filter(move_records::Column::SessionId.eq(id.as_str()))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        latest_moves::Entity::delete_by_id(id.as_str().to_string())
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        let deleted = sessions::Entity::delete_by_id(id.as_str().to_string())
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        if deleted.rows_affected == 0 {
            txn.rollback().await.map_err(map_db_err)?;
            return Err(session_missing(id));
        }
        txn.commit().await.map_err(map_db_err)?;
        Ok(())
    }
}
