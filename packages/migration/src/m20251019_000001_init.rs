use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Sessions {
    Table,
    Id,
    WhiteActor,
    BlackActor,
    Status,
    LastErrorKind,
    LastErrorCause,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum LatestMoves {
    Table,
    SessionId,
    Board,
    MoveCount,
    SanList,
    LockToken,
    CallbackToken,
    SuggestedMove,
    GameWinner,
    Version,
    UpdatedAt,
}

#[derive(Iden)]
enum MoveRecords {
    Table,
    SessionId,
    Sequence,
    RecordedAt,
    Board,
    MoveCount,
    San,
    RunId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // sessions: actors are stored as JSON text, status as its stable string
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Id)
                            .string_len(128)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::WhiteActor).text().not_null())
                    .col(ColumnDef::new(Sessions::BlackActor).text().not_null())
                    .col(ColumnDef::new(Sessions::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Sessions::LastErrorKind).string().null())
                    .col(ColumnDef::new(Sessions::LastErrorCause).text().null())
                    .col(
                        ColumnDef::new(Sessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // latest_moves: one mutable head per session
        manager
            .create_table(
                Table::create()
                    .table(LatestMoves::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LatestMoves::SessionId)
                            .string_len(128)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LatestMoves::Board).text().not_null())
                    .col(
                        ColumnDef::new(LatestMoves::MoveCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LatestMoves::SanList)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(LatestMoves::LockToken).string().null())
                    .col(ColumnDef::new(LatestMoves::CallbackToken).string().null())
                    .col(ColumnDef::new(LatestMoves::SuggestedMove).string().null())
                    .col(ColumnDef::new(LatestMoves::GameWinner).string_len(8).null())
                    .col(
                        ColumnDef::new(LatestMoves::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(LatestMoves::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_latest_moves_session_id")
                            .from(LatestMoves::Table, LatestMoves::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // move_records: append-only; the composite key makes a duplicate sequence a unique violation
        manager
            .create_table(
                Table::create()
                    .table(MoveRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MoveRecords::SessionId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MoveRecords::Sequence).integer().not_null())
                    .col(
                        ColumnDef::new(MoveRecords::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MoveRecords::Board).text().not_null())
                    .col(ColumnDef::new(MoveRecords::MoveCount).integer().not_null())
                    .col(ColumnDef::new(MoveRecords::San).string().null())
                    .col(ColumnDef::new(MoveRecords::RunId).string().null())
                    .primary_key(
                        Index::create()
                            .name("pk_move_records")
                            .col(MoveRecords::SessionId)
                            .col(MoveRecords::Sequence),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_move_records_session_id")
                            .from(MoveRecords::Table, MoveRecords::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_latest_moves_callback_token")
                    .table(LatestMoves::Table)
                    .col(LatestMoves::CallbackToken)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MoveRecords::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LatestMoves::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
