use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// JSON-encoded `ActorKind`
    #[sea_orm(column_name = "white_actor", column_type = "Text")]
    pub white_actor: String,
    #[sea_orm(column_name = "black_actor", column_type = "Text")]
    pub black_actor: String,
    pub status: String,
    #[sea_orm(column_name = "last_error_kind")]
    pub last_error_kind: Option<String>,
    #[sea_orm(column_name = "last_error_cause", column_type = "Text", nullable)]
    pub last_error_cause: Option<String>,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::latest_moves::Entity")]
    LatestMove,
    #[sea_orm(has_many = "super::move_records::Entity")]
    MoveRecords,
}

impl Related<super::latest_moves::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LatestMove.def()
    }
}

impl Related<super::move_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MoveRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
