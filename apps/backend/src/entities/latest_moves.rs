use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "latest_moves")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "session_id")]
    pub session_id: String,
    #[sea_orm(column_type = "Text")]
    pub board: String,
    #[sea_orm(column_name = "move_count")]
    pub move_count: i32,
    #[sea_orm(column_name = "san_list", column_type = "Text")]
    pub san_list: String,
    #[sea_orm(column_name = "lock_token")]
    pub lock_token: Option<String>,
    #[sea_orm(column_name = "callback_token")]
    pub callback_token: Option<String>,
    #[sea_orm(column_name = "suggested_move")]
    pub suggested_move: Option<String>,
    #[sea_orm(column_name = "game_winner")]
    pub game_winner: Option<String>,
    pub version: i32,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sessions::Entity",
        from = "Column::SessionId",
        to = "super::sessions::Column::Id"
    )]
    Session,
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
