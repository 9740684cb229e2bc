pub mod latest_moves;
pub mod move_records;
pub mod sessions;

pub use latest_moves::Entity as LatestMoves;
pub use latest_moves::Model as LatestMove;
pub use move_records::Entity as MoveRecords;
pub use move_records::Model as MoveRecordRow;
pub use sessions::Entity as Sessions;
pub use sessions::Model as SessionRow;
