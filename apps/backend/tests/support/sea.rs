//! Fresh migrated SQLite databases for adapter tests.

use std::sync::Arc;

use gambit_backend::adapters::SeaStore;
use gambit_backend::config::db::DbKind;
use gambit_backend::infra::db::bootstrap_db;
use gambit_backend::repos::GameStore;
use gambit_backend::AppError;

/// One in-memory database per call; nothing is shared between tests.
pub async fn sqlite_store() -> Result<Arc<dyn GameStore>, AppError> {
    let conn = bootstrap_db(DbKind::SqliteMemory).await?;
    Ok(Arc::new(SeaStore::new(conn)))
}
