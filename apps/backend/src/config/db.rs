use std::env;

use crate::error::AppError;

/// Storage backend selected through `GAMBIT_DB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Postgres,
    SqliteFile,
    SqliteMemory,
}

impl DbKind {
    /// Read `GAMBIT_DB` (defaults to Postgres).
    pub fn from_env() -> Result<Self, AppError> {
        match env::var("GAMBIT_DB") {
            Err(_) => Ok(DbKind::Postgres),
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "postgres" | "postgresql" => Ok(DbKind::Postgres),
                "sqlite-file" | "sqlite" => Ok(DbKind::SqliteFile),
                "sqlite-memory" | "memory" => Ok(DbKind::SqliteMemory),
                other => Err(AppError::config(format!(
                    "GAMBIT_DB must be one of postgres, sqlite-file, sqlite-memory; got '{other}'"
                ))),
            },
        }
    }
}

/// Builds a database URL from environment variables for the given backend
pub fn db_url(kind: DbKind) -> Result<String, AppError> {
    match kind {
        DbKind::Postgres => {
            let host = env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_string());
            let port = env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
            let db_name = must_var("GAMBIT_DB_NAME")?;
            let username = must_var("GAMBIT_DB_USER")?;
            let password = must_var("GAMBIT_DB_PASSWORD")?;
            Ok(format!(
                "postgresql://{username}:{password}@{host}:{port}/{db_name}"
            ))
        }
        DbKind::SqliteFile => {
            let path = must_var("GAMBIT_SQLITE_PATH")?;
            Ok(format!("sqlite://{path}?mode=rwc"))
        }
        DbKind::SqliteMemory => Ok("sqlite::memory:".to_string()),
    }
}

/// Get required environment variable or return error
pub(crate) fn must_var(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::config(format!("Required environment variable '{name}' is not set")))
}
