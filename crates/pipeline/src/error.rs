use vitrine_core::error::CoreError;

/// Errors raised by ingestion and the alert store.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Name of the violated foreign-key constraint, if `err` is one (SQLSTATE 23503).
pub(crate) fn foreign_key_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => db.constraint(),
        _ => None,
    }
}

/// Name of the violated unique constraint, if `err` is one (SQLSTATE 23505).
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => db.constraint(),
        _ => None,
    }
}
