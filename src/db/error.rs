use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(&'static str),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("message references an unknown chatter or room")]
    ForeignKey,

    #[error("{0} not found")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Io(#[from] sqlx::Error),
}

impl StoreError {
    /// Sorts constraint violations out of a raw sqlx error; everything else
    /// stays an I/O failure.
    pub(crate) fn classify(err: sqlx::Error, conflict: impl FnOnce() -> String) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(conflict());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKey;
            }
        }
        StoreError::Io(err)
    }
}
