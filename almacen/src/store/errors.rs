use thiserror::Error;

/// Unified error type for record store operations that application code can handle
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record not found by the given key
    #[error("Record not found")]
    NotFound,

    /// Key already exists within the collection
    #[error("Duplicate key '{key}' in collection '{collection}'")]
    DuplicateKey { collection: String, key: String },

    /// Credential check failed. Deliberately does not distinguish an unknown
    /// username from a wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Metadata filter referenced a field name that is not a plain identifier
    #[error("Invalid filter field '{field}'")]
    InvalidFilter { field: String },

    /// Stored metadata does not match the collection schema
    #[error("Corrupted record '{key}' in collection '{collection}': {message}")]
    Corrupted {
        collection: String,
        key: String,
        message: String,
    },

    /// Catch-all for non-recoverable backing store errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Whether a sqlx error is a unique constraint violation. Callers map these
    /// to [`StoreError::DuplicateKey`] with the collection and key in hand.
    pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            // All other database errors are non-recoverable
            _ => StoreError::Other(anyhow::Error::from(err)),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Other(anyhow::Error::from(err))
    }
}

/// Type alias for record store operation results
pub type Result<T> = std::result::Result<T, StoreError>;
