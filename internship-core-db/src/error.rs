use internship_core_api::CoreError;
use thiserror::Error;

/// Failures reported by the persistence gateway.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Concurrent update detected on {0}")]
    Conflict(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to decode row: {0}")]
    Decode(String),

    #[error("Transaction has been consumed")]
    TransactionConsumed,

    #[error("Store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(entity: &'static str, id: impl std::fmt::Display) -> Self {
        StoreError::Conflict(format!("{entity} {id}"))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound {
                entity: "row",
                id: "-".to_string(),
            },
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    sqlx::error::ErrorKind::UniqueViolation => StoreError::DuplicateKey(message),
                    sqlx::error::ErrorKind::ForeignKeyViolation => {
                        StoreError::ForeignKeyViolation(message)
                    }
                    _ => StoreError::Internal(message),
                }
            }
            sqlx::Error::PoolTimedOut => StoreError::Unavailable("pool timed out".to_string()),
            sqlx::Error::PoolClosed => StoreError::Unavailable("pool closed".to_string()),
            sqlx::Error::Io(e) => StoreError::Unavailable(e.to_string()),
            sqlx::Error::Tls(e) => StoreError::Unavailable(e.to_string()),
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::Decode(format!("column {index}: {source}"))
            }
            sqlx::Error::ColumnNotFound(column) => {
                StoreError::Decode(format!("column {column} not found"))
            }
            sqlx::Error::Decode(e) => StoreError::Decode(e.to_string()),
            other => StoreError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::Conflict(what) => CoreError::Conflict(what),
            StoreError::DuplicateKey(what) => CoreError::DuplicateKey(what),
            StoreError::ForeignKeyViolation(what) => CoreError::ForeignKeyViolation(what),
            StoreError::Unavailable(what) => CoreError::StoreUnavailable(what),
            other @ (StoreError::Decode(_)
            | StoreError::TransactionConsumed
            | StoreError::Internal(_)) => CoreError::Internal(other.to_string()),
        }
    }
}
