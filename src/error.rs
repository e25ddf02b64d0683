use sea_orm::{DbErr, SqlErr};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Cannot convert {input:?} to a number")]
    ValueConversion { input: String },

    #[error("Timestamp {input:?} matched none of the accepted formats")]
    TimestampResolution { input: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Storage constraint violation: {0}")]
    StorageConstraintViolation(String),

    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg))
            | Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                Self::StorageConstraintViolation(msg)
            }
            _ => Self::Database(err),
        }
    }
}

impl AppError {
    /// Whether the failure happened before any storage call was made.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ContractViolation(_)
                | Self::ValueConversion { .. }
                | Self::TimestampResolution { .. }
                | Self::MissingField(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
