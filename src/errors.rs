use sea_orm::error::DbErr;
use serde::Serialize;

use crate::models::calendar::CalendarError;

/// Process exit status for a run that hit a stage-fatal error.
pub const EXIT_STAGE_FAILURE: i32 = 1;
/// Process exit status when configuration could not be loaded or validated.
pub const EXIT_CONFIG_FAILURE: i32 = 2;

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<CalendarError> for ServiceError {
    fn from(err: CalendarError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// Process exit status for this error.
    /// This is the single source of truth for error-to-exit-code mapping.
    /// Row-level problems never become a `ServiceError`; they are counted in
    /// the stage report, so any error that reaches here aborts the run.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigError(_) => EXIT_CONFIG_FAILURE,
            _ => EXIT_STAGE_FAILURE,
        }
    }
}
