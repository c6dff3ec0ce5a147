use sea_orm::DbErr;
use thiserror::Error;

/// Business failures surfaced by every service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    NameDuplicated(String),
    #[error("{0}")]
    InvalidName(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("export failed: {0}")]
    Export(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn bad_request(msg: impl Into<String>) -> Self { Self::BadRequest(msg.into()) }

    /// Short machine-friendly name used in error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "Not Found",
            ServiceError::AlreadyExists(_)
            | ServiceError::NameDuplicated(_)
            | ServiceError::InvalidName(_)
            | ServiceError::BadRequest(_)
            | ServiceError::Model(_) => "Bad Request",
            ServiceError::Unauthorized(_) => "Unauthorized",
            ServiceError::Forbidden(_) => "Forbidden",
            ServiceError::Db(_) | ServiceError::Export(_) => "Internal Server Error",
        }
    }
}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self { Self::Db(e.to_string()) }
}
