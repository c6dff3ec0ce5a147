use thiserror::Error;

use crate::errors::ServiceError;

/// Failures of the sign-in and token workflows.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    /// Unknown e-mail, missing password hash and wrong password all land here.
    #[error("Invalid email or password")]
    Unauthorized,
    #[error("password hashing failed: {0}")]
    HashError(String),
    #[error("invalid token: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl From<AuthError> for ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(m) => ServiceError::BadRequest(m),
            AuthError::Unauthorized | AuthError::TokenError(_) => ServiceError::Unauthorized(e.to_string()),
            AuthError::HashError(_) | AuthError::Repository(_) => ServiceError::Db(e.to_string()),
        }
    }
}
