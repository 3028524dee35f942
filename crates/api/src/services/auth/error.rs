//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

use super::TokenError;

/// Errors that can occur during account and authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email already belongs to another account.
    #[error("email already in use")]
    EmailInUse,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] strive_core::EmailError),

    /// Email longer than the column allows.
    #[error("email too long")]
    EmailTooLong,

    /// Password does not meet the minimum requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Another field failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Reset token is unknown.
    #[error("invalid reset token")]
    InvalidResetToken,

    /// Reset token was past its expiry.
    #[error("reset token expired")]
    ResetTokenExpired,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Bearer token could not be issued.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Argon2 failed to hash a password.
    #[error("password hashing failed")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => Self::EmailInUse,
            RepositoryError::NotFound => Self::UserNotFound,
            other => Self::Repository(other),
        }
    }
}
