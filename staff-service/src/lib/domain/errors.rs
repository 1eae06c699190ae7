use auth::JwtError;
use auth::PasswordError;
use thiserror::Error;

use crate::domain::credential::errors::CredentialIdError;
use crate::domain::credential::errors::EmailError;
use crate::domain::credential::errors::NationalIdError;
use crate::domain::credential::errors::StaffRoleError;

/// Top-level error taxonomy for the authentication core.
///
/// Every variant is a recoverable, caller-facing failure carrying a
/// human-readable message; none represent programmer error. Lockout and
/// rate-limit variants also carry a machine-usable retry hint in seconds.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is temporarily locked; retry in {retry_after_secs} seconds")]
    AccountLocked { retry_after_secs: i64 },

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Account has not been activated yet")]
    AccountNotActivated,

    #[error("Token is invalid or expired")]
    TokenInvalidOrExpired,

    #[error("Rate limit exceeded; retry in {retry_after_secs} seconds")]
    RateLimitExceeded { retry_after_secs: i64 },

    #[error("Password policy violated: {0}")]
    PasswordPolicyViolation(String),

    #[error("Password was used recently and cannot be reused")]
    PasswordReused,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Not authorized to perform this operation")]
    Unauthorized,

    #[error("Email or national id is already registered")]
    DuplicateIdentity,

    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid credential id: {0}")]
    InvalidCredentialId(#[from] CredentialIdError),

    #[error("Invalid national id: {0}")]
    InvalidNationalId(#[from] NationalIdError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid role: {0}")]
    InvalidRole(#[from] StaffRoleError),

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Email dispatch error: {0}")]
    Email(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::PolicyViolation(msg) => AuthError::PasswordPolicyViolation(msg),
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired | JwtError::InvalidToken(_) => AuthError::TokenInvalidOrExpired,
            JwtError::EncodingFailed(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Internal(err.to_string())
    }
}
