use thiserror::Error;

/// Error for CredentialId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for NationalId validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NationalIdError {
    #[error("National id must not be empty")]
    Empty,

    #[error("National id must be {expected} digits, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("National id must contain only digits")]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for StaffRole parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StaffRoleError {
    #[error("Unknown staff role: {0}")]
    Unknown(String),
}
