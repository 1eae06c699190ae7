use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::credential::models::CredentialId;

/// What a recovery token is good for. A token redeems only against its own
/// kind; the two flows can never cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryTokenKind {
    EmailVerification,
    PasswordRecovery,
}

impl RecoveryTokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryTokenKind::EmailVerification => "email_verification",
            RecoveryTokenKind::PasswordRecovery => "password_recovery",
        }
    }
}

impl FromStr for RecoveryTokenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verification" => Ok(RecoveryTokenKind::EmailVerification),
            "password_recovery" => Ok(RecoveryTokenKind::PasswordRecovery),
            other => Err(format!("unknown recovery token kind: {other}")),
        }
    }
}

impl fmt::Display for RecoveryTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-use, typed, expiring token row.
///
/// Only the SHA-256 digest of the raw token is ever stored; the raw value
/// exists solely in the email that carried it.
#[derive(Debug, Clone)]
pub struct RecoveryToken {
    pub id: Uuid,
    pub credential_id: CredentialId,
    pub kind: RecoveryTokenKind,
    pub token_hash: String,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RecoveryToken {
    pub fn new(
        credential_id: CredentialId,
        kind: RecoveryTokenKind,
        token_hash: String,
        ttl_hours: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            credential_id,
            kind,
            token_hash,
            used: false,
            used_at: None,
            expires_at: now + Duration::hours(ttl_hours),
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            RecoveryTokenKind::EmailVerification,
            RecoveryTokenKind::PasswordRecovery,
        ] {
            assert_eq!(kind.as_str().parse::<RecoveryTokenKind>(), Ok(kind));
        }
        assert!("session".parse::<RecoveryTokenKind>().is_err());
    }

    #[test]
    fn test_new_token_is_unused_and_unexpired() {
        let token = RecoveryToken::new(
            CredentialId::new(),
            RecoveryTokenKind::PasswordRecovery,
            "abc123".to_string(),
            24,
        );
        assert!(!token.used);
        assert!(!token.is_expired(Utc::now()));
        assert!(token.is_expired(Utc::now() + Duration::hours(25)));
    }
}
