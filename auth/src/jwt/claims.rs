use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried by a bearer token.
///
/// The payload is intentionally minimal: who the token is for and when it
/// lives. Everything else about the caller is looked up server-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BearerClaims {
    /// Subject: the credential's national id
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl BearerClaims {
    /// Build claims for a subject with a time-to-live in seconds.
    pub fn for_subject(subject: impl Into<String>, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        let expiration = now + Duration::seconds(ttl_seconds);

        Self {
            sub: subject.into(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    /// Check if the claims are expired relative to a Unix timestamp.
    ///
    /// Strict comparison: a token whose `exp` equals the current second is
    /// already expired. No clock skew is tolerated.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp <= current_timestamp
    }
}
