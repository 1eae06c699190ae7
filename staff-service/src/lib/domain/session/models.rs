use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::credential::models::CredentialId;

/// Session unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Server-recorded, revocable handle correlated with an issued bearer token.
///
/// The `active` flag is the only authoritative revocation signal; the token's
/// cryptographic validity never implies authorization. Sessions are mutated
/// only by revocation and are never physically deleted except by the optional
/// cleanup sweep.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub credential_id: CredentialId,
    pub token: String,
    pub ip: String,
    pub user_agent: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a new active session for an issued bearer token.
    pub fn new(
        credential_id: CredentialId,
        token: String,
        ip: String,
        user_agent: String,
        ttl_seconds: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            credential_id,
            token,
            ip,
            user_agent,
            active: true,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
        }
    }
}
