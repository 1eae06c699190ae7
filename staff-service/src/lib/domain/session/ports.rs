use async_trait::async_trait;

use crate::domain::credential::models::CredentialId;
use crate::domain::errors::AuthError;
use crate::domain::session::models::Session;
use crate::domain::session::models::SessionId;

/// Persistence operations for sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Persist a new session row.
    async fn create(&self, session: Session) -> Result<Session, AuthError>;

    /// Retrieve a session by identifier.
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, AuthError>;

    /// Retrieve a session by its opaque bearer token string.
    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, AuthError>;

    /// Persist updated session state (revocation flag flips).
    async fn update(&self, session: Session) -> Result<Session, AuthError>;

    /// Flip `active = false` for all of a credential's sessions, optionally
    /// keeping the session holding `keep_token` untouched.
    ///
    /// # Returns
    /// Number of sessions revoked
    async fn revoke_all<'a>(
        &self,
        credential_id: &'a CredentialId,
        keep_token: Option<&'a str>,
    ) -> Result<u64, AuthError>;

    /// Delete sessions that expired before `cutoff`. Optional maintenance
    /// hook; correctness never depends on it running.
    async fn delete_expired(&self, cutoff: chrono::DateTime<chrono::Utc>)
        -> Result<u64, AuthError>;
}
