use std::sync::Arc;

use chrono::Utc;

use crate::domain::credential::models::CredentialId;
use crate::domain::errors::AuthError;
use crate::domain::session::models::Session;
use crate::domain::session::models::SessionId;
use crate::domain::session::ports::SessionRepository;

/// Session registry: the stateful half of the hybrid authorization model.
///
/// Records every issued bearer token as a revocable session row. A request is
/// authenticated only when the token codec verifies the token AND `is_valid`
/// confirms the session here; the two checks are composed at the request
/// gate and never collapsed into one.
pub struct SessionRegistry<R>
where
    R: SessionRepository,
{
    repository: Arc<R>,
}

impl<R> SessionRegistry<R>
where
    R: SessionRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Record an active session for an issued token.
    pub async fn create(
        &self,
        credential_id: CredentialId,
        token: String,
        ip: String,
        user_agent: String,
        ttl_seconds: i64,
    ) -> Result<Session, AuthError> {
        let session = Session::new(credential_id, token, ip, user_agent, ttl_seconds);
        self.repository.create(session).await
    }

    /// Check whether the session behind a token still authorizes requests.
    ///
    /// True iff the session exists, is active, and has not expired. Never
    /// errors: an absent session or a storage failure both deny (fail closed).
    pub async fn is_valid(&self, token: &str) -> bool {
        match self.repository.find_by_token(token).await {
            Ok(Some(session)) => session.active && Utc::now() < session.expires_at,
            Ok(None) => false,
            Err(e) => {
                tracing::error!(error = %e, "Session lookup failed; denying");
                false
            }
        }
    }

    /// Look up the session recorded for a bearer token.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<Session>, AuthError> {
        self.repository.find_by_token(token).await
    }

    /// Revoke a single session on behalf of its owner.
    ///
    /// Idempotent: revoking an already-revoked session is a no-op success.
    ///
    /// # Errors
    /// * `SessionNotFound` - No session with this id
    /// * `Unauthorized` - The session belongs to a different credential
    pub async fn revoke(
        &self,
        session_id: &SessionId,
        requester: &CredentialId,
    ) -> Result<(), AuthError> {
        let mut session = self
            .repository
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AuthError::SessionNotFound(session_id.to_string()))?;

        if session.credential_id != *requester {
            return Err(AuthError::Unauthorized);
        }

        if session.active {
            session.active = false;
            self.repository.update(session).await?;
        }

        Ok(())
    }

    /// Revoke every session of a credential ("log out everywhere").
    pub async fn revoke_all(&self, credential_id: &CredentialId) -> Result<u64, AuthError> {
        self.repository.revoke_all(credential_id, None).await
    }

    /// Revoke every session of a credential except the one holding
    /// `keep_token`. Used for password-change-triggered revocation.
    pub async fn revoke_all_except(
        &self,
        credential_id: &CredentialId,
        keep_token: &str,
    ) -> Result<u64, AuthError> {
        self.repository
            .revoke_all(credential_id, Some(keep_token))
            .await
    }

    /// Delete long-expired session rows. External maintenance hook only.
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        self.repository.delete_expired(Utc::now()).await
    }
}
