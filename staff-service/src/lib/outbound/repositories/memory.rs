//! In-memory adapters backed by `tokio::sync::RwLock`.
//!
//! Used by the cross-component flow tests to drive every port without a
//! database. Each adapter mirrors the semantics its Postgres counterpart gets
//! from the schema (unique keys, upserts, ordering).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::audit::models::LoginAttempt;
use crate::domain::audit::ports::LoginAttemptRepository;
use crate::domain::credential::models::Credential;
use crate::domain::credential::models::CredentialId;
use crate::domain::credential::models::EmailAddress;
use crate::domain::credential::models::NationalId;
use crate::domain::credential::ports::CredentialRepository;
use crate::domain::errors::AuthError;
use crate::domain::password_history::models::PasswordHistoryEntry;
use crate::domain::password_history::ports::PasswordHistoryRepository;
use crate::domain::recovery::models::RecoveryToken;
use crate::domain::recovery::models::RecoveryTokenKind;
use crate::domain::recovery::ports::RecoveryTokenRepository;
use crate::domain::session::models::Session;
use crate::domain::session::models::SessionId;
use crate::domain::session::ports::SessionRepository;
use crate::domain::two_factor::models::TwoFactorConfig;
use crate::domain::two_factor::models::TwoFactorRateLimit;
use crate::domain::two_factor::ports::TwoFactorConfigRepository;
use crate::domain::two_factor::ports::TwoFactorRateLimitRepository;

#[derive(Default)]
pub struct InMemoryCredentialRepository {
    rows: RwLock<HashMap<Uuid, Credential>>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn create(&self, credential: Credential) -> Result<Credential, AuthError> {
        let mut rows = self.rows.write().await;
        let duplicate = rows.values().any(|c| {
            c.national_id == credential.national_id || c.email == credential.email
        });
        if duplicate {
            return Err(AuthError::DuplicateIdentity);
        }
        rows.insert(credential.id.0, credential.clone());
        Ok(credential)
    }

    async fn find_by_id(&self, id: &CredentialId) -> Result<Option<Credential>, AuthError> {
        Ok(self.rows.read().await.get(&id.0).cloned())
    }

    async fn find_by_national_id(
        &self,
        national_id: &NationalId,
    ) -> Result<Option<Credential>, AuthError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|c| c.national_id == *national_id)
            .cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Credential>, AuthError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|c| c.email == *email)
            .cloned())
    }

    async fn update(&self, credential: Credential) -> Result<Credential, AuthError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&credential.id.0) {
            return Err(AuthError::Database(format!(
                "credential {} no longer exists",
                credential.id
            )));
        }
        rows.insert(credential.id.0, credential.clone());
        Ok(credential)
    }
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    rows: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: Session) -> Result<Session, AuthError> {
        self.rows
            .write()
            .await
            .insert(session.id.0, session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, AuthError> {
        Ok(self.rows.read().await.get(&id.0).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, AuthError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|s| s.token == token)
            .cloned())
    }

    async fn update(&self, session: Session) -> Result<Session, AuthError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&session.id.0) {
            return Err(AuthError::Database(format!(
                "session {} no longer exists",
                session.id
            )));
        }
        rows.insert(session.id.0, session.clone());
        Ok(session)
    }

    async fn revoke_all<'a>(
        &self,
        credential_id: &'a CredentialId,
        keep_token: Option<&'a str>,
    ) -> Result<u64, AuthError> {
        let mut rows = self.rows.write().await;
        let mut revoked = 0;
        for session in rows.values_mut() {
            if session.credential_id == *credential_id
                && session.active
                && keep_token != Some(session.token.as_str())
            {
                session.active = false;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, AuthError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, session| session.expires_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryLoginAttemptRepository {
    rows: RwLock<Vec<LoginAttempt>>,
}

impl InMemoryLoginAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backdate every stored attempt, for tests that need the trailing
    /// window to move on without sleeping.
    pub async fn shift_attempts_back(&self, duration: chrono::Duration) {
        for attempt in self.rows.write().await.iter_mut() {
            attempt.attempted_at -= duration;
        }
    }
}

#[async_trait]
impl LoginAttemptRepository for InMemoryLoginAttemptRepository {
    async fn append(&self, attempt: LoginAttempt) -> Result<LoginAttempt, AuthError> {
        self.rows.write().await.push(attempt.clone());
        Ok(attempt)
    }

    async fn count_failures_since(
        &self,
        national_id: &NationalId,
        since: DateTime<Utc>,
    ) -> Result<u64, AuthError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|a| !a.success && a.national_id == *national_id && a.attempted_at >= since)
            .count() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryPasswordHistoryRepository {
    rows: RwLock<Vec<PasswordHistoryEntry>>,
}

impl InMemoryPasswordHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PasswordHistoryRepository for InMemoryPasswordHistoryRepository {
    async fn append(&self, entry: PasswordHistoryEntry) -> Result<PasswordHistoryEntry, AuthError> {
        self.rows.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn find_recent(
        &self,
        credential_id: &CredentialId,
        limit: u32,
    ) -> Result<Vec<PasswordHistoryEntry>, AuthError> {
        let rows = self.rows.read().await;
        let mut recent: Vec<_> = rows
            .iter()
            .filter(|e| e.credential_id == *credential_id)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit as usize);
        Ok(recent)
    }
}

#[derive(Default)]
pub struct InMemoryRecoveryTokenRepository {
    rows: RwLock<HashMap<Uuid, RecoveryToken>>,
}

impl InMemoryRecoveryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecoveryTokenRepository for InMemoryRecoveryTokenRepository {
    async fn create(&self, token: RecoveryToken) -> Result<RecoveryToken, AuthError> {
        self.rows.write().await.insert(token.id, token.clone());
        Ok(token)
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
        kind: RecoveryTokenKind,
    ) -> Result<Option<RecoveryToken>, AuthError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|t| t.token_hash == token_hash && t.kind == kind)
            .cloned())
    }

    async fn update(&self, token: RecoveryToken) -> Result<RecoveryToken, AuthError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&token.id) {
            return Err(AuthError::Database(format!(
                "recovery token {} no longer exists",
                token.id
            )));
        }
        rows.insert(token.id, token.clone());
        Ok(token)
    }

    async fn invalidate_outstanding(
        &self,
        credential_id: &CredentialId,
        kind: RecoveryTokenKind,
    ) -> Result<u64, AuthError> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let mut invalidated = 0;
        for token in rows.values_mut() {
            if token.credential_id == *credential_id
                && token.kind == kind
                && !token.used
                && token.expires_at > now
            {
                token.used = true;
                token.used_at = Some(now);
                invalidated += 1;
            }
        }
        Ok(invalidated)
    }
}

#[derive(Default)]
pub struct InMemoryTwoFactorConfigRepository {
    rows: RwLock<HashMap<Uuid, TwoFactorConfig>>,
}

impl InMemoryTwoFactorConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TwoFactorConfigRepository for InMemoryTwoFactorConfigRepository {
    async fn find(
        &self,
        credential_id: &CredentialId,
    ) -> Result<Option<TwoFactorConfig>, AuthError> {
        Ok(self.rows.read().await.get(&credential_id.0).cloned())
    }

    async fn upsert(&self, config: TwoFactorConfig) -> Result<TwoFactorConfig, AuthError> {
        self.rows
            .write()
            .await
            .insert(config.credential_id.0, config.clone());
        Ok(config)
    }
}

#[derive(Default)]
pub struct InMemoryTwoFactorRateLimitRepository {
    rows: RwLock<HashMap<Uuid, TwoFactorRateLimit>>,
}

impl InMemoryTwoFactorRateLimitRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewind `last_send` (and any block) for tests exercising window resets.
    pub async fn shift_back(&self, credential_id: &CredentialId, duration: chrono::Duration) {
        if let Some(state) = self.rows.write().await.get_mut(&credential_id.0) {
            if let Some(last) = state.last_send {
                state.last_send = Some(last - duration);
            }
            if let Some(until) = state.blocked_until {
                state.blocked_until = Some(until - duration);
            }
        }
    }
}

#[async_trait]
impl TwoFactorRateLimitRepository for InMemoryTwoFactorRateLimitRepository {
    async fn find(
        &self,
        credential_id: &CredentialId,
    ) -> Result<Option<TwoFactorRateLimit>, AuthError> {
        Ok(self.rows.read().await.get(&credential_id.0).cloned())
    }

    async fn upsert(&self, state: TwoFactorRateLimit) -> Result<TwoFactorRateLimit, AuthError> {
        self.rows
            .write()
            .await
            .insert(state.credential_id.0, state.clone());
        Ok(state)
    }
}
