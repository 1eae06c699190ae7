use async_trait::async_trait;

use crate::domain::credential::models::CredentialId;
use crate::domain::errors::AuthError;
use crate::domain::two_factor::models::TwoFactorConfig;
use crate::domain::two_factor::models::TwoFactorRateLimit;

/// Persistence operations for per-credential two-factor configuration.
#[async_trait]
pub trait TwoFactorConfigRepository: Send + Sync + 'static {
    async fn find(&self, credential_id: &CredentialId)
        -> Result<Option<TwoFactorConfig>, AuthError>;

    /// Insert or replace the credential's configuration row.
    async fn upsert(&self, config: TwoFactorConfig) -> Result<TwoFactorConfig, AuthError>;
}

/// Persistence operations for per-credential send-quota state.
///
/// Counters live in the repository, never in process globals, so the design
/// stays shareable across worker threads and processes.
#[async_trait]
pub trait TwoFactorRateLimitRepository: Send + Sync + 'static {
    async fn find(
        &self,
        credential_id: &CredentialId,
    ) -> Result<Option<TwoFactorRateLimit>, AuthError>;

    /// Insert or replace the credential's quota row.
    async fn upsert(&self, state: TwoFactorRateLimit) -> Result<TwoFactorRateLimit, AuthError>;
}
