use async_trait::async_trait;

use crate::domain::credential::models::CredentialId;
use crate::domain::errors::AuthError;
use crate::domain::recovery::models::RecoveryToken;
use crate::domain::recovery::models::RecoveryTokenKind;

/// Persistence operations for single-use recovery tokens.
#[async_trait]
pub trait RecoveryTokenRepository: Send + Sync + 'static {
    async fn create(&self, token: RecoveryToken) -> Result<RecoveryToken, AuthError>;

    /// Look up a token by digest and kind. The kind is part of the key so a
    /// verification token can never redeem a password reset.
    async fn find_by_hash(
        &self,
        token_hash: &str,
        kind: RecoveryTokenKind,
    ) -> Result<Option<RecoveryToken>, AuthError>;

    async fn update(&self, token: RecoveryToken) -> Result<RecoveryToken, AuthError>;

    /// Mark every outstanding (unused, unexpired) token of this kind as used.
    /// Returns the number of tokens invalidated.
    async fn invalidate_outstanding(
        &self,
        credential_id: &CredentialId,
        kind: RecoveryTokenKind,
    ) -> Result<u64, AuthError>;
}
