use std::sync::Arc;

use chrono::Utc;
use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;

use crate::domain::credential::models::CredentialId;
use crate::domain::errors::AuthError;
use crate::domain::recovery::models::RecoveryToken;
use crate::domain::recovery::models::RecoveryTokenKind;
use crate::domain::recovery::ports::RecoveryTokenRepository;

/// Token lifetime.
const TOKEN_TTL_HOURS: i64 = 24;
/// Raw token entropy in bytes before hex encoding.
const TOKEN_BYTES: usize = 32;

/// Issuance and redemption of single-use recovery tokens.
///
/// `issue` hands back the raw token exactly once; everything stored and
/// matched afterwards is its SHA-256 digest. Issuing a new token of a kind
/// invalidates any outstanding one of the same kind, so at most one token per
/// (credential, kind) is live at a time.
pub struct RecoveryTokens<R>
where
    R: RecoveryTokenRepository,
{
    repository: Arc<R>,
}

impl<R> RecoveryTokens<R>
where
    R: RecoveryTokenRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Mint a token of the given kind and return the raw value for delivery.
    pub async fn issue(
        &self,
        credential_id: CredentialId,
        kind: RecoveryTokenKind,
    ) -> Result<String, AuthError> {
        let invalidated = self
            .repository
            .invalidate_outstanding(&credential_id, kind)
            .await?;
        if invalidated > 0 {
            tracing::debug!(
                credential_id = %credential_id,
                kind = %kind,
                invalidated,
                "Superseded outstanding recovery tokens"
            );
        }

        let raw = generate_raw_token();
        let token = RecoveryToken::new(credential_id, kind, hash_token(&raw), TOKEN_TTL_HOURS);
        self.repository.create(token).await?;

        Ok(raw)
    }

    /// Redeem a raw token: look it up by digest and kind, burn it, and return
    /// the row so the caller knows which credential it belongs to.
    ///
    /// # Errors
    /// * `TokenInvalidOrExpired` - Unknown, already used, or expired. The three
    ///   cases are deliberately indistinguishable to the caller.
    pub async fn redeem(
        &self,
        raw: &str,
        kind: RecoveryTokenKind,
    ) -> Result<RecoveryToken, AuthError> {
        let mut token = self
            .repository
            .find_by_hash(&hash_token(raw), kind)
            .await?
            .ok_or(AuthError::TokenInvalidOrExpired)?;

        if token.used || token.is_expired(Utc::now()) {
            return Err(AuthError::TokenInvalidOrExpired);
        }

        token.used = true;
        token.used_at = Some(Utc::now());
        self.repository.update(token.clone()).await?;

        Ok(token)
    }
}

fn generate_raw_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Duration;
    use mockall::mock;
    use mockall::predicate::eq;

    use super::*;

    mock! {
        pub TestTokenRepository {}

        #[async_trait]
        impl RecoveryTokenRepository for TestTokenRepository {
            async fn create(&self, token: RecoveryToken) -> Result<RecoveryToken, AuthError>;
            async fn find_by_hash(
                &self,
                token_hash: &str,
                kind: RecoveryTokenKind,
            ) -> Result<Option<RecoveryToken>, AuthError>;
            async fn update(&self, token: RecoveryToken) -> Result<RecoveryToken, AuthError>;
            async fn invalidate_outstanding(
                &self,
                credential_id: &CredentialId,
                kind: RecoveryTokenKind,
            ) -> Result<u64, AuthError>;
        }
    }

    #[test]
    fn test_raw_token_is_64_hex_chars() {
        let raw = generate_raw_token();
        assert_eq!(raw.len(), 64);
        assert!(raw.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_is_deterministic_and_not_identity() {
        let raw = generate_raw_token();
        assert_eq!(hash_token(&raw), hash_token(&raw));
        assert_ne!(hash_token(&raw), raw);
    }

    #[tokio::test]
    async fn test_issue_supersedes_and_stores_digest_only() {
        let credential_id = CredentialId::new();

        let mut repository = MockTestTokenRepository::new();
        repository
            .expect_invalidate_outstanding()
            .with(eq(credential_id), eq(RecoveryTokenKind::PasswordRecovery))
            .times(1)
            .returning(|_, _| Ok(1));
        repository
            .expect_create()
            .withf(|token| !token.used && token.token_hash.len() == 64)
            .times(1)
            .returning(Ok);

        let service = RecoveryTokens::new(Arc::new(repository));
        let raw = service
            .issue(credential_id, RecoveryTokenKind::PasswordRecovery)
            .await
            .expect("issue");
        assert_eq!(raw.len(), 64);
    }

    #[tokio::test]
    async fn test_redeem_burns_the_token() {
        let credential_id = CredentialId::new();
        let raw = generate_raw_token();
        let digest = hash_token(&raw);

        let mut repository = MockTestTokenRepository::new();
        let stored = RecoveryToken::new(
            credential_id,
            RecoveryTokenKind::EmailVerification,
            digest.clone(),
            24,
        );
        let expected_digest = digest.clone();
        repository
            .expect_find_by_hash()
            .withf(move |hash, kind| {
                hash == expected_digest && *kind == RecoveryTokenKind::EmailVerification
            })
            .returning(move |_, _| Ok(Some(stored.clone())));
        repository
            .expect_update()
            .withf(|token| token.used && token.used_at.is_some())
            .times(1)
            .returning(Ok);

        let service = RecoveryTokens::new(Arc::new(repository));
        let redeemed = service
            .redeem(&raw, RecoveryTokenKind::EmailVerification)
            .await
            .expect("redeem");
        assert_eq!(redeemed.credential_id, credential_id);
    }

    #[tokio::test]
    async fn test_redeem_unknown_token() {
        let mut repository = MockTestTokenRepository::new();
        repository.expect_find_by_hash().returning(|_, _| Ok(None));

        let service = RecoveryTokens::new(Arc::new(repository));
        let result = service
            .redeem("deadbeef", RecoveryTokenKind::PasswordRecovery)
            .await;
        assert!(matches!(result, Err(AuthError::TokenInvalidOrExpired)));
    }

    #[tokio::test]
    async fn test_redeem_used_token() {
        let raw = generate_raw_token();
        let mut stored = RecoveryToken::new(
            CredentialId::new(),
            RecoveryTokenKind::PasswordRecovery,
            hash_token(&raw),
            24,
        );
        stored.used = true;

        let mut repository = MockTestTokenRepository::new();
        repository
            .expect_find_by_hash()
            .returning(move |_, _| Ok(Some(stored.clone())));
        repository.expect_update().times(0);

        let service = RecoveryTokens::new(Arc::new(repository));
        let result = service
            .redeem(&raw, RecoveryTokenKind::PasswordRecovery)
            .await;
        assert!(matches!(result, Err(AuthError::TokenInvalidOrExpired)));
    }

    #[tokio::test]
    async fn test_redeem_expired_token() {
        let raw = generate_raw_token();
        let mut stored = RecoveryToken::new(
            CredentialId::new(),
            RecoveryTokenKind::PasswordRecovery,
            hash_token(&raw),
            24,
        );
        stored.expires_at = Utc::now() - Duration::seconds(1);

        let mut repository = MockTestTokenRepository::new();
        repository
            .expect_find_by_hash()
            .returning(move |_, _| Ok(Some(stored.clone())));
        repository.expect_update().times(0);

        let service = RecoveryTokens::new(Arc::new(repository));
        let result = service
            .redeem(&raw, RecoveryTokenKind::PasswordRecovery)
            .await;
        assert!(matches!(result, Err(AuthError::TokenInvalidOrExpired)));
    }
}
