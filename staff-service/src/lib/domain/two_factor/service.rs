use std::sync::Arc;

use chrono::Duration;
use chrono::Utc;
use rand::Rng;

use crate::domain::auth::ports::EmailSender;
use crate::domain::credential::models::Credential;
use crate::domain::credential::models::CredentialId;
use crate::domain::errors::AuthError;
use crate::domain::two_factor::models::TwoFactorConfig;
use crate::domain::two_factor::models::TwoFactorRateLimit;
use crate::domain::two_factor::ports::TwoFactorConfigRepository;
use crate::domain::two_factor::ports::TwoFactorRateLimitRepository;
use crate::domain::two_factor::rate_limit;
use crate::domain::two_factor::rate_limit::SendDecision;

/// One-time code lifetime.
const CODE_TTL_MINUTES: i64 = 5;
/// Wrong submissions tolerated before validation is blocked.
const MAX_CODE_ATTEMPTS: i32 = 5;
/// Validation block applied after too many wrong submissions.
const CODE_ATTEMPT_BLOCK_MINUTES: i64 = 15;

/// Email-based two-factor verification.
///
/// Codes are six uniformly random digits, zero-padded, delivered by email and
/// valid for five minutes. Sending is governed by the layered quota in
/// `rate_limit`; quota counters are only charged after the email was actually
/// dispatched, so a mailer outage never burns the member's budget.
pub struct TwoFactorService<C, L, E>
where
    C: TwoFactorConfigRepository,
    L: TwoFactorRateLimitRepository,
    E: EmailSender,
{
    configs: Arc<C>,
    quotas: Arc<L>,
    mailer: Arc<E>,
}

impl<C, L, E> TwoFactorService<C, L, E>
where
    C: TwoFactorConfigRepository,
    L: TwoFactorRateLimitRepository,
    E: EmailSender,
{
    pub fn new(configs: Arc<C>, quotas: Arc<L>, mailer: Arc<E>) -> Self {
        Self {
            configs,
            quotas,
            mailer,
        }
    }

    /// Whether two-factor login is enabled for a credential.
    pub async fn is_enabled(&self, credential_id: &CredentialId) -> Result<bool, AuthError> {
        Ok(self
            .configs
            .find(credential_id)
            .await?
            .map(|config| config.enabled)
            .unwrap_or(false))
    }

    /// Generate and email a fresh one-time code.
    ///
    /// A newly issued code replaces any outstanding one.
    ///
    /// # Errors
    /// * `RateLimitExceeded` - Send quota exhausted or minimum spacing not met
    /// * `Email` - Dispatch failed; no quota was charged
    pub async fn request_code(&self, credential: &Credential) -> Result<(), AuthError> {
        let now = Utc::now();
        let mut quota = self
            .quotas
            .find(&credential.id)
            .await?
            .unwrap_or_else(|| TwoFactorRateLimit::new(credential.id));

        match rate_limit::evaluate(&mut quota, now) {
            SendDecision::Deny { retry_after_secs } => {
                // Persist so an escalation block outlives this request
                self.quotas.upsert(quota).await?;
                tracing::warn!(
                    credential_id = %credential.id,
                    retry_after_secs,
                    "Two-factor code send denied by quota"
                );
                Err(AuthError::RateLimitExceeded { retry_after_secs })
            }
            SendDecision::Allow => {
                let code = generate_code();

                let mut config = self
                    .configs
                    .find(&credential.id)
                    .await?
                    .unwrap_or_else(|| TwoFactorConfig::new(credential.id));
                config.code = Some(code.clone());
                config.code_expires_at = Some(now + Duration::minutes(CODE_TTL_MINUTES));
                config.failed_attempts = 0;
                config.blocked_until = None;

                self.mailer
                    .send_two_factor_code(&credential.email, &code)
                    .await?;

                // Charge the quota only once the email went out
                rate_limit::note_send(&mut quota, now);
                self.configs.upsert(config).await?;
                self.quotas.upsert(quota).await?;

                tracing::info!(credential_id = %credential.id, "Two-factor code dispatched");
                Ok(())
            }
        }
    }

    /// Check a submitted code against the outstanding one.
    ///
    /// Returns `Ok(false)` on mismatch; five consecutive mismatches block
    /// validation for fifteen minutes. A correct submission consumes the code.
    ///
    /// # Errors
    /// * `TokenInvalidOrExpired` - No outstanding code, or it has expired
    /// * `RateLimitExceeded` - Validation blocked after repeated mismatches
    pub async fn validate_code(
        &self,
        credential_id: &CredentialId,
        submitted: &str,
    ) -> Result<bool, AuthError> {
        let now = Utc::now();
        let mut config = self
            .configs
            .find(credential_id)
            .await?
            .ok_or(AuthError::TokenInvalidOrExpired)?;

        if let Some(until) = config.blocked_until {
            if now < until {
                return Err(AuthError::RateLimitExceeded {
                    retry_after_secs: (until - now).num_seconds().max(1),
                });
            }
            config.blocked_until = None;
        }

        let code = config
            .code
            .clone()
            .ok_or(AuthError::TokenInvalidOrExpired)?;

        let expired = config
            .code_expires_at
            .map(|at| now >= at)
            .unwrap_or(true);
        if expired {
            config.clear_code();
            self.configs.upsert(config).await?;
            return Err(AuthError::TokenInvalidOrExpired);
        }

        if submitted != code {
            config.failed_attempts += 1;
            if config.failed_attempts >= MAX_CODE_ATTEMPTS {
                config.blocked_until =
                    Some(now + Duration::minutes(CODE_ATTEMPT_BLOCK_MINUTES));
                config.failed_attempts = 0;
                tracing::warn!(
                    credential_id = %credential_id,
                    "Two-factor validation blocked after repeated mismatches"
                );
            }
            self.configs.upsert(config).await?;
            return Ok(false);
        }

        config.clear_code();
        config.failed_attempts = 0;
        self.configs.upsert(config).await?;
        Ok(true)
    }

    /// Turn two-factor login on, gated by a valid code.
    ///
    /// # Errors
    /// * `TokenInvalidOrExpired` - The submitted code is wrong, absent, or expired
    pub async fn enable(
        &self,
        credential_id: &CredentialId,
        submitted: &str,
    ) -> Result<(), AuthError> {
        if !self.validate_code(credential_id, submitted).await? {
            return Err(AuthError::TokenInvalidOrExpired);
        }

        let mut config = self
            .configs
            .find(credential_id)
            .await?
            .unwrap_or_else(|| TwoFactorConfig::new(*credential_id));
        config.enabled = true;
        config.enabled_at = Some(Utc::now());
        config.disabled_at = None;
        self.configs.upsert(config).await?;

        tracing::info!(credential_id = %credential_id, "Two-factor login enabled");
        Ok(())
    }

    /// Turn two-factor login off, gated by a valid code.
    ///
    /// # Errors
    /// * `TokenInvalidOrExpired` - The submitted code is wrong, absent, or expired
    pub async fn disable(
        &self,
        credential_id: &CredentialId,
        submitted: &str,
    ) -> Result<(), AuthError> {
        if !self.validate_code(credential_id, submitted).await? {
            return Err(AuthError::TokenInvalidOrExpired);
        }

        let mut config = self
            .configs
            .find(credential_id)
            .await?
            .unwrap_or_else(|| TwoFactorConfig::new(*credential_id));
        config.enabled = false;
        config.disabled_at = Some(Utc::now());
        self.configs.upsert(config).await?;

        tracing::info!(credential_id = %credential_id, "Two-factor login disabled");
        Ok(())
    }
}

/// Six uniformly distributed digits, zero-padded. Sampling the full
/// 0..1_000_000 range keeps leading zeros as likely as any other digit.
fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::DateTime;
    use mockall::mock;

    use super::*;
    use crate::domain::credential::models::EmailAddress;
    use crate::domain::credential::models::NationalId;
    use crate::domain::credential::models::StaffRole;

    mock! {
        pub TestConfigRepository {}

        #[async_trait]
        impl TwoFactorConfigRepository for TestConfigRepository {
            async fn find(
                &self,
                credential_id: &CredentialId,
            ) -> Result<Option<TwoFactorConfig>, AuthError>;
            async fn upsert(&self, config: TwoFactorConfig) -> Result<TwoFactorConfig, AuthError>;
        }
    }

    mock! {
        pub TestQuotaRepository {}

        #[async_trait]
        impl TwoFactorRateLimitRepository for TestQuotaRepository {
            async fn find(
                &self,
                credential_id: &CredentialId,
            ) -> Result<Option<TwoFactorRateLimit>, AuthError>;
            async fn upsert(
                &self,
                state: TwoFactorRateLimit,
            ) -> Result<TwoFactorRateLimit, AuthError>;
        }
    }

    mock! {
        pub TestMailer {}

        #[async_trait]
        impl EmailSender for TestMailer {
            async fn send_activation_email<'a>(
                &self,
                to: &'a EmailAddress,
                name: &'a str,
                token: &'a str,
                temp_password: Option<&'a str>,
            ) -> Result<(), AuthError>;
            async fn send_recovery_email(
                &self,
                to: &EmailAddress,
                name: &str,
                token: &str,
            ) -> Result<(), AuthError>;
            async fn send_two_factor_code(
                &self,
                to: &EmailAddress,
                code: &str,
            ) -> Result<(), AuthError>;
        }
    }

    fn sample_credential() -> Credential {
        Credential::new(
            NationalId::new("12345678901").expect("valid id"),
            EmailAddress::new("nurse@clinic.example".to_string()).expect("valid email"),
            "Test Nurse".to_string(),
            "$argon2id$fake".to_string(),
            StaffRole::Caregiver,
            false,
        )
    }

    fn config_with_code(
        credential_id: CredentialId,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> TwoFactorConfig {
        let mut config = TwoFactorConfig::new(credential_id);
        config.code = Some(code.to_string());
        config.code_expires_at = Some(expires_at);
        config
    }

    fn service(
        configs: MockTestConfigRepository,
        quotas: MockTestQuotaRepository,
        mailer: MockTestMailer,
    ) -> TwoFactorService<MockTestConfigRepository, MockTestQuotaRepository, MockTestMailer> {
        TwoFactorService::new(Arc::new(configs), Arc::new(quotas), Arc::new(mailer))
    }

    #[test]
    fn test_generated_code_is_six_digits() {
        for _ in 0..64 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_request_code_sends_and_charges_quota() {
        let credential = sample_credential();

        let mut configs = MockTestConfigRepository::new();
        configs.expect_find().returning(|_| Ok(None));
        configs
            .expect_upsert()
            .withf(|config| config.code.is_some() && config.code_expires_at.is_some())
            .returning(Ok);

        let mut quotas = MockTestQuotaRepository::new();
        quotas.expect_find().returning(|_| Ok(None));
        quotas
            .expect_upsert()
            .withf(|state| state.quarter_hour_count == 1 && state.last_send.is_some())
            .times(1)
            .returning(Ok);

        let mut mailer = MockTestMailer::new();
        mailer
            .expect_send_two_factor_code()
            .times(1)
            .returning(|_, _| Ok(()));

        let service = service(configs, quotas, mailer);
        assert!(service.request_code(&credential).await.is_ok());
    }

    #[tokio::test]
    async fn test_request_code_denied_when_quota_exhausted() {
        let credential = sample_credential();
        let credential_id = credential.id;

        let configs = MockTestConfigRepository::new();

        let mut quotas = MockTestQuotaRepository::new();
        quotas.expect_find().returning(move |_| {
            let mut state = TwoFactorRateLimit::new(credential_id);
            state.quarter_hour_count = 3;
            state.last_send = Some(Utc::now());
            Ok(Some(state))
        });
        // The escalation block must still be persisted
        quotas
            .expect_upsert()
            .withf(|state| state.blocked_until.is_some())
            .times(1)
            .returning(Ok);

        let mut mailer = MockTestMailer::new();
        mailer.expect_send_two_factor_code().times(0);

        let service = service(configs, quotas, mailer);
        let result = service.request_code(&credential).await;
        assert!(matches!(
            result,
            Err(AuthError::RateLimitExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_mailer_failure_does_not_charge_quota() {
        let credential = sample_credential();

        let mut configs = MockTestConfigRepository::new();
        configs.expect_find().returning(|_| Ok(None));
        configs.expect_upsert().times(0);

        let mut quotas = MockTestQuotaRepository::new();
        quotas.expect_find().returning(|_| Ok(None));
        quotas.expect_upsert().times(0);

        let mut mailer = MockTestMailer::new();
        mailer
            .expect_send_two_factor_code()
            .returning(|_, _| Err(AuthError::Email("smtp down".to_string())));

        let service = service(configs, quotas, mailer);
        let result = service.request_code(&credential).await;
        assert!(matches!(result, Err(AuthError::Email(_))));
    }

    #[tokio::test]
    async fn test_validate_correct_code_consumes_it() {
        let credential_id = CredentialId::new();

        let mut configs = MockTestConfigRepository::new();
        configs.expect_find().returning(move |_| {
            Ok(Some(config_with_code(
                credential_id,
                "042137",
                Utc::now() + Duration::minutes(4),
            )))
        });
        configs
            .expect_upsert()
            .withf(|config| config.code.is_none() && config.failed_attempts == 0)
            .times(1)
            .returning(Ok);

        let service = service(configs, MockTestQuotaRepository::new(), MockTestMailer::new());
        let valid = service.validate_code(&credential_id, "042137").await;
        assert_eq!(valid.ok(), Some(true));
    }

    #[tokio::test]
    async fn test_validate_wrong_code_counts_attempt() {
        let credential_id = CredentialId::new();

        let mut configs = MockTestConfigRepository::new();
        configs.expect_find().returning(move |_| {
            Ok(Some(config_with_code(
                credential_id,
                "042137",
                Utc::now() + Duration::minutes(4),
            )))
        });
        configs
            .expect_upsert()
            .withf(|config| config.failed_attempts == 1 && config.code.is_some())
            .times(1)
            .returning(Ok);

        let service = service(configs, MockTestQuotaRepository::new(), MockTestMailer::new());
        let valid = service.validate_code(&credential_id, "000000").await;
        assert_eq!(valid.ok(), Some(false));
    }

    #[tokio::test]
    async fn test_fifth_mismatch_blocks_validation() {
        let credential_id = CredentialId::new();

        let mut configs = MockTestConfigRepository::new();
        configs.expect_find().returning(move |_| {
            let mut config = config_with_code(
                credential_id,
                "042137",
                Utc::now() + Duration::minutes(4),
            );
            config.failed_attempts = MAX_CODE_ATTEMPTS - 1;
            Ok(Some(config))
        });
        configs
            .expect_upsert()
            .withf(|config| config.blocked_until.is_some() && config.failed_attempts == 0)
            .times(1)
            .returning(Ok);

        let service = service(configs, MockTestQuotaRepository::new(), MockTestMailer::new());
        let valid = service.validate_code(&credential_id, "000000").await;
        assert_eq!(valid.ok(), Some(false));
    }

    #[tokio::test]
    async fn test_validate_while_blocked_is_rate_limited() {
        let credential_id = CredentialId::new();

        let mut configs = MockTestConfigRepository::new();
        configs.expect_find().returning(move |_| {
            let mut config = config_with_code(
                credential_id,
                "042137",
                Utc::now() + Duration::minutes(4),
            );
            config.blocked_until = Some(Utc::now() + Duration::minutes(10));
            Ok(Some(config))
        });

        let service = service(configs, MockTestQuotaRepository::new(), MockTestMailer::new());
        let result = service.validate_code(&credential_id, "042137").await;
        assert!(matches!(
            result,
            Err(AuthError::RateLimitExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_validate_expired_code_errors_and_clears() {
        let credential_id = CredentialId::new();

        let mut configs = MockTestConfigRepository::new();
        configs.expect_find().returning(move |_| {
            Ok(Some(config_with_code(
                credential_id,
                "042137",
                Utc::now() - Duration::seconds(1),
            )))
        });
        configs
            .expect_upsert()
            .withf(|config| config.code.is_none())
            .times(1)
            .returning(Ok);

        let service = service(configs, MockTestQuotaRepository::new(), MockTestMailer::new());
        let result = service.validate_code(&credential_id, "042137").await;
        assert!(matches!(result, Err(AuthError::TokenInvalidOrExpired)));
    }

    #[tokio::test]
    async fn test_enable_requires_valid_code() {
        let credential_id = CredentialId::new();

        let mut configs = MockTestConfigRepository::new();
        configs.expect_find().returning(move |_| {
            Ok(Some(config_with_code(
                credential_id,
                "042137",
                Utc::now() + Duration::minutes(4),
            )))
        });
        configs
            .expect_upsert()
            .withf(|config| config.failed_attempts == 1)
            .times(1)
            .returning(Ok);

        let service = service(configs, MockTestQuotaRepository::new(), MockTestMailer::new());
        let result = service.enable(&credential_id, "999999").await;
        assert!(matches!(result, Err(AuthError::TokenInvalidOrExpired)));
    }

    #[tokio::test]
    async fn test_enable_with_valid_code() {
        let credential_id = CredentialId::new();

        let mut configs = MockTestConfigRepository::new();
        configs.expect_find().returning(move |_| {
            Ok(Some(config_with_code(
                credential_id,
                "042137",
                Utc::now() + Duration::minutes(4),
            )))
        });
        // First upsert consumes the code, second flips the switch
        configs
            .expect_upsert()
            .withf(|config| config.code.is_none())
            .times(1)
            .returning(Ok);
        configs
            .expect_upsert()
            .withf(|config| config.enabled && config.enabled_at.is_some())
            .times(1)
            .returning(Ok);

        let service = service(configs, MockTestQuotaRepository::new(), MockTestMailer::new());
        assert!(service.enable(&credential_id, "042137").await.is_ok());
    }
}
