use std::sync::Arc;

use chrono::Duration;
use chrono::Utc;

use crate::domain::audit::models::FailureReason;
use crate::domain::audit::models::LoginAttempt;
use crate::domain::audit::ports::LoginAttemptRepository;
use crate::domain::credential::models::Credential;
use crate::domain::credential::models::NationalId;
use crate::domain::errors::AuthError;

/// Failures inside the trailing window before lockout engages.
pub const FAILURE_THRESHOLD: u64 = 5;

/// Width of the trailing failure window, in minutes.
pub const LOCKOUT_WINDOW_MINUTES: i64 = 30;

/// Login attempt auditor.
///
/// Records every attempt in an append-only log and derives lockout state by
/// counting recent failures. Lockout here is derived, never stored; the
/// credential's own `locked_until` field (set by the orchestrator) is an
/// independent mechanism and the two must agree.
pub struct LoginAuditor<R>
where
    R: LoginAttemptRepository,
{
    repository: Arc<R>,
}

impl<R> LoginAuditor<R>
where
    R: LoginAttemptRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Append a success row.
    pub async fn record_success(
        &self,
        credential: &Credential,
        ip: &str,
        user_agent: &str,
    ) -> Result<(), AuthError> {
        self.repository
            .append(LoginAttempt::success(
                credential.id,
                credential.national_id.clone(),
                ip.to_string(),
                user_agent.to_string(),
            ))
            .await?;
        Ok(())
    }

    /// Append a failure row, tagging it `blocked` if the national id is
    /// currently locked out.
    pub async fn record_failure(
        &self,
        credential: Option<&Credential>,
        national_id: &NationalId,
        ip: &str,
        user_agent: &str,
        reason: FailureReason,
    ) -> Result<(), AuthError> {
        let blocked = self.is_locked(national_id).await?;
        self.repository
            .append(LoginAttempt::failure(
                credential.map(|c| c.id),
                national_id.clone(),
                ip.to_string(),
                user_agent.to_string(),
                reason,
                blocked,
            ))
            .await?;
        Ok(())
    }

    /// Derived lockout check: true when the trailing window holds at least
    /// `FAILURE_THRESHOLD` failures for this national id.
    pub async fn is_locked(&self, national_id: &NationalId) -> Result<bool, AuthError> {
        let since = Utc::now() - Duration::minutes(LOCKOUT_WINDOW_MINUTES);
        let failures = self
            .repository
            .count_failures_since(national_id, since)
            .await?;
        Ok(failures >= FAILURE_THRESHOLD)
    }
}
