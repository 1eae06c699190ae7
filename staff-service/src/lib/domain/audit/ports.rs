use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::audit::models::LoginAttempt;
use crate::domain::credential::models::NationalId;
use crate::domain::errors::AuthError;

/// Persistence operations for the append-only login audit log.
#[async_trait]
pub trait LoginAttemptRepository: Send + Sync + 'static {
    /// Append an attempt row. Rows are never updated or deleted.
    async fn append(&self, attempt: LoginAttempt) -> Result<LoginAttempt, AuthError>;

    /// Count failed attempts for a national id recorded at or after `since`.
    async fn count_failures_since(
        &self,
        national_id: &NationalId,
        since: DateTime<Utc>,
    ) -> Result<u64, AuthError>;
}
