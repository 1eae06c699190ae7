use async_trait::async_trait;

use crate::domain::credential::models::CredentialId;
use crate::domain::errors::AuthError;
use crate::domain::password_history::models::PasswordHistoryEntry;

/// Persistence operations for the password history ledger.
#[async_trait]
pub trait PasswordHistoryRepository: Send + Sync + 'static {
    /// Append an entry. Entries are never updated or deleted by the core.
    async fn append(&self, entry: PasswordHistoryEntry) -> Result<PasswordHistoryEntry, AuthError>;

    /// Fetch the most recent `limit` entries for a credential, newest first.
    async fn find_recent(
        &self,
        credential_id: &CredentialId,
        limit: u32,
    ) -> Result<Vec<PasswordHistoryEntry>, AuthError>;
}
