use std::sync::Arc;

use auth::PasswordHasher;

use crate::domain::credential::models::CredentialId;
use crate::domain::errors::AuthError;
use crate::domain::password_history::models::PasswordHistoryEntry;
use crate::domain::password_history::ports::PasswordHistoryRepository;

/// How many most-recent hashes the reuse check inspects by default.
pub const DEFAULT_HISTORY_DEPTH: u32 = 5;

/// Password history ledger.
///
/// Appends a hash per password change and checks candidates against the most
/// recent `depth` hashes. Older rows are retained but stop being checked;
/// nothing is ever deleted here.
pub struct PasswordHistory<R>
where
    R: PasswordHistoryRepository,
{
    repository: Arc<R>,
    hasher: PasswordHasher,
    depth: u32,
}

impl<R> PasswordHistory<R>
where
    R: PasswordHistoryRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_depth(repository, DEFAULT_HISTORY_DEPTH)
    }

    pub fn with_depth(repository: Arc<R>, depth: u32) -> Self {
        Self {
            repository,
            hasher: PasswordHasher::new(),
            depth,
        }
    }

    /// Append a hash to the ledger. Does not prune.
    pub async fn record(
        &self,
        credential_id: CredentialId,
        password_hash: String,
    ) -> Result<(), AuthError> {
        self.repository
            .append(PasswordHistoryEntry::new(credential_id, password_hash))
            .await?;
        Ok(())
    }

    /// Check a plaintext candidate against the most recent stored hashes.
    ///
    /// The comparison goes through the argon2 verifier (hash comparison, not
    /// a plaintext store).
    pub async fn was_recently_used(
        &self,
        credential_id: &CredentialId,
        candidate: &str,
    ) -> Result<bool, AuthError> {
        let recent = self
            .repository
            .find_recent(credential_id, self.depth)
            .await?;

        for entry in &recent {
            if self.hasher.verify(candidate, &entry.password_hash)? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
