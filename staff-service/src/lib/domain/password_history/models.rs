use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::credential::models::CredentialId;

/// One entry of the append-only password history ledger.
#[derive(Debug, Clone)]
pub struct PasswordHistoryEntry {
    pub id: Uuid,
    pub credential_id: CredentialId,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl PasswordHistoryEntry {
    pub fn new(credential_id: CredentialId, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            credential_id,
            password_hash,
            created_at: Utc::now(),
        }
    }
}
