use async_trait::async_trait;

use crate::domain::credential::models::Credential;
use crate::domain::credential::models::CredentialId;
use crate::domain::credential::models::EmailAddress;
use crate::domain::credential::models::NationalId;
use crate::domain::errors::AuthError;

/// Persistence operations for the credential aggregate.
///
/// The backing store must offer read-your-writes consistency within a single
/// logical operation.
#[async_trait]
pub trait CredentialRepository: Send + Sync + 'static {
    /// Persist a new credential.
    ///
    /// # Errors
    /// * `DuplicateIdentity` - Email or national id is already registered
    /// * `Database` - Storage operation failed
    async fn create(&self, credential: Credential) -> Result<Credential, AuthError>;

    /// Retrieve a credential by identifier.
    async fn find_by_id(&self, id: &CredentialId) -> Result<Option<Credential>, AuthError>;

    /// Retrieve a credential by national id.
    async fn find_by_national_id(
        &self,
        national_id: &NationalId,
    ) -> Result<Option<Credential>, AuthError>;

    /// Retrieve a credential by email address.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Credential>, AuthError>;

    /// Persist updated credential state.
    ///
    /// # Errors
    /// * `Database` - Storage operation failed or the row no longer exists
    async fn update(&self, credential: Credential) -> Result<Credential, AuthError>;
}
