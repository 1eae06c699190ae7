use async_trait::async_trait;

use crate::domain::credential::models::EmailAddress;
use crate::domain::errors::AuthError;

/// Email dispatch collaborator.
///
/// Fire-and-report: a delivery failure must propagate as an error the caller
/// can surface. The one exception is registration, where the orchestrator
/// explicitly treats delivery failure as non-fatal and logs it.
#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    /// Send the account activation email carrying the raw activation token
    /// and, for admin-provisioned accounts, the temporary password.
    async fn send_activation_email<'a>(
        &self,
        to: &'a EmailAddress,
        name: &'a str,
        token: &'a str,
        temp_password: Option<&'a str>,
    ) -> Result<(), AuthError>;

    /// Send the password recovery email carrying the raw recovery token.
    async fn send_recovery_email(
        &self,
        to: &EmailAddress,
        name: &str,
        token: &str,
    ) -> Result<(), AuthError>;

    /// Send a one-time two-factor code.
    async fn send_two_factor_code(&self, to: &EmailAddress, code: &str) -> Result<(), AuthError>;
}
