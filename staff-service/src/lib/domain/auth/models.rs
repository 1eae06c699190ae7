use crate::domain::credential::models::Credential;
use crate::domain::credential::models::CredentialId;
use crate::domain::credential::models::StaffRole;

/// Input for staff registration.
///
/// Raw strings from the edge; the orchestrator parses them into value objects
/// and rejects bad input before touching storage. `temporary_password` marks
/// admin-provisioned accounts whose holder must activate by email before
/// logging in.
#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub national_id: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: Option<String>,
    pub temporary_password: bool,
    pub ip: String,
    pub user_agent: String,
}

/// Input for a login attempt.
#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub national_id: String,
    pub password: String,
    pub ip: String,
    pub user_agent: String,
}

/// The non-secret slice of a credential returned to callers.
#[derive(Debug, Clone)]
pub struct StaffProfile {
    pub id: CredentialId,
    pub national_id: String,
    pub email: String,
    pub full_name: String,
    pub role: StaffRole,
    pub email_verified: bool,
}

impl From<&Credential> for StaffProfile {
    fn from(credential: &Credential) -> Self {
        Self {
            id: credential.id,
            national_id: credential.national_id.to_string(),
            email: credential.email.to_string(),
            full_name: credential.full_name.clone(),
            role: credential.role,
            email_verified: credential.email_verified,
        }
    }
}

/// A freshly issued bearer session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_in_secs: i64,
    pub staff: StaffProfile,
}
