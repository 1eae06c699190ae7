use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::credential::models::CredentialId;
use crate::domain::credential::models::NationalId;

/// Why a login attempt failed.
///
/// Recorded in the audit log only. Clients never see these reasons; they only
/// receive the coarse error taxonomy, so failure reasons cannot be used to
/// enumerate registered national ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    UnknownNationalId,
    WrongPassword,
    AccountLocked,
    AccountInactive,
    AccountNotActivated,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::UnknownNationalId => "unknown_national_id",
            FailureReason::WrongPassword => "wrong_password",
            FailureReason::AccountLocked => "account_locked",
            FailureReason::AccountInactive => "account_inactive",
            FailureReason::AccountNotActivated => "account_not_activated",
        }
    }
}

impl FromStr for FailureReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown_national_id" => Ok(FailureReason::UnknownNationalId),
            "wrong_password" => Ok(FailureReason::WrongPassword),
            "account_locked" => Ok(FailureReason::AccountLocked),
            "account_inactive" => Ok(FailureReason::AccountInactive),
            "account_not_activated" => Ok(FailureReason::AccountNotActivated),
            other => Err(format!("unknown failure reason: {}", other)),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the append-only login audit log.
///
/// Never mutated after creation. `credential_id` is None when the presented
/// national id matched no credential.
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    pub id: Uuid,
    pub credential_id: Option<CredentialId>,
    pub national_id: NationalId,
    pub ip: String,
    pub user_agent: String,
    pub success: bool,
    pub failure_reason: Option<FailureReason>,
    pub blocked: bool,
    pub attempted_at: DateTime<Utc>,
}

impl LoginAttempt {
    pub fn success(credential_id: CredentialId, national_id: NationalId, ip: String, user_agent: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            credential_id: Some(credential_id),
            national_id,
            ip,
            user_agent,
            success: true,
            failure_reason: None,
            blocked: false,
            attempted_at: Utc::now(),
        }
    }

    pub fn failure(
        credential_id: Option<CredentialId>,
        national_id: NationalId,
        ip: String,
        user_agent: String,
        reason: FailureReason,
        blocked: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            credential_id,
            national_id,
            ip,
            user_agent,
            success: false,
            failure_reason: Some(reason),
            blocked,
            attempted_at: Utc::now(),
        }
    }
}
