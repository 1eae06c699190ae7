use chrono::DateTime;
use chrono::Utc;

use crate::domain::credential::models::CredentialId;

/// Per-credential two-factor configuration.
///
/// Created lazily on first setup. The state machine is
/// disabled -> setup-pending (row exists, `enabled == false`) -> enabled,
/// with transitions gated by a valid one-time code.
#[derive(Debug, Clone)]
pub struct TwoFactorConfig {
    pub credential_id: CredentialId,
    pub enabled: bool,
    pub enabled_at: Option<DateTime<Utc>>,
    pub disabled_at: Option<DateTime<Utc>>,
    /// Current outstanding one-time code, if any.
    pub code: Option<String>,
    pub code_expires_at: Option<DateTime<Utc>>,
    pub failed_attempts: i32,
    pub blocked_until: Option<DateTime<Utc>>,
}

impl TwoFactorConfig {
    pub fn new(credential_id: CredentialId) -> Self {
        Self {
            credential_id,
            enabled: false,
            enabled_at: None,
            disabled_at: None,
            code: None,
            code_expires_at: None,
            failed_attempts: 0,
            blocked_until: None,
        }
    }

    /// Clear the outstanding code and its expiry.
    pub fn clear_code(&mut self) {
        self.code = None;
        self.code_expires_at = None;
    }
}

/// Per-credential send-quota state for two-factor codes.
///
/// Created lazily. All three counters are reset based on the single
/// `last_send` timestamp; see `rate_limit` for the decision logic.
#[derive(Debug, Clone)]
pub struct TwoFactorRateLimit {
    pub credential_id: CredentialId,
    pub last_send: Option<DateTime<Utc>>,
    /// Sends counted against the trailing 15-minute budget.
    pub quarter_hour_count: i32,
    /// Sends counted against the trailing 1-hour budget.
    pub hour_count: i32,
    /// Sends counted against the calendar-day budget.
    pub day_count: i32,
    pub blocked_until: Option<DateTime<Utc>>,
}

impl TwoFactorRateLimit {
    pub fn new(credential_id: CredentialId) -> Self {
        Self {
            credential_id,
            last_send: None,
            quarter_hour_count: 0,
            hour_count: 0,
            day_count: 0,
            blocked_until: None,
        }
    }
}
