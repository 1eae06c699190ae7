use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::auth::ports::EmailSender;
use crate::domain::credential::models::EmailAddress;
use crate::domain::errors::AuthError;

/// What the capturing sender recorded for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentEmail {
    Activation {
        to: String,
        token: String,
        temp_password: Option<String>,
    },
    Recovery {
        to: String,
        token: String,
    },
    TwoFactorCode {
        to: String,
        code: String,
    },
}

/// Email adapter that records every send instead of talking to a provider.
///
/// `fail_next` simulates a provider outage for exactly one dispatch, which is
/// how tests exercise the no-quota-charge-on-failure behavior.
#[derive(Default)]
pub struct CapturingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
    fail_next: AtomicBool,
}

impl CapturingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// The raw token in the most recent activation email, if any.
    pub fn last_activation_token(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|email| match email {
            SentEmail::Activation { token, .. } => Some(token),
            _ => None,
        })
    }

    /// The raw token in the most recent recovery email, if any.
    pub fn last_recovery_token(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|email| match email {
            SentEmail::Recovery { token, .. } => Some(token),
            _ => None,
        })
    }

    /// The code in the most recent two-factor email, if any.
    pub fn last_two_factor_code(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|email| match email {
            SentEmail::TwoFactorCode { code, .. } => Some(code),
            _ => None,
        })
    }

    fn record(&self, email: SentEmail) -> Result<(), AuthError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AuthError::Email("simulated provider outage".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email);
        }
        Ok(())
    }
}

#[async_trait]
impl EmailSender for CapturingEmailSender {
    async fn send_activation_email<'a>(
        &self,
        to: &'a EmailAddress,
        _name: &'a str,
        token: &'a str,
        temp_password: Option<&'a str>,
    ) -> Result<(), AuthError> {
        self.record(SentEmail::Activation {
            to: to.to_string(),
            token: token.to_string(),
            temp_password: temp_password.map(str::to_string),
        })
    }

    async fn send_recovery_email(
        &self,
        to: &EmailAddress,
        _name: &str,
        token: &str,
    ) -> Result<(), AuthError> {
        self.record(SentEmail::Recovery {
            to: to.to_string(),
            token: token.to_string(),
        })
    }

    async fn send_two_factor_code(&self, to: &EmailAddress, code: &str) -> Result<(), AuthError> {
        self.record(SentEmail::TwoFactorCode {
            to: to.to_string(),
            code: code.to_string(),
        })
    }
}
