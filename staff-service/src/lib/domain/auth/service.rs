use std::str::FromStr;
use std::sync::Arc;

use auth::password::policy;
use auth::JwtHandler;
use auth::PasswordHasher;
use chrono::Duration;
use chrono::Utc;

use crate::domain::audit::models::FailureReason;
use crate::domain::audit::ports::LoginAttemptRepository;
use crate::domain::audit::service::LoginAuditor;
use crate::domain::audit::service::LOCKOUT_WINDOW_MINUTES;
use crate::domain::auth::models::IssuedSession;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::models::StaffProfile;
use crate::domain::auth::ports::EmailSender;
use crate::domain::credential::models::Credential;
use crate::domain::credential::models::CredentialId;
use crate::domain::credential::models::EmailAddress;
use crate::domain::credential::models::NationalId;
use crate::domain::credential::models::StaffRole;
use crate::domain::credential::ports::CredentialRepository;
use crate::domain::errors::AuthError;
use crate::domain::password_history::ports::PasswordHistoryRepository;
use crate::domain::password_history::service::PasswordHistory;
use crate::domain::recovery::models::RecoveryTokenKind;
use crate::domain::recovery::ports::RecoveryTokenRepository;
use crate::domain::recovery::service::RecoveryTokens;
use crate::domain::session::ports::SessionRepository;
use crate::domain::session::service::SessionRegistry;

/// Consecutive wrong passwords tolerated before the credential itself locks.
pub const CONSECUTIVE_FAILURE_LIMIT: i32 = 5;
/// How long a credential lock lasts.
pub const CREDENTIAL_LOCK_MINUTES: i64 = 30;

/// Authentication orchestrator.
///
/// Composes the credential store, session registry, login auditor, password
/// history, recovery tokens, and email dispatch into the staff-facing flows.
/// Each flow is a strict ladder: the first failing rung decides the error and
/// no later rung runs.
pub struct AuthService<CR, SR, AR, HR, RR, E>
where
    CR: CredentialRepository,
    SR: SessionRepository,
    AR: LoginAttemptRepository,
    HR: PasswordHistoryRepository,
    RR: RecoveryTokenRepository,
    E: EmailSender,
{
    credentials: Arc<CR>,
    sessions: SessionRegistry<SR>,
    auditor: LoginAuditor<AR>,
    history: PasswordHistory<HR>,
    recovery: RecoveryTokens<RR>,
    mailer: Arc<E>,
    codec: Arc<JwtHandler>,
    hasher: PasswordHasher,
    token_ttl_seconds: i64,
}

impl<CR, SR, AR, HR, RR, E> AuthService<CR, SR, AR, HR, RR, E>
where
    CR: CredentialRepository,
    SR: SessionRepository,
    AR: LoginAttemptRepository,
    HR: PasswordHistoryRepository,
    RR: RecoveryTokenRepository,
    E: EmailSender,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        credentials: Arc<CR>,
        sessions: Arc<SR>,
        attempts: Arc<AR>,
        history: Arc<HR>,
        recovery_tokens: Arc<RR>,
        mailer: Arc<E>,
        codec: Arc<JwtHandler>,
        token_ttl_seconds: i64,
    ) -> Self {
        Self {
            credentials,
            sessions: SessionRegistry::new(sessions),
            auditor: LoginAuditor::new(attempts),
            history: PasswordHistory::new(history),
            recovery: RecoveryTokens::new(recovery_tokens),
            mailer,
            codec,
            hasher: PasswordHasher::new(),
            token_ttl_seconds,
        }
    }

    /// Register a staff member and open their first session.
    ///
    /// The verification email is best-effort: a dispatch failure is logged
    /// and the registration still succeeds, since the member can request a
    /// fresh token later.
    ///
    /// # Errors
    /// * `PasswordPolicyViolation` - Password fails the policy
    /// * `DuplicateIdentity` - Email or national id already registered
    pub async fn register(&self, cmd: RegisterCommand) -> Result<IssuedSession, AuthError> {
        policy::enforce(&cmd.password)?;

        let national_id = NationalId::new(&cmd.national_id)?;
        let email = EmailAddress::new(cmd.email.clone())?;
        let role = match cmd.role.as_deref() {
            Some(raw) => StaffRole::from_str(raw)?,
            None => StaffRole::default(),
        };

        if self
            .credentials
            .find_by_national_id(&national_id)
            .await?
            .is_some()
            || self.credentials.find_by_email(&email).await?.is_some()
        {
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = self.hasher.hash(&cmd.password)?;
        let credential = Credential::new(
            national_id,
            email,
            cmd.full_name.clone(),
            password_hash,
            role,
            cmd.temporary_password,
        );
        let credential = self.credentials.create(credential).await?;

        self.history
            .record(credential.id, credential.password_hash.clone())
            .await?;

        match self
            .recovery
            .issue(credential.id, RecoveryTokenKind::EmailVerification)
            .await
        {
            Ok(raw_token) => {
                let temp_password = cmd.temporary_password.then_some(cmd.password.as_str());
                if let Err(e) = self
                    .mailer
                    .send_activation_email(
                        &credential.email,
                        &credential.full_name,
                        &raw_token,
                        temp_password,
                    )
                    .await
                {
                    tracing::warn!(
                        credential_id = %credential.id,
                        error = %e,
                        "Verification email failed; registration continues"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    credential_id = %credential.id,
                    error = %e,
                    "Could not issue verification token; registration continues"
                );
            }
        }

        tracing::info!(credential_id = %credential.id, "Staff member registered");
        self.issue_session(&credential, &cmd.ip, &cmd.user_agent)
            .await
    }

    /// Authenticate a staff member.
    ///
    /// The checks run in a fixed order and every failure leaves an audit row.
    ///
    /// # Errors
    /// * `AccountLocked` - Derived lockout holds, or `locked_until` is in the future
    /// * `InvalidCredentials` - Unknown national id or wrong password
    /// * `AccountInactive` - The credential was deactivated
    /// * `AccountNotActivated` - Temporary password not yet replaced via activation
    pub async fn login(&self, cmd: LoginCommand) -> Result<IssuedSession, AuthError> {
        let national_id =
            NationalId::new(&cmd.national_id).map_err(|_| AuthError::InvalidCredentials)?;

        if self.auditor.is_locked(&national_id).await? {
            self.auditor
                .record_failure(
                    None,
                    &national_id,
                    &cmd.ip,
                    &cmd.user_agent,
                    FailureReason::AccountLocked,
                )
                .await?;
            return Err(AuthError::AccountLocked {
                retry_after_secs: LOCKOUT_WINDOW_MINUTES * 60,
            });
        }

        let Some(mut credential) = self.credentials.find_by_national_id(&national_id).await?
        else {
            self.auditor
                .record_failure(
                    None,
                    &national_id,
                    &cmd.ip,
                    &cmd.user_agent,
                    FailureReason::UnknownNationalId,
                )
                .await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !credential.active {
            self.auditor
                .record_failure(
                    Some(&credential),
                    &national_id,
                    &cmd.ip,
                    &cmd.user_agent,
                    FailureReason::AccountInactive,
                )
                .await?;
            return Err(AuthError::AccountInactive);
        }

        let now = Utc::now();
        if let Some(locked_until) = credential.locked_until {
            if now < locked_until {
                self.auditor
                    .record_failure(
                        Some(&credential),
                        &national_id,
                        &cmd.ip,
                        &cmd.user_agent,
                        FailureReason::AccountLocked,
                    )
                    .await?;
                return Err(AuthError::AccountLocked {
                    retry_after_secs: (locked_until - now).num_seconds().max(1),
                });
            }
        }

        if credential.temporary_password && !credential.email_verified {
            self.auditor
                .record_failure(
                    Some(&credential),
                    &national_id,
                    &cmd.ip,
                    &cmd.user_agent,
                    FailureReason::AccountNotActivated,
                )
                .await?;
            return Err(AuthError::AccountNotActivated);
        }

        if !self.hasher.verify(&cmd.password, &credential.password_hash)? {
            credential.failed_attempts += 1;
            if credential.failed_attempts >= CONSECUTIVE_FAILURE_LIMIT {
                credential.locked_until = Some(now + Duration::minutes(CREDENTIAL_LOCK_MINUTES));
                tracing::warn!(
                    credential_id = %credential.id,
                    "Credential locked after repeated password failures"
                );
            }
            let credential = self.credentials.update(credential).await?;
            self.auditor
                .record_failure(
                    Some(&credential),
                    &national_id,
                    &cmd.ip,
                    &cmd.user_agent,
                    FailureReason::WrongPassword,
                )
                .await?;
            return Err(AuthError::InvalidCredentials);
        }

        credential.failed_attempts = 0;
        credential.locked_until = None;
        credential.last_login_at = Some(now);
        let credential = self.credentials.update(credential).await?;

        self.auditor
            .record_success(&credential, &cmd.ip, &cmd.user_agent)
            .await?;

        self.issue_session(&credential, &cmd.ip, &cmd.user_agent)
            .await
    }

    /// Change the password of an authenticated staff member.
    ///
    /// All other sessions are revoked; the session holding `keep_token`
    /// survives so the member is not logged out of the device they acted from.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Current password does not match
    /// * `PasswordPolicyViolation` - New password fails the policy
    /// * `PasswordReused` - New password matches a recent one
    pub async fn change_password(
        &self,
        credential_id: &CredentialId,
        current_password: &str,
        new_password: &str,
        keep_token: &str,
    ) -> Result<(), AuthError> {
        let mut credential = self
            .credentials
            .find_by_id(credential_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self
            .hasher
            .verify(current_password, &credential.password_hash)?
        {
            return Err(AuthError::InvalidCredentials);
        }

        self.apply_new_password(&mut credential, new_password)
            .await?;
        self.credentials.update(credential).await?;

        self.sessions
            .revoke_all_except(credential_id, keep_token)
            .await?;

        tracing::info!(credential_id = %credential_id, "Password changed");
        Ok(())
    }

    /// Reset a forgotten password with a recovery token.
    ///
    /// Every session is revoked: the member proved mailbox control, not
    /// possession of any existing device.
    ///
    /// # Errors
    /// * `PasswordPolicyViolation` - New password fails the policy; the token
    ///   is not consumed
    /// * `TokenInvalidOrExpired` - Unknown, used, or expired token
    /// * `PasswordReused` - New password matches a recent one
    pub async fn reset_password(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        // Policy runs before redemption so a weak password does not burn
        // the single-use token
        policy::enforce(new_password)?;

        let token = self
            .recovery
            .redeem(raw_token, RecoveryTokenKind::PasswordRecovery)
            .await?;

        let mut credential = self
            .credentials
            .find_by_id(&token.credential_id)
            .await?
            .ok_or(AuthError::TokenInvalidOrExpired)?;

        self.apply_new_password(&mut credential, new_password)
            .await?;
        credential.failed_attempts = 0;
        credential.locked_until = None;
        let credential = self.credentials.update(credential).await?;

        self.sessions.revoke_all(&credential.id).await?;

        tracing::info!(credential_id = %credential.id, "Password reset via recovery token");
        Ok(())
    }

    /// Activate an admin-provisioned account: prove mailbox control and
    /// replace the temporary password in one step.
    ///
    /// # Errors
    /// * `PasswordPolicyViolation` - New password fails the policy; the token
    ///   is not consumed
    /// * `TokenInvalidOrExpired` - Unknown, used, or expired token
    /// * `PasswordReused` - New password matches a recent one
    pub async fn activate_account(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        policy::enforce(new_password)?;

        let token = self
            .recovery
            .redeem(raw_token, RecoveryTokenKind::EmailVerification)
            .await?;

        let mut credential = self
            .credentials
            .find_by_id(&token.credential_id)
            .await?
            .ok_or(AuthError::TokenInvalidOrExpired)?;

        self.apply_new_password(&mut credential, new_password)
            .await?;
        credential.email_verified = true;
        credential.temporary_password = false;
        credential.active = true;
        let credential = self.credentials.update(credential).await?;

        tracing::info!(credential_id = %credential.id, "Account activated");
        Ok(())
    }

    /// Confirm mailbox control for a self-registered account.
    ///
    /// # Errors
    /// * `TokenInvalidOrExpired` - Unknown, used, or expired token
    pub async fn verify_email(&self, raw_token: &str) -> Result<(), AuthError> {
        let token = self
            .recovery
            .redeem(raw_token, RecoveryTokenKind::EmailVerification)
            .await?;

        let mut credential = self
            .credentials
            .find_by_id(&token.credential_id)
            .await?
            .ok_or(AuthError::TokenInvalidOrExpired)?;

        credential.email_verified = true;
        self.credentials.update(credential).await?;

        tracing::info!(credential_id = %token.credential_id, "Email verified");
        Ok(())
    }

    /// Start the forgotten-password flow.
    ///
    /// Deliberately silent on unknown or malformed email addresses so the
    /// endpoint cannot be used to probe which addresses are registered.
    ///
    /// # Errors
    /// * `Email` - The recovery email could not be dispatched
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let Ok(email) = EmailAddress::new(email.to_string()) else {
            return Ok(());
        };

        let Some(credential) = self.credentials.find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let raw_token = self
            .recovery
            .issue(credential.id, RecoveryTokenKind::PasswordRecovery)
            .await?;

        self.mailer
            .send_recovery_email(&credential.email, &credential.full_name, &raw_token)
            .await?;

        tracing::info!(credential_id = %credential.id, "Recovery email dispatched");
        Ok(())
    }

    /// Fetch the profile behind a credential id.
    pub async fn profile(&self, credential_id: &CredentialId) -> Result<StaffProfile, AuthError> {
        let credential = self
            .credentials
            .find_by_id(credential_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(StaffProfile::from(&credential))
    }

    /// Policy, reuse check, hash, stamp. Mutates the credential in place;
    /// the caller persists it.
    async fn apply_new_password(
        &self,
        credential: &mut Credential,
        new_password: &str,
    ) -> Result<(), AuthError> {
        policy::enforce(new_password)?;

        if self
            .history
            .was_recently_used(&credential.id, new_password)
            .await?
        {
            return Err(AuthError::PasswordReused);
        }

        let password_hash = self.hasher.hash(new_password)?;
        credential.password_hash = password_hash.clone();
        credential.last_password_change = Some(Utc::now());
        credential.temporary_password = false;

        self.history.record(credential.id, password_hash).await?;
        Ok(())
    }

    async fn issue_session(
        &self,
        credential: &Credential,
        ip: &str,
        user_agent: &str,
    ) -> Result<IssuedSession, AuthError> {
        let token = self
            .codec
            .issue(credential.national_id.as_str(), self.token_ttl_seconds)?;

        self.sessions
            .create(
                credential.id,
                token.clone(),
                ip.to_string(),
                user_agent.to_string(),
                self.token_ttl_seconds,
            )
            .await?;

        Ok(IssuedSession {
            token,
            expires_in_secs: self.token_ttl_seconds,
            staff: StaffProfile::from(credential),
        })
    }
}
