//! Cross-component flow tests driven entirely in-process against the
//! in-memory adapters. No network, no database.

use std::sync::Arc;

use auth::JwtHandler;
use chrono::Duration;
use chrono::Utc;
use staff_service::domain::auth::models::LoginCommand;
use staff_service::domain::auth::models::RegisterCommand;
use staff_service::domain::auth::service::AuthService;
use staff_service::domain::credential::models::NationalId;
use staff_service::domain::credential::ports::CredentialRepository;
use staff_service::domain::errors::AuthError;
use staff_service::domain::session::service::SessionRegistry;
use staff_service::domain::two_factor::service::TwoFactorService;
use staff_service::outbound::email::CapturingEmailSender;
use staff_service::outbound::repositories::memory::InMemoryCredentialRepository;
use staff_service::outbound::repositories::memory::InMemoryLoginAttemptRepository;
use staff_service::outbound::repositories::memory::InMemoryPasswordHistoryRepository;
use staff_service::outbound::repositories::memory::InMemoryRecoveryTokenRepository;
use staff_service::outbound::repositories::memory::InMemorySessionRepository;
use staff_service::outbound::repositories::memory::InMemoryTwoFactorConfigRepository;
use staff_service::outbound::repositories::memory::InMemoryTwoFactorRateLimitRepository;

const TOKEN_TTL_SECONDS: i64 = 3600;
const NATIONAL_ID: &str = "12345678901";
const EMAIL: &str = "nurse@clinic.example";
const PASSWORD: &str = "Aa1@first-pass";

type TestAuthService = AuthService<
    InMemoryCredentialRepository,
    InMemorySessionRepository,
    InMemoryLoginAttemptRepository,
    InMemoryPasswordHistoryRepository,
    InMemoryRecoveryTokenRepository,
    CapturingEmailSender,
>;

struct TestHarness {
    auth: TestAuthService,
    sessions: SessionRegistry<InMemorySessionRepository>,
    two_factor: TwoFactorService<
        InMemoryTwoFactorConfigRepository,
        InMemoryTwoFactorRateLimitRepository,
        CapturingEmailSender,
    >,
    credentials: Arc<InMemoryCredentialRepository>,
    attempts: Arc<InMemoryLoginAttemptRepository>,
    quotas: Arc<InMemoryTwoFactorRateLimitRepository>,
    mailer: Arc<CapturingEmailSender>,
    codec: Arc<JwtHandler>,
}

impl TestHarness {
    fn new() -> Self {
        let credentials = Arc::new(InMemoryCredentialRepository::new());
        let sessions = Arc::new(InMemorySessionRepository::new());
        let attempts = Arc::new(InMemoryLoginAttemptRepository::new());
        let history = Arc::new(InMemoryPasswordHistoryRepository::new());
        let recovery_tokens = Arc::new(InMemoryRecoveryTokenRepository::new());
        let configs = Arc::new(InMemoryTwoFactorConfigRepository::new());
        let quotas = Arc::new(InMemoryTwoFactorRateLimitRepository::new());
        let mailer = Arc::new(CapturingEmailSender::new());
        let codec = Arc::new(JwtHandler::new(b"test-secret-for-flow-tests"));

        let auth = AuthService::new(
            Arc::clone(&credentials),
            Arc::clone(&sessions),
            Arc::clone(&attempts),
            history,
            recovery_tokens,
            Arc::clone(&mailer),
            Arc::clone(&codec),
            TOKEN_TTL_SECONDS,
        );
        let two_factor = TwoFactorService::new(configs, Arc::clone(&quotas), Arc::clone(&mailer));
        let session_registry = SessionRegistry::new(sessions);

        Self {
            auth,
            sessions: session_registry,
            two_factor,
            credentials,
            attempts,
            quotas,
            mailer,
            codec,
        }
    }

    async fn register_default(&self) -> staff_service::domain::auth::models::IssuedSession {
        self.register(NATIONAL_ID, EMAIL, PASSWORD, false).await
    }

    async fn register(
        &self,
        national_id: &str,
        email: &str,
        password: &str,
        temporary_password: bool,
    ) -> staff_service::domain::auth::models::IssuedSession {
        self.auth
            .register(RegisterCommand {
                national_id: national_id.to_string(),
                email: email.to_string(),
                full_name: "Test Nurse".to_string(),
                password: password.to_string(),
                role: None,
                temporary_password,
                ip: "10.0.0.1".to_string(),
                user_agent: "test-agent".to_string(),
            })
            .await
            .expect("registration")
    }

    async fn login(&self, password: &str) -> Result<
        staff_service::domain::auth::models::IssuedSession,
        AuthError,
    > {
        self.auth
            .login(LoginCommand {
                national_id: NATIONAL_ID.to_string(),
                password: password.to_string(),
                ip: "10.0.0.1".to_string(),
                user_agent: "test-agent".to_string(),
            })
            .await
    }

    async fn credential(&self) -> staff_service::domain::credential::models::Credential {
        let national_id = NationalId::new(NATIONAL_ID).expect("valid id");
        self.credentials
            .find_by_national_id(&national_id)
            .await
            .expect("lookup")
            .expect("credential exists")
    }
}

#[tokio::test]
async fn test_register_then_login() {
    let harness = TestHarness::new();
    let session = harness.register_default().await;

    // The issued token carries the national id as subject
    let claims = harness.codec.verify(&session.token).expect("valid token");
    assert_eq!(claims.sub, NATIONAL_ID);
    assert_eq!(session.expires_in_secs, TOKEN_TTL_SECONDS);

    // Registration dispatched a verification email
    assert!(harness.mailer.last_activation_token().is_some());

    let login = harness.login(PASSWORD).await.expect("login");
    assert!(harness.sessions.is_valid(&login.token).await);
    assert_eq!(login.staff.national_id, NATIONAL_ID);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_weak_passwords() {
    let harness = TestHarness::new();
    harness.register_default().await;

    let duplicate = harness
        .auth
        .register(RegisterCommand {
            national_id: NATIONAL_ID.to_string(),
            email: "other@clinic.example".to_string(),
            full_name: "Someone Else".to_string(),
            password: PASSWORD.to_string(),
            role: None,
            temporary_password: false,
            ip: "10.0.0.1".to_string(),
            user_agent: "test-agent".to_string(),
        })
        .await;
    assert!(matches!(duplicate, Err(AuthError::DuplicateIdentity)));

    // Policy vectors: missing uppercase, too short
    for weak in ["aa1@abcd", "Aa1@a"] {
        let result = harness
            .auth
            .register(RegisterCommand {
                national_id: "98765432109".to_string(),
                email: "weak@clinic.example".to_string(),
                full_name: "Weak Password".to_string(),
                password: weak.to_string(),
                role: None,
                temporary_password: false,
                ip: "10.0.0.1".to_string(),
                user_agent: "test-agent".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::PasswordPolicyViolation(_))));
    }
}

#[tokio::test]
async fn test_login_unknown_national_id() {
    let harness = TestHarness::new();
    let result = harness.login(PASSWORD).await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_lockout_after_five_failures() {
    let harness = TestHarness::new();
    harness.register_default().await;

    for _ in 0..5 {
        let result = harness.login("Xx9$wrong-pass").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    // The 5th consecutive failure locked the credential itself
    let credential = harness.credential().await;
    assert!(credential.locked_until.is_some());

    // 6th attempt fails AccountLocked even with the right password
    let result = harness.login(PASSWORD).await;
    assert!(matches!(result, Err(AuthError::AccountLocked { .. })));
}

#[tokio::test]
async fn test_success_resets_consecutive_failures() {
    let harness = TestHarness::new();
    harness.register_default().await;

    for _ in 0..4 {
        let result = harness.login("Xx9$wrong-pass").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    harness.login(PASSWORD).await.expect("login");

    let credential = harness.credential().await;
    assert_eq!(credential.failed_attempts, 0);
    assert!(credential.locked_until.is_none());
    assert!(credential.last_login_at.is_some());
}

#[tokio::test]
async fn test_lockout_expires_with_the_window() {
    let harness = TestHarness::new();
    harness.register_default().await;

    for _ in 0..5 {
        let _ = harness.login("Xx9$wrong-pass").await;
    }
    assert!(matches!(
        harness.login(PASSWORD).await,
        Err(AuthError::AccountLocked { .. })
    ));

    // Move the audit window past the failures and expire the credential lock
    harness
        .attempts
        .shift_attempts_back(Duration::minutes(31))
        .await;
    let mut credential = harness.credential().await;
    credential.locked_until = Some(Utc::now() - Duration::seconds(1));
    harness
        .credentials
        .update(credential)
        .await
        .expect("update");

    harness.login(PASSWORD).await.expect("login after lockout");
}

#[tokio::test]
async fn test_revocation_is_idempotent_and_gate_denies_revoked_tokens() {
    let harness = TestHarness::new();
    let session = harness.register_default().await;

    let stored = harness
        .sessions
        .find_by_token(&session.token)
        .await
        .expect("lookup")
        .expect("session exists");

    harness
        .sessions
        .revoke(&stored.id, &stored.credential_id)
        .await
        .expect("first revoke");
    harness
        .sessions
        .revoke(&stored.id, &stored.credential_id)
        .await
        .expect("second revoke is a no-op");

    // The token still verifies cryptographically, but the registry half of
    // the gate denies it
    assert!(harness.codec.verify(&session.token).is_ok());
    assert!(!harness.sessions.is_valid(&session.token).await);
}

#[tokio::test]
async fn test_change_password_revokes_other_sessions() {
    let harness = TestHarness::new();
    let first = harness.register_default().await;
    let second = harness.login(PASSWORD).await.expect("second session");

    let credential = harness.credential().await;
    harness
        .auth
        .change_password(&credential.id, PASSWORD, "Bb2#second-pass", &first.token)
        .await
        .expect("change password");

    assert!(harness.sessions.is_valid(&first.token).await);
    assert!(!harness.sessions.is_valid(&second.token).await);

    // Old password is gone, new one works
    assert!(matches!(
        harness.login(PASSWORD).await,
        Err(AuthError::InvalidCredentials)
    ));
    harness.login("Bb2#second-pass").await.expect("login");
}

#[tokio::test]
async fn test_password_history_depth() {
    let harness = TestHarness::new();
    let session = harness.register_default().await;
    let credential_id = harness.credential().await.id;

    let ladder = [
        "Bb2#pass-two",
        "Cc3$pass-three",
        "Dd4%pass-four",
        "Ee5^pass-five",
        "Ff6&pass-six",
    ];

    let mut current = PASSWORD.to_string();
    for next in ladder {
        harness
            .auth
            .change_password(&credential_id, &current, next, &session.token)
            .await
            .expect("change password");
        current = next.to_string();
    }

    // Any of the five most recent passwords is rejected
    for recent in ladder {
        let result = harness
            .auth
            .change_password(&credential_id, &current, recent, &session.token)
            .await;
        assert!(matches!(result, Err(AuthError::PasswordReused)));
    }

    // The original password has aged out of the checked window
    harness
        .auth
        .change_password(&credential_id, &current, PASSWORD, &session.token)
        .await
        .expect("original password aged out");
}

#[tokio::test]
async fn test_password_reset_is_single_use_and_revokes_sessions() {
    let harness = TestHarness::new();
    let session = harness.register_default().await;

    harness
        .auth
        .request_password_reset(EMAIL)
        .await
        .expect("request reset");
    let token = harness
        .mailer
        .last_recovery_token()
        .expect("recovery email sent");

    harness
        .auth
        .reset_password(&token, "Bb2#reset-pass")
        .await
        .expect("reset");

    // Every session was revoked
    assert!(!harness.sessions.is_valid(&session.token).await);

    // Second redemption of the same token fails
    let replay = harness.auth.reset_password(&token, "Cc3$reset-again").await;
    assert!(matches!(replay, Err(AuthError::TokenInvalidOrExpired)));

    harness.login("Bb2#reset-pass").await.expect("login");
}

#[tokio::test]
async fn test_reset_request_is_silent_for_unknown_email() {
    let harness = TestHarness::new();
    harness.register_default().await;

    harness
        .auth
        .request_password_reset("stranger@clinic.example")
        .await
        .expect("silent no-op");
    assert!(harness.mailer.last_recovery_token().is_none());
}

#[tokio::test]
async fn test_temporary_password_requires_activation() {
    let harness = TestHarness::new();
    harness
        .register(NATIONAL_ID, EMAIL, PASSWORD, true)
        .await;

    let result = harness.login(PASSWORD).await;
    assert!(matches!(result, Err(AuthError::AccountNotActivated)));

    let token = harness
        .mailer
        .last_activation_token()
        .expect("activation email sent");
    harness
        .auth
        .activate_account(&token, "Bb2#chosen-pass")
        .await
        .expect("activate");

    let credential = harness.credential().await;
    assert!(credential.email_verified);
    assert!(!credential.temporary_password);

    harness.login("Bb2#chosen-pass").await.expect("login");
}

#[tokio::test]
async fn test_verify_email_flow() {
    let harness = TestHarness::new();
    harness.register_default().await;
    assert!(!harness.credential().await.email_verified);

    let token = harness
        .mailer
        .last_activation_token()
        .expect("verification email sent");
    harness.auth.verify_email(&token).await.expect("verify");

    assert!(harness.credential().await.email_verified);

    // The token is single-use
    let replay = harness.auth.verify_email(&token).await;
    assert!(matches!(replay, Err(AuthError::TokenInvalidOrExpired)));
}

#[tokio::test]
async fn test_two_factor_send_quota() {
    let harness = TestHarness::new();
    harness.register_default().await;
    let credential = harness.credential().await;

    // Three sends go through, spaced past the minimum interval
    for _ in 0..3 {
        harness
            .two_factor
            .request_code(&credential)
            .await
            .expect("code sent");
        harness
            .quotas
            .shift_back(&credential.id, Duration::minutes(2))
            .await;
    }

    // Fourth within the 15-minute window is denied with a wait hint
    let denied = harness.two_factor.request_code(&credential).await;
    match denied {
        Err(AuthError::RateLimitExceeded { retry_after_secs }) => {
            assert!(retry_after_secs > 0 && retry_after_secs <= 15 * 60);
        }
        other => panic!("expected rate limit, got {other:?}"),
    }

    // Once the block and the window have passed, sends resume
    harness
        .quotas
        .shift_back(&credential.id, Duration::minutes(17))
        .await;
    harness
        .two_factor
        .request_code(&credential)
        .await
        .expect("window reset");
}

#[tokio::test]
async fn test_two_factor_send_failure_charges_no_quota() {
    let harness = TestHarness::new();
    harness.register_default().await;
    let credential = harness.credential().await;

    harness.mailer.fail_next();
    let failed = harness.two_factor.request_code(&credential).await;
    assert!(matches!(failed, Err(AuthError::Email(_))));

    // The failed dispatch consumed no budget, not even the minimum spacing
    harness
        .two_factor
        .request_code(&credential)
        .await
        .expect("retry goes through");
}

#[tokio::test]
async fn test_two_factor_enable_with_emailed_code() {
    let harness = TestHarness::new();
    harness.register_default().await;
    let credential = harness.credential().await;

    harness
        .two_factor
        .request_code(&credential)
        .await
        .expect("code sent");
    let code = harness
        .mailer
        .last_two_factor_code()
        .expect("code email sent");

    // A wrong code is counted but does not enable
    let wrong_code = if code == "000000" { "000001" } else { "000000" };
    let wrong = harness
        .two_factor
        .enable(&credential.id, wrong_code)
        .await;
    assert!(matches!(wrong, Err(AuthError::TokenInvalidOrExpired)));

    // The wrong attempt did not consume the real code; request a fresh one
    // is unnecessary
    harness
        .two_factor
        .enable(&credential.id, &code)
        .await
        .expect("enable");
    assert!(harness
        .two_factor
        .is_enabled(&credential.id)
        .await
        .expect("query"));
}
