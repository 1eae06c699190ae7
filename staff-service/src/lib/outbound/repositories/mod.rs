pub mod credential;
pub mod login_attempt;
pub mod memory;
pub mod password_history;
pub mod recovery_token;
pub mod session;
pub mod two_factor;

pub use credential::PostgresCredentialRepository;
pub use login_attempt::PostgresLoginAttemptRepository;
pub use password_history::PostgresPasswordHistoryRepository;
pub use recovery_token::PostgresRecoveryTokenRepository;
pub use session::PostgresSessionRepository;
pub use two_factor::PostgresTwoFactorConfigRepository;
pub use two_factor::PostgresTwoFactorRateLimitRepository;
