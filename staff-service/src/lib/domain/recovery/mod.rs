pub mod models;
pub mod ports;
pub mod service;

pub use models::RecoveryToken;
pub use models::RecoveryTokenKind;
pub use service::RecoveryTokens;
