pub mod audit;
pub mod auth;
pub mod credential;
pub mod errors;
pub mod password_history;
pub mod recovery;
pub mod session;
pub mod two_factor;

pub use errors::AuthError;
