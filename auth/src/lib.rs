//! Authentication primitives library
//!
//! Provides the two pure building blocks of the staff-management auth core:
//! - Password handling: Argon2id hashing and the password policy validator
//! - Bearer token codec: stateless signed tokens (JWT/HS256)
//!
//! Both are deliberately stateless. Revocation, lockout, and rate limiting
//! are stateful concerns layered on top by the service that uses this crate.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("Aa1@abcd").unwrap();
//! assert!(hasher.verify("Aa1@abcd", &hash).unwrap());
//! ```
//!
//! ## Password Policy
//! ```
//! use auth::password::policy;
//!
//! assert!(policy::validate("Aa1@abcd").is_empty());
//! assert!(!policy::validate("Aa1@a").is_empty());
//! ```
//!
//! ## Bearer Tokens
//! ```
//! use auth::{BearerClaims, JwtHandler};
//!
//! let codec = JwtHandler::new(b"secret_key_at_least_32_bytes_long!");
//! let token = codec.issue("12345678901", 3600).unwrap();
//! let claims: BearerClaims = codec.verify(&token).unwrap();
//! assert_eq!(claims.sub, "12345678901");
//! ```

pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use jwt::BearerClaims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::policy::PolicyViolation;
pub use password::PasswordError;
pub use password::PasswordHasher;
