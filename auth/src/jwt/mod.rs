pub mod claims;
pub mod errors;
pub mod handler;

pub use claims::BearerClaims;
pub use errors::JwtError;
pub use handler::JwtHandler;
