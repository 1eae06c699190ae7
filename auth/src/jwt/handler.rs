use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::BearerClaims;
use super::errors::JwtError;

/// Stateless bearer token codec.
///
/// Issues and verifies compact three-part signed tokens
/// (header.payload.signature, base64url) using HS256 (HMAC with SHA-256).
///
/// Verification checks signature integrity and expiry only. The codec has no
/// knowledge of revocation: a revoked session's token still verifies here.
/// Callers must additionally consult the session registry before treating a
/// token as authorization.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a new codec with a shared secret key.
    ///
    /// The secret should be at least 256 bits (32 bytes) for HS256 and come
    /// from configuration, never from code.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Issue a signed bearer token for a subject.
    ///
    /// # Arguments
    /// * `subject` - The credential's national id
    /// * `ttl_seconds` - Token lifetime in seconds
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn issue(&self, subject: &str, ttl_seconds: i64) -> Result<String, JwtError> {
        let claims = BearerClaims::for_subject(subject, ttl_seconds);
        self.encode(&claims)
    }

    /// Encode claims into a signed token.
    pub fn encode(&self, claims: &BearerClaims) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// Expiry is strict: zero leeway, compared against the current time.
    ///
    /// # Errors
    /// * `TokenExpired` - The `exp` claim has passed
    /// * `InvalidToken` - Signature mismatch or malformed token
    pub fn verify(&self, token: &str) -> Result<BearerClaims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<BearerClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                    _ => JwtError::InvalidToken(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    #[test]
    fn test_issue_and_verify() {
        let codec = JwtHandler::new(SECRET);

        let token = codec.issue("12345678901", 3600).expect("Failed to issue");
        assert_eq!(token.split('.').count(), 3);

        let claims = codec.verify(&token).expect("Failed to verify");
        assert_eq!(claims.sub, "12345678901");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let codec = JwtHandler::new(SECRET);

        let result = codec.verify("invalid.token.here");
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let codec1 = JwtHandler::new(b"secret1_at_least_32_bytes_long_key!");
        let codec2 = JwtHandler::new(b"secret2_at_least_32_bytes_long_key!");

        let token = codec1.issue("12345678901", 3600).expect("Failed to issue");

        let result = codec2.verify(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_rejects_expired() {
        let codec = JwtHandler::new(SECRET);

        // Already expired at issue time
        let claims = BearerClaims::for_subject("12345678901", -10);
        let token = codec.encode(&claims).expect("Failed to encode");

        let result = codec.verify(&token);
        assert!(matches!(result, Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let codec = JwtHandler::new(SECRET);

        let token = codec.issue("12345678901", 3600).expect("Failed to issue");
        let mut parts: Vec<&str> = token.split('.').collect();

        let other = codec.issue("10987654321", 3600).expect("Failed to issue");
        let other_parts: Vec<&str> = other.split('.').collect();
        parts[1] = other_parts[1];

        let spliced = parts.join(".");
        assert!(codec.verify(&spliced).is_err());
    }
}
