use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::credential::errors::CredentialIdError;
use crate::domain::credential::errors::EmailError;
use crate::domain::credential::errors::NationalIdError;
use crate::domain::credential::errors::StaffRoleError;

/// Credential aggregate entity.
///
/// The authentication-relevant record for one staff member. Owned by the
/// orchestrator; mutated on register, login success/failure, password change,
/// and activation.
#[derive(Debug, Clone)]
pub struct Credential {
    pub id: CredentialId,
    pub national_id: NationalId,
    pub email: EmailAddress,
    pub full_name: String,
    pub password_hash: String,
    pub role: StaffRole,
    pub active: bool,
    pub locked_until: Option<DateTime<Utc>>,
    pub failed_attempts: i32,
    pub email_verified: bool,
    pub temporary_password: bool,
    pub last_password_change: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    /// Build a fresh credential for registration.
    ///
    /// Starts active, unverified, with no lockout and no failed attempts.
    pub fn new(
        national_id: NationalId,
        email: EmailAddress,
        full_name: String,
        password_hash: String,
        role: StaffRole,
        temporary_password: bool,
    ) -> Self {
        Self {
            id: CredentialId::new(),
            national_id,
            email,
            full_name,
            password_hash,
            role,
            active: true,
            locked_until: None,
            failed_attempts: 0,
            email_verified: false,
            temporary_password,
            last_password_change: None,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Credential unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CredentialId(pub Uuid);

impl CredentialId {
    /// Generate a new random credential ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a credential ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, CredentialIdError> {
        Uuid::parse_str(s)
            .map(CredentialId)
            .map_err(|e| CredentialIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for CredentialId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// National id value type
///
/// The unique person identifier used as the login username. Normalized to
/// digits only; separators (`.`, `-`) are stripped on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NationalId(String);

impl NationalId {
    const LENGTH: usize = 11;

    /// Create a new validated national id.
    ///
    /// # Errors
    /// * `Empty` - Input is blank
    /// * `InvalidCharacters` - Contains characters other than digits and separators
    /// * `WrongLength` - Not exactly 11 digits after normalization
    pub fn new(raw: impl AsRef<str>) -> Result<Self, NationalIdError> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(NationalIdError::Empty);
        }

        let digits: String = raw.chars().filter(|c| *c != '.' && *c != '-').collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(NationalIdError::InvalidCharacters);
        }
        if digits.len() != Self::LENGTH {
            return Err(NationalIdError::WrongLength {
                expected: Self::LENGTH,
                actual: digits.len(),
            });
        }

        Ok(Self(digits))
    }

    /// Get the normalized national id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Staff role tag.
///
/// Closed enumeration; `Caregiver` is the least-privileged tier and the
/// default for registrations that do not specify a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffRole {
    Admin,
    Coordinator,
    Caregiver,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Admin => "admin",
            StaffRole::Coordinator => "coordinator",
            StaffRole::Caregiver => "caregiver",
        }
    }
}

impl Default for StaffRole {
    fn default() -> Self {
        StaffRole::Caregiver
    }
}

impl FromStr for StaffRole {
    type Err = StaffRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(StaffRole::Admin),
            "coordinator" => Ok(StaffRole::Coordinator),
            "caregiver" => Ok(StaffRole::Caregiver),
            other => Err(StaffRoleError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_national_id_normalizes_separators() {
        let id = NationalId::new("123.456.789-01").expect("valid id");
        assert_eq!(id.as_str(), "12345678901");
    }

    #[test]
    fn test_national_id_rejects_blank() {
        assert_eq!(NationalId::new("  "), Err(NationalIdError::Empty));
    }

    #[test]
    fn test_national_id_rejects_letters() {
        assert_eq!(
            NationalId::new("1234567890a"),
            Err(NationalIdError::InvalidCharacters)
        );
    }

    #[test]
    fn test_national_id_rejects_wrong_length() {
        assert_eq!(
            NationalId::new("12345"),
            Err(NationalIdError::WrongLength {
                expected: 11,
                actual: 5
            })
        );
    }

    #[test]
    fn test_staff_role_round_trip() {
        for role in [StaffRole::Admin, StaffRole::Coordinator, StaffRole::Caregiver] {
            assert_eq!(role.as_str().parse::<StaffRole>(), Ok(role));
        }
        assert!("janitor".parse::<StaffRole>().is_err());
    }

    #[test]
    fn test_default_role_is_least_privileged() {
        assert_eq!(StaffRole::default(), StaffRole::Caregiver);
    }
}
