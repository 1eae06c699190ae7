use super::errors::PasswordError;

/// Password policy validator.
///
/// A pure predicate over a candidate password. `validate` checks every rule
/// and returns all violations together; it never short-circuits, so callers
/// can report the complete list to the user in one round trip.

/// A single violated password rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    Empty,
    TooShort,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    MissingSymbol,
}

impl PolicyViolation {
    /// Human-readable description of the violated rule.
    pub fn message(&self) -> &'static str {
        match self {
            PolicyViolation::Empty => "password must not be empty",
            PolicyViolation::TooShort => "password must be at least 8 characters long",
            PolicyViolation::MissingUppercase => {
                "password must contain at least one uppercase letter"
            }
            PolicyViolation::MissingLowercase => {
                "password must contain at least one lowercase letter"
            }
            PolicyViolation::MissingDigit => "password must contain at least one digit",
            PolicyViolation::MissingSymbol => {
                "password must contain at least one character that is neither a letter nor a digit"
            }
        }
    }
}

const MIN_LENGTH: usize = 8;

/// Validate a candidate password against every policy rule.
///
/// # Returns
/// All violated rules; an empty vector means the password is acceptable.
/// A blank candidate yields exactly one `Empty` violation.
pub fn validate(candidate: &str) -> Vec<PolicyViolation> {
    if candidate.trim().is_empty() {
        return vec![PolicyViolation::Empty];
    }

    let mut violations = Vec::new();

    if candidate.chars().count() < MIN_LENGTH {
        violations.push(PolicyViolation::TooShort);
    }
    if !candidate.chars().any(|c| c.is_uppercase()) {
        violations.push(PolicyViolation::MissingUppercase);
    }
    if !candidate.chars().any(|c| c.is_lowercase()) {
        violations.push(PolicyViolation::MissingLowercase);
    }
    if !candidate.chars().any(|c| c.is_ascii_digit()) {
        violations.push(PolicyViolation::MissingDigit);
    }
    if !candidate
        .chars()
        .any(|c| !c.is_alphabetic() && !c.is_ascii_digit())
    {
        violations.push(PolicyViolation::MissingSymbol);
    }

    violations
}

/// Enforce the policy, failing with the concatenated violation messages.
///
/// # Errors
/// * `PolicyViolation` - One or more rules are violated
pub fn enforce(candidate: &str) -> Result<(), PasswordError> {
    let violations = validate(candidate);
    if violations.is_empty() {
        return Ok(());
    }

    let messages: Vec<&str> = violations.iter().map(PolicyViolation::message).collect();
    Err(PasswordError::PolicyViolation(messages.join("; ")))
}
