//! Input validation utilities
//!
//! Rules report a [`Rule`] code plus a human readable message. Failures are
//! collected in [`ValidationErrors`], keyed by field path (`user.name`,
//! `password`, ...).

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Maximum length, in characters, of names and emails
pub const MAX_STRING_LENGTH: usize = 255;

/// Validation rule that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    Required,
    Max,
    Min,
    Email,
    Unique,
    Confirmed,
    Password,
}

impl Rule {
    /// Rule code as exposed to clients
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Max => "max",
            Rule::Min => "min",
            Rule::Email => "email",
            Rule::Unique => "unique",
            Rule::Confirmed => "confirmed",
            Rule::Password => "password",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failed rule on a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub rule: Rule,
    pub message: String,
}

impl FieldError {
    pub fn new(rule: Rule, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

/// Field errors keyed by field path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<FieldError>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`
    pub fn add(&mut self, field: &str, error: FieldError) {
        self.0.entry(field.to_string()).or_default().push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Errors recorded for `field`
    pub fn get(&self, field: &str) -> &[FieldError] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `field` failed `rule`
    pub fn has(&self, field: &str, rule: Rule) -> bool {
        self.get(field).iter().any(|e| e.rule == rule)
    }

    /// Field paths with at least one error
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// First error message, used as a summary
    pub fn first_message(&self) -> Option<&str> {
        self.0
            .values()
            .flat_map(|errors| errors.iter())
            .map(|e| e.message.as_str())
            .next()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .flat_map(|(field, errors)| errors.iter().map(move |e| format!("{field}: {}", e.rule)))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), FieldError> {
    if name.trim().is_empty() {
        return Err(FieldError::new(Rule::Required, "The name field is required."));
    }

    if name.chars().count() > MAX_STRING_LENGTH {
        return Err(FieldError::new(
            Rule::Max,
            format!("The name field must not be greater than {MAX_STRING_LENGTH} characters."),
        ));
    }

    Ok(())
}

/// Validate email format
///
/// Uniqueness needs the store and is checked by the caller.
pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if email.trim().is_empty() {
        return Err(FieldError::new(Rule::Required, "The email field is required."));
    }

    if email.chars().count() > MAX_STRING_LENGTH {
        return Err(FieldError::new(
            Rule::Max,
            format!("The email field must not be greater than {MAX_STRING_LENGTH} characters."),
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(FieldError::new(
            Rule::Email,
            "The email field must be a valid email address.",
        ));
    }

    Ok(())
}

/// Check that the confirmation matches the password
pub fn validate_confirmation(password: &str, confirmation: Option<&str>) -> Result<(), FieldError> {
    if confirmation != Some(password) {
        return Err(FieldError::new(
            Rule::Confirmed,
            "The password field confirmation does not match.",
        ));
    }

    Ok(())
}

/// Password strength policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_mixed_case: bool,
    pub require_digit: bool,
    pub require_symbol: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_mixed_case: false,
            require_digit: false,
            require_symbol: false,
        }
    }
}

impl PasswordPolicy {
    /// Policy requiring mixed case, a digit and a symbol
    pub fn strict(min_length: usize) -> Self {
        Self {
            min_length,
            require_mixed_case: true,
            require_digit: true,
            require_symbol: true,
        }
    }

    /// Validate a non-empty password against the policy
    pub fn validate(&self, password: &str) -> Result<(), FieldError> {
        if password.chars().count() < self.min_length {
            return Err(FieldError::new(
                Rule::Min,
                format!(
                    "The password field must be at least {} characters.",
                    self.min_length
                ),
            ));
        }

        let mut has_upper = false;
        let mut has_lower = false;
        let mut has_digit = false;
        let mut has_symbol = false;

        for c in password.chars() {
            if c.is_uppercase() {
                has_upper = true;
            } else if c.is_lowercase() {
                has_lower = true;
            } else if c.is_ascii_digit() {
                has_digit = true;
            } else if !c.is_alphanumeric() {
                has_symbol = true;
            }
        }

        if self.require_mixed_case && !(has_upper && has_lower) {
            return Err(FieldError::new(
                Rule::Password,
                "The password field must contain at least one uppercase and one lowercase letter.",
            ));
        }

        if self.require_digit && !has_digit {
            return Err(FieldError::new(
                Rule::Password,
                "The password field must contain at least one number.",
            ));
        }

        if self.require_symbol && !has_symbol {
            return Err(FieldError::new(
                Rule::Password,
                "The password field must contain at least one symbol.",
            ));
        }

        Ok(())
    }
}
