//! Validated email addresses.
//!
//! Addresses reach the storefront from the admin account in the environment,
//! from upstream customer profiles and from the checkout form. All of them go
//! through [`Email::parse`], including deserialization, so a session can never
//! hold an address that would be rejected at checkout.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Longest accepted address (RFC 5321).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Why an address was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    TooLong,
    #[error("email must look like name@domain")]
    Malformed,
    #[error("email cannot contain whitespace")]
    ContainsWhitespace,
}

/// An email address with a non-empty name and domain around a single `@`.
///
/// ```
/// use hello_shop_core::Email;
///
/// assert!(Email::parse("john@mail.com").is_ok());
/// assert!(Email::parse("john@").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate `s` as an address.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] naming the first problem found.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > MAX_EMAIL_LENGTH {
            return Err(EmailError::TooLong);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::ContainsWhitespace);
        }

        match s.split_once('@') {
            Some((name, domain)) if !name.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(Self(s.to_owned()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_catalog_and_checkout_addresses() {
        for ok in ["john@mail.com", "admin@mail.com", "jane+orders@shop.test", "a@b"] {
            assert_eq!(Email::parse(ok).unwrap().as_str(), ok);
        }
    }

    #[test]
    fn test_rejections() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at-sign"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("@mail.com"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("john@"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("john@a@b"), Err(EmailError::Malformed));
        assert_eq!(
            Email::parse("john doe@mail.com"),
            Err(EmailError::ContainsWhitespace)
        );

        let long = format!("{}@mail.com", "a".repeat(MAX_EMAIL_LENGTH));
        assert_eq!(Email::parse(&long), Err(EmailError::TooLong));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let email: Email = "john@mail.com".parse().unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"john@mail.com\"");
        assert_eq!(email.to_string(), "john@mail.com");
    }

    #[test]
    fn test_deserialization_validates() {
        let email: Email = serde_json::from_str("\"jane@shop.test\"").unwrap();
        assert_eq!(email.as_str(), "jane@shop.test");
        assert!(serde_json::from_str::<Email>("\"not an email\"").is_err());
    }
}
