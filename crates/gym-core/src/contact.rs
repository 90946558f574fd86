//! # Contact Fields
//!
//! `Email` and `Phone` newtypes with validated constructors. An `Email`
//! is stored in its normalized (trimmed, lowercased) form, which makes
//! equality and uniqueness case-insensitive.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum stored email length.
pub const MAX_EMAIL_LEN: usize = 255;

/// Maximum stored phone length.
pub const MAX_PHONE_LEN: usize = 20;

/// A normalized email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.chars().count() > MAX_EMAIL_LEN {
            return Err(CoreError::InvalidEmail(format!(
                "must be at most {MAX_EMAIL_LEN} characters"
            )));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidEmail("must not contain whitespace".into()));
        }
        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(CoreError::InvalidEmail("missing '@'".into()));
        };
        if local.is_empty() || domain.contains('@') {
            return Err(CoreError::InvalidEmail("malformed local part".into()));
        }
        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
            return Err(CoreError::InvalidEmail("malformed domain".into()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

/// A phone number: optional leading `+`, then digits, spaces, dashes and
/// parentheses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        if raw.chars().count() > MAX_PHONE_LEN {
            return Err(CoreError::InvalidPhone(format!(
                "must be at most {MAX_PHONE_LEN} characters"
            )));
        }
        let body = raw.strip_prefix('+').unwrap_or(raw);
        let allowed = |c: char| c.is_ascii_digit() || c.is_whitespace() || "-()".contains(c);
        if body.is_empty() || !body.chars().all(allowed) {
            return Err(CoreError::InvalidPhone("invalid phone number format".into()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}
