//! Authenticated user profile.
//!
//! # Invariants
//! - `id` and `name` are non-blank.
//! - `email` has one `@` with non-empty local and domain parts and no
//!   whitespace.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+$").expect("valid email regex"));

/// Access level granted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

/// User profile record; also the shape of every user listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    /// Employment start date as sent by the server (ISO-8601 date).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

/// Users listed by the API share the identity shape.
pub type UserRecord = Identity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityValidationError {
    BlankId,
    BlankName,
    InvalidEmail(String),
    Malformed(String),
}

impl Display for IdentityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId => write!(f, "identity id must not be blank"),
            Self::BlankName => write!(f, "identity name must not be blank"),
            Self::InvalidEmail(value) => write!(f, "identity email is invalid: `{value}`"),
            Self::Malformed(details) => write!(f, "identity payload is malformed: {details}"),
        }
    }
}

impl Error for IdentityValidationError {}

impl Identity {
    /// Checks the invariants required before a record may back a session.
    pub fn validate(&self) -> Result<(), IdentityValidationError> {
        if self.id.trim().is_empty() {
            return Err(IdentityValidationError::BlankId);
        }
        if self.name.trim().is_empty() {
            return Err(IdentityValidationError::BlankName);
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(IdentityValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }

    /// Parses and validates a stored or received JSON identity.
    pub fn from_json(raw: &str) -> Result<Self, IdentityValidationError> {
        let identity: Self = serde_json::from_str(raw)
            .map_err(|err| IdentityValidationError::Malformed(err.to_string()))?;
        identity.validate()?;
        Ok(identity)
    }

    /// Serializes to the persisted JSON form.
    pub fn to_json(&self) -> String {
        // Plain string fields and unit enums cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
