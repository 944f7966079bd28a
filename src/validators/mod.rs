//! Field validation for user directory records.

pub mod email;
pub mod name;
pub mod phone;

pub use email::validate_email;
pub use name::validate_name;
pub use phone::validate_phone;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    EmailEmpty,
    EmailTooLong,
    EmailInvalidFormat,
    NameEmpty,
    NameTooLong,
    PhoneEmpty,
    PhoneInvalidFormat,
    IdEmpty,
    UsernameEmpty,
    PasswordEmpty,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailEmpty => write!(f, "Email cannot be empty"),
            Self::EmailTooLong => write!(f, "Email is too long (max 254 characters)"),
            Self::EmailInvalidFormat => write!(f, "Invalid email format"),
            Self::NameEmpty => write!(f, "Name cannot be empty"),
            Self::NameTooLong => write!(f, "Name is too long (max 100 characters)"),
            Self::PhoneEmpty => write!(f, "Phone number cannot be empty"),
            Self::PhoneInvalidFormat => write!(f, "Invalid phone number format"),
            Self::IdEmpty => write!(f, "User id cannot be empty"),
            Self::UsernameEmpty => write!(f, "Username cannot be empty"),
            Self::PasswordEmpty => write!(f, "Password cannot be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Rejects blank user ids.
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::IdEmpty);
    }
    Ok(())
}
