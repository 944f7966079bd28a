use std::sync::LazyLock;

use regex::Regex;

use super::ValidationError;

/// Digits with optional leading `+` and `-`, `.`, space or parenthesis
/// separators; 7 to 15 digits in total.
#[allow(clippy::unwrap_used)]
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9()\-. ]+$").unwrap());

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::PhoneEmpty);
    }

    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !PHONE_REGEX.is_match(phone) || !(7..=15).contains(&digits) {
        return Err(ValidationError::PhoneInvalidFormat);
    }

    Ok(())
}
