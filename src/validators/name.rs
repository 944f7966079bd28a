use super::ValidationError;

const MAX_NAME_CHARS: usize = 100;

/// Display name of a directory entry; surrounding whitespace is ignored.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::NameEmpty);
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::NameTooLong);
    }

    Ok(())
}
