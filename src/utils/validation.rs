//! Centralized validation and helper functions.

use crate::core::code::CodeSet;

/// Maximum accepted patient description length in characters (DOS protection)
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Maximum number of codes accepted in one query
pub const MAX_CODES: usize = 256;

/// Maximum length of a single medical code
pub const MAX_CODE_LENGTH: usize = 16;

/// Input validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Patient description is empty")]
    EmptyDescription,
    #[error("Patient description too long: exceeds {MAX_DESCRIPTION_LENGTH} characters")]
    DescriptionTooLong,
    #[error("Patient description contains control characters")]
    InvalidDescription,
    #[error("Invalid medical code: '{0}'")]
    InvalidCode(String),
    #[error("Too many codes: exceeds maximum of {MAX_CODES}")]
    TooManyCodes,
}

/// Check that a patient description is usable and return it trimmed.
///
/// # Errors
///
/// Returns `ValidationError::EmptyDescription` for blank input,
/// `ValidationError::DescriptionTooLong` above the length limit, or
/// `ValidationError::InvalidDescription` if it contains control characters.
pub fn validate_description(description: &str) -> Result<&str, ValidationError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyDescription);
    }

    if trimmed.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong);
    }

    if trimmed.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return Err(ValidationError::InvalidDescription);
    }

    Ok(trimmed)
}

/// Validate that a string looks like a hierarchical medical code.
///
/// # Examples
///
/// ```
/// use trial_matcher::utils::validation::is_valid_code;
///
/// assert!(is_valid_code("C50.911"));
/// assert!(is_valid_code("I10"));
/// assert!(!is_valid_code(".C50"));
/// assert!(!is_valid_code("C50 911"));
/// ```
#[must_use]
pub fn is_valid_code(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_CODE_LENGTH
        && s.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
}

/// Normalize a code to trimmed uppercase.
/// Returns None if the input is not a valid code.
#[must_use]
pub fn normalize_code(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if is_valid_code(trimmed) {
        Some(trimmed.to_ascii_uppercase())
    } else {
        None
    }
}

/// Validate caller-supplied codes into a code set.
///
/// # Errors
///
/// Returns `ValidationError::InvalidCode` for the first malformed code, or
/// `ValidationError::TooManyCodes` if more than [`MAX_CODES`] are given.
pub fn validate_codes<I, S>(codes: I) -> Result<CodeSet, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut set = CodeSet::new();
    for code in codes {
        let code = code.as_ref();
        if code.trim().is_empty() {
            continue;
        }
        let normalized =
            normalize_code(code).ok_or_else(|| ValidationError::InvalidCode(code.to_string()))?;
        set.insert(normalized);
        if set.len() > MAX_CODES {
            return Err(ValidationError::TooManyCodes);
        }
    }
    Ok(set)
}

/// Parse a comma or whitespace separated code list (e.g. `"C50.911, I10"`).
///
/// # Errors
///
/// See [`validate_codes`].
pub fn parse_code_list(list: &str) -> Result<CodeSet, ValidationError> {
    validate_codes(list.split(|c: char| c == ',' || c.is_whitespace()))
}
