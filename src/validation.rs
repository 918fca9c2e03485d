//! # Form Validation
//!
//! Every create/update payload implements [`Validate`]. Screens run it before a
//! mutation is sent, so a request the backend would reject for shape reasons
//! never leaves the process.

/// A form field that failed validation.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be at most {max} characters (got {found})")]
    TooLong {
        field: &'static str,
        max: usize,
        found: usize,
    },
    #[error("{field} must have {expected} digits (got {found})")]
    Digits {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{field} {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
}

/// Checks a payload before it is sent.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

/// Length limit in characters, not bytes.
pub fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let found = value.trim().chars().count();
    if found > max {
        return Err(ValidationError::TooLong { field, max, found });
    }
    Ok(())
}

pub fn optional_max_len(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| max_len(field, v, max))
}

/// Document numbers may be typed with dots, dashes and spaces; only the digits count.
pub fn digits(field: &'static str, value: &str, expected: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    let separators = |c: char| matches!(c, '.' | '-' | ' ' | '/');
    if value.chars().any(|c| !c.is_ascii_digit() && !separators(c)) {
        return Err(ValidationError::Digits {
            field,
            expected,
            found: value.chars().filter(char::is_ascii_digit).count(),
        });
    }
    let found = value.chars().filter(char::is_ascii_digit).count();
    if found != expected {
        return Err(ValidationError::Digits {
            field,
            expected,
            found,
        });
    }
    Ok(())
}
