//! Total-count extraction from `Content-Range` style headers.
//!
//! The backend reports the exact row count only through a header shaped like
//! `0-9/42` (a window of rows out of 42) or `*/42` (no rows returned). A missing
//! or garbled header must not break the list, so callers use
//! [`total_count_or_zero`] and render an empty state instead.

use tracing::debug;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CountHeaderError {
    #[error("Count header missing")]
    Missing,
    #[error("Malformed count header: {0:?}")]
    Malformed(String),
}

/// Parses the total after the slash of a `Content-Range` value.
pub fn parse_content_range(value: &str) -> Result<u64, CountHeaderError> {
    let malformed = || CountHeaderError::Malformed(value.to_string());
    let (range, total) = value.trim().rsplit_once('/').ok_or_else(malformed)?;

    let range_ok = range == "*"
        || range
            .split_once('-')
            .is_some_and(|(start, end)| start.parse::<u64>().is_ok() && end.parse::<u64>().is_ok());
    if !range_ok {
        return Err(malformed());
    }
    total.parse::<u64>().map_err(|_| malformed())
}

/// Total count from an optional header value, degrading to 0.
pub fn total_count_or_zero(value: Option<&str>) -> u64 {
    match value.ok_or(CountHeaderError::Missing).and_then(parse_content_range) {
        Ok(total) => total,
        Err(e) => {
            debug!(error = %e, "Count unavailable, assuming 0");
            0
        }
    }
}
