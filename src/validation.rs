use crate::error::{RosterError, RosterResult};

/// Validates that a string is not blank (empty or whitespace-only).
/// Returns the trimmed string on success.
pub fn non_blank(value: &str, field: &str) -> RosterResult<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        Err(RosterError::BlankField {
            field: field.to_string(),
        })
    } else {
        Ok(trimmed)
    }
}

/// Validates that `end` does not come before `start`. Works for dates and times alike.
pub fn not_before<T: PartialOrd>(start: T, end: T, field: &str) -> RosterResult<()> {
    if end < start {
        Err(RosterError::DateOrder {
            field: field.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Same as [`not_before`] but only checks when both ends are present.
pub fn optional_not_before<T: PartialOrd>(
    start: Option<T>,
    end: Option<T>,
    field: &str,
) -> RosterResult<()> {
    match (start, end) {
        (Some(s), Some(e)) => not_before(s, e, field),
        _ => Ok(()),
    }
}

/// Trims an optional string, returning None if blank.
pub fn trim_optional(value: Option<&str>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
