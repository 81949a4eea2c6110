//! Free-text field bounds, checked before anything reaches the store.
//!
//! Limits match the store's own bean validation so a payload that
//! passes here is never bounced for length server-side.

use crate::error::CoreError;

/// Maximum length for a transition work note.
pub const MAX_NOTE_LENGTH: usize = 500;

/// Maximum length for a rating comment.
pub const MAX_COMMENT_LENGTH: usize = 500;

/// Title length bounds.
pub const TITLE_MIN_LENGTH: usize = 5;
pub const TITLE_MAX_LENGTH: usize = 120;

/// Description length bounds.
pub const DESCRIPTION_MIN_LENGTH: usize = 10;
pub const DESCRIPTION_MAX_LENGTH: usize = 2_000;

/// Maximum length for building and location names.
pub const MAX_PLACE_LENGTH: usize = 120;

/// Validate a transition work note, when one is supplied.
pub fn validate_note(note: &str) -> Result<(), CoreError> {
    if note.len() > MAX_NOTE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Note exceeds maximum length of {MAX_NOTE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a satisfaction rating's star count.
pub fn validate_stars(stars: u8) -> Result<(), CoreError> {
    if !(1..=5).contains(&stars) {
        return Err(CoreError::Validation(format!(
            "Stars must be between 1 and 5, got {stars}"
        )));
    }
    Ok(())
}

/// Validate a rating comment, when one is supplied.
pub fn validate_comment(comment: &str) -> Result<(), CoreError> {
    if comment.len() > MAX_COMMENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Comment exceeds maximum length of {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a new ticket's title.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.len() < TITLE_MIN_LENGTH || trimmed.len() > TITLE_MAX_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title must be between {TITLE_MIN_LENGTH} and {TITLE_MAX_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a new ticket's description.
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    let trimmed = description.trim();
    if trimmed.len() < DESCRIPTION_MIN_LENGTH || trimmed.len() > DESCRIPTION_MAX_LENGTH {
        return Err(CoreError::Validation(format!(
            "Description must be between {DESCRIPTION_MIN_LENGTH} and {DESCRIPTION_MAX_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a building or location name. `field` names the offender in
/// the error message.
pub fn validate_place(field: &str, value: &str) -> Result<(), CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be blank")));
    }
    if trimmed.len() > MAX_PLACE_LENGTH {
        return Err(CoreError::Validation(format!(
            "{field} exceeds maximum length of {MAX_PLACE_LENGTH} characters"
        )));
    }
    Ok(())
}
