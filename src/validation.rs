//! Input validation for the login screen

use thiserror::Error;

pub const MIN_USERNAME_LENGTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("Nickname cannot be empty")]
    Empty,

    #[error("Nickname must be at least 2 characters")]
    TooShort,

    #[error("Nickname too long (max {max} characters)")]
    TooLong { max: usize },
}

/// Validates a nickname and returns it trimmed.
pub fn validate_username(raw: &str, max_len: usize) -> Result<String, UsernameError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(UsernameError::Empty);
    }

    let len = name.chars().count();
    if len < MIN_USERNAME_LENGTH {
        return Err(UsernameError::TooShort);
    }
    if len > max_len {
        return Err(UsernameError::TooLong { max: max_len });
    }

    Ok(name.to_string())
}

/// Only rooms from the configured list can be joined.
pub fn validate_room<'a>(room: &str, rooms: &'a [String]) -> Option<&'a str> {
    rooms
        .iter()
        .find(|candidate| candidate.as_str() == room)
        .map(String::as_str)
}
