//! Tag name validation

use crate::error::{Result, TagError};

/// Validates an already-normalized tag name
///
/// A valid name is non-empty, at most `max_length` characters long and free
/// of control characters.
///
/// # Examples
///
/// ```
/// use tagweave::validator::validate_tag_name;
///
/// assert!(validate_tag_name("rust", 100).is_ok());
/// assert!(validate_tag_name("", 100).is_err());
/// assert!(validate_tag_name("abcdef", 3).is_err());
/// ```
pub fn validate_tag_name(name: &str, max_length: usize) -> Result<()> {
	if name.is_empty() {
		return Err(TagError::InvalidTagName(
			"tag name must not be empty".to_string(),
		));
	}

	let len = name.chars().count();
	if len > max_length {
		return Err(TagError::TagNameTooLong {
			max: max_length,
			len,
		});
	}

	if name.chars().any(char::is_control) {
		return Err(TagError::InvalidCharacters(name.escape_debug().to_string()));
	}

	Ok(())
}
