//! Unit tests for TagError
//!
//! Tests the user-facing messages of each error variant.

use rstest::rstest;
use tagweave::TagError;

/// Test error messages carry their context
#[rstest]
#[case(TagError::InvalidState("Food record must be persisted".into()), "Invalid state: Food record must be persisted")]
#[case(TagError::InvalidArgument("bad lookup".into()), "Invalid argument: bad lookup")]
#[case(TagError::TagNameTooLong { max: 100, len: 120 }, "Tag name too long: maximum 100 characters, got 120")]
#[case(TagError::TagNotFound("id 3".into()), "Tag not found: id 3")]
#[case(TagError::UnknownContentType("Pet".into()), "No object loader registered for content type 'Pet'")]
#[case(TagError::ConfigError("tag_table".into()), "Configuration error: tag_table")]
fn test_error_display(#[case] error: TagError, #[case] expected: &str) {
	// Act
	let message = error.to_string();

	// Assert
	assert_eq!(message, expected);
}

/// Test errors work with the standard error trait
#[test]
fn test_error_is_std_error() {
	// Arrange
	let error: Box<dyn std::error::Error + Send + Sync> =
		Box::new(TagError::DatabaseError("connection refused".into()));

	// Assert
	assert_eq!(error.to_string(), "Database error: connection refused");
}
