use thiserror::Error;

/// Errors that can occur in the tagging engine
#[derive(Debug, Error)]
pub enum TagError {
	/// Operation is not allowed in the manager's current state
	///
	/// Raised when tags are mutated on a record that has no persisted
	/// identity, or through a relation-wide manager.
	#[error("Invalid state: {0}")]
	InvalidState(String),

	/// Argument rejected before touching the store
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// Tag name is invalid
	#[error("Tag name is invalid: {0}")]
	InvalidTagName(String),

	/// Tag name exceeds maximum length
	#[error("Tag name too long: maximum {max} characters, got {len}")]
	TagNameTooLong { max: usize, len: usize },

	/// Tag name contains invalid characters
	#[error("Tag name contains invalid characters: {0}")]
	InvalidCharacters(String),

	/// Tag not found
	#[error("Tag not found: {0}")]
	TagNotFound(String),

	/// No loader registered for a content type
	#[error("No object loader registered for content type '{0}'")]
	UnknownContentType(String),

	/// Database error
	#[error("Database error: {0}")]
	DatabaseError(String),

	/// Transaction error
	#[error("Transaction error: {0}")]
	TransactionError(String),

	/// Configuration error
	#[error("Configuration error: {0}")]
	ConfigError(String),
}

/// Result type for tagging operations
pub type Result<T> = std::result::Result<T, TagError>;

/// Returns true when `err` is a unique-constraint violation reported by the store
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
	match err {
		sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
		_ => false,
	}
}
