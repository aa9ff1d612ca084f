//! Unit tests for TagConfig
//!
//! Tests builder validation and backend detection.

use rstest::rstest;
use tagweave::{DatabaseBackend, TagConfig, TagError};

/// Test the defaults target SQLite with the standard table names
#[test]
fn test_default_config() {
	// Arrange & Act
	let config = TagConfig::default();

	// Assert
	assert_eq!(config.backend(), DatabaseBackend::Sqlite);
	assert_eq!(config.tag_table(), "tags");
	assert_eq!(config.tagged_item_table(), "tagged_items");
	assert_eq!(config.max_name_length(), 100);
	assert_eq!(config.normalizer().normalize("  rust "), "rust");
}

/// Test invalid builder settings are rejected
#[rstest]
#[case(TagConfig::builder().tag_table("tags; drop"))]
#[case(TagConfig::builder().tagged_item_table(""))]
#[case(TagConfig::builder().tagged_item_table("tags"))]
#[case(TagConfig::builder().max_name_length(0))]
#[case(TagConfig::builder().max_create_attempts(0))]
fn test_builder_rejects_invalid(#[case] builder: tagweave::TagConfigBuilder) {
	// Act
	let result = builder.build();

	// Assert
	assert!(matches!(result, Err(TagError::ConfigError(_))));
}

/// Test backend detection from connection URLs
#[rstest]
#[case("sqlite::memory:", DatabaseBackend::Sqlite)]
#[case("sqlite:///tmp/tags.db", DatabaseBackend::Sqlite)]
#[case("postgres://localhost/tags", DatabaseBackend::Postgres)]
#[case("postgresql://localhost/tags", DatabaseBackend::Postgres)]
#[case("mysql://localhost/tags", DatabaseBackend::MySql)]
fn test_backend_from_url(#[case] url: &str, #[case] expected: DatabaseBackend) {
	assert_eq!(DatabaseBackend::from_url(url).unwrap(), expected);
}
