//! Unit tests for Tag model
//!
//! Tests the Tag constructors, display and serialization.

use rstest::rstest;
use tagweave::{Tag, TagCount};

/// Test Tag::new() keeps the explicit slug
#[rstest]
#[case("rust", "rust")]
#[case("Rust Programming", "rust-prog")]
#[case("web_development", "web_development")]
fn test_tag_new_constructor(#[case] name: &str, #[case] slug: &str) {
	// Arrange & Act
	let tag = Tag::new(name, slug);

	// Assert
	assert_eq!(tag.name, name);
	assert_eq!(tag.slug, slug);
	assert!(tag.id.is_none());
	assert!(!tag.is_saved());
}

/// Test Tag::from_name() derives a URL-safe slug
#[rstest]
#[case("Rust Programming", "rust-programming")]
#[case("C++", "c")]
#[case("  padded  ", "padded")]
#[case("html5", "html5")]
#[case("Café Crème", "cafe-creme")]
fn test_tag_from_name_slug(#[case] name: &str, #[case] expected_slug: &str) {
	// Arrange & Act
	let tag = Tag::from_name(name);

	// Assert
	assert_eq!(tag.name, name);
	assert_eq!(tag.slug, expected_slug);
}

/// Test Tag created_at is initialized
#[test]
fn test_tag_created_at_initialized() {
	// Arrange & Act
	let tag = Tag::new("test", "test");

	// Assert
	assert!(tag.created_at.timestamp() > 0);
}

/// Test Tag displays as its name
#[test]
fn test_tag_display() {
	// Arrange
	let tag = Tag::from_name("Web Development");

	// Act
	let shown = tag.to_string();

	// Assert
	assert_eq!(shown, "Web Development");
}

/// Test Tag serializes every field
#[test]
fn test_tag_serde() {
	// Arrange
	let mut tag = Tag::new("rust", "rust");
	tag.id = Some(7);

	// Act
	let json = serde_json::to_value(&tag).unwrap();
	let back: Tag = serde_json::from_value(json.clone()).unwrap();

	// Assert
	assert_eq!(json["id"], 7);
	assert_eq!(json["name"], "rust");
	assert_eq!(json["slug"], "rust");
	assert_eq!(back.id, Some(7));
	assert_eq!(back.created_at, tag.created_at);
	assert!(back.is_saved());
}

/// Test TagCount carries the tag and its count
#[test]
fn test_tag_count_serde() {
	// Arrange
	let count = TagCount {
		tag: Tag::new("rust", "rust"),
		num_times: 5,
	};

	// Act
	let json = serde_json::to_value(&count).unwrap();

	// Assert
	assert_eq!(json["num_times"], 5);
	assert_eq!(json["tag"]["name"], "rust");
}
