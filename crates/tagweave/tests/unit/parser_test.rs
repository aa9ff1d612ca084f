//! Unit tests for tag string parsing
//!
//! Tests the public parser API used by form fields.

use rstest::rstest;
use tagweave::parser::{edit_string_for_tags, parse_tags};

/// Test parsing typical form input
#[rstest]
#[case("red, green, blue", vec!["blue", "green", "red"])]
#[case("red,,  ,green", vec!["green", "red"])]
#[case(r#""new york", boston"#, vec!["boston", "new york"])]
#[case(r#""a, b", "a, b", c"#, vec!["a, b", "c"])]
fn test_parse_form_input(#[case] input: &str, #[case] expected: Vec<&str>) {
	// Act
	let names = parse_tags(input);

	// Assert
	assert_eq!(names, expected);
}

/// Test rendering and re-parsing preserves the name set
#[rstest]
#[case(vec!["rust"])]
#[case(vec!["web dev", "rust"])]
#[case(vec!["one, two", "three"])]
fn test_edit_string_reparses(#[case] names: Vec<&str>) {
	// Arrange
	let mut expected: Vec<String> = names.iter().map(|n| n.to_string()).collect();
	expected.sort();

	// Act
	let rendered = edit_string_for_tags(&names);

	// Assert
	assert_eq!(parse_tags(&rendered), expected);
}
