//! Comma-separated tag strings
//!
//! Forms edit a record's tags as one text field. [`edit_string_for_tags`]
//! renders the current names into that field and [`parse_tags`] turns the
//! submitted value back into individual names.
//!
//! ```
//! use tagweave::parser::{edit_string_for_tags, parse_tags};
//!
//! let names = parse_tags(r#"rust, "async, await", web dev"#);
//! assert_eq!(names, vec!["async, await", "rust", "web dev"]);
//!
//! assert_eq!(edit_string_for_tags(&names), r#""async, await", rust, web dev"#);
//! ```

use std::collections::BTreeSet;

/// Split a comma-separated string into tag names
///
/// Segments are trimmed and empty segments dropped. Text between double
/// quotes is taken verbatim, so a quoted segment may contain commas; the
/// quote characters themselves are removed. Inside quotes `""` stands for
/// one literal `"`. An unterminated quote extends to the end of the input.
/// The result is de-duplicated and sorted.
pub fn parse_tags(input: &str) -> Vec<String> {
	let mut names = BTreeSet::new();
	let mut current = String::new();
	let mut in_quotes = false;
	let mut chars = input.chars().peekable();

	while let Some(c) = chars.next() {
		match c {
			'"' if in_quotes && chars.peek() == Some(&'"') => {
				chars.next();
				current.push('"');
			}
			'"' => in_quotes = !in_quotes,
			',' if !in_quotes => {
				push_name(&mut names, &current);
				current.clear();
			}
			_ => current.push(c),
		}
	}
	push_name(&mut names, &current);

	names.into_iter().collect()
}

fn push_name(names: &mut BTreeSet<String>, segment: &str) {
	let name = segment.trim();
	if !name.is_empty() {
		names.insert(name.to_string());
	}
}

/// Render tag names as a sorted, comma-separated string
///
/// Names containing a comma or a double quote are wrapped in double quotes,
/// with embedded quotes doubled, so that [`parse_tags`] reads them back
/// unchanged.
pub fn edit_string_for_tags<S: AsRef<str>>(names: &[S]) -> String {
	let mut sorted: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
	sorted.sort_unstable();
	sorted.dedup();

	sorted
		.into_iter()
		.map(|name| {
			if name.contains([',', '"']) {
				format!("\"{}\"", name.replace('"', "\"\""))
			} else {
				name.to_string()
			}
		})
		.collect::<Vec<_>>()
		.join(", ")
}
