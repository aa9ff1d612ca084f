//! Tag name normalization
//!
//! Names are normalized once, before lookup or creation, so that
//! `" rust "` and `"rust"` address the same tag. Tags are case-sensitive:
//! the default normalizer never changes case.

use std::fmt::Debug;

/// Transforms raw user input into the stored form of a tag name
pub trait Normalizer: Send + Sync + Debug {
	/// Returns the normalized name
	fn normalize(&self, name: &str) -> String;
}

/// Trims surrounding whitespace and leaves everything else untouched
///
/// # Examples
///
/// ```
/// use tagweave::normalizer::{DefaultNormalizer, Normalizer};
///
/// let normalizer = DefaultNormalizer;
/// assert_eq!(normalizer.normalize("  Rust "), "Rust");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNormalizer;

impl Normalizer for DefaultNormalizer {
	fn normalize(&self, name: &str) -> String {
		name.trim().to_string()
	}
}
