//! Tag model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unique, named label in the shared tag vocabulary
///
/// `name` is case-sensitive and unique; `slug` is the URL-safe form,
/// also unique. Rows are created lazily by [`TagStore::get_or_create`]
/// and are never deleted when their last association goes away.
///
/// [`TagStore::get_or_create`]: crate::store::TagStore::get_or_create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
	/// Primary key, `None` until persisted
	pub id: Option<i64>,
	pub name: String,
	pub slug: String,
	pub created_at: DateTime<Utc>,
}

impl Tag {
	/// Create an unsaved tag with an explicit slug
	///
	/// # Examples
	///
	/// ```
	/// use tagweave::Tag;
	///
	/// let tag = Tag::new("Rust Programming", "rust-prog");
	/// assert_eq!(tag.slug, "rust-prog");
	/// assert!(tag.id.is_none());
	/// ```
	pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
		Self {
			id: None,
			name: name.into(),
			slug: slug.into(),
			created_at: Utc::now(),
		}
	}

	/// Create an unsaved tag whose slug is derived from the name
	///
	/// # Examples
	///
	/// ```
	/// use tagweave::Tag;
	///
	/// let tag = Tag::from_name("Rust Programming");
	/// assert_eq!(tag.slug, "rust-programming");
	/// ```
	pub fn from_name(name: impl Into<String>) -> Self {
		let name = name.into();
		let slug = slug::slugify(&name);
		Self::new(name, slug)
	}

	/// Whether the tag has been persisted
	pub fn is_saved(&self) -> bool {
		self.id.is_some()
	}
}

impl fmt::Display for Tag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)
	}
}

/// A tag annotated with how many associations reference it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCount {
	pub tag: Tag,
	pub num_times: i64,
}
