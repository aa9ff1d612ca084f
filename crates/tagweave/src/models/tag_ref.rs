//! Tag arguments
//!
//! Managers and filters accept tags in three shapes: a `Tag` object, a raw
//! name, or a raw tag id. [`TagRef`] makes the shape explicit so callers
//! never rely on runtime type inspection.

use super::tag::Tag;

/// A reference to a tag as supplied by a caller
#[derive(Debug, Clone)]
pub enum TagRef {
	Tag(Tag),
	Name(String),
	Id(i64),
}

impl TagRef {
	/// Short label for error messages
	pub(crate) fn kind(&self) -> &'static str {
		match self {
			TagRef::Tag(_) => "tag object",
			TagRef::Name(_) => "tag name",
			TagRef::Id(_) => "tag id",
		}
	}
}

impl From<Tag> for TagRef {
	fn from(tag: Tag) -> Self {
		TagRef::Tag(tag)
	}
}

impl From<&Tag> for TagRef {
	fn from(tag: &Tag) -> Self {
		TagRef::Tag(tag.clone())
	}
}

impl From<String> for TagRef {
	fn from(name: String) -> Self {
		TagRef::Name(name)
	}
}

impl From<&String> for TagRef {
	fn from(name: &String) -> Self {
		TagRef::Name(name.clone())
	}
}

impl From<&str> for TagRef {
	fn from(name: &str) -> Self {
		TagRef::Name(name.to_string())
	}
}

impl From<i64> for TagRef {
	fn from(id: i64) -> Self {
		TagRef::Id(id)
	}
}
