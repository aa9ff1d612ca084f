//! Taggable trait definition
//!
//! Trait for models that can be tagged. Implement this trait directly
//! or use the `#[taggable]` attribute macro for auto-generation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Trait for models that can be tagged
///
/// Models implementing this trait can be associated with tags via `TaggedItem`.
/// The trait provides the content type discriminator and object identifier
/// needed for the polymorphic many-to-many relationship.
///
/// # Examples
///
/// ```
/// use tagweave::Taggable;
///
/// struct Food {
///     id: Option<i64>,
///     name: String,
/// }
///
/// impl Taggable for Food {
///     fn content_type_name() -> &'static str {
///         "Food"
///     }
///
///     fn object_id(&self) -> Option<i64> {
///         self.id
///     }
/// }
///
/// let food = Food { id: Some(42), name: "apple".to_string() };
/// assert_eq!(food.content_object().unwrap().to_string(), "Food#42");
/// ```
pub trait Taggable {
	/// Returns the content type name used as discriminator in `TaggedItem`
	///
	/// This should be a stable, unique identifier for the model type.
	/// Typically the struct name (e.g., "Food", "Article").
	fn content_type_name() -> &'static str;

	/// Returns the primary key of this instance, `None` while unsaved
	fn object_id(&self) -> Option<i64>;

	/// Association table backing this model's tags
	fn through() -> Through {
		Through::Generic
	}

	/// Polymorphic reference to this instance, `None` while unsaved
	fn content_object(&self) -> Option<ContentObject> {
		self.object_id()
			.map(|id| ContentObject::new(Self::content_type_name(), id))
	}
}

/// Which association table a relation uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Through {
	/// The shared `tagged_items` table keyed by `(content_type, object_id)`
	Generic,
	/// A relation-specific table with an implicit content type
	///
	/// Rows carry `tag_id` and the record key in `object_column`.
	Direct {
		table: String,
		object_column: String,
	},
}

impl Through {
	pub fn direct(table: impl Into<String>, object_column: impl Into<String>) -> Self {
		Through::Direct {
			table: table.into(),
			object_column: object_column.into(),
		}
	}

	pub fn is_generic(&self) -> bool {
		matches!(self, Through::Generic)
	}
}

/// A `(content_type, object_id)` pair identifying any taggable record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentObject {
	pub content_type: String,
	pub object_id: i64,
}

impl ContentObject {
	pub fn new(content_type: impl Into<String>, object_id: i64) -> Self {
		Self {
			content_type: content_type.into(),
			object_id,
		}
	}
}

impl fmt::Display for ContentObject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#{}", self.content_type, self.object_id)
	}
}

/// Primary key types usable as a taggable identity
///
/// Used by the `#[taggable]` macro so the id field may be either a plain
/// `i64` or an `Option<i64>` that stays `None` until the record is saved.
pub trait ObjectIdentity {
	fn object_identity(&self) -> Option<i64>;
}

impl ObjectIdentity for i64 {
	fn object_identity(&self) -> Option<i64> {
		Some(*self)
	}
}

impl ObjectIdentity for Option<i64> {
	fn object_identity(&self) -> Option<i64> {
		*self
	}
}
