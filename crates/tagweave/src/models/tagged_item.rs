//! TaggedItem model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::taggable::ContentObject;

/// Association row binding one tag to one content object
///
/// At most one row exists per `(tag_id, content_type, object_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedItem {
	pub id: Option<i64>,
	pub tag_id: i64,
	pub content_type: String,
	pub object_id: i64,
	pub created_at: DateTime<Utc>,
}

impl TaggedItem {
	/// Create an unsaved association
	pub fn new(tag_id: i64, content_type: impl Into<String>, object_id: i64) -> Self {
		Self {
			id: None,
			tag_id,
			content_type: content_type.into(),
			object_id,
			created_at: Utc::now(),
		}
	}

	/// The tagged record this row points at
	pub fn content_object(&self) -> ContentObject {
		ContentObject::new(self.content_type.clone(), self.object_id)
	}
}
