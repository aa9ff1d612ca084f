//! Model definitions for the tagging engine
//!
//! This module contains the core data models:
//! - `Tag`: Core tag entity with name and slug
//! - `TaggedItem`: Association row binding a tag to a content object
//! - `Taggable`: Trait for host records that can be tagged
//! - `ContentObject`: Polymorphic `(content_type, object_id)` reference
//! - `TagRef`: Tag argument accepted by managers and filters

pub mod tag;
pub mod tag_ref;
pub mod taggable;
pub mod tagged_item;

pub use tag::{Tag, TagCount};
pub use tag_ref::TagRef;
pub use taggable::{ContentObject, ObjectIdentity, Taggable, Through};
pub use tagged_item::TaggedItem;
