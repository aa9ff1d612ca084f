//! # tagweave
//!
//! Polymorphic tagging for SQL-backed records.
//!
//! Any record type can carry tags by implementing [`Taggable`], by hand or
//! with the `#[taggable]` attribute. Tags live in one shared vocabulary
//! table; associations reference records by `(content_type, object_id)` so a
//! single association table serves every model.
//!
//! ## Features
//!
//! - [`TagStore`]: race-safe `get_or_create` with unique slug allocation
//! - [`TagManager`]: add / remove / set / clear tags on one record
//! - Aggregates: [`TagManager::most_common`] and [`TagManager::similar_objects`]
//!   with batched object loading through an [`ObjectRegistry`]
//! - [`TagFilter`]: `tags__in` style lookups rendered as sea-query subqueries
//! - [`parser`]: comma-separated tag strings for form fields
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tagweave::prelude::*;
//! use tagweave::schema;
//!
//! #[taggable]
//! pub struct Food {
//!     pub id: Option<i64>,
//!     pub name: String,
//! }
//!
//! # async fn example() -> tagweave::Result<()> {
//! let ctx = TagContext::connect("sqlite::memory:").await?;
//! schema::create_tables(&ctx).await?;
//!
//! let apple = Food { id: Some(1), name: "apple".to_string() };
//! apple.tags(&ctx).set(["fruit", "red"]).await?;
//!
//! let popular = ctx.manager_for::<Food>().most_common().await?;
//! assert_eq!(popular.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod manager;
pub mod models;
pub mod normalizer;
pub mod parser;
pub mod query;
pub mod registry;
pub mod schema;
pub mod store;
pub mod validator;

mod through;

pub use config::{DatabaseBackend, TagConfig, TagConfigBuilder};
pub use context::TagContext;
pub use error::{Result, TagError};
pub use manager::{SimilarObject, TagManager};
pub use models::{ContentObject, ObjectIdentity, Tag, TagCount, TagRef, Taggable, TaggedItem, Through};
pub use normalizer::{DefaultNormalizer, Normalizer};
pub use query::TagFilter;
pub use registry::{ObjectLoader, ObjectRegistry, TableLoader};
pub use store::TagStore;

#[cfg(feature = "macros")]
pub use tagweave_macros::taggable;

/// Prelude module for convenient imports
pub mod prelude {
	pub use crate::context::TagContext;
	pub use crate::error::{Result, TagError};
	pub use crate::manager::TagManager;
	pub use crate::models::{Tag, TagRef, Taggable, TaggedItem};
	pub use crate::query::TagFilter;
	pub use crate::registry::{ObjectRegistry, TableLoader};
	#[cfg(feature = "macros")]
	pub use tagweave_macros::taggable;
}
