//! Shared handle to the tag store
//!
//! [`TagContext`] pairs a connection pool with a [`TagConfig`]. It is cheap
//! to clone and is the entry point for everything else: the tag store,
//! per-record managers and relation-wide managers.
//!
//! ```rust,no_run
//! use tagweave::{TagContext, Taggable, schema};
//!
//! struct Food {
//!     id: Option<i64>,
//! }
//!
//! impl Taggable for Food {
//!     fn content_type_name() -> &'static str {
//!         "Food"
//!     }
//!
//!     fn object_id(&self) -> Option<i64> {
//!         self.id
//!     }
//! }
//!
//! # async fn example() -> tagweave::Result<()> {
//! let ctx = TagContext::connect("sqlite::memory:").await?;
//! schema::create_tables(&ctx).await?;
//!
//! let apple = Food { id: Some(1) };
//! ctx.manager(&apple).add(["red", "fruit"]).await?;
//! assert_eq!(ctx.manager(&apple).names().await?, vec!["fruit", "red"]);
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Once};

use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

use crate::config::{DatabaseBackend, TagConfig};
use crate::error::{Result, TagError};
use crate::manager::TagManager;
use crate::models::Taggable;
use crate::store::TagStore;

static INIT_DRIVERS: Once = Once::new();

/// Install the sqlx `Any` drivers once per process
pub fn install_drivers() {
	INIT_DRIVERS.call_once(|| {
		sqlx::any::install_default_drivers();
	});
}

/// Pool plus configuration shared by every tagging operation
#[derive(Debug, Clone)]
pub struct TagContext {
	pool: Arc<AnyPool>,
	config: Arc<TagConfig>,
}

impl TagContext {
	/// Wrap an existing pool
	///
	/// The caller is responsible for `config.backend()` matching the pool.
	pub fn new(pool: Arc<AnyPool>, config: TagConfig) -> Self {
		Self {
			pool,
			config: Arc::new(config),
		}
	}

	/// Connect with the default configuration for the URL's backend
	pub async fn connect(url: &str) -> Result<Self> {
		let config = TagConfig::builder()
			.backend(DatabaseBackend::from_url(url)?)
			.build()?;
		Self::connect_with(url, config).await
	}

	/// Connect with an explicit configuration
	///
	/// In-memory SQLite databases live and die with their connection, so the
	/// pool is pinned to a single connection that is never recycled.
	pub async fn connect_with(url: &str, config: TagConfig) -> Result<Self> {
		let backend = DatabaseBackend::from_url(url)?;
		if backend != config.backend() {
			return Err(TagError::ConfigError(format!(
				"configured backend {:?} does not match url backend {:?}",
				config.backend(),
				backend
			)));
		}

		install_drivers();

		let mut options = AnyPoolOptions::new();
		if url.contains(":memory:") {
			options = options
				.min_connections(1)
				.max_connections(1)
				.idle_timeout(None)
				.max_lifetime(None);
		}

		let pool = options
			.connect(url)
			.await
			.map_err(|e| TagError::DatabaseError(format!("Failed to connect: {}", e)))?;

		tracing::debug!(backend = ?backend, "connected tag store");

		Ok(Self::new(Arc::new(pool), config))
	}

	pub fn pool(&self) -> &AnyPool {
		&self.pool
	}

	pub fn config(&self) -> &TagConfig {
		&self.config
	}

	/// Tag vocabulary operations
	pub fn store(&self) -> TagStore<'_> {
		TagStore::new(self)
	}

	/// Manager bound to one record
	pub fn manager<'a, T: Taggable>(&'a self, instance: &'a T) -> TagManager<'a, T> {
		TagManager::bound(self, instance)
	}

	/// Relation-wide manager for a model type
	///
	/// Only aggregate reads and filters are available; mutations fail with
	/// [`TagError::InvalidState`].
	pub fn manager_for<T: Taggable>(&self) -> TagManager<'_, T> {
		TagManager::relation(self)
	}
}
