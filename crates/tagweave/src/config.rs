//! Configuration for the tagging engine
//!
//! [`TagConfig`] carries everything that varies between deployments: which
//! SQL dialect to emit, the table names, name/slug bounds and the
//! normalizer applied to incoming tag names.
//!
//! ```
//! use tagweave::config::{DatabaseBackend, TagConfig};
//!
//! let config = TagConfig::builder()
//!     .backend(DatabaseBackend::Postgres)
//!     .tag_table("taggit_tag")
//!     .tagged_item_table("taggit_taggeditem")
//!     .max_name_length(50)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.tag_table(), "taggit_tag");
//! assert_eq!(config.max_name_length(), 50);
//! ```

use std::sync::Arc;

use sea_query::{
	IndexCreateStatement, MysqlQueryBuilder, PostgresQueryBuilder, QueryStatementWriter,
	SchemaStatementBuilder, SqliteQueryBuilder,
};

use crate::error::{Result, TagError};
use crate::normalizer::{DefaultNormalizer, Normalizer};

/// SQL dialect used when rendering statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseBackend {
	#[default]
	Sqlite,
	Postgres,
	MySql,
}

impl DatabaseBackend {
	/// Detect the backend from a connection URL
	///
	/// # Examples
	///
	/// ```
	/// use tagweave::config::DatabaseBackend;
	///
	/// assert_eq!(DatabaseBackend::from_url("sqlite::memory:").unwrap(), DatabaseBackend::Sqlite);
	/// assert_eq!(DatabaseBackend::from_url("postgres://localhost/db").unwrap(), DatabaseBackend::Postgres);
	/// assert!(DatabaseBackend::from_url("redis://localhost").is_err());
	/// ```
	pub fn from_url(url: &str) -> Result<Self> {
		if url.starts_with("sqlite:") {
			Ok(Self::Sqlite)
		} else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
			Ok(Self::Postgres)
		} else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
			Ok(Self::MySql)
		} else {
			Err(TagError::ConfigError(format!(
				"unsupported database url scheme: {}",
				url.split(':').next().unwrap_or_default()
			)))
		}
	}

	/// Build query SQL string for this backend
	pub(crate) fn build_sql<T>(&self, statement: &T) -> String
	where
		T: QueryStatementWriter,
	{
		match self {
			DatabaseBackend::Postgres => statement.to_string(PostgresQueryBuilder),
			DatabaseBackend::MySql => statement.to_string(MysqlQueryBuilder),
			DatabaseBackend::Sqlite => statement.to_string(SqliteQueryBuilder),
		}
	}

	/// Build table SQL string for this backend
	pub(crate) fn build_table_sql<T>(&self, statement: &T) -> String
	where
		T: SchemaStatementBuilder,
	{
		match self {
			DatabaseBackend::Postgres => statement.to_string(PostgresQueryBuilder),
			DatabaseBackend::MySql => statement.to_string(MysqlQueryBuilder),
			DatabaseBackend::Sqlite => statement.to_string(SqliteQueryBuilder),
		}
	}

	/// Build index SQL string for this backend
	pub(crate) fn build_index_sql(&self, statement: &IndexCreateStatement) -> String {
		match self {
			DatabaseBackend::Postgres => statement.to_string(PostgresQueryBuilder),
			DatabaseBackend::MySql => statement.to_string(MysqlQueryBuilder),
			DatabaseBackend::Sqlite => statement.to_string(SqliteQueryBuilder),
		}
	}
}

/// Engine configuration
///
/// Build with [`TagConfig::builder`]; [`TagConfig::default`] targets SQLite
/// with the `tags` / `tagged_items` tables.
#[derive(Debug, Clone)]
pub struct TagConfig {
	backend: DatabaseBackend,
	tag_table: String,
	tagged_item_table: String,
	max_name_length: usize,
	max_slug_length: usize,
	max_create_attempts: usize,
	normalizer: Arc<dyn Normalizer>,
}

impl Default for TagConfig {
	fn default() -> Self {
		Self {
			backend: DatabaseBackend::Sqlite,
			tag_table: "tags".to_string(),
			tagged_item_table: "tagged_items".to_string(),
			max_name_length: 100,
			max_slug_length: 100,
			max_create_attempts: 5,
			normalizer: Arc::new(DefaultNormalizer),
		}
	}
}

impl TagConfig {
	/// Start building a configuration from the defaults
	pub fn builder() -> TagConfigBuilder {
		TagConfigBuilder {
			config: TagConfig::default(),
		}
	}

	pub fn backend(&self) -> DatabaseBackend {
		self.backend
	}

	/// Name of the table holding tag rows
	pub fn tag_table(&self) -> &str {
		&self.tag_table
	}

	/// Name of the shared polymorphic association table
	pub fn tagged_item_table(&self) -> &str {
		&self.tagged_item_table
	}

	pub fn max_name_length(&self) -> usize {
		self.max_name_length
	}

	pub fn max_slug_length(&self) -> usize {
		self.max_slug_length
	}

	/// How many insert attempts `get_or_create` makes before giving up on slug allocation
	pub fn max_create_attempts(&self) -> usize {
		self.max_create_attempts
	}

	pub fn normalizer(&self) -> &dyn Normalizer {
		self.normalizer.as_ref()
	}
}

/// Builder for [`TagConfig`]
#[derive(Debug, Clone)]
pub struct TagConfigBuilder {
	config: TagConfig,
}

impl TagConfigBuilder {
	pub fn backend(mut self, backend: DatabaseBackend) -> Self {
		self.config.backend = backend;
		self
	}

	pub fn tag_table(mut self, table: impl Into<String>) -> Self {
		self.config.tag_table = table.into();
		self
	}

	pub fn tagged_item_table(mut self, table: impl Into<String>) -> Self {
		self.config.tagged_item_table = table.into();
		self
	}

	pub fn max_name_length(mut self, len: usize) -> Self {
		self.config.max_name_length = len;
		self
	}

	pub fn max_slug_length(mut self, len: usize) -> Self {
		self.config.max_slug_length = len;
		self
	}

	pub fn max_create_attempts(mut self, attempts: usize) -> Self {
		self.config.max_create_attempts = attempts;
		self
	}

	pub fn normalizer(mut self, normalizer: impl Normalizer + 'static) -> Self {
		self.config.normalizer = Arc::new(normalizer);
		self
	}

	/// Validate and produce the configuration
	pub fn build(self) -> Result<TagConfig> {
		let config = self.config;

		validate_identifier("tag_table", &config.tag_table)?;
		validate_identifier("tagged_item_table", &config.tagged_item_table)?;
		if config.tag_table == config.tagged_item_table {
			return Err(TagError::ConfigError(
				"tag_table and tagged_item_table must differ".to_string(),
			));
		}
		if config.max_name_length == 0 {
			return Err(TagError::ConfigError(
				"max_name_length must be positive".to_string(),
			));
		}
		if config.max_slug_length == 0 {
			return Err(TagError::ConfigError(
				"max_slug_length must be positive".to_string(),
			));
		}
		if config.max_create_attempts == 0 {
			return Err(TagError::ConfigError(
				"max_create_attempts must be at least 1".to_string(),
			));
		}

		Ok(config)
	}
}

/// Table and column names are interpolated into DDL, so keep them to plain identifiers
pub(crate) fn validate_identifier(field: &str, value: &str) -> Result<()> {
	let mut chars = value.chars();
	let valid = match chars.next() {
		Some(first) => {
			(first.is_ascii_alphabetic() || first == '_')
				&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
		}
		None => false,
	};

	if valid {
		Ok(())
	} else {
		Err(TagError::ConfigError(format!(
			"{} must be a plain SQL identifier, got '{}'",
			field, value
		)))
	}
}
