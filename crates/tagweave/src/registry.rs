//! Content type registry
//!
//! Association rows only store `(content_type, object_id)`. To turn those
//! references back into host objects, each content type registers an
//! [`ObjectLoader`] that fetches many records of that kind in one call.
//! [`ObjectRegistry::resolve`] partitions references by kind and calls each
//! loader exactly once.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use sea_query::{Alias, Asterisk, Expr, ExprTrait, Query};
use sqlx::Row;
use sqlx::any::AnyRow;

use crate::config::validate_identifier;
use crate::context::TagContext;
use crate::error::{Result, TagError};
use crate::models::{ContentObject, Taggable};

/// Batched loader for one content type
///
/// Ids that no longer exist are simply absent from the returned pairs.
#[async_trait]
pub trait ObjectLoader<O>: Send + Sync {
	async fn load_many(&self, ctx: &TagContext, ids: &[i64]) -> Result<Vec<(i64, O)>>;
}

/// Maps content type names to their loaders
pub struct ObjectRegistry<O> {
	loaders: HashMap<String, Arc<dyn ObjectLoader<O>>>,
}

impl<O> Default for ObjectRegistry<O> {
	fn default() -> Self {
		Self {
			loaders: HashMap::new(),
		}
	}
}

impl<O> fmt::Debug for ObjectRegistry<O> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObjectRegistry")
			.field("content_types", &self.content_types())
			.finish()
	}
}

impl<O> ObjectRegistry<O> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn contains(&self, content_type: &str) -> bool {
		self.loaders.contains_key(content_type)
	}

	/// Registered content types, sorted
	pub fn content_types(&self) -> Vec<&str> {
		let mut types: Vec<&str> = self.loaders.keys().map(String::as_str).collect();
		types.sort_unstable();
		types
	}
}

impl<O: Send + 'static> ObjectRegistry<O> {

	/// Register a loader, replacing any previous one for the same content type
	pub fn register(
		&mut self,
		content_type: impl Into<String>,
		loader: impl ObjectLoader<O> + 'static,
	) -> &mut Self {
		self.loaders.insert(content_type.into(), Arc::new(loader));
		self
	}

	/// Register a loader for a taggable model
	pub fn with<T: Taggable>(mut self, loader: impl ObjectLoader<O> + 'static) -> Self {
		self.register(T::content_type_name(), loader);
		self
	}

	/// Load every referenced object with one loader call per content type
	///
	/// References the loader does not return are missing from the map.
	pub async fn resolve(
		&self,
		ctx: &TagContext,
		refs: &[ContentObject],
	) -> Result<HashMap<ContentObject, O>> {
		let mut by_kind: BTreeMap<&str, BTreeSet<i64>> = BTreeMap::new();
		for content_object in refs {
			by_kind
				.entry(content_object.content_type.as_str())
				.or_default()
				.insert(content_object.object_id);
		}

		let mut resolved = HashMap::with_capacity(refs.len());
		for (content_type, ids) in by_kind {
			let loader = self
				.loaders
				.get(content_type)
				.ok_or_else(|| TagError::UnknownContentType(content_type.to_string()))?;

			let ids: Vec<i64> = ids.into_iter().collect();
			let loaded = loader.load_many(ctx, &ids).await?;
			tracing::debug!(
				content_type,
				requested = ids.len(),
				loaded = loaded.len(),
				"resolved content objects"
			);

			for (id, object) in loaded {
				resolved.insert(ContentObject::new(content_type, id), object);
			}
		}

		Ok(resolved)
	}
}

type RowMapper<O> = dyn Fn(&AnyRow) -> std::result::Result<O, sqlx::Error> + Send + Sync;

/// Loader that selects rows of a host table by primary key
///
/// Issues `SELECT * FROM <table> WHERE <pk> IN (...)` and hands each row to
/// the mapping closure.
pub struct TableLoader<O> {
	table: String,
	pk_column: String,
	map_row: Box<RowMapper<O>>,
}

impl<O> TableLoader<O> {
	pub fn new<F>(table: impl Into<String>, pk_column: impl Into<String>, map_row: F) -> Result<Self>
	where
		F: Fn(&AnyRow) -> std::result::Result<O, sqlx::Error> + Send + Sync + 'static,
	{
		let table = table.into();
		let pk_column = pk_column.into();
		validate_identifier("table", &table)?;
		validate_identifier("pk_column", &pk_column)?;

		Ok(Self {
			table,
			pk_column,
			map_row: Box::new(map_row),
		})
	}
}

impl<O> fmt::Debug for TableLoader<O> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TableLoader")
			.field("table", &self.table)
			.field("pk_column", &self.pk_column)
			.finish_non_exhaustive()
	}
}

#[async_trait]
impl<O: Send + 'static> ObjectLoader<O> for TableLoader<O> {
	async fn load_many(&self, ctx: &TagContext, ids: &[i64]) -> Result<Vec<(i64, O)>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let sql = {
			let stmt = Query::select()
				.column(Asterisk)
				.from(Alias::new(self.table.as_str()))
				.and_where(Expr::col(Alias::new(self.pk_column.as_str())).is_in(ids.iter().copied()))
				.to_owned();
			ctx.config().backend().build_sql(&stmt)
		};

		let rows = sqlx::query(&sql)
			.fetch_all(ctx.pool())
			.await
			.map_err(|e| {
				TagError::DatabaseError(format!("Failed to load rows from {}: {}", self.table, e))
			})?;

		rows.iter()
			.map(|row| {
				let id: i64 = row.try_get(self.pk_column.as_str()).map_err(|e| {
					TagError::DatabaseError(format!("Invalid {}: {}", self.pk_column, e))
				})?;
				let object = (self.map_row)(row).map_err(|e| {
					TagError::DatabaseError(format!("Failed to map {} row: {}", self.table, e))
				})?;
				Ok((id, object))
			})
			.collect()
	}
}
