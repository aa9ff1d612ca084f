//! Association manager
//!
//! A [`TagManager`] is attached either to one record (created by
//! [`TagContext::manager`] or the generated `tags()` accessor) or to a whole
//! relation ([`TagContext::manager_for`]). Bound managers mutate and read
//! the record's tags; relation-wide managers only answer aggregate reads
//! and filters.
//!
//! Mutations are not atomic across tags, with one exception: [`TagManager::set`]
//! replaces the record's associations inside a single transaction.

use std::collections::HashSet;
use std::fmt;

use chrono::Utc;
use sea_query::{
	Alias, Condition, Expr, ExprTrait, Func, IntoColumnRef, Order, Query, SelectStatement,
};
use sqlx::Row;

use crate::context::TagContext;
use crate::error::{Result, TagError};
use crate::models::{ContentObject, Tag, TagCount, TagRef, Taggable, TaggedItem};
use crate::parser::{edit_string_for_tags, parse_tags};
use crate::query::TagFilter;
use crate::registry::ObjectRegistry;
use crate::store::{parse_timestamp, select_tags, tag_from_row};
use crate::through::{CONTENT_TYPE, CREATED_AT, ID, OBJECT_ID, TAG_ID, ThroughTable};

const NUM_TIMES: &str = "num_times";
const SIMILAR_COUNT: &str = "n";

/// A record sharing tags with the manager's record
#[derive(Debug, Clone)]
pub struct SimilarObject<O> {
	pub object: O,
	pub content_object: ContentObject,
	/// Number of tags shared with the source record
	pub similar_tags: i64,
}

/// Tag operations for one record or one relation
pub struct TagManager<'a, T: Taggable> {
	ctx: &'a TagContext,
	instance: Option<&'a T>,
	through: ThroughTable,
}

impl<T: Taggable> fmt::Debug for TagManager<'_, T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TagManager")
			.field("content_type", &self.through.content_type())
			.field("through", &self.through.table_name())
			.field("object_id", &self.instance.and_then(|instance| instance.object_id()))
			.finish()
	}
}

impl<'a, T: Taggable> TagManager<'a, T> {
	pub(crate) fn bound(ctx: &'a TagContext, instance: &'a T) -> Self {
		Self {
			ctx,
			instance: Some(instance),
			through: ThroughTable::new(ctx.config(), &T::through(), T::content_type_name()),
		}
	}

	pub(crate) fn relation(ctx: &'a TagContext) -> Self {
		Self {
			ctx,
			instance: None,
			through: ThroughTable::new(ctx.config(), &T::through(), T::content_type_name()),
		}
	}

	/// True when the manager is attached to a single record
	pub fn is_bound(&self) -> bool {
		self.instance.is_some()
	}

	/// Identity of the bound record, `None` for a relation-wide manager
	fn object_id(&self) -> Result<Option<i64>> {
		match self.instance {
			None => Ok(None),
			Some(instance) => instance.object_id().map(Some).ok_or_else(|| {
				TagError::InvalidState(format!(
					"{} record must be persisted before tags can be attached",
					T::content_type_name()
				))
			}),
		}
	}

	fn require_instance(&self) -> Result<i64> {
		self.object_id()?.ok_or_else(|| {
			TagError::InvalidState(format!(
				"{} tags can only be changed through a manager bound to a record",
				T::content_type_name()
			))
		})
	}

	/// Attach tags to the record
	///
	/// Each item may be a tag, a name or a tag id. Unknown names are created.
	/// Tags already attached are left alone. Tags processed before a failing
	/// item stay attached.
	pub async fn add<I, V>(&self, tags: I) -> Result<()>
	where
		I: IntoIterator<Item = V>,
		V: Into<TagRef>,
	{
		let object_id = self.require_instance()?;
		let store = self.ctx.store();

		for value in tags {
			let tag = store.resolve(value.into()).await?;
			let tag_id = saved_id(&tag)?;
			let inserted = self
				.insert_association(self.ctx.pool(), tag_id, object_id)
				.await?;
			tracing::debug!(
				content_type = self.through.content_type(),
				object_id,
				tag = %tag.name,
				inserted,
				"added tag"
			);
		}

		Ok(())
	}

	/// Detach the named tags, returning the number of associations removed
	///
	/// Names that are not attached are ignored.
	pub async fn remove<I, S>(&self, names: I) -> Result<u64>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let object_id = self.require_instance()?;
		let config = self.ctx.config();
		let names: Vec<String> = names
			.into_iter()
			.map(|name| config.normalizer().normalize(name.as_ref()))
			.collect();
		if names.is_empty() {
			return Ok(0);
		}

		let tag_ids = Query::select()
			.column(Alias::new(ID))
			.from(Alias::new(config.tag_table()))
			.and_where(Expr::col(Alias::new("name")).is_in(names))
			.to_owned();
		let stmt = Query::delete()
			.from_table(self.through.table())
			.cond_where(
				self.through
					.record(object_id)
					.add(Expr::col(self.through.col(TAG_ID)).in_subquery(tag_ids)),
			)
			.to_owned();
		let sql = config.backend().build_sql(&stmt);

		let removed = sqlx::query(&sql)
			.execute(self.ctx.pool())
			.await
			.map_err(|e| TagError::DatabaseError(format!("Failed to remove tags: {}", e)))?
			.rows_affected();

		tracing::debug!(
			content_type = self.through.content_type(),
			object_id,
			removed,
			"removed tags"
		);
		Ok(removed)
	}

	/// Replace the record's tags with exactly `tags`
	///
	/// Tags are resolved (and created) first; the swap itself runs in one
	/// transaction.
	pub async fn set<I, V>(&self, tags: I) -> Result<()>
	where
		I: IntoIterator<Item = V>,
		V: Into<TagRef>,
	{
		let object_id = self.require_instance()?;
		let store = self.ctx.store();

		let mut seen = HashSet::new();
		let mut tag_ids = Vec::new();
		for value in tags {
			let tag = store.resolve(value.into()).await?;
			let tag_id = saved_id(&tag)?;
			if seen.insert(tag_id) {
				tag_ids.push(tag_id);
			}
		}

		let mut tx = self
			.ctx
			.pool()
			.begin()
			.await
			.map_err(|e| TagError::TransactionError(format!("Failed to begin: {}", e)))?;

		let cleared = self.clear_with(&mut *tx, object_id).await?;
		for tag_id in &tag_ids {
			self.insert_association(&mut *tx, *tag_id, object_id).await?;
		}

		tx.commit()
			.await
			.map_err(|e| TagError::TransactionError(format!("Failed to commit: {}", e)))?;

		tracing::debug!(
			content_type = self.through.content_type(),
			object_id,
			cleared,
			count = tag_ids.len(),
			"set tags"
		);
		Ok(())
	}

	/// Detach every tag, returning the number of associations removed
	pub async fn clear(&self) -> Result<u64> {
		let object_id = self.require_instance()?;
		let cleared = self.clear_with(self.ctx.pool(), object_id).await?;
		tracing::debug!(
			content_type = self.through.content_type(),
			object_id,
			cleared,
			"cleared tags"
		);
		Ok(cleared)
	}

	/// Tags attached to the record, or used anywhere in the relation, ordered by name
	pub async fn all(&self) -> Result<Vec<Tag>> {
		let config = self.ctx.config();
		let tags = Alias::new(config.tag_table());

		let mut stmt = select_tags(config);
		stmt.inner_join(
			self.through.table(),
			Expr::col((tags.clone(), Alias::new(ID))).equals(self.through.col(TAG_ID)),
		)
		.order_by((tags, Alias::new("name")), Order::Asc);

		match self.object_id()? {
			Some(object_id) => {
				stmt.cond_where(self.through.record(object_id));
			}
			None => {
				stmt.distinct().cond_where(self.through.scope());
			}
		}

		self.fetch_tags(&stmt).await
	}

	/// Sorted names of [`all`](Self::all)
	pub async fn names(&self) -> Result<Vec<String>> {
		Ok(self.all().await?.into_iter().map(|tag| tag.name).collect())
	}

	/// Names rendered for a form field
	pub async fn edit_string(&self) -> Result<String> {
		Ok(edit_string_for_tags(&self.names().await?))
	}

	/// Parse a comma-separated string and [`set`](Self::set) the result
	pub async fn set_from_str(&self, input: &str) -> Result<()> {
		self.set(parse_tags(input)).await
	}

	/// Raw association rows, ordered by id
	pub async fn tagged_items(&self) -> Result<Vec<TaggedItem>> {
		let condition = match self.object_id()? {
			Some(object_id) => self.through.record(object_id),
			None => self.through.scope(),
		};
		let stmt = Query::select()
			.column(self.through.col(ID))
			.column(self.through.col(TAG_ID))
			.expr_as(Expr::col(self.through.object_col()), Alias::new(OBJECT_ID))
			.column(self.through.col(CREATED_AT))
			.from(self.through.table())
			.cond_where(condition)
			.order_by(self.through.col(ID), Order::Asc)
			.to_owned();
		let sql = self.ctx.config().backend().build_sql(&stmt);

		let rows = sqlx::query(&sql)
			.fetch_all(self.ctx.pool())
			.await
			.map_err(|e| TagError::DatabaseError(format!("Failed to fetch tagged items: {}", e)))?;

		rows.iter()
			.map(|row| {
				let created_at: String = row
					.try_get(CREATED_AT)
					.map_err(|e| TagError::DatabaseError(format!("Invalid created_at: {}", e)))?;
				Ok(TaggedItem {
					id: Some(get_i64(row, ID)?),
					tag_id: get_i64(row, TAG_ID)?,
					content_type: self.through.content_type().to_string(),
					object_id: get_i64(row, OBJECT_ID)?,
					created_at: parse_timestamp(&created_at)?,
				})
			})
			.collect()
	}

	/// Tags of the relation with their usage counts, most used first
	///
	/// Ties are ordered by name. A bound manager only reports the tags its
	/// record carries, still counted across the whole relation.
	pub async fn most_common(&self) -> Result<Vec<TagCount>> {
		self.most_common_query(None).await
	}

	/// [`most_common`](Self::most_common) truncated to `limit` entries
	pub async fn most_common_limited(&self, limit: u64) -> Result<Vec<TagCount>> {
		self.most_common_query(Some(limit)).await
	}

	async fn most_common_query(&self, limit: Option<u64>) -> Result<Vec<TagCount>> {
		let config = self.ctx.config();
		let tags = Alias::new(config.tag_table());
		let tag_col = |column: &str| (tags.clone(), Alias::new(column));

		let mut condition = self.through.scope();
		if let Some(object_id) = self.object_id()? {
			let own_tags = Query::select()
				.column(self.through.col(TAG_ID))
				.from(self.through.table())
				.cond_where(self.through.record(object_id))
				.to_owned();
			condition = condition.add(Expr::col(tag_col(ID)).in_subquery(own_tags));
		}

		let mut stmt = select_tags(config);
		stmt.expr_as(
			Func::count(Expr::col(self.through.col(ID))),
			Alias::new(NUM_TIMES),
		)
		.inner_join(
			self.through.table(),
			Expr::col(tag_col(ID)).equals(self.through.col(TAG_ID)),
		)
		.cond_where(condition)
		.group_by_col(tag_col(ID))
		.group_by_col(tag_col("name"))
		.group_by_col(tag_col("slug"))
		.group_by_col(tag_col(CREATED_AT))
		.order_by(Alias::new(NUM_TIMES), Order::Desc)
		.order_by(tag_col("name"), Order::Asc);
		if let Some(limit) = limit {
			stmt.limit(limit);
		}
		let sql = config.backend().build_sql(&stmt);

		let rows = sqlx::query(&sql)
			.fetch_all(self.ctx.pool())
			.await
			.map_err(|e| TagError::DatabaseError(format!("Failed to count tags: {}", e)))?;

		rows.iter()
			.map(|row| {
				Ok(TagCount {
					tag: tag_from_row(row)?,
					num_times: get_i64(row, NUM_TIMES)?,
				})
			})
			.collect()
	}

	/// Records sharing at least one tag with this one, most shared first
	///
	/// Ties are ordered by content type, then object id. The record itself
	/// is never included. References `registry` cannot load are skipped.
	pub async fn similar_objects<O: Send + 'static>(
		&self,
		registry: &ObjectRegistry<O>,
	) -> Result<Vec<SimilarObject<O>>> {
		let object_id = self.require_similar_source()?;

		let own_tags = Query::select()
			.column(self.through.col(TAG_ID))
			.from(self.through.table())
			.cond_where(self.through.record(object_id))
			.to_owned();

		let mut stmt = Query::select();
		if self.through.is_generic() {
			stmt.column(self.through.col(CONTENT_TYPE));
		}
		stmt.expr_as(Expr::col(self.through.object_col()), Alias::new(OBJECT_ID))
			.expr_as(
				Func::count(Expr::col(self.through.col(ID))),
				Alias::new(SIMILAR_COUNT),
			)
			.from(self.through.table())
			.cond_where(
				Condition::all()
					.add(Expr::col(self.through.col(TAG_ID)).in_subquery(own_tags))
					.add(self.through.not_record(object_id)),
			);
		if self.through.is_generic() {
			stmt.group_by_col(self.through.col(CONTENT_TYPE));
		}
		stmt.group_by_col(self.through.object_col())
			.order_by(Alias::new(SIMILAR_COUNT), Order::Desc);
		if self.through.is_generic() {
			stmt.order_by(self.through.col(CONTENT_TYPE), Order::Asc);
		}
		stmt.order_by(self.through.object_col(), Order::Asc);
		let sql = self.ctx.config().backend().build_sql(&stmt);

		let rows = sqlx::query(&sql)
			.fetch_all(self.ctx.pool())
			.await
			.map_err(|e| TagError::DatabaseError(format!("Failed to find similar objects: {}", e)))?;

		let mut groups = Vec::with_capacity(rows.len());
		for row in &rows {
			let content_type = if self.through.is_generic() {
				row.try_get::<String, _>(CONTENT_TYPE)
					.map_err(|e| TagError::DatabaseError(format!("Invalid content_type: {}", e)))?
			} else {
				self.through.content_type().to_string()
			};
			groups.push((
				ContentObject::new(content_type, get_i64(row, OBJECT_ID)?),
				get_i64(row, SIMILAR_COUNT)?,
			));
		}
		if groups.is_empty() {
			return Ok(Vec::new());
		}

		let refs: Vec<ContentObject> = groups.iter().map(|(co, _)| co.clone()).collect();
		let mut objects = registry.resolve(self.ctx, &refs).await?;

		let mut similar = Vec::with_capacity(groups.len());
		for (content_object, similar_tags) in groups {
			match objects.remove(&content_object) {
				Some(object) => similar.push(SimilarObject {
					object,
					content_object,
					similar_tags,
				}),
				None => {
					tracing::debug!(%content_object, "skipping dangling tagged reference");
				}
			}
		}

		Ok(similar)
	}

	fn require_similar_source(&self) -> Result<i64> {
		self.object_id()?.ok_or_else(|| {
			TagError::InvalidState(format!(
				"similar {} objects require a manager bound to a record",
				T::content_type_name()
			))
		})
	}

	/// Keys of records in this relation matching the lookup, ascending
	pub async fn filter<I, V>(&self, lookup: &str, values: I) -> Result<Vec<i64>>
	where
		I: IntoIterator<Item = V>,
		V: Into<TagRef>,
	{
		let filter = TagFilter::new(lookup, values)?;
		if filter.is_empty() {
			return Ok(Vec::new());
		}

		let stmt = self
			.tagged_with(&filter)
			.order_by(self.through.object_col(), Order::Asc)
			.to_owned();
		let sql = self.ctx.config().backend().build_sql(&stmt);

		let rows = sqlx::query(&sql)
			.fetch_all(self.ctx.pool())
			.await
			.map_err(|e| TagError::DatabaseError(format!("Failed to filter by tags: {}", e)))?;

		rows.iter()
			.map(|row| {
				row.try_get::<i64, _>(0)
					.map_err(|e| TagError::DatabaseError(format!("Invalid object id: {}", e)))
			})
			.collect()
	}

	/// Subquery selecting the keys of records matching `filter`
	pub fn tagged_with(&self, filter: &TagFilter) -> SelectStatement {
		filter.subquery(self.ctx.config(), &self.through)
	}

	/// `pk IN (...)` condition for a host query over this relation's table
	pub fn filter_condition<C: IntoColumnRef>(&self, filter: &TagFilter, pk: C) -> Condition {
		Condition::all().add(Expr::col(pk).in_subquery(self.tagged_with(filter)))
	}

	/// Insert one association; `false` when it already existed
	async fn insert_association<'e, E>(&self, executor: E, tag_id: i64, object_id: i64) -> Result<bool>
	where
		E: sqlx::Executor<'e, Database = sqlx::Any>,
	{
		let now = Utc::now().to_rfc3339();
		let sql = {
			let stmt = self.through.insert(tag_id, object_id, &now);
			self.ctx.config().backend().build_sql(&stmt)
		};

		let result = sqlx::query(&sql)
			.execute(executor)
			.await
			.map_err(|e| TagError::DatabaseError(format!("Failed to attach tag {}: {}", tag_id, e)))?;
		Ok(result.rows_affected() > 0)
	}

	async fn clear_with<'e, E>(&self, executor: E, object_id: i64) -> Result<u64>
	where
		E: sqlx::Executor<'e, Database = sqlx::Any>,
	{
		let stmt = Query::delete()
			.from_table(self.through.table())
			.cond_where(self.through.record(object_id))
			.to_owned();
		let sql = self.ctx.config().backend().build_sql(&stmt);

		let result = sqlx::query(&sql)
			.execute(executor)
			.await
			.map_err(|e| TagError::DatabaseError(format!("Failed to clear tags: {}", e)))?;
		Ok(result.rows_affected())
	}

	async fn fetch_tags(&self, stmt: &SelectStatement) -> Result<Vec<Tag>> {
		let sql = self.ctx.config().backend().build_sql(stmt);
		let rows = sqlx::query(&sql)
			.fetch_all(self.ctx.pool())
			.await
			.map_err(|e| TagError::DatabaseError(format!("Failed to fetch tags: {}", e)))?;
		rows.iter().map(tag_from_row).collect()
	}
}

fn saved_id(tag: &Tag) -> Result<i64> {
	tag.id
		.ok_or_else(|| TagError::InvalidState(format!("tag '{}' has no id", tag.name)))
}

fn get_i64(row: &sqlx::any::AnyRow, column: &str) -> Result<i64> {
	row.try_get(column)
		.map_err(|e| TagError::DatabaseError(format!("Invalid {}: {}", column, e)))
}
