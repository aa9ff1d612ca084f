//! Tag vocabulary
//!
//! [`TagStore`] owns the `tags` table. Its central operation is
//! [`TagStore::get_or_create`], which relies on the table's unique
//! constraints rather than in-process locking: a writer that loses a
//! creation race sees a unique violation and re-reads the winner's row.

use chrono::{DateTime, Utc};
use sea_query::{Alias, Expr, ExprTrait, Func, Order, Query, SelectStatement};
use sqlx::Row;
use sqlx::any::AnyRow;

use crate::config::TagConfig;
use crate::context::TagContext;
use crate::error::{Result, TagError, is_unique_violation};
use crate::models::{Tag, TagRef};
use crate::validator::validate_tag_name;

const NAME: &str = "name";
const SLUG: &str = "slug";

/// Slug used when a name has no URL-safe characters at all
const FALLBACK_SLUG: &str = "tag";

/// Read and create tags
#[derive(Debug, Clone, Copy)]
pub struct TagStore<'a> {
	ctx: &'a TagContext,
}

impl<'a> TagStore<'a> {
	pub(crate) fn new(ctx: &'a TagContext) -> Self {
		Self { ctx }
	}

	fn config(&self) -> &TagConfig {
		self.ctx.config()
	}

	/// Normalize and validate a raw name
	pub fn prepare_name(&self, name: &str) -> Result<String> {
		let name = self.config().normalizer().normalize(name);
		validate_tag_name(&name, self.config().max_name_length())?;
		Ok(name)
	}

	/// Return the tag called `name`, creating it on first use
	///
	/// Concurrent calls with the same new name converge on one row.
	pub async fn get_or_create(&self, name: &str) -> Result<Tag> {
		let name = self.prepare_name(name)?;

		if let Some(tag) = self.find_by_name(&name).await? {
			return Ok(tag);
		}

		let attempts = self.config().max_create_attempts();
		for attempt in 0..attempts {
			if attempt > 0 {
				tracing::warn!(name = %name, attempt, "retrying tag creation after slug collision");
			}

			let slug = self.unique_slug(&name).await?;
			match self.insert(&name, &slug).await {
				Ok(()) => {
					tracing::debug!(name = %name, slug = %slug, "created tag");
				}
				Err(e) if is_unique_violation(&e) => {
					tracing::debug!(name = %name, slug = %slug, "tag created concurrently, re-reading");
				}
				Err(e) => {
					return Err(TagError::DatabaseError(format!(
						"Failed to create tag '{}': {}",
						name, e
					)));
				}
			}

			// Either our insert or a concurrent one; a missing row means the slug lost the race
			if let Some(tag) = self.find_by_name(&name).await? {
				return Ok(tag);
			}
		}

		Err(TagError::DatabaseError(format!(
			"Failed to allocate a unique slug for tag '{}' after {} attempts",
			name, attempts
		)))
	}

	/// Look up a tag by name
	pub async fn get(&self, name: &str) -> Result<Option<Tag>> {
		let name = self.config().normalizer().normalize(name);
		self.find_by_name(&name).await
	}

	/// Look up a tag by id
	pub async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
		let stmt = self
			.select_tags()
			.and_where(Expr::col(self.col("id")).eq(id))
			.to_owned();
		self.fetch_optional(&stmt).await
	}

	/// Existing tags among `names`, ordered by name
	pub async fn get_many<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Tag>> {
		let names: Vec<String> = names
			.iter()
			.map(|name| self.config().normalizer().normalize(name.as_ref()))
			.collect();
		if names.is_empty() {
			return Ok(Vec::new());
		}

		let stmt = self
			.select_tags()
			.and_where(Expr::col(self.col(NAME)).is_in(names))
			.order_by(self.col(NAME), Order::Asc)
			.to_owned();
		self.fetch_all(&stmt).await
	}

	/// Every tag, ordered by name
	pub async fn all(&self) -> Result<Vec<Tag>> {
		let stmt = self
			.select_tags()
			.order_by(self.col(NAME), Order::Asc)
			.to_owned();
		self.fetch_all(&stmt).await
	}

	/// Turn a caller-supplied reference into a persisted tag
	///
	/// Names and unsaved tag objects go through [`get_or_create`](Self::get_or_create);
	/// raw ids must already exist.
	pub async fn resolve(&self, tag: TagRef) -> Result<Tag> {
		match tag {
			TagRef::Tag(tag) if tag.id.is_some() => Ok(tag),
			TagRef::Tag(tag) => self.get_or_create(&tag.name).await,
			TagRef::Name(name) => self.get_or_create(&name).await,
			TagRef::Id(id) => self
				.get_by_id(id)
				.await?
				.ok_or_else(|| TagError::TagNotFound(format!("id {}", id))),
		}
	}

	/// First free slug derived from `name`
	///
	/// The slugified name is used as is when free, otherwise `_1`, `_2`, …
	/// is appended, truncating the base so the result fits
	/// `max_slug_length`. Fails once the suffix alone no longer fits.
	pub async fn unique_slug(&self, name: &str) -> Result<String> {
		let max = self.config().max_slug_length();
		let mut base = slug::slugify(name);
		if base.is_empty() {
			base = FALLBACK_SLUG.to_string();
		}

		let mut candidate = truncate(&base, max).to_string();
		let mut suffix_number = 1u64;
		while self.slug_exists(&candidate).await? {
			let suffix = format!("_{}", suffix_number);
			if suffix.len() > max {
				return Err(TagError::DatabaseError(format!(
					"No free slug of at most {} characters for tag '{}'",
					max, name
				)));
			}
			let keep = max - suffix.len();
			candidate = format!("{}{}", truncate(&base, keep), suffix);
			suffix_number += 1;
		}
		Ok(candidate)
	}

	async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
		let stmt = self
			.select_tags()
			.and_where(Expr::col(self.col(NAME)).eq(name))
			.to_owned();
		self.fetch_optional(&stmt).await
	}

	async fn slug_exists(&self, slug: &str) -> Result<bool> {
		let stmt = Query::select()
			.expr(Func::count(Expr::col(self.col("id"))))
			.from(self.table())
			.and_where(Expr::col(self.col(SLUG)).eq(slug))
			.to_owned();
		let sql = self.config().backend().build_sql(&stmt);

		let row = sqlx::query(&sql)
			.fetch_one(self.ctx.pool())
			.await
			.map_err(|e| TagError::DatabaseError(format!("Failed to check slug: {}", e)))?;
		let count: i64 = row
			.try_get(0)
			.map_err(|e| TagError::DatabaseError(format!("Invalid count: {}", e)))?;

		Ok(count > 0)
	}

	async fn insert(&self, name: &str, slug: &str) -> std::result::Result<(), sqlx::Error> {
		let stmt = Query::insert()
			.into_table(self.table())
			.columns([Alias::new(NAME), Alias::new(SLUG), Alias::new("created_at")])
			.values_panic([name.into(), slug.into(), Utc::now().to_rfc3339().into()])
			.to_owned();
		let sql = self.config().backend().build_sql(&stmt);

		sqlx::query(&sql).execute(self.ctx.pool()).await?;
		Ok(())
	}

	async fn fetch_optional(&self, stmt: &SelectStatement) -> Result<Option<Tag>> {
		let sql = self.config().backend().build_sql(stmt);
		let row = sqlx::query(&sql)
			.fetch_optional(self.ctx.pool())
			.await
			.map_err(|e| TagError::DatabaseError(format!("Failed to fetch tag: {}", e)))?;
		row.as_ref().map(tag_from_row).transpose()
	}

	async fn fetch_all(&self, stmt: &SelectStatement) -> Result<Vec<Tag>> {
		let sql = self.config().backend().build_sql(stmt);
		let rows = sqlx::query(&sql)
			.fetch_all(self.ctx.pool())
			.await
			.map_err(|e| TagError::DatabaseError(format!("Failed to fetch tags: {}", e)))?;
		rows.iter().map(tag_from_row).collect()
	}

	fn table(&self) -> Alias {
		Alias::new(self.config().tag_table())
	}

	fn col(&self, column: &str) -> (Alias, Alias) {
		(self.table(), Alias::new(column))
	}

	fn select_tags(&self) -> SelectStatement {
		select_tags(self.config())
	}
}

/// `SELECT id, name, slug, created_at FROM tags`, columns qualified for joins
pub(crate) fn select_tags(config: &TagConfig) -> SelectStatement {
	let table = Alias::new(config.tag_table());
	Query::select()
		.columns([
			(table.clone(), Alias::new("id")),
			(table.clone(), Alias::new(NAME)),
			(table.clone(), Alias::new(SLUG)),
			(table.clone(), Alias::new("created_at")),
		])
		.from(table)
		.to_owned()
}

pub(crate) fn tag_from_row(row: &AnyRow) -> Result<Tag> {
	let id: i64 = row
		.try_get("id")
		.map_err(|e| TagError::DatabaseError(format!("Invalid id: {}", e)))?;
	let name: String = row
		.try_get(NAME)
		.map_err(|e| TagError::DatabaseError(format!("Invalid name: {}", e)))?;
	let slug: String = row
		.try_get(SLUG)
		.map_err(|e| TagError::DatabaseError(format!("Invalid slug: {}", e)))?;
	let created_at: String = row
		.try_get("created_at")
		.map_err(|e| TagError::DatabaseError(format!("Invalid created_at: {}", e)))?;

	Ok(Tag {
		id: Some(id),
		name,
		slug,
		created_at: parse_timestamp(&created_at)?,
	})
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| TagError::DatabaseError(format!("Invalid timestamp '{}': {}", value, e)))
}

/// Slugs are ASCII, so byte and character boundaries coincide
fn truncate(value: &str, max: usize) -> &str {
	match value.char_indices().nth(max) {
		Some((index, _)) => &value[..index],
		None => value,
	}
}
