//! Resolved association table for one relation
//!
//! A relation is either the shared polymorphic table, scoped to one
//! content type, or a direct table whose rows all belong to the same
//! content type. [`ThroughTable`] hides that difference from the SQL
//! builders in the manager and filter code.

use sea_query::{Alias, Condition, Expr, ExprTrait, InsertStatement, OnConflict, Query};

use crate::config::TagConfig;
use crate::models::Through;

pub(crate) const ID: &str = "id";
pub(crate) const TAG_ID: &str = "tag_id";
pub(crate) const CONTENT_TYPE: &str = "content_type";
pub(crate) const OBJECT_ID: &str = "object_id";
pub(crate) const CREATED_AT: &str = "created_at";

#[derive(Debug, Clone)]
pub(crate) struct ThroughTable {
	table: String,
	object_column: String,
	content_type: String,
	generic: bool,
}

impl ThroughTable {
	pub(crate) fn new(config: &TagConfig, through: &Through, content_type: &str) -> Self {
		match through {
			Through::Generic => Self {
				table: config.tagged_item_table().to_string(),
				object_column: OBJECT_ID.to_string(),
				content_type: content_type.to_string(),
				generic: true,
			},
			Through::Direct {
				table,
				object_column,
			} => Self {
				table: table.clone(),
				object_column: object_column.clone(),
				content_type: content_type.to_string(),
				generic: false,
			},
		}
	}

	pub(crate) fn table(&self) -> Alias {
		Alias::new(self.table.as_str())
	}

	pub(crate) fn table_name(&self) -> &str {
		&self.table
	}

	/// Content type of the relation's records
	pub(crate) fn content_type(&self) -> &str {
		&self.content_type
	}

	pub(crate) fn is_generic(&self) -> bool {
		self.generic
	}

	/// Qualified column of the association table
	pub(crate) fn col(&self, column: &str) -> (Alias, Alias) {
		(self.table(), Alias::new(column))
	}

	/// Qualified column holding the record key
	pub(crate) fn object_col(&self) -> (Alias, Alias) {
		self.col(&self.object_column)
	}

	/// Insert of one association that skips an existing row
	///
	/// Duplicates never raise, so the statement is safe inside a
	/// transaction on backends that abort on the first error.
	pub(crate) fn insert(&self, tag_id: i64, object_id: i64, created_at: &str) -> InsertStatement {
		let mut stmt = Query::insert();
		stmt.into_table(self.table());
		let conflict_columns = if self.generic {
			stmt.columns([
				Alias::new(TAG_ID),
				Alias::new(CONTENT_TYPE),
				Alias::new(OBJECT_ID),
				Alias::new(CREATED_AT),
			])
			.values_panic([
				tag_id.into(),
				self.content_type.as_str().into(),
				object_id.into(),
				created_at.into(),
			]);
			vec![Alias::new(TAG_ID), Alias::new(CONTENT_TYPE), Alias::new(OBJECT_ID)]
		} else {
			let object_column = Alias::new(self.object_column.as_str());
			stmt.columns([object_column.clone(), Alias::new(TAG_ID), Alias::new(CREATED_AT)])
				.values_panic([object_id.into(), tag_id.into(), created_at.into()]);
			vec![Alias::new(TAG_ID), object_column]
		};
		// MySQL has no conflict target; `id = id` turns the duplicate into a no-op
		stmt.on_conflict(
			OnConflict::columns(conflict_columns)
				.do_nothing_on([Alias::new(ID)])
				.to_owned(),
		);
		stmt
	}

	/// Rows belonging to this relation
	pub(crate) fn scope(&self) -> Condition {
		let condition = Condition::all();
		if self.generic {
			condition.add(Expr::col(self.col(CONTENT_TYPE)).eq(self.content_type.as_str()))
		} else {
			condition
		}
	}

	/// Rows belonging to one record of this relation
	pub(crate) fn record(&self, object_id: i64) -> Condition {
		self.scope()
			.add(Expr::col(self.object_col()).eq(object_id))
	}

	/// Rows belonging to any record except `object_id` of this relation
	///
	/// Records of other content types in a shared table are kept.
	pub(crate) fn not_record(&self, object_id: i64) -> Condition {
		if self.generic {
			Condition::any()
				.add(Expr::col(self.col(CONTENT_TYPE)).ne(self.content_type.as_str()))
				.add(Expr::col(self.object_col()).ne(object_id))
		} else {
			Condition::all().add(Expr::col(self.object_col()).ne(object_id))
		}
	}
}
