//! Table bootstrap
//!
//! Emits `CREATE TABLE IF NOT EXISTS` statements for the tag tables in the
//! configured dialect. Deployments with their own migrations can ignore
//! this module; tests and small tools use it to get a working store.

use sea_query::{
	Alias, ColumnDef, ForeignKey, ForeignKeyAction, Index, IndexCreateStatement, Table,
	TableCreateStatement,
};

use crate::config::{DatabaseBackend, TagConfig, validate_identifier};
use crate::context::TagContext;
use crate::error::{Result, TagError};
use crate::models::Through;
use crate::through::{CONTENT_TYPE, CREATED_AT, ID, OBJECT_ID, TAG_ID};

const CONTENT_TYPE_LENGTH: u32 = 100;
const MYSQL_BINARY_COLLATION: &str = "utf8mb4_bin";

/// Create the tag table and the shared association table
pub async fn create_tables(ctx: &TagContext) -> Result<()> {
	let config = ctx.config();

	execute(ctx, &config.backend().build_table_sql(&tag_table(config)), config.tag_table()).await?;
	execute(
		ctx,
		&config.backend().build_table_sql(&tagged_item_table(config)),
		config.tagged_item_table(),
	)
	.await?;

	if config.backend() != DatabaseBackend::MySql {
		let index = object_index(config.tagged_item_table(), &[CONTENT_TYPE, OBJECT_ID]);
		execute(
			ctx,
			&config.backend().build_index_sql(&index),
			config.tagged_item_table(),
		)
		.await?;
	}

	tracing::debug!(
		tag_table = config.tag_table(),
		tagged_item_table = config.tagged_item_table(),
		"created tag tables"
	);
	Ok(())
}

/// Create a relation-specific association table
///
/// A no-op for [`Through::Generic`], whose table [`create_tables`] creates.
pub async fn create_through_table(ctx: &TagContext, through: &Through) -> Result<()> {
	let Through::Direct {
		table,
		object_column,
	} = through
	else {
		return Ok(());
	};
	validate_identifier("through table", table)?;
	validate_identifier("object column", object_column)?;

	let config = ctx.config();
	let stmt = direct_table(config, table, object_column);
	execute(ctx, &config.backend().build_table_sql(&stmt), table).await?;

	if config.backend() != DatabaseBackend::MySql {
		let index = object_index(table, &[object_column.as_str()]);
		execute(ctx, &config.backend().build_index_sql(&index), table).await?;
	}

	tracing::debug!(table = table.as_str(), "created through table");
	Ok(())
}

async fn execute(ctx: &TagContext, sql: &str, table: &str) -> Result<()> {
	sqlx::query(sql)
		.execute(ctx.pool())
		.await
		.map_err(|e| TagError::DatabaseError(format!("Failed to create {}: {}", table, e)))?;
	Ok(())
}

/// SQLite only auto-increments `INTEGER PRIMARY KEY`
fn id_column(backend: DatabaseBackend) -> ColumnDef {
	let mut column = ColumnDef::new(Alias::new(ID));
	match backend {
		DatabaseBackend::Sqlite => column.integer(),
		_ => column.big_integer(),
	};
	column.not_null().auto_increment().primary_key();
	column
}

/// Tag names compare case-sensitively; MySQL's default collation does not
fn unique_text_column(config: &TagConfig, name: &str, len: usize) -> ColumnDef {
	let mut column = ColumnDef::new(Alias::new(name));
	column.string_len(len as u32).not_null().unique_key();
	if config.backend() == DatabaseBackend::MySql {
		column.extra(format!("COLLATE {}", MYSQL_BINARY_COLLATION));
	}
	column
}

fn tag_table(config: &TagConfig) -> TableCreateStatement {
	Table::create()
		.table(Alias::new(config.tag_table()))
		.if_not_exists()
		.col(&mut id_column(config.backend()))
		.col(&mut unique_text_column(config, "name", config.max_name_length()))
		.col(&mut unique_text_column(config, "slug", config.max_slug_length()))
		.col(ColumnDef::new(Alias::new(CREATED_AT)).string_len(64).not_null())
		.to_owned()
}

fn tagged_item_table(config: &TagConfig) -> TableCreateStatement {
	let table = config.tagged_item_table();
	let mut stmt = Table::create()
		.table(Alias::new(table))
		.if_not_exists()
		.col(&mut id_column(config.backend()))
		.col(ColumnDef::new(Alias::new(TAG_ID)).big_integer().not_null())
		.col(
			ColumnDef::new(Alias::new(CONTENT_TYPE))
				.string_len(CONTENT_TYPE_LENGTH)
				.not_null(),
		)
		.col(ColumnDef::new(Alias::new(OBJECT_ID)).big_integer().not_null())
		.col(ColumnDef::new(Alias::new(CREATED_AT)).string_len(64).not_null())
		.foreign_key(&mut tag_foreign_key(config, table))
		.index(
			Index::create()
				.name(format!("uq_{}_tag_object", table))
				.unique()
				.col(Alias::new(TAG_ID))
				.col(Alias::new(CONTENT_TYPE))
				.col(Alias::new(OBJECT_ID)),
		)
		.to_owned();

	if config.backend() == DatabaseBackend::MySql {
		stmt.index(&mut object_index(table, &[CONTENT_TYPE, OBJECT_ID]));
	}
	stmt
}

fn direct_table(config: &TagConfig, table: &str, object_column: &str) -> TableCreateStatement {
	let mut stmt = Table::create()
		.table(Alias::new(table))
		.if_not_exists()
		.col(&mut id_column(config.backend()))
		.col(ColumnDef::new(Alias::new(TAG_ID)).big_integer().not_null())
		.col(ColumnDef::new(Alias::new(object_column)).big_integer().not_null())
		.col(ColumnDef::new(Alias::new(CREATED_AT)).string_len(64).not_null())
		.foreign_key(&mut tag_foreign_key(config, table))
		.index(
			Index::create()
				.name(format!("uq_{}_tag_object", table))
				.unique()
				.col(Alias::new(TAG_ID))
				.col(Alias::new(object_column)),
		)
		.to_owned();

	if config.backend() == DatabaseBackend::MySql {
		stmt.index(&mut object_index(table, &[object_column]));
	}
	stmt
}

fn tag_foreign_key(config: &TagConfig, table: &str) -> sea_query::ForeignKeyCreateStatement {
	ForeignKey::create()
		.name(format!("fk_{}_tag", table))
		.from(Alias::new(table), Alias::new(TAG_ID))
		.to(Alias::new(config.tag_table()), Alias::new(ID))
		.on_delete(ForeignKeyAction::Cascade)
		.to_owned()
}

fn object_index(table: &str, columns: &[&str]) -> IndexCreateStatement {
	let mut index = Index::create();
	index
		.if_not_exists()
		.name(format!("idx_{}_object", table))
		.table(Alias::new(table));
	for column in columns {
		index.col(Alias::new(*column));
	}
	index
}
