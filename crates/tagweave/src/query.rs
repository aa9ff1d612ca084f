//! Tag-filter lookups
//!
//! A [`TagFilter`] selects the records of one relation that carry any of a
//! set of tags. It is validated up front and rendered later against a
//! relation, either as a subquery of record keys or as a `pk IN (...)`
//! condition for a host query.
//!
//! ```
//! use tagweave::{TagError, TagFilter, TagRef};
//!
//! let by_name = TagFilter::new("in", ["red", "fruit"]).unwrap();
//! assert_eq!(by_name.len(), 2);
//!
//! let unsupported = TagFilter::new("exact", ["red"]);
//! assert!(matches!(unsupported, Err(TagError::InvalidArgument(_))));
//!
//! let mixed = TagFilter::new("in", [TagRef::from("red"), TagRef::from(3i64)]);
//! assert!(matches!(mixed, Err(TagError::InvalidArgument(_))));
//! ```

use sea_query::{Alias, Expr, ExprTrait, Query, SelectStatement};

use crate::config::TagConfig;
use crate::error::{Result, TagError};
use crate::models::TagRef;
use crate::through::{TAG_ID, ThroughTable};

/// The only supported lookup: "record has any of these tags"
pub const LOOKUP_IN: &str = "in";

/// How the filter identifies its tags
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
	/// Ids taken from saved `Tag` objects
	Tags(Vec<i64>),
	/// Tag names, matched after normalization
	Names(Vec<String>),
	/// Raw tag ids passed through unchanged
	Ids(Vec<i64>),
}

/// A validated `tags__in` style lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
	selector: Selector,
}

impl TagFilter {
	/// Validate a lookup and its values
	///
	/// Values must be all tag objects, all names or all ids. Tag objects
	/// must already be saved.
	pub fn new<I, V>(lookup: &str, values: I) -> Result<Self>
	where
		I: IntoIterator<Item = V>,
		V: Into<TagRef>,
	{
		if lookup != LOOKUP_IN {
			return Err(TagError::InvalidArgument(format!(
				"unsupported lookup '{}', only '{}' is supported",
				lookup, LOOKUP_IN
			)));
		}

		let values: Vec<TagRef> = values.into_iter().map(Into::into).collect();
		let selector = match values.first() {
			None => Selector::Names(Vec::new()),
			Some(TagRef::Tag(_)) => Selector::Tags(Vec::with_capacity(values.len())),
			Some(TagRef::Name(_)) => Selector::Names(Vec::with_capacity(values.len())),
			Some(TagRef::Id(_)) => Selector::Ids(Vec::with_capacity(values.len())),
		};

		let first_kind = values.first().map(TagRef::kind);
		let selector = values
			.into_iter()
			.try_fold(selector, |mut selector, value| {
				match (&mut selector, value) {
					(Selector::Tags(ids), TagRef::Tag(tag)) => match tag.id {
						Some(id) => ids.push(id),
						None => {
							return Err(TagError::InvalidArgument(format!(
								"tag '{}' must be saved before it can be used in a filter",
								tag.name
							)));
						}
					},
					(Selector::Names(names), TagRef::Name(name)) => names.push(name),
					(Selector::Ids(ids), TagRef::Id(id)) => ids.push(id),
					(Selector::Tags(_), TagRef::Name(_)) | (Selector::Names(_), TagRef::Tag(_)) => {
						return Err(TagError::InvalidArgument(
							"cannot combine tag objects and tag names in one filter".to_string(),
						));
					}
					(_, other) => {
						return Err(TagError::InvalidArgument(format!(
							"cannot combine {} and {} values in one filter",
							first_kind.unwrap_or_default(),
							other.kind()
						)));
					}
				}
				Ok(selector)
			})?;

		Ok(Self { selector })
	}

	/// Number of tag values in the filter
	pub fn len(&self) -> usize {
		match &self.selector {
			Selector::Tags(ids) | Selector::Ids(ids) => ids.len(),
			Selector::Names(names) => names.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// `SELECT DISTINCT <object column> FROM <through> WHERE ...`
	///
	/// An empty filter renders a subquery that matches nothing.
	pub(crate) fn subquery(&self, config: &TagConfig, through: &ThroughTable) -> SelectStatement {
		let mut stmt = Query::select();
		stmt.distinct()
			.column(through.object_col())
			.from(through.table())
			.cond_where(through.scope());

		match &self.selector {
			Selector::Tags(ids) | Selector::Ids(ids) => {
				stmt.and_where(Expr::col(through.col(TAG_ID)).is_in(ids.iter().copied()));
			}
			Selector::Names(names) => {
				let names: Vec<String> = names
					.iter()
					.map(|name| config.normalizer().normalize(name))
					.collect();
				let tag_ids = Query::select()
					.column(Alias::new("id"))
					.from(Alias::new(config.tag_table()))
					.and_where(Expr::col(Alias::new("name")).is_in(names))
					.to_owned();
				stmt.and_where(Expr::col(through.col(TAG_ID)).in_subquery(tag_ids));
			}
		}

		stmt
	}
}
