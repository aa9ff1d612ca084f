//! Proc macros for tagweave
//!
//! This crate provides the `#[taggable]` attribute macro.

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod taggable;

/// Attribute macro to make a record type taggable
///
/// Implements `tagweave::Taggable` for the struct and adds a `tags()`
/// accessor returning a manager bound to the instance.
///
/// # Usage
///
/// ```rust,ignore
/// use tagweave::prelude::*;
///
/// #[taggable]
/// pub struct Food {
///     pub id: Option<i64>,
///     pub name: String,
/// }
///
/// #[taggable(content_type = "blog.Post", id_field = "pk")]
/// pub struct Post {
///     pub pk: i64,
/// }
///
/// #[taggable(through_table = "pet_tags", through_column = "pet_id")]
/// pub struct Pet {
///     pub id: Option<i64>,
/// }
/// ```
///
/// # Arguments
///
/// - `content_type`: discriminator stored in association rows, defaults to the struct name
/// - `id_field`: primary key field, defaults to `id`; must be `i64` or `Option<i64>`
/// - `through_table` / `through_column`: use a relation-specific association table
///   instead of the shared one; both must be given together
#[proc_macro_attribute]
pub fn taggable(attr: TokenStream, item: TokenStream) -> TokenStream {
	let mut args = taggable::TaggableArgs::default();
	let parser = syn::meta::parser(|meta| args.parse(meta));
	parse_macro_input!(attr with parser);

	let input = parse_macro_input!(item as syn::DeriveInput);

	taggable::expand(args, input)
		.unwrap_or_else(syn::Error::into_compile_error)
		.into()
}
