//! `#[taggable]` expansion

use proc_macro2::TokenStream;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Result};

/// Arguments accepted by `#[taggable(...)]`
#[derive(Default)]
pub(crate) struct TaggableArgs {
	content_type: Option<LitStr>,
	id_field: Option<LitStr>,
	through_table: Option<LitStr>,
	through_column: Option<LitStr>,
}

impl TaggableArgs {
	pub(crate) fn parse(&mut self, meta: ParseNestedMeta) -> Result<()> {
		let slot = if meta.path.is_ident("content_type") {
			&mut self.content_type
		} else if meta.path.is_ident("id_field") {
			&mut self.id_field
		} else if meta.path.is_ident("through_table") {
			&mut self.through_table
		} else if meta.path.is_ident("through_column") {
			&mut self.through_column
		} else {
			return Err(meta.error(
				"unsupported taggable attribute, expected one of: content_type, id_field, through_table, through_column",
			));
		};

		if slot.is_some() {
			return Err(meta.error("duplicate taggable attribute"));
		}
		*slot = Some(meta.value()?.parse()?);
		Ok(())
	}
}

pub(crate) fn expand(args: TaggableArgs, input: DeriveInput) -> Result<TokenStream> {
	let name = &input.ident;

	let Data::Struct(data) = &input.data else {
		return Err(syn::Error::new_spanned(
			&input,
			"#[taggable] can only be applied to structs",
		));
	};
	let Fields::Named(fields) = &data.fields else {
		return Err(syn::Error::new_spanned(
			&input,
			"#[taggable] requires a struct with named fields",
		));
	};

	let id_field = match &args.id_field {
		Some(lit) => Ident::new(&lit.value(), lit.span()),
		None => Ident::new("id", name.span()),
	};
	let has_id = fields
		.named
		.iter()
		.any(|field| field.ident.as_ref() == Some(&id_field));
	if !has_id {
		return Err(syn::Error::new_spanned(
			name,
			format!("#[taggable] struct has no `{}` field", id_field),
		));
	}

	let content_type = match &args.content_type {
		Some(lit) => lit.value(),
		None => name.to_string(),
	};

	let through = match (&args.through_table, &args.through_column) {
		(Some(table), Some(column)) => quote! {
			fn through() -> ::tagweave::Through {
				::tagweave::Through::direct(#table, #column)
			}
		},
		(None, None) => TokenStream::new(),
		(Some(lit), None) | (None, Some(lit)) => {
			return Err(syn::Error::new(
				lit.span(),
				"through_table and through_column must be given together",
			));
		}
	};

	let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

	Ok(quote! {
		#input

		#[automatically_derived]
		impl #impl_generics ::tagweave::Taggable for #name #ty_generics #where_clause {
			fn content_type_name() -> &'static str {
				#content_type
			}

			fn object_id(&self) -> ::core::option::Option<i64> {
				::tagweave::ObjectIdentity::object_identity(&self.#id_field)
			}

			#through
		}

		#[automatically_derived]
		impl #impl_generics #name #ty_generics #where_clause {
			/// Tag manager bound to this record
			pub fn tags<'__tags>(
				&'__tags self,
				ctx: &'__tags ::tagweave::TagContext,
			) -> ::tagweave::TagManager<'__tags, Self> {
				ctx.manager(self)
			}
		}
	})
}
