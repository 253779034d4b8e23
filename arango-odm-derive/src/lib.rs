#![recursion_limit = "128"]
//! # Arango ODM Derive Macros
//!
//! This crate provides the `ArangoEntity` derive macro, which generates the
//! mapping description of an entity type from `#[arango(...)]` attributes.
//!
//! ## Type attributes
//!
//! - `document(..)` / `edge(..)` - backing collection and its creation options
//! - `search_view(..)` - search view the type contributes to
//! - `hash_index(..)`, `skiplist_index(..)`, `persistent_index(..)`,
//!   `geo_index(..)`, `fulltext_index(..)` - repeatable index declarations
//!
//! ## Field attributes
//!
//! - `id`, `rev`, `arango_id` - identity properties (`_key`, `_rev`, `_id`)
//! - `hash_indexed`, `skiplist_indexed`, `persistent_indexed`, `geo_indexed`,
//!   `fulltext_indexed` - single field indexes
//! - `field_link(..)` - the field is linked by the search view
//! - `base` - the field holds the base type whose configuration is inherited;
//!   combine it with `#[serde(flatten)]`
//!
//! Property names follow `#[serde(rename = "..")]`.
//!
//! # Examples
//!
//! ```rust,ignore
//! use arango_odm_derive::ArangoEntity;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(ArangoEntity, Serialize, Deserialize)]
//! #[arango(document(name = "products", allow_user_keys, key_type = "uuid"))]
//! #[arango(hash_index(fields = "vendor, sku", unique))]
//! pub struct Product {
//!     #[arango(id)]
//!     pub id: Option<String>,
//!     #[arango(rev)]
//!     pub rev: Option<String>,
//!     pub vendor: String,
//!     pub sku: String,
//!     #[arango(fulltext_indexed(min_length = 3))]
//!     pub description: String,
//! }
//! ```

extern crate proc_macro;
mod arango_entity;

use crate::arango_entity::generate_entity_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives the `ArangoEntity` trait from `#[arango(...)]` attributes.
///
/// # Supported Types
///
/// - Structs with named fields only
/// - Enums and unions are not supported
///
/// # Errors
///
/// Returns a compile error if:
/// - Applied to an enum, a union, a tuple struct or a unit struct
/// - An attribute key is unknown or repeated
/// - `document`, `edge` or `search_view` is declared twice
/// - More than one field is marked as `base`
#[proc_macro_derive(ArangoEntity, attributes(arango))]
pub fn derive_arango_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_entity_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => e.to_compile_error().into(),
        },
        Data::Enum(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive ArangoEntity for enums. Only structs with named fields are supported.",
            );
            error.to_compile_error().into()
        }
        Data::Union(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive ArangoEntity for unions. Only structs with named fields are supported.",
            );
            error.to_compile_error().into()
        }
    }
}
