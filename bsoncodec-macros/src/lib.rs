//! Procedural macros for the bsoncodec project.
//!
//! `#[derive(Model)]` implements `bsoncodec::model::Model` for structs with named fields and
//! for enums whose variants carry no data. The generated codec resolves the codec of every
//! field through the registry it is built from.
//!
//! Supported attributes:
//!
//! - `#[bson(rename = "...")]` on a field or variant: the name used in BSON.
//! - `#[bson(default)]` on a field: use `Default::default()` when the field is absent.
//! - `#[bson(skip)]` on a field: never written, always `Default::default()` when read.

#[allow(unused_extern_crates)]
extern crate self as bsoncodec_macros;

mod model;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `bsoncodec::model::Model`.
#[proc_macro_derive(Model, attributes(bson))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
