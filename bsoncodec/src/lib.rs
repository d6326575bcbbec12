//! Main bsoncodec crate providing typed, pluggable BSON codecs.
//!
//! This crate is the primary entry point for users of the bsoncodec framework. It re-exports
//! the core types from `bsoncodec-core` and the `#[derive(Model)]` macro from
//! `bsoncodec-macros`.
//!
//! # Features
//!
//! - **Hand-written codecs** - Implement [`Codec`](codec::Codec) to control exactly how a type maps to BSON
//! - **Composable registries** - Layer application codecs over the built-in ones, earlier layers win
//! - **Derived models** - `#[derive(Model)]` builds a document codec from the codecs of a struct's fields
//! - **Serde interop** - Route any `Serialize + Deserialize` type through the same registry
//!
//! # Quick Start
//!
//! ```ignore
//! use bsoncodec::prelude::*;
//!
//! #[derive(Debug, PartialEq, Model)]
//! pub struct Penguin {
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! let registry = CodecRegistry::from_registries([
//!     CodecRegistry::from_provider(ModelCodecProvider::builder().register::<Penguin>().build()),
//!     default_registry(),
//! ]);
//!
//! let penguin = Penguin { name: "Robin".to_string(), age: 3 };
//! let doc = registry.encode(&penguin).unwrap();
//! assert_eq!(doc, bson::doc! { "name": "Robin", "age": 3 });
//!
//! let decoded: Penguin = registry.decode(&doc).unwrap();
//! assert_eq!(decoded, penguin);
//! ```
//!
//! # Custom Codecs
//!
//! A codec for a type the default registry does not know is registered through a provider.
//! Providers receive the registry the lookup started from, so a codec for a composite type
//! can fetch the codecs of its parts from it:
//!
//! ```ignore
//! use bsoncodec::prelude::*;
//!
//! struct MonolightCodecProvider;
//!
//! impl CodecProvider for MonolightCodecProvider {
//!     fn get(&self, key: TypeKey, registry: &CodecRegistry) -> CodecResult<Option<AnyCodec>> {
//!         if key.is::<PowerStatus>() {
//!             return Ok(Some(AnyCodec::new::<PowerStatus, _>(PowerStatusCodec)));
//!         }
//!         if key.is::<Monolight>() {
//!             return Ok(Some(AnyCodec::new::<Monolight, _>(MonolightCodec::new(registry)?)));
//!         }
//!         Ok(None)
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as bsoncodec;

pub mod prelude;

pub use bsoncodec_core::{codec, codecs, error, io, model, provider, registry, serde};
pub use bsoncodec_macros::Model;

pub use bson;
