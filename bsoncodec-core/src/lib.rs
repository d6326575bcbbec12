//! Pluggable, typed BSON codecs resolved through composable registries.
//!
//! This crate is the core of the bsoncodec project and provides:
//!
//! - **Reader and writer** ([`io`]) - Ordered, typed cursors over BSON documents
//! - **Codecs** ([`codec`]) - The `Codec<T>` trait and type-erased codec handles
//! - **Built-in codecs** ([`codecs`]) - Scalars, BSON values, `Option<T>`, `Vec<T>` and the default registry
//! - **Providers** ([`provider`]) - Factories that build codecs on demand
//! - **Registries** ([`registry`]) - Ordered composition of providers with fallback lookup
//! - **Models** ([`model`]) - Codecs built from the codecs of a type's fields
//! - **Serde bridge** ([`serde`]) - Codecs for types that implement `Serialize`/`Deserialize`
//! - **Error handling** ([`error`]) - Error and result types shared by every operation
//!
//! # Example
//!
//! ```ignore
//! use bsoncodec_core::{codecs::default_registry, registry::CodecRegistry};
//!
//! let registry = CodecRegistry::from_registries([
//!     CodecRegistry::from_provider(MonolightCodecProvider),
//!     default_registry(),
//! ]);
//!
//! let doc = registry.encode(&Monolight::new(PowerStatus::On, 5200))?;
//! let light: Monolight = registry.decode(&doc)?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as bsoncodec_core;

pub mod codec;
pub mod codecs;
pub mod error;
pub mod io;
pub mod model;
pub mod provider;
pub mod registry;
pub mod serde;
