//! Built-in codecs and the default registry.
//!
//! [`default_registry`] supplies codecs for the scalar types, BSON's own value types and the
//! common `chrono`/`uuid` types. `Option<T>` and `Vec<T>` are not registered as such; they are
//! built on demand by [`CodecRegistry::get_nullable`] and [`CodecRegistry::get_array`] from
//! the codec of `T`.

mod document;
mod primitive;
mod temporal;
mod wrapper;

pub use document::{BsonValueCodec, DocumentCodec};
pub use primitive::{
    BooleanCodec, DateTimeCodec, DoubleCodec, Int32Codec, Int64Codec, ObjectIdCodec,
    StringCodec, UInt32Codec, UInt64Codec,
};
pub use temporal::{BsonUuidCodec, ChronoDateTimeCodec, UuidCodec};
pub use wrapper::{ArrayCodec, NullableCodec};

use bson::{Bson, Document, oid::ObjectId};

use crate::{
    codec::{AnyCodec, TypeKey},
    error::CodecResult,
    provider::{CodecMap, CodecProvider},
    registry::CodecRegistry,
};

/// Provider for the built-in value codecs.
#[derive(Debug, Clone)]
pub struct ValueCodecProvider {
    codecs: CodecMap,
}

impl ValueCodecProvider {
    /// Creates the provider with every built-in codec.
    pub fn new() -> Self {
        let mut codecs = CodecMap::new();
        codecs.insert::<bool, _>(BooleanCodec);
        codecs.insert::<i32, _>(Int32Codec);
        codecs.insert::<i64, _>(Int64Codec);
        codecs.insert::<u32, _>(UInt32Codec);
        codecs.insert::<u64, _>(UInt64Codec);
        codecs.insert::<f64, _>(DoubleCodec);
        codecs.insert::<String, _>(StringCodec);
        codecs.insert::<ObjectId, _>(ObjectIdCodec);
        codecs.insert::<bson::DateTime, _>(DateTimeCodec);
        codecs.insert::<chrono::DateTime<chrono::Utc>, _>(ChronoDateTimeCodec);
        codecs.insert::<bson::Uuid, _>(BsonUuidCodec);
        codecs.insert::<uuid::Uuid, _>(UuidCodec);
        codecs.insert::<Document, _>(DocumentCodec);
        codecs.insert::<Bson, _>(BsonValueCodec);
        Self { codecs }
    }
}

impl Default for ValueCodecProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecProvider for ValueCodecProvider {
    fn get(&self, key: TypeKey, registry: &CodecRegistry) -> CodecResult<Option<AnyCodec>> {
        self.codecs.get(key, registry)
    }
}

/// Returns a registry holding only the built-in value codecs.
///
/// Combine it with application providers via [`CodecRegistry::from_registries`]; put the
/// application registry first to override a built-in codec.
pub fn default_registry() -> CodecRegistry {
    CodecRegistry::from_provider(ValueCodecProvider::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_supplies_builtins() {
        let registry = default_registry();
        assert!(registry.get::<bool>().is_ok());
        assert!(registry.get::<u64>().is_ok());
        assert!(registry.get::<chrono::DateTime<chrono::Utc>>().is_ok());
        assert!(registry.get::<uuid::Uuid>().is_ok());
        assert!(registry.get::<Document>().is_ok());
        assert!(registry.get::<Bson>().is_ok());
        assert!(registry.get::<u8>().err().unwrap().is_codec_not_found());
    }
}
