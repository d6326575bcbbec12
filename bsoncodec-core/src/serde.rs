//! Bridge from `serde` to codecs.
//!
//! Types that already implement `Serialize` and `Deserialize` can be registered with a
//! [`SerdeCodecProvider`] instead of writing a codec by hand. Values are converted with the
//! `bson` crate's serde support, so `#[serde(...)]` attributes apply as usual.

use ::serde::{Serialize, de::DeserializeOwned};
use bson::{de::deserialize_from_bson, ser::serialize_to_bson};
use std::{collections::HashMap, fmt, marker::PhantomData};

use crate::{
    codec::{AnyCodec, Codec, DecoderContext, EncoderContext, TypeKey},
    error::{CodecError, CodecResult},
    io::{BsonReader, BsonWriter},
    provider::CodecProvider,
    registry::CodecRegistry,
};

/// Codec for any `Serialize + DeserializeOwned` type.
pub struct SerdeCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeCodec<T> {
    /// Creates the codec.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeCodec")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Codec<T> for SerdeCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, writer: &mut BsonWriter, value: &T, _: &EncoderContext) -> CodecResult<()> {
        let value =
            serialize_to_bson(value).map_err(|e| CodecError::Encoding(e.to_string()))?;
        writer.write_value(value)
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<T> {
        deserialize_from_bson(reader.read_value()?)
            .map_err(|e| CodecError::Decoding(e.to_string()))
    }
}

type BuildFn = fn() -> AnyCodec;

fn build_any<T>() -> AnyCodec
where
    T: Serialize + DeserializeOwned + 'static,
{
    AnyCodec::new::<T, _>(SerdeCodec::<T>::new())
}

/// Provider serving [`SerdeCodec`]s for an explicit set of types.
#[derive(Clone, Default)]
pub struct SerdeCodecProvider {
    types: HashMap<TypeKey, BuildFn>,
}

impl SerdeCodecProvider {
    /// Creates a builder for a serde provider.
    pub fn builder() -> SerdeCodecProviderBuilder {
        SerdeCodecProviderBuilder::default()
    }
}

impl CodecProvider for SerdeCodecProvider {
    fn get(&self, key: TypeKey, _: &CodecRegistry) -> CodecResult<Option<AnyCodec>> {
        Ok(self.types.get(&key).map(|build| build()))
    }
}

impl fmt::Debug for SerdeCodecProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeCodecProvider")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`SerdeCodecProvider`].
#[derive(Default)]
pub struct SerdeCodecProviderBuilder {
    types: HashMap<TypeKey, BuildFn>,
}

impl SerdeCodecProviderBuilder {
    /// Registers `T` to be encoded through its serde implementation.
    pub fn register<T>(mut self) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        self.types.insert(TypeKey::of::<T>(), build_any::<T>);
        self
    }

    /// Builds the provider.
    pub fn build(self) -> SerdeCodecProvider {
        SerdeCodecProvider { types: self.types }
    }
}
