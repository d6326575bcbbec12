//! Codec providers: factories that build codecs on demand.
//!
//! A [`CodecProvider`] is asked for a codec by [`TypeKey`] and answers with a codec or
//! `None` ("not applicable"). Providers are composed into a
//! [`CodecRegistry`](crate::registry::CodecRegistry), which tries them in order and returns
//! the first match.
//!
//! # Example
//!
//! ```ignore
//! struct MonolightCodecProvider;
//!
//! impl CodecProvider for MonolightCodecProvider {
//!     fn get(&self, key: TypeKey, registry: &CodecRegistry) -> CodecResult<Option<AnyCodec>> {
//!         if key.is::<Monolight>() {
//!             return Ok(Some(AnyCodec::new(MonolightCodec::new(registry)?)));
//!         }
//!         if key.is::<PowerStatus>() {
//!             return Ok(Some(AnyCodec::new(PowerStatusCodec)));
//!         }
//!         Ok(None)
//!     }
//! }
//! ```

use std::collections::HashMap;

use crate::{
    codec::{AnyCodec, Codec, TypeKey},
    error::CodecResult,
    registry::CodecRegistry,
};

/// Factory producing codecs for the types it knows about.
///
/// # Contract
///
/// - `get` is a pure lookup: repeated calls with the same key return equivalent codecs.
/// - Codecs for nested field types are obtained from `registry`, never hardcoded, so the
///   composition order of the registry decides which codec wins.
/// - `Ok(None)` means "not applicable"; an `Err` means the provider recognized the type but
///   could not build its codec (for instance, a field type has no codec).
///
/// Closures of the shape `Fn(TypeKey, &CodecRegistry) -> CodecResult<Option<AnyCodec>>` are
/// providers too.
pub trait CodecProvider: Send + Sync {
    /// Returns a codec for `key`, resolving nested codecs through `registry`.
    fn get(&self, key: TypeKey, registry: &CodecRegistry) -> CodecResult<Option<AnyCodec>>;
}

impl<F> CodecProvider for F
where
    F: Fn(TypeKey, &CodecRegistry) -> CodecResult<Option<AnyCodec>> + Send + Sync,
{
    fn get(&self, key: TypeKey, registry: &CodecRegistry) -> CodecResult<Option<AnyCodec>> {
        self(key, registry)
    }
}

/// A provider serving a fixed set of prebuilt codecs.
///
/// If several codecs handle the same type, the last one inserted wins.
#[derive(Debug, Clone, Default)]
pub struct CodecMap {
    codecs: HashMap<TypeKey, AnyCodec>,
}

impl CodecMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a codec for `T`.
    pub fn insert<T, C>(&mut self, codec: C)
    where
        T: 'static,
        C: Codec<T> + 'static,
    {
        self.insert_any(AnyCodec::new::<T, C>(codec));
    }

    /// Adds a type-erased codec under its own type key.
    pub fn insert_any(&mut self, codec: AnyCodec) {
        self.codecs.insert(codec.type_key(), codec);
    }

    /// Returns the number of codecs in the map.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Returns `true` if the map holds no codecs.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl FromIterator<AnyCodec> for CodecMap {
    fn from_iter<I: IntoIterator<Item = AnyCodec>>(iter: I) -> Self {
        let mut map = CodecMap::new();
        for codec in iter {
            map.insert_any(codec);
        }
        map
    }
}

impl CodecProvider for CodecMap {
    fn get(&self, key: TypeKey, _: &CodecRegistry) -> CodecResult<Option<AnyCodec>> {
        Ok(self.codecs.get(&key).cloned())
    }
}
