//! Codec registries: the single lookup surface mapping types to codecs.
//!
//! A [`CodecRegistry`] is an ordered, immutable list of [`CodecProvider`]s. Looking up a type
//! asks each provider in turn and returns the first codec produced. Registries are providers
//! themselves, so they compose:
//!
//! ```ignore
//! use bsoncodec::prelude::*;
//!
//! let models = ModelCodecProvider::builder().register::<Penguin>().build();
//! let registry = CodecRegistry::from_registries([
//!     default_registry(),
//!     CodecRegistry::from_provider(models),
//! ]);
//!
//! let doc = registry.encode(&Penguin::new("Robin", 51, Family::Adelie))?;
//! let penguin: Penguin = registry.decode(&doc)?;
//! ```
//!
//! # Resolution rules
//!
//! - Earlier providers win. `from_registries([a, b])` consults `b` only for types `a` cannot
//!   supply.
//! - Providers always receive the outermost registry, so codecs they build resolve their
//!   field types against the complete chain, including providers registered after them.
//! - A type that no provider supplies fails with [`CodecError::CodecNotFound`] at lookup time.
//! - While a provider builds the codec for `T`, a nested lookup of `T` itself (directly or
//!   through other types) returns a [`LazyCodec`] that resolves `T` again on first use. This
//!   is what allows self-referential models such as trees.
//!
//! # Thread Safety
//!
//! Registries are immutable once built and are `Send + Sync`; cloning one is cheap and all
//! clones share the same providers.

use bson::Document;
use std::{fmt, sync::Arc, sync::OnceLock};
use tracing::{debug, trace};

use crate::{
    codec::{
        AnyCodec, Codec, DecoderContext, EncoderContext, TypeKey, decode_document,
        encode_document,
    },
    codecs::{ArrayCodec, NullableCodec},
    error::{CodecError, CodecResult},
    io::{self, BsonReader, BsonWriter},
    provider::{CodecMap, CodecProvider},
};

/// One link in the chain of types whose codecs are currently being built.
struct Resolving {
    key: TypeKey,
    parent: Option<Arc<Resolving>>,
}

/// An immutable, composable collection of codec providers.
#[derive(Clone)]
pub struct CodecRegistry {
    providers: Arc<[Arc<dyn CodecProvider>]>,
    resolving: Option<Arc<Resolving>>,
}

impl CodecRegistry {
    /// Creates a builder for composing a registry step by step.
    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::default()
    }

    /// Creates a registry that supplies no codecs.
    pub fn empty() -> Self {
        Self::from_providers([])
    }

    /// Creates a registry from providers, consulted in the given order.
    pub fn from_providers(providers: impl IntoIterator<Item = Arc<dyn CodecProvider>>) -> Self {
        Self {
            providers: providers.into_iter().collect(),
            resolving: None,
        }
    }

    /// Creates a registry from a single provider.
    pub fn from_provider(provider: impl CodecProvider + 'static) -> Self {
        Self::from_providers([Arc::new(provider) as Arc<dyn CodecProvider>])
    }

    /// Combines registries; earlier registries take precedence over later ones.
    pub fn from_registries(registries: impl IntoIterator<Item = CodecRegistry>) -> Self {
        Self::from_providers(
            registries
                .into_iter()
                .map(|registry| Arc::new(registry.root()) as Arc<dyn CodecProvider>),
        )
    }

    /// Creates a registry serving a fixed set of prebuilt codecs.
    pub fn from_codecs(codecs: impl IntoIterator<Item = AnyCodec>) -> Self {
        Self::from_provider(codecs.into_iter().collect::<CodecMap>())
    }

    /// Returns the codec for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::CodecNotFound`] if no provider supplies `T`, or the error a
    /// provider raised while building the codec.
    pub fn get<T: 'static>(&self) -> CodecResult<Arc<dyn Codec<T>>> {
        self.try_get::<T>()?.ok_or_else(|| {
            let key = TypeKey::of::<T>();
            debug!(type_name = key.name(), "no provider supplies a codec");
            CodecError::CodecNotFound(key.name().to_string())
        })
    }

    /// Returns the codec for `T`, or `None` if no provider supplies it.
    pub fn try_get<T: 'static>(&self) -> CodecResult<Option<Arc<dyn Codec<T>>>> {
        let key = TypeKey::of::<T>();
        if self.is_resolving(key) {
            debug!(type_name = key.name(), "deferring recursive codec lookup");
            return Ok(Some(Arc::new(LazyCodec::<T>::new(self.root()))));
        }

        let child = self.child(key);
        match self.resolve(key, &child)? {
            Some(codec) => match codec.downcast::<T>() {
                Some(codec) => Ok(Some(codec)),
                None => Err(CodecError::InvalidCodec(
                    key.name().to_string(),
                    codec.type_key().name().to_string(),
                )),
            },
            None => Ok(None),
        }
    }

    /// Returns a codec for `Option<T>`.
    ///
    /// A codec registered for `Option<T>` itself takes precedence; otherwise the codec for `T`
    /// is wrapped in a [`NullableCodec`].
    pub fn get_nullable<T: 'static>(&self) -> CodecResult<Arc<dyn Codec<Option<T>>>> {
        if let Some(codec) = self.try_get::<Option<T>>()? {
            return Ok(codec);
        }
        Ok(Arc::new(NullableCodec::new(self.get::<T>()?)))
    }

    /// Returns a codec for `Vec<T>`.
    ///
    /// A codec registered for `Vec<T>` itself takes precedence; otherwise the codec for `T`
    /// is wrapped in an [`ArrayCodec`].
    pub fn get_array<T: 'static>(&self) -> CodecResult<Arc<dyn Codec<Vec<T>>>> {
        if let Some(codec) = self.try_get::<Vec<T>>()? {
            return Ok(codec);
        }
        Ok(Arc::new(ArrayCodec::new(self.get::<T>()?)))
    }

    /// Encodes `value` as a top-level document using the codec registered for `T`.
    ///
    /// The value is encoded as a collectible document, so a model's `_id` field is written
    /// first.
    pub fn encode<T: 'static>(&self, value: &T) -> CodecResult<Document> {
        let context = EncoderContext::builder()
            .encoding_collectible_document(true)
            .build();
        self.encode_with(value, &context)
    }

    /// Encodes `value` as a top-level document with an explicit context.
    pub fn encode_with<T: 'static>(
        &self,
        value: &T,
        context: &EncoderContext,
    ) -> CodecResult<Document> {
        let codec = self.get::<T>()?;
        encode_document(&*codec, value, context)
    }

    /// Decodes a `T` from a top-level document using the codec registered for `T`.
    pub fn decode<T: 'static>(&self, doc: &Document) -> CodecResult<T> {
        self.decode_with(doc, &DecoderContext::default())
    }

    /// Decodes a `T` from a top-level document with an explicit context.
    pub fn decode_with<T: 'static>(
        &self,
        doc: &Document,
        context: &DecoderContext,
    ) -> CodecResult<T> {
        let codec = self.get::<T>()?;
        decode_document(&*codec, doc, context)
    }

    /// Encodes `value` straight to BSON bytes.
    pub fn to_vec<T: 'static>(&self, value: &T) -> CodecResult<Vec<u8>> {
        io::to_vec(&self.encode(value)?)
    }

    /// Decodes a `T` straight from BSON bytes.
    pub fn from_slice<T: 'static>(&self, bytes: &[u8]) -> CodecResult<T> {
        self.decode(&io::from_slice(bytes)?)
    }

    /// Returns the number of providers at the top level of this registry.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if the registry has no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn resolve(&self, key: TypeKey, registry: &CodecRegistry) -> CodecResult<Option<AnyCodec>> {
        for (index, provider) in self.providers.iter().enumerate() {
            if let Some(codec) = provider.get(key, registry)? {
                trace!(type_name = key.name(), provider = index, "resolved codec");
                return Ok(Some(codec));
            }
        }
        Ok(None)
    }

    fn is_resolving(&self, key: TypeKey) -> bool {
        let mut link = self.resolving.as_deref();
        while let Some(resolving) = link {
            if resolving.key == key {
                return true;
            }
            link = resolving.parent.as_deref();
        }
        false
    }

    fn child(&self, key: TypeKey) -> Self {
        Self {
            providers: self.providers.clone(),
            resolving: Some(Arc::new(Resolving {
                key,
                parent: self.resolving.clone(),
            })),
        }
    }

    fn root(&self) -> Self {
        Self {
            providers: self.providers.clone(),
            resolving: None,
        }
    }
}

impl CodecProvider for CodecRegistry {
    fn get(&self, key: TypeKey, registry: &CodecRegistry) -> CodecResult<Option<AnyCodec>> {
        self.resolve(key, registry)
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut resolving = Vec::new();
        let mut link = self.resolving.as_deref();
        while let Some(current) = link {
            resolving.push(current.key);
            link = current.parent.as_deref();
        }
        resolving.reverse();

        f.debug_struct("CodecRegistry")
            .field("providers", &self.providers.len())
            .field("resolving", &resolving)
            .finish()
    }
}

/// Builder for composing a [`CodecRegistry`] from providers, registries and codecs.
///
/// Sources are consulted in the order they were added.
///
/// # Example
///
/// ```ignore
/// let registry = CodecRegistry::builder()
///     .codec::<i64, _>(EpochMillisCodec)
///     .registry(default_registry())
///     .provider(ModelCodecProvider::builder().register::<Penguin>().build())
///     .build();
/// ```
#[derive(Default)]
pub struct CodecRegistryBuilder {
    providers: Vec<Arc<dyn CodecProvider>>,
}

impl CodecRegistryBuilder {
    /// Appends a provider.
    pub fn provider(mut self, provider: impl CodecProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Appends a registry.
    pub fn registry(mut self, registry: CodecRegistry) -> Self {
        self.providers.push(Arc::new(registry.root()));
        self
    }

    /// Appends a single prebuilt codec for `T`.
    pub fn codec<T, C>(mut self, codec: C) -> Self
    where
        T: 'static,
        C: Codec<T> + 'static,
    {
        let mut map = CodecMap::new();
        map.insert::<T, C>(codec);
        self.providers.push(Arc::new(map));
        self
    }

    /// Builds the registry.
    pub fn build(self) -> CodecRegistry {
        CodecRegistry::from_providers(self.providers)
    }
}

/// A codec that looks up the real codec for `T` the first time it is used.
///
/// Registries hand these out for recursive lookups (a type whose codec is still being built).
/// The lookup happens against the root registry and is performed at most once.
pub struct LazyCodec<T> {
    registry: CodecRegistry,
    codec: OnceLock<Arc<dyn Codec<T>>>,
}

impl<T: 'static> LazyCodec<T> {
    /// Creates a lazy codec resolving `T` through `registry`.
    pub fn new(registry: CodecRegistry) -> Self {
        Self {
            registry,
            codec: OnceLock::new(),
        }
    }

    fn codec(&self) -> CodecResult<&Arc<dyn Codec<T>>> {
        if let Some(codec) = self.codec.get() {
            return Ok(codec);
        }
        let codec = self.registry.get::<T>()?;
        Ok(self.codec.get_or_init(|| codec))
    }
}

impl<T: 'static> Codec<T> for LazyCodec<T> {
    fn encode(
        &self,
        writer: &mut BsonWriter,
        value: &T,
        context: &EncoderContext,
    ) -> CodecResult<()> {
        self.codec()?.encode(writer, value, context)
    }

    fn decode(&self, reader: &mut BsonReader<'_>, context: &DecoderContext) -> CodecResult<T> {
        self.codec()?.decode(reader, context)
    }
}

impl<T> fmt::Debug for LazyCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCodec")
            .field("resolved", &self.codec.get().is_some())
            .finish()
    }
}
