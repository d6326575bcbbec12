//! The [`Codec`] trait and the type-erased handles the registry stores.
//!
//! A codec is a pair of functions mapping one Rust type to and from the primitives of
//! [`BsonWriter`] / [`BsonReader`]. Registries and providers work with [`AnyCodec`], which
//! erases the codec's type parameter so codecs for unrelated types can live in one lookup
//! table, and downcast back to `Arc<dyn Codec<T>>` when a caller asks for a specific `T`.

use bson::Document;
use std::{
    any::{Any, TypeId, type_name},
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::{
    error::CodecResult,
    io::{BsonReader, BsonWriter},
};

/// Descriptor identifying the Rust type a codec handles.
///
/// Keys compare and hash by [`TypeId`]; the type name is carried for error messages and logs.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Returns `true` if this key identifies `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Returns the underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the full type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Options passed down through an encode call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderContext {
    encoding_collectible_document: bool,
}

impl EncoderContext {
    /// Creates a builder for an encoder context.
    pub fn builder() -> EncoderContextBuilder {
        EncoderContextBuilder::default()
    }

    /// Returns `true` if the value being encoded is a top-level document stored in a
    /// collection, in which case its `_id` field is written first.
    pub fn is_encoding_collectible_document(&self) -> bool {
        self.encoding_collectible_document
    }

    /// Returns the context to use for values nested inside the current one.
    ///
    /// Nested documents are never collectible.
    pub fn child(&self) -> Self {
        Self {
            encoding_collectible_document: false,
        }
    }
}

/// Builder for [`EncoderContext`].
#[derive(Debug, Clone, Default)]
pub struct EncoderContextBuilder {
    context: EncoderContext,
}

impl EncoderContextBuilder {
    /// Marks the encoded value as a collectible top-level document.
    pub fn encoding_collectible_document(mut self, value: bool) -> Self {
        self.context.encoding_collectible_document = value;
        self
    }

    /// Builds the context.
    pub fn build(self) -> EncoderContext {
        self.context
    }
}

/// Options passed down through a decode call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderContext {
    deny_unknown_fields: bool,
}

impl DecoderContext {
    /// Creates a builder for a decoder context.
    pub fn builder() -> DecoderContextBuilder {
        DecoderContextBuilder::default()
    }

    /// Returns `true` if structured codecs should reject fields they do not recognize
    /// instead of skipping them.
    pub fn denies_unknown_fields(&self) -> bool {
        self.deny_unknown_fields
    }
}

/// Builder for [`DecoderContext`].
#[derive(Debug, Clone, Default)]
pub struct DecoderContextBuilder {
    context: DecoderContext,
}

impl DecoderContextBuilder {
    /// Rejects unknown fields with a decoding error.
    pub fn deny_unknown_fields(mut self, value: bool) -> Self {
        self.context.deny_unknown_fields = value;
        self
    }

    /// Builds the context.
    pub fn build(self) -> DecoderContext {
        self.context
    }
}

/// Bidirectional mapping between one Rust type `T` and BSON.
///
/// # Contract
///
/// - `encode` writes exactly one logical value: a single scalar, or a bracketed
///   start/fields/end sequence for structured types. It never leaves a field name without a
///   value.
/// - `decode` reads exactly the shape `encode` produces and fails with
///   [`CodecError::Decoding`](crate::error::CodecError::Decoding) when the element at the
///   cursor has an incompatible type.
/// - For every valid `v`, decoding the output of `encode(v)` yields a value equal to `v`.
///
/// Codecs are shared through registries across threads, so they must be `Send + Sync` and
/// hold no per-call state.
///
/// # Example
///
/// ```ignore
/// struct AnswerCodec;
///
/// impl Codec<Answer> for AnswerCodec {
///     fn encode(&self, writer: &mut BsonWriter, value: &Answer, _: &EncoderContext) -> CodecResult<()> {
///         writer.write_boolean(*value == Answer::Correct)
///     }
///
///     fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<Answer> {
///         Ok(if reader.read_boolean()? { Answer::Correct } else { Answer::Incorrect })
///     }
/// }
/// ```
pub trait Codec<T>: Send + Sync {
    /// Writes `value` at the writer's cursor.
    fn encode(&self, writer: &mut BsonWriter, value: &T, context: &EncoderContext)
    -> CodecResult<()>;

    /// Reads one value of type `T` at the reader's cursor.
    fn decode(&self, reader: &mut BsonReader<'_>, context: &DecoderContext) -> CodecResult<T>;

    /// Returns the key of the type this codec handles.
    fn type_key(&self) -> TypeKey
    where
        T: 'static,
    {
        TypeKey::of::<T>()
    }
}

impl<T, C: Codec<T> + ?Sized> Codec<T> for Arc<C> {
    fn encode(
        &self,
        writer: &mut BsonWriter,
        value: &T,
        context: &EncoderContext,
    ) -> CodecResult<()> {
        (**self).encode(writer, value, context)
    }

    fn decode(&self, reader: &mut BsonReader<'_>, context: &DecoderContext) -> CodecResult<T> {
        (**self).decode(reader, context)
    }
}

/// A type-erased, cheaply clonable codec handle.
///
/// Providers return `AnyCodec` so that a single provider can serve codecs for many types.
/// The registry checks the handle's [`TypeKey`] and downcasts it back to the requested type.
#[derive(Clone)]
pub struct AnyCodec {
    key: TypeKey,
    codec: Arc<dyn Any + Send + Sync>,
}

impl AnyCodec {
    /// Wraps a codec for `T`.
    pub fn new<T, C>(codec: C) -> Self
    where
        T: 'static,
        C: Codec<T> + 'static,
    {
        Self::from_arc::<T>(Arc::new(codec))
    }

    /// Wraps an already shared codec for `T`.
    pub fn from_arc<T: 'static>(codec: Arc<dyn Codec<T>>) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            codec: Arc::new(codec),
        }
    }

    /// Returns the key of the type the wrapped codec handles.
    pub fn type_key(&self) -> TypeKey {
        self.key
    }

    /// Returns the wrapped codec if it handles `T`.
    pub fn downcast<T: 'static>(&self) -> Option<Arc<dyn Codec<T>>> {
        self.codec.downcast_ref::<Arc<dyn Codec<T>>>().cloned()
    }
}

impl fmt::Debug for AnyCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyCodec").field("type", &self.key).finish()
    }
}

/// Encodes `value` as a standalone document with `codec`.
///
/// The codec must write a document. Nothing is returned unless the whole document was
/// written successfully.
pub fn encode_document<T, C>(codec: &C, value: &T, context: &EncoderContext) -> CodecResult<Document>
where
    C: Codec<T> + ?Sized,
{
    let mut writer = BsonWriter::new();
    codec.encode(&mut writer, value, context)?;
    writer.into_document()
}

/// Decodes a value from a standalone document with `codec`.
pub fn decode_document<T, C>(codec: &C, doc: &Document, context: &DecoderContext) -> CodecResult<T>
where
    C: Codec<T> + ?Sized,
{
    let mut reader = BsonReader::new(doc);
    codec.decode(&mut reader, context)
}
