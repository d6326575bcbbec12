//! Models: application types whose codec is built from the codecs of their fields.
//!
//! A [`Model`] knows how to build its own codec given a registry, resolving the codec of every
//! field through that registry. `#[derive(Model)]` implements the trait for structs with named
//! fields and for unit-only enums. [`ModelCodecProvider`] exposes a fixed set of models to a
//! [`CodecRegistry`].
//!
//! # Example
//!
//! ```ignore
//! use bsoncodec::prelude::*;
//!
//! #[derive(Debug, PartialEq, Model)]
//! pub struct Penguin {
//!     pub name: String,
//!     #[bson(rename = "heightInCm")]
//!     pub height: i32,
//!     pub family: Family,
//! }
//!
//! #[derive(Debug, PartialEq, Model)]
//! pub enum Family {
//!     Adelie,
//!     Emperor,
//! }
//!
//! let models = ModelCodecProvider::builder()
//!     .register::<Penguin>()
//!     .register::<Family>()
//!     .build();
//! let registry = CodecRegistry::from_registries([
//!     default_registry(),
//!     CodecRegistry::from_provider(models),
//! ]);
//! ```

use std::{collections::HashMap, fmt, sync::Arc};
use tracing::trace;

use crate::{
    codec::{AnyCodec, Codec, DecoderContext, TypeKey},
    error::{CodecError, CodecResult},
    io::BsonReader,
    provider::CodecProvider,
    registry::CodecRegistry,
};

/// A type that builds its own codec from the codecs of its fields.
pub trait Model: Sized + Send + Sync + 'static {
    /// Builds the codec for `Self`, resolving field codecs through `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::CodecNotFound`](crate::error::CodecError::CodecNotFound) if a
    /// field type has no codec in `registry`.
    fn codec(registry: &CodecRegistry) -> CodecResult<Arc<dyn Codec<Self>>>;
}

/// Handles a field a structured codec does not recognize.
///
/// The field's value is skipped, unless `context` denies unknown fields, in which case a
/// decoding error naming the field is returned. Call it right after
/// [`BsonReader::read_name`] returned `field`.
pub fn skip_unknown_field(
    reader: &mut BsonReader<'_>,
    context: &DecoderContext,
    model: &str,
    field: &str,
) -> CodecResult<()> {
    if context.denies_unknown_fields() {
        return Err(CodecError::Decoding(format!(
            "unknown field `{field}` in {model}"
        )));
    }
    trace!(model, field, "skipping unknown field");
    reader.skip_value()
}

/// Returns the error for a required field that is absent from the document.
pub fn missing_field(model: &str, field: &str) -> CodecError {
    CodecError::Decoding(format!("missing field `{field}` in {model}"))
}

type BuildFn = fn(&CodecRegistry) -> CodecResult<AnyCodec>;

fn build_any<M: Model>(registry: &CodecRegistry) -> CodecResult<AnyCodec> {
    Ok(AnyCodec::from_arc::<M>(M::codec(registry)?))
}

/// Provider for an explicit set of [`Model`] types.
///
/// Codecs are built on every lookup against the registry the lookup came from, so field types
/// always resolve against the complete registry chain.
#[derive(Clone, Default)]
pub struct ModelCodecProvider {
    models: HashMap<TypeKey, BuildFn>,
}

impl ModelCodecProvider {
    /// Creates a builder for a model provider.
    pub fn builder() -> ModelCodecProviderBuilder {
        ModelCodecProviderBuilder::default()
    }

    /// Returns `true` if `M` is registered with this provider.
    pub fn contains<M: Model>(&self) -> bool {
        self.models.contains_key(&TypeKey::of::<M>())
    }

    /// Returns the number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns `true` if no model is registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl CodecProvider for ModelCodecProvider {
    fn get(&self, key: TypeKey, registry: &CodecRegistry) -> CodecResult<Option<AnyCodec>> {
        match self.models.get(&key) {
            Some(build) => build(registry).map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for ModelCodecProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCodecProvider")
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`ModelCodecProvider`].
#[derive(Default)]
pub struct ModelCodecProviderBuilder {
    models: HashMap<TypeKey, BuildFn>,
}

impl ModelCodecProviderBuilder {
    /// Registers the model type `M`.
    pub fn register<M: Model>(mut self) -> Self {
        self.models.insert(TypeKey::of::<M>(), build_any::<M>);
        self
    }

    /// Builds the provider.
    pub fn build(self) -> ModelCodecProvider {
        ModelCodecProvider {
            models: self.models,
        }
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;
    use crate::{
        codec::EncoderContext,
        codecs::default_registry,
        io::BsonWriter,
    };

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i32,
        label: String,
    }

    struct PointCodec {
        x: Arc<dyn Codec<i32>>,
        label: Arc<dyn Codec<String>>,
    }

    impl Codec<Point> for PointCodec {
        fn encode(
            &self,
            writer: &mut BsonWriter,
            value: &Point,
            context: &EncoderContext,
        ) -> CodecResult<()> {
            writer.write_start_document()?;
            writer.write_name("x")?;
            self.x.encode(writer, &value.x, context)?;
            writer.write_name("label")?;
            self.label.encode(writer, &value.label, context)?;
            writer.write_end_document()
        }

        fn decode(
            &self,
            reader: &mut BsonReader<'_>,
            context: &DecoderContext,
        ) -> CodecResult<Point> {
            reader.read_start_document()?;
            let (mut x, mut label) = (None, None);
            while reader.read_bson_type()?.is_some() {
                match reader.read_name()?.as_str() {
                    "x" => x = Some(self.x.decode(reader, context)?),
                    "label" => label = Some(self.label.decode(reader, context)?),
                    other => skip_unknown_field(reader, context, "Point", other)?,
                }
            }
            reader.read_end_document()?;
            Ok(Point {
                x: x.ok_or_else(|| missing_field("Point", "x"))?,
                label: label.ok_or_else(|| missing_field("Point", "label"))?,
            })
        }
    }

    impl Model for Point {
        fn codec(registry: &CodecRegistry) -> CodecResult<Arc<dyn Codec<Self>>> {
            Ok(Arc::new(PointCodec {
                x: registry.get()?,
                label: registry.get()?,
            }))
        }
    }

    #[test]
    fn test_registered_model_resolves() {
        let provider = ModelCodecProvider::builder().register::<Point>().build();
        assert!(provider.contains::<Point>());
        assert_eq!(provider.len(), 1);

        let registry = CodecRegistry::from_registries([
            CodecRegistry::from_provider(provider),
            default_registry(),
        ]);
        let point = Point {
            x: 3,
            label: "p".to_string(),
        };
        let doc = registry.encode(&point).unwrap();
        assert_eq!(doc, doc! { "x": 3, "label": "p" });
        assert_eq!(registry.decode::<Point>(&doc).unwrap(), point);
    }

    #[test]
    fn test_unregistered_model_is_not_applicable() {
        let provider = ModelCodecProvider::builder().build();
        assert!(provider.is_empty());
        let registry = CodecRegistry::from_provider(provider);
        assert!(registry.try_get::<Point>().unwrap().is_none());
    }

    #[test]
    fn test_unknown_and_missing_fields() {
        let registry = CodecRegistry::from_registries([
            CodecRegistry::from_provider(
                ModelCodecProvider::builder().register::<Point>().build(),
            ),
            default_registry(),
        ]);

        let doc = doc! { "x": 1, "extra": [1, 2], "label": "a" };
        assert_eq!(
            registry.decode::<Point>(&doc).unwrap(),
            Point {
                x: 1,
                label: "a".to_string()
            }
        );

        let strict = DecoderContext::builder().deny_unknown_fields(true).build();
        assert_eq!(
            registry.decode_with::<Point>(&doc, &strict).unwrap_err(),
            CodecError::Decoding("unknown field `extra` in Point".to_string())
        );

        assert_eq!(
            registry.decode::<Point>(&doc! { "x": 1 }).unwrap_err(),
            missing_field("Point", "label")
        );
    }

    #[test]
    fn test_missing_field_codec_fails_lookup() {
        let provider = ModelCodecProvider::builder().register::<Point>().build();
        let registry = CodecRegistry::from_provider(provider);
        let err = registry.get::<Point>().err().unwrap();
        assert!(err.is_codec_not_found());
    }
}
