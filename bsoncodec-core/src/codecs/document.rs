//! Pass-through codecs for values that are already BSON.

use bson::{Bson, Document, spec::ElementType};

use crate::{
    codec::{Codec, DecoderContext, EncoderContext},
    error::{CodecError, CodecResult},
    io::{BsonReader, BsonWriter},
};

/// Codec for [`Document`], copied as-is.
///
/// Works both at the root of a writer and as a field value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCodec;

impl Codec<Document> for DocumentCodec {
    fn encode(
        &self,
        writer: &mut BsonWriter,
        value: &Document,
        _: &EncoderContext,
    ) -> CodecResult<()> {
        writer.write_value(Bson::Document(value.clone()))
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<Document> {
        match reader.read_value()? {
            Bson::Document(doc) => Ok(doc),
            other => Err(CodecError::unexpected_type(
                ElementType::EmbeddedDocument,
                other.element_type(),
            )),
        }
    }
}

/// Codec for any [`Bson`] value, copied as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct BsonValueCodec;

impl Codec<Bson> for BsonValueCodec {
    fn encode(&self, writer: &mut BsonWriter, value: &Bson, _: &EncoderContext) -> CodecResult<()> {
        writer.write_value(value.clone())
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<Bson> {
        reader.read_value()
    }
}
