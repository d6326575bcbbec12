//! Codecs that wrap the codec of an element type: `Option<T>` and `Vec<T>`.

use bson::spec::ElementType;
use std::sync::Arc;

use crate::{
    codec::{Codec, DecoderContext, EncoderContext},
    error::CodecResult,
    io::{BsonReader, BsonWriter},
};

/// Codec for `Option<T>`.
///
/// `None` is written as an explicit BSON null rather than omitting the field, and a BSON null
/// decodes to `None`. Any other value is delegated to the element codec.
pub struct NullableCodec<T> {
    inner: Arc<dyn Codec<T>>,
}

impl<T> NullableCodec<T> {
    /// Wraps the codec for the element type.
    pub fn new(inner: Arc<dyn Codec<T>>) -> Self {
        Self { inner }
    }
}

impl<T> Codec<Option<T>> for NullableCodec<T> {
    fn encode(
        &self,
        writer: &mut BsonWriter,
        value: &Option<T>,
        context: &EncoderContext,
    ) -> CodecResult<()> {
        match value {
            Some(value) => self.inner.encode(writer, value, context),
            None => writer.write_null(),
        }
    }

    fn decode(
        &self,
        reader: &mut BsonReader<'_>,
        context: &DecoderContext,
    ) -> CodecResult<Option<T>> {
        if reader.read_bson_type()? == Some(ElementType::Null) {
            reader.read_null()?;
            return Ok(None);
        }
        self.inner.decode(reader, context).map(Some)
    }
}

/// Codec for `Vec<T>`, stored as a BSON array.
pub struct ArrayCodec<T> {
    inner: Arc<dyn Codec<T>>,
}

impl<T> ArrayCodec<T> {
    /// Wraps the codec for the element type.
    pub fn new(inner: Arc<dyn Codec<T>>) -> Self {
        Self { inner }
    }
}

impl<T> Codec<Vec<T>> for ArrayCodec<T> {
    fn encode(
        &self,
        writer: &mut BsonWriter,
        value: &Vec<T>,
        context: &EncoderContext,
    ) -> CodecResult<()> {
        let context = context.child();
        writer.write_start_array()?;
        for item in value {
            self.inner.encode(writer, item, &context)?;
        }
        writer.write_end_array()
    }

    fn decode(&self, reader: &mut BsonReader<'_>, context: &DecoderContext) -> CodecResult<Vec<T>> {
        reader.read_start_array()?;
        let mut items = Vec::new();
        while reader.read_bson_type()?.is_some() {
            items.push(self.inner.decode(reader, context)?);
        }
        reader.read_end_array()?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use bson::{Bson, doc};

    use super::*;
    use crate::{
        codecs::{Int32Codec, StringCodec},
        error::CodecError,
    };

    fn encode_field<T, C: Codec<T>>(codec: &C, value: &T) -> bson::Document {
        let mut writer = BsonWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("v").unwrap();
        codec
            .encode(&mut writer, value, &EncoderContext::default())
            .unwrap();
        writer.write_end_document().unwrap();
        writer.into_document().unwrap()
    }

    fn decode_field<T, C: Codec<T>>(codec: &C, doc: &bson::Document) -> CodecResult<T> {
        let mut reader = BsonReader::new(doc);
        reader.read_start_document()?;
        reader.read_name()?;
        let value = codec.decode(&mut reader, &DecoderContext::default())?;
        reader.read_end_document()?;
        Ok(value)
    }

    #[test]
    fn test_nullable_writes_explicit_null() {
        let codec = NullableCodec::<i32>::new(Arc::new(Int32Codec));
        let doc = encode_field(&codec, &None);
        assert_eq!(doc, doc! { "v": Bson::Null });
        assert_eq!(decode_field(&codec, &doc).unwrap(), None);
    }

    #[test]
    fn test_nullable_delegates_values() {
        let codec = NullableCodec::<String>::new(Arc::new(StringCodec));
        let doc = encode_field(&codec, &Some("x".to_string()));
        assert_eq!(doc, doc! { "v": "x" });
        assert_eq!(decode_field(&codec, &doc).unwrap(), Some("x".to_string()));
    }

    #[test]
    fn test_non_nullable_rejects_null() {
        let doc = doc! { "v": Bson::Null };
        assert!(matches!(
            decode_field::<i32, _>(&Int32Codec, &doc),
            Err(CodecError::Decoding(_))
        ));
    }

    #[test]
    fn test_array_roundtrip() {
        let codec = ArrayCodec::<i32>::new(Arc::new(Int32Codec));
        let doc = encode_field(&codec, &vec![1, 2, 3]);
        assert_eq!(doc, doc! { "v": [1, 2, 3] });
        assert_eq!(decode_field(&codec, &doc).unwrap(), vec![1, 2, 3]);

        let empty = encode_field(&codec, &Vec::new());
        assert_eq!(decode_field(&codec, &empty).unwrap(), Vec::<i32>::new());
    }

    #[test]
    fn test_array_of_nullable() {
        let codec = ArrayCodec::new(Arc::new(NullableCodec::<i32>::new(Arc::new(Int32Codec))));
        let doc = encode_field(&codec, &vec![Some(1), None]);
        assert_eq!(doc, doc! { "v": [1, Bson::Null] });
        assert_eq!(decode_field(&codec, &doc).unwrap(), vec![Some(1), None]);
    }

    #[test]
    fn test_array_element_type_mismatch_fails() {
        let codec = ArrayCodec::<i32>::new(Arc::new(Int32Codec));
        let doc = doc! { "v": [1, "two"] };
        assert!(decode_field(&codec, &doc).is_err());
    }
}
