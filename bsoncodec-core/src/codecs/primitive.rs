//! Codecs for scalar Rust types.
//!
//! Numeric codecs decode any numeric BSON type that converts to the target without loss,
//! so an `i64` field holding a small value can still be read into an `i32`.

use bson::{DateTime, oid::ObjectId, spec::ElementType};

use crate::{
    codec::{Codec, DecoderContext, EncoderContext},
    error::{CodecError, CodecResult},
    io::{BsonReader, BsonWriter},
};

/// Codec for `bool`, stored as a BSON boolean.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl Codec<bool> for BooleanCodec {
    fn encode(&self, writer: &mut BsonWriter, value: &bool, _: &EncoderContext) -> CodecResult<()> {
        writer.write_boolean(*value)
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<bool> {
        reader.read_boolean()
    }
}

/// Codec for `i32`, stored as a BSON 32-bit integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int32Codec;

impl Codec<i32> for Int32Codec {
    fn encode(&self, writer: &mut BsonWriter, value: &i32, _: &EncoderContext) -> CodecResult<()> {
        writer.write_int32(*value)
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<i32> {
        let value = read_integer(reader)?;
        i32::try_from(value).map_err(|_| {
            CodecError::Decoding(format!("{value} does not fit in a 32-bit integer"))
        })
    }
}

/// Codec for `i64`, stored as a BSON 64-bit integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int64Codec;

impl Codec<i64> for Int64Codec {
    fn encode(&self, writer: &mut BsonWriter, value: &i64, _: &EncoderContext) -> CodecResult<()> {
        writer.write_int64(*value)
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<i64> {
        read_integer(reader)
    }
}

/// Codec for `u32`, stored as a BSON 64-bit integer so every value fits.
#[derive(Debug, Clone, Copy, Default)]
pub struct UInt32Codec;

impl Codec<u32> for UInt32Codec {
    fn encode(&self, writer: &mut BsonWriter, value: &u32, _: &EncoderContext) -> CodecResult<()> {
        writer.write_int64(i64::from(*value))
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<u32> {
        let value = read_integer(reader)?;
        u32::try_from(value).map_err(|_| {
            CodecError::Decoding(format!("{value} does not fit in an unsigned 32-bit integer"))
        })
    }
}

/// Codec for `u64`, stored as a BSON 64-bit integer.
///
/// Values above `i64::MAX` have no BSON representation and fail to encode.
#[derive(Debug, Clone, Copy, Default)]
pub struct UInt64Codec;

impl Codec<u64> for UInt64Codec {
    fn encode(&self, writer: &mut BsonWriter, value: &u64, _: &EncoderContext) -> CodecResult<()> {
        let value = i64::try_from(*value).map_err(|_| {
            CodecError::Encoding(format!("{value} is out of range for a 64-bit BSON integer"))
        })?;
        writer.write_int64(value)
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<u64> {
        let value = read_integer(reader)?;
        u64::try_from(value).map_err(|_| {
            CodecError::Decoding(format!("{value} does not fit in an unsigned 64-bit integer"))
        })
    }
}

/// Codec for `f64`, stored as a BSON double.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleCodec;

impl Codec<f64> for DoubleCodec {
    fn encode(&self, writer: &mut BsonWriter, value: &f64, _: &EncoderContext) -> CodecResult<()> {
        writer.write_double(*value)
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<f64> {
        match reader.read_bson_type()? {
            Some(ElementType::Int32) => Ok(f64::from(reader.read_int32()?)),
            Some(ElementType::Int64) => {
                let value = reader.read_int64()?;
                let converted = value as f64;
                // i64::MAX rounds up to 2^63, which saturates back to i64::MAX on the cast.
                if converted < i64::MAX as f64 && converted as i64 == value {
                    Ok(converted)
                } else {
                    Err(CodecError::Decoding(format!(
                        "{value} cannot be represented exactly as a double"
                    )))
                }
            }
            _ => reader.read_double(),
        }
    }
}

/// Codec for `String`, stored as a BSON string.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec<String> for StringCodec {
    fn encode(
        &self,
        writer: &mut BsonWriter,
        value: &String,
        _: &EncoderContext,
    ) -> CodecResult<()> {
        writer.write_string(value.as_str())
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<String> {
        reader.read_string()
    }
}

/// Codec for [`ObjectId`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdCodec;

impl Codec<ObjectId> for ObjectIdCodec {
    fn encode(
        &self,
        writer: &mut BsonWriter,
        value: &ObjectId,
        _: &EncoderContext,
    ) -> CodecResult<()> {
        writer.write_object_id(*value)
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<ObjectId> {
        reader.read_object_id()
    }
}

/// Codec for BSON [`DateTime`] (milliseconds since the Unix epoch).
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeCodec;

impl Codec<DateTime> for DateTimeCodec {
    fn encode(
        &self,
        writer: &mut BsonWriter,
        value: &DateTime,
        _: &EncoderContext,
    ) -> CodecResult<()> {
        writer.write_date_time(*value)
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<DateTime> {
        reader.read_date_time()
    }
}

/// Reads any integral numeric value as an `i64`.
fn read_integer(reader: &mut BsonReader<'_>) -> CodecResult<i64> {
    match reader.read_bson_type()? {
        Some(ElementType::Int32) => Ok(i64::from(reader.read_int32()?)),
        Some(ElementType::Double) => {
            let value = reader.read_double()?;
            if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
                Ok(value as i64)
            } else {
                Err(CodecError::Decoding(format!(
                    "{value} cannot be converted to an integer without loss"
                )))
            }
        }
        _ => reader.read_int64(),
    }
}

#[cfg(test)]
mod tests {
    use bson::{Bson, doc};
    use proptest::prelude::*;

    use super::*;

    fn roundtrip<T, C: Codec<T>>(codec: &C, value: &T) -> T {
        let mut writer = BsonWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("v").unwrap();
        codec
            .encode(&mut writer, value, &EncoderContext::default())
            .unwrap();
        writer.write_end_document().unwrap();
        let doc = writer.into_document().unwrap();

        let mut reader = BsonReader::new(&doc);
        reader.read_start_document().unwrap();
        reader.read_name().unwrap();
        let decoded = codec.decode(&mut reader, &DecoderContext::default()).unwrap();
        reader.read_end_document().unwrap();
        decoded
    }

    fn decode_field<T, C: Codec<T>>(codec: &C, value: Bson) -> CodecResult<T> {
        let doc = doc! { "v": value };
        let mut reader = BsonReader::new(&doc);
        reader.read_start_document()?;
        reader.read_name()?;
        codec.decode(&mut reader, &DecoderContext::default())
    }

    proptest! {
        #[test]
        fn prop_int32_roundtrip(value in any::<i32>()) {
            prop_assert_eq!(roundtrip(&Int32Codec, &value), value);
        }

        #[test]
        fn prop_int64_roundtrip(value in any::<i64>()) {
            prop_assert_eq!(roundtrip(&Int64Codec, &value), value);
        }

        #[test]
        fn prop_uint32_roundtrip(value in any::<u32>()) {
            prop_assert_eq!(roundtrip(&UInt32Codec, &value), value);
        }

        #[test]
        fn prop_uint64_roundtrip(value in 0..=i64::MAX as u64) {
            prop_assert_eq!(roundtrip(&UInt64Codec, &value), value);
        }

        #[test]
        fn prop_string_roundtrip(value in ".*") {
            prop_assert_eq!(roundtrip(&StringCodec, &value), value);
        }

        #[test]
        fn prop_double_roundtrip(value in any::<f64>().prop_filter("NaN never equals itself", |v| !v.is_nan())) {
            prop_assert_eq!(roundtrip(&DoubleCodec, &value), value);
        }
    }

    #[test]
    fn test_boolean_and_object_id_roundtrip() {
        assert!(roundtrip(&BooleanCodec, &true));
        assert!(!roundtrip(&BooleanCodec, &false));

        let id = ObjectId::new();
        assert_eq!(roundtrip(&ObjectIdCodec, &id), id);

        let now = DateTime::from_millis(1_700_000_000_123);
        assert_eq!(roundtrip(&DateTimeCodec, &now), now);
    }

    #[test]
    fn test_int32_accepts_lossless_numbers() {
        assert_eq!(decode_field(&Int32Codec, Bson::Int64(42)).unwrap(), 42);
        assert_eq!(decode_field(&Int32Codec, Bson::Double(7.0)).unwrap(), 7);
        assert!(decode_field(&Int32Codec, Bson::Int64(i64::MAX)).is_err());
        assert!(decode_field(&Int32Codec, Bson::Double(1.5)).is_err());
        assert!(matches!(
            decode_field(&Int32Codec, Bson::String("1".into())),
            Err(CodecError::Decoding(_))
        ));
    }

    #[test]
    fn test_uint64_out_of_range_fails_to_encode() {
        let mut writer = BsonWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("v").unwrap();
        let err = UInt64Codec
            .encode(&mut writer, &u64::MAX, &EncoderContext::default())
            .unwrap_err();
        assert!(matches!(err, CodecError::Encoding(_)));
    }

    #[test]
    fn test_unsigned_rejects_negative() {
        assert!(decode_field(&UInt32Codec, Bson::Int32(-1)).is_err());
        assert!(decode_field(&UInt64Codec, Bson::Int64(-1)).is_err());
    }

    #[test]
    fn test_double_rejects_int64_that_rounds() {
        assert_eq!(
            decode_field(&DoubleCodec, Bson::Int64(1 << 53)).unwrap(),
            9_007_199_254_740_992.0
        );
        assert!(matches!(
            decode_field(&DoubleCodec, Bson::Int64(i64::MAX)),
            Err(CodecError::Decoding(_))
        ));
        assert!(decode_field(&DoubleCodec, Bson::Int64((1 << 53) + 1)).is_err());
    }

    #[test]
    fn test_widening_inside_array_without_explicit_type_read() {
        let doc = doc! { "v": [1_i32, 2_i32], "d": [3_i32, 4_i64] };
        let mut reader = BsonReader::new(&doc);
        let context = DecoderContext::default();
        reader.read_start_document().unwrap();

        reader.read_name().unwrap();
        reader.read_start_array().unwrap();
        assert_eq!(Int64Codec.decode(&mut reader, &context).unwrap(), 1);
        assert_eq!(Int64Codec.decode(&mut reader, &context).unwrap(), 2);
        assert!(Int64Codec.decode(&mut reader, &context).is_err());
        reader.read_end_array().unwrap();

        reader.read_name().unwrap();
        reader.read_start_array().unwrap();
        assert_eq!(DoubleCodec.decode(&mut reader, &context).unwrap(), 3.0);
        assert_eq!(DoubleCodec.decode(&mut reader, &context).unwrap(), 4.0);
        reader.read_end_array().unwrap();
        reader.read_end_document().unwrap();
    }

    #[test]
    fn test_boolean_rejects_string() {
        assert!(matches!(
            decode_field(&BooleanCodec, Bson::String("on".into())),
            Err(CodecError::Decoding(_))
        ));
    }
}
