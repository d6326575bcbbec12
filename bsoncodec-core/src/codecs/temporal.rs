//! Codecs for `chrono` timestamps and UUIDs.

use bson::{Binary, spec::BinarySubtype};
use chrono::{DateTime, Utc};

use crate::{
    codec::{Codec, DecoderContext, EncoderContext},
    error::{CodecError, CodecResult},
    io::{BsonReader, BsonWriter},
};

/// Codec for `chrono::DateTime<Utc>`, stored as a BSON date-time.
///
/// BSON date-times have millisecond precision; sub-millisecond parts are truncated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoDateTimeCodec;

impl Codec<DateTime<Utc>> for ChronoDateTimeCodec {
    fn encode(
        &self,
        writer: &mut BsonWriter,
        value: &DateTime<Utc>,
        _: &EncoderContext,
    ) -> CodecResult<()> {
        writer.write_date_time(bson::DateTime::from_chrono(*value))
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<DateTime<Utc>> {
        Ok(reader.read_date_time()?.to_chrono())
    }
}

/// Codec for [`bson::Uuid`], stored as binary subtype 4.
#[derive(Debug, Clone, Copy, Default)]
pub struct BsonUuidCodec;

impl Codec<bson::Uuid> for BsonUuidCodec {
    fn encode(
        &self,
        writer: &mut BsonWriter,
        value: &bson::Uuid,
        _: &EncoderContext,
    ) -> CodecResult<()> {
        writer.write_binary(uuid_binary(value.bytes()))
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<bson::Uuid> {
        Ok(bson::Uuid::from_bytes(read_uuid_bytes(reader)?))
    }
}

/// Codec for [`uuid::Uuid`], stored as binary subtype 4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidCodec;

impl Codec<uuid::Uuid> for UuidCodec {
    fn encode(
        &self,
        writer: &mut BsonWriter,
        value: &uuid::Uuid,
        _: &EncoderContext,
    ) -> CodecResult<()> {
        writer.write_binary(uuid_binary(*value.as_bytes()))
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<uuid::Uuid> {
        Ok(uuid::Uuid::from_bytes(read_uuid_bytes(reader)?))
    }
}

fn uuid_binary(bytes: [u8; 16]) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: bytes.to_vec(),
    }
}

fn read_uuid_bytes(reader: &mut BsonReader<'_>) -> CodecResult<[u8; 16]> {
    let binary = reader.read_binary()?;
    if binary.subtype != BinarySubtype::Uuid {
        return Err(CodecError::Decoding(format!(
            "expected binary subtype Uuid but found {:?}",
            binary.subtype
        )));
    }
    binary.bytes.as_slice().try_into().map_err(|_| {
        CodecError::Decoding(format!(
            "a UUID is 16 bytes long, found {}",
            binary.bytes.len()
        ))
    })
}
