//! Convenient re-exports of commonly used types from bsoncodec.
//!
//! ```ignore
//! use bsoncodec::prelude::*;
//! ```

pub use bsoncodec_core::{
    codec::{AnyCodec, Codec, DecoderContext, EncoderContext, TypeKey},
    codecs::{ArrayCodec, NullableCodec, ValueCodecProvider, default_registry},
    error::{CodecError, CodecResult},
    io::{BsonReader, BsonWriter},
    model::{Model, ModelCodecProvider},
    provider::{CodecMap, CodecProvider},
    registry::{CodecRegistry, CodecRegistryBuilder},
    serde::{SerdeCodec, SerdeCodecProvider},
};
pub use bsoncodec_macros::Model;
