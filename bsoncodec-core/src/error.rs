//! Error types and result types for codec operations.
//!
//! Every fallible operation in this crate returns [`CodecResult<T>`]. Errors are never
//! retried internally: they surface to the immediate caller, and a failure while encoding
//! or decoding a nested value fails the enclosing value as well.

use bson::error::Error as BsonError;
use thiserror::Error;

/// Represents all possible errors that can occur while resolving, encoding or decoding values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    /// No provider in the registry chain can supply a codec for the requested type.
    /// The argument is the requested type's name.
    #[error("Can't find a codec for {0}")]
    CodecNotFound(String),
    /// A value could not be represented in BSON (out of range number, malformed field name,
    /// writer used out of order).
    #[error("Encoding error: {0}")]
    Encoding(String),
    /// The data at the reader's cursor does not have the shape or type a codec expects.
    #[error("Decoding error: {0}")]
    Decoding(String),
    /// A provider answered a lookup with a codec for a different type.
    /// The first argument is the requested type, the second the type the codec handles.
    #[error("Provider returned a codec for {1} when {0} was requested")]
    InvalidCodec(String, String),
    /// An error raised by the underlying BSON library while converting documents or bytes.
    #[error("BSON error: {0}")]
    Bson(String),
}

/// A specialized `Result` type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

impl CodecError {
    /// Creates a decoding error describing an unexpected BSON type at the cursor.
    pub fn unexpected_type(expected: impl std::fmt::Debug, found: impl std::fmt::Debug) -> Self {
        CodecError::Decoding(format!("expected BSON type {expected:?} but found {found:?}"))
    }

    /// Returns `true` if this is a [`CodecError::CodecNotFound`] error.
    pub fn is_codec_not_found(&self) -> bool {
        matches!(self, CodecError::CodecNotFound(_))
    }
}

impl From<BsonError> for CodecError {
    fn from(err: BsonError) -> Self {
        CodecError::Bson(err.to_string())
    }
}
