//! Ordered, typed read and write cursors over BSON documents.
//!
//! Codecs never touch [`bson::Document`] directly; they go through [`BsonWriter`] and
//! [`BsonReader`], which enforce the start/name/value/end protocol of a streaming BSON
//! encoder. Converting a finished document to and from its binary form is handled here as
//! well.

mod reader;
mod writer;

pub use reader::BsonReader;
pub use writer::{BsonWriter, DEFAULT_MAX_DEPTH};

use bson::Document;

use crate::error::CodecResult;

/// Serializes a document to BSON bytes.
pub fn to_vec(doc: &Document) -> CodecResult<Vec<u8>> {
    let mut bytes = Vec::new();
    doc.to_writer(&mut bytes)?;
    Ok(bytes)
}

/// Parses a document from BSON bytes.
pub fn from_slice(bytes: &[u8]) -> CodecResult<Document> {
    Ok(Document::from_reader(bytes)?)
}
