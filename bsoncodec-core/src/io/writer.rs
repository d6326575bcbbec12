//! Sequential BSON document writer.

use bson::{Binary, Bson, DateTime, Document, oid::ObjectId};

use crate::error::{CodecError, CodecResult};

/// Default limit on the nesting depth of documents and arrays.
pub const DEFAULT_MAX_DEPTH: usize = 100;

#[derive(Debug)]
enum Frame {
    Document {
        doc: Document,
        /// Name this document will be stored under in its parent.
        key: Option<String>,
        /// Name written by `write_name` and not yet followed by a value.
        pending: Option<String>,
    },
    Array {
        items: Vec<Bson>,
        key: Option<String>,
    },
}

/// A writer that builds exactly one BSON document from an ordered sequence of primitive
/// write operations.
///
/// The writer enforces the same call protocol a streaming BSON writer does: the root value
/// is a document, every document field is a [`write_name`](Self::write_name) followed by
/// exactly one value, and every start is matched by an end. Violations are reported as
/// [`CodecError::Encoding`] and leave the writer unusable; a document is only produced by
/// [`into_document`](Self::into_document) once the root has been closed.
///
/// # Example
///
/// ```ignore
/// let mut writer = BsonWriter::new();
/// writer.write_start_document()?;
/// writer.write_name("powerStatus")?;
/// writer.write_boolean(true)?;
/// writer.write_end_document()?;
///
/// assert_eq!(writer.into_document()?, doc! { "powerStatus": true });
/// ```
#[derive(Debug)]
pub struct BsonWriter {
    stack: Vec<Frame>,
    root: Option<Document>,
    max_depth: usize,
}

impl Default for BsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BsonWriter {
    /// Creates a new writer with the default nesting limit.
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Creates a new writer that rejects documents nested deeper than `max_depth` levels.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            root: None,
            max_depth,
        }
    }

    /// Returns the current nesting depth (0 before the root document is started).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns `true` once the root document has been closed.
    pub fn is_complete(&self) -> bool {
        self.root.is_some()
    }

    /// Starts a new document, either the root or the value of the pending field or array slot.
    ///
    /// # Errors
    ///
    /// Returns an error if no name was written for the value, the root was already written,
    /// or the nesting limit would be exceeded.
    pub fn write_start_document(&mut self) -> CodecResult<()> {
        let key = self.take_slot("document")?;
        self.push(Frame::Document {
            doc: Document::new(),
            key,
            pending: None,
        })
    }

    /// Closes the innermost open document.
    ///
    /// # Errors
    ///
    /// Returns an error if the innermost open value is not a document or a field name was
    /// written without a value.
    pub fn write_end_document(&mut self) -> CodecResult<()> {
        match self.stack.pop() {
            Some(Frame::Document { doc, key, pending: None }) => {
                self.attach(key, Bson::Document(doc))
            }
            Some(Frame::Document { pending: Some(name), .. }) => Err(CodecError::Encoding(
                format!("field '{name}' was named but no value was written"),
            )),
            Some(Frame::Array { .. }) => Err(CodecError::Encoding(
                "write_end_document called while an array is open".to_string(),
            )),
            None => Err(CodecError::Encoding(
                "write_end_document called with no open document".to_string(),
            )),
        }
    }

    /// Starts a new array as the value of the pending field or array slot.
    ///
    /// # Errors
    ///
    /// Returns an error if no name was written, the array would be the root value, or the
    /// nesting limit would be exceeded.
    pub fn write_start_array(&mut self) -> CodecResult<()> {
        if self.stack.is_empty() {
            return Err(CodecError::Encoding(
                "the root value must be a document, not an array".to_string(),
            ));
        }
        let key = self.take_slot("array")?;
        self.push(Frame::Array {
            items: Vec::new(),
            key,
        })
    }

    /// Closes the innermost open array.
    ///
    /// # Errors
    ///
    /// Returns an error if the innermost open value is not an array.
    pub fn write_end_array(&mut self) -> CodecResult<()> {
        match self.stack.pop() {
            Some(Frame::Array { items, key }) => self.attach(key, Bson::Array(items)),
            Some(frame) => {
                self.stack.push(frame);
                Err(CodecError::Encoding(
                    "write_end_array called while a document is open".to_string(),
                ))
            }
            None => Err(CodecError::Encoding(
                "write_end_array called with no open array".to_string(),
            )),
        }
    }

    /// Writes the name of the next field of the innermost open document.
    ///
    /// # Errors
    ///
    /// Returns an error if no document is open, the previous name has no value yet, or the
    /// name contains a NUL byte (BSON field names are C strings).
    pub fn write_name(&mut self, name: impl Into<String>) -> CodecResult<()> {
        let name = name.into();
        if name.contains('\0') {
            return Err(CodecError::Encoding(format!(
                "field name {name:?} contains a NUL byte"
            )));
        }

        match self.stack.last_mut() {
            Some(Frame::Document { pending, .. }) => {
                if let Some(previous) = pending {
                    return Err(CodecError::Encoding(format!(
                        "field '{previous}' was named but no value was written before '{name}'"
                    )));
                }
                *pending = Some(name);
                Ok(())
            }
            Some(Frame::Array { .. }) => Err(CodecError::Encoding(format!(
                "cannot write name '{name}' inside an array"
            ))),
            None => Err(CodecError::Encoding(format!(
                "cannot write name '{name}' before the document is started"
            ))),
        }
    }

    /// Writes a boolean value.
    pub fn write_boolean(&mut self, value: bool) -> CodecResult<()> {
        self.write_scalar(Bson::Boolean(value))
    }

    /// Writes a 32-bit integer value.
    pub fn write_int32(&mut self, value: i32) -> CodecResult<()> {
        self.write_scalar(Bson::Int32(value))
    }

    /// Writes a 64-bit integer value.
    pub fn write_int64(&mut self, value: i64) -> CodecResult<()> {
        self.write_scalar(Bson::Int64(value))
    }

    /// Writes a double precision floating point value.
    pub fn write_double(&mut self, value: f64) -> CodecResult<()> {
        self.write_scalar(Bson::Double(value))
    }

    /// Writes a UTF-8 string value.
    pub fn write_string(&mut self, value: impl Into<String>) -> CodecResult<()> {
        self.write_scalar(Bson::String(value.into()))
    }

    /// Writes a UTC date-time value.
    pub fn write_date_time(&mut self, value: DateTime) -> CodecResult<()> {
        self.write_scalar(Bson::DateTime(value))
    }

    /// Writes an explicit null marker.
    pub fn write_null(&mut self) -> CodecResult<()> {
        self.write_scalar(Bson::Null)
    }

    /// Writes an object identifier.
    pub fn write_object_id(&mut self, value: ObjectId) -> CodecResult<()> {
        self.write_scalar(Bson::ObjectId(value))
    }

    /// Writes a binary value.
    pub fn write_binary(&mut self, value: Binary) -> CodecResult<()> {
        self.write_scalar(Bson::Binary(value))
    }

    /// Writes an arbitrary, already-built BSON value.
    ///
    /// At the root this accepts only a document, which becomes the finished root.
    pub fn write_value(&mut self, value: Bson) -> CodecResult<()> {
        if self.stack.is_empty() {
            return match value {
                Bson::Document(doc) if self.root.is_none() => {
                    self.root = Some(doc);
                    Ok(())
                }
                Bson::Document(_) => Err(CodecError::Encoding(
                    "the root document has already been written".to_string(),
                )),
                other => Err(CodecError::Encoding(format!(
                    "the root value must be a document, not {:?}",
                    other.element_type()
                ))),
            };
        }
        if self.stack.len() + nested_depth(&value) > self.max_depth {
            return Err(self.depth_exceeded());
        }
        self.write_scalar(value)
    }

    /// Consumes the writer and returns the finished root document.
    ///
    /// # Errors
    ///
    /// Returns an error if the root document was never started or is still open.
    pub fn into_document(self) -> CodecResult<Document> {
        if !self.stack.is_empty() {
            return Err(CodecError::Encoding(format!(
                "document is incomplete: {} value(s) still open",
                self.stack.len()
            )));
        }
        self.root
            .ok_or_else(|| CodecError::Encoding("no document was written".to_string()))
    }

    /// Consumes the writer and returns the finished root document as BSON bytes.
    pub fn into_bytes(self) -> CodecResult<Vec<u8>> {
        let doc = self.into_document()?;
        let mut bytes = Vec::new();
        doc.to_writer(&mut bytes)?;
        Ok(bytes)
    }

    fn write_scalar(&mut self, value: Bson) -> CodecResult<()> {
        if self.stack.is_empty() {
            return Err(CodecError::Encoding(format!(
                "the root value must be a document, not {:?}",
                value.element_type()
            )));
        }
        let key = self.take_slot("value")?;
        self.attach(key, value)
    }

    /// Takes the name the next value will be stored under. `None` means the value is the
    /// root document or an array element.
    fn take_slot(&mut self, what: &str) -> CodecResult<Option<String>> {
        match self.stack.last_mut() {
            None if self.root.is_none() => Ok(None),
            None => Err(CodecError::Encoding(
                "the root document has already been written".to_string(),
            )),
            Some(Frame::Array { .. }) => Ok(None),
            Some(Frame::Document { pending, .. }) => match pending.take() {
                Some(name) => Ok(Some(name)),
                None => Err(CodecError::Encoding(format!(
                    "cannot write a {what} without writing a field name first"
                ))),
            },
        }
    }

    fn push(&mut self, frame: Frame) -> CodecResult<()> {
        if self.stack.len() >= self.max_depth {
            return Err(self.depth_exceeded());
        }
        self.stack.push(frame);
        Ok(())
    }

    fn attach(&mut self, key: Option<String>, value: Bson) -> CodecResult<()> {
        match (self.stack.last_mut(), key) {
            (Some(Frame::Document { doc, .. }), Some(key)) => {
                doc.insert(key, value);
                Ok(())
            }
            (Some(Frame::Array { items, .. }), None) => {
                items.push(value);
                Ok(())
            }
            (None, None) => match value {
                Bson::Document(doc) => {
                    self.root = Some(doc);
                    Ok(())
                }
                _ => Err(CodecError::Encoding(
                    "the root value must be a document".to_string(),
                )),
            },
            _ => Err(CodecError::Encoding(
                "value does not match the enclosing container".to_string(),
            )),
        }
    }

    fn depth_exceeded(&self) -> CodecError {
        CodecError::Encoding(format!(
            "maximum nesting depth of {} exceeded",
            self.max_depth
        ))
    }
}

fn nested_depth(value: &Bson) -> usize {
    match value {
        Bson::Document(doc) => 1 + doc.values().map(nested_depth).max().unwrap_or(0),
        Bson::Array(items) => 1 + items.iter().map(nested_depth).max().unwrap_or(0),
        _ => 0,
    }
}
