//! Sequential BSON document reader.

use bson::{Binary, Bson, DateTime, Document, oid::ObjectId, spec::ElementType};

use crate::error::{CodecError, CodecResult};

#[derive(Debug)]
enum Frame<'a> {
    Document(std::vec::IntoIter<(&'a str, &'a Bson)>),
    Array(std::slice::Iter<'a, Bson>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing has been read yet; the root document is next.
    Initial,
    /// Positioned between values; `read_bson_type` is next.
    Type,
    /// An element has been found; its name is next.
    Name,
    /// The element's name has been consumed; its value is next.
    Value,
    /// The current document has no more fields.
    EndOfDocument,
    /// The current array has no more elements.
    EndOfArray,
    /// The root document has been fully read.
    Done,
}

/// A cursor that reads one BSON document as an ordered sequence of typed values.
///
/// The reader mirrors [`BsonWriter`](crate::io::BsonWriter): a document is read with
/// [`read_start_document`](Self::read_start_document), then repeated calls to
/// [`read_bson_type`](Self::read_bson_type) (which returns `None` at the end of the document),
/// [`read_name`](Self::read_name) and one typed `read_*` call or
/// [`skip_value`](Self::skip_value) per field, and finally
/// [`read_end_document`](Self::read_end_document).
///
/// Typed reads verify the element type at the cursor and fail with
/// [`CodecError::Decoding`] without advancing when it does not match. A reader that has
/// returned an error mid-document should be discarded.
///
/// # Example
///
/// ```ignore
/// let doc = doc! { "powerStatus": true, "colorTemperature": 5200 };
/// let mut reader = BsonReader::new(&doc);
///
/// reader.read_start_document()?;
/// while let Some(_) = reader.read_bson_type()? {
///     match reader.read_name()?.as_str() {
///         "powerStatus" => println!("{}", reader.read_boolean()?),
///         _ => reader.skip_value()?,
///     }
/// }
/// reader.read_end_document()?;
/// ```
#[derive(Debug)]
pub struct BsonReader<'a> {
    root: &'a Document,
    stack: Vec<Frame<'a>>,
    state: State,
    current: Option<(Option<&'a str>, &'a Bson)>,
}

impl<'a> BsonReader<'a> {
    /// Creates a reader positioned before the given root document.
    pub fn new(root: &'a Document) -> Self {
        Self {
            root,
            stack: Vec::new(),
            state: State::Initial,
            current: None,
        }
    }

    /// Returns the current nesting depth (0 outside the root document).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns `true` once the root document has been read to its end.
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Advances to the next element of the current document or array and returns its type,
    /// or `None` once the container has no more elements.
    ///
    /// If the cursor is already on an element whose value has not been read, the type of that
    /// element is returned without advancing.
    ///
    /// # Errors
    ///
    /// Returns an error if no document or array is open.
    pub fn read_bson_type(&mut self) -> CodecResult<Option<ElementType>> {
        match self.state {
            State::Name | State::Value => return Ok(self.current_bson_type()),
            State::EndOfDocument | State::EndOfArray => return Ok(None),
            State::Type => {}
            State::Initial | State::Done => {
                return Err(CodecError::Decoding(
                    "read_bson_type called outside of a document".to_string(),
                ));
            }
        }

        let next = match self.stack.last_mut() {
            Some(Frame::Document(fields)) => fields.next().map(|(name, value)| (Some(name), value)),
            Some(Frame::Array(items)) => items.next().map(|value| (None, value)),
            None => None,
        };

        match next {
            Some((name, value)) => {
                self.state = if name.is_some() { State::Name } else { State::Value };
                self.current = Some((name, value));
                Ok(Some(value.element_type()))
            }
            None => {
                self.state = match self.stack.last() {
                    Some(Frame::Array(_)) => State::EndOfArray,
                    _ => State::EndOfDocument,
                };
                self.current = None;
                Ok(None)
            }
        }
    }

    /// Returns the type of the element under the cursor without consuming anything.
    pub fn current_bson_type(&self) -> Option<ElementType> {
        match self.state {
            State::Name | State::Value => self.current.map(|(_, value)| value.element_type()),
            _ => None,
        }
    }

    /// Reads the name of the element under the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor is not on a document field.
    pub fn read_name(&mut self) -> CodecResult<String> {
        if self.state == State::Type {
            self.read_bson_type()?;
        }
        match (self.state, self.current) {
            (State::Name, Some((Some(name), _))) => {
                self.state = State::Value;
                Ok(name.to_string())
            }
            (state, _) => Err(CodecError::Decoding(format!(
                "read_name called in state {state:?}"
            ))),
        }
    }

    /// Enters a document: the root on the first call, otherwise the value under the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the value under the cursor is not an embedded document.
    pub fn read_start_document(&mut self) -> CodecResult<()> {
        let doc = match self.state {
            State::Initial => self.root,
            _ => match self.take_value(ElementType::EmbeddedDocument)? {
                Bson::Document(doc) => doc,
                other => return Err(CodecError::unexpected_type(
                    ElementType::EmbeddedDocument,
                    other.element_type(),
                )),
            },
        };
        let fields = doc
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .collect::<Vec<_>>();
        self.stack.push(Frame::Document(fields.into_iter()));
        self.state = State::Type;
        Ok(())
    }

    /// Leaves the current document.
    ///
    /// # Errors
    ///
    /// Returns an error if fields remain unread or the current container is an array.
    pub fn read_end_document(&mut self) -> CodecResult<()> {
        if self.state == State::Type {
            if let Some(element_type) = self.read_bson_type()? {
                return Err(CodecError::Decoding(format!(
                    "expected end of document but found a {element_type:?} field"
                )));
            }
        }
        if self.state != State::EndOfDocument {
            return Err(CodecError::Decoding(format!(
                "read_end_document called in state {:?}",
                self.state
            )));
        }
        self.pop();
        Ok(())
    }

    /// Enters the array under the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the value under the cursor is not an array.
    pub fn read_start_array(&mut self) -> CodecResult<()> {
        match self.take_value(ElementType::Array)? {
            Bson::Array(items) => {
                self.stack.push(Frame::Array(items.iter()));
                self.state = State::Type;
                Ok(())
            }
            other => Err(CodecError::unexpected_type(
                ElementType::Array,
                other.element_type(),
            )),
        }
    }

    /// Leaves the current array.
    ///
    /// # Errors
    ///
    /// Returns an error if elements remain unread or the current container is a document.
    pub fn read_end_array(&mut self) -> CodecResult<()> {
        if self.state == State::Type {
            if let Some(element_type) = self.read_bson_type()? {
                return Err(CodecError::Decoding(format!(
                    "expected end of array but found a {element_type:?} element"
                )));
            }
        }
        if self.state != State::EndOfArray {
            return Err(CodecError::Decoding(format!(
                "read_end_array called in state {:?}",
                self.state
            )));
        }
        self.pop();
        Ok(())
    }

    /// Reads a boolean value.
    pub fn read_boolean(&mut self) -> CodecResult<bool> {
        match self.take_value(ElementType::Boolean)? {
            Bson::Boolean(value) => Ok(*value),
            other => Err(mismatch(ElementType::Boolean, other)),
        }
    }

    /// Reads a 32-bit integer value.
    pub fn read_int32(&mut self) -> CodecResult<i32> {
        match self.take_value(ElementType::Int32)? {
            Bson::Int32(value) => Ok(*value),
            other => Err(mismatch(ElementType::Int32, other)),
        }
    }

    /// Reads a 64-bit integer value.
    pub fn read_int64(&mut self) -> CodecResult<i64> {
        match self.take_value(ElementType::Int64)? {
            Bson::Int64(value) => Ok(*value),
            other => Err(mismatch(ElementType::Int64, other)),
        }
    }

    /// Reads a double precision floating point value.
    pub fn read_double(&mut self) -> CodecResult<f64> {
        match self.take_value(ElementType::Double)? {
            Bson::Double(value) => Ok(*value),
            other => Err(mismatch(ElementType::Double, other)),
        }
    }

    /// Reads a UTF-8 string value.
    pub fn read_string(&mut self) -> CodecResult<String> {
        match self.take_value(ElementType::String)? {
            Bson::String(value) => Ok(value.clone()),
            other => Err(mismatch(ElementType::String, other)),
        }
    }

    /// Reads a UTC date-time value.
    pub fn read_date_time(&mut self) -> CodecResult<DateTime> {
        match self.take_value(ElementType::DateTime)? {
            Bson::DateTime(value) => Ok(*value),
            other => Err(mismatch(ElementType::DateTime, other)),
        }
    }

    /// Reads an explicit null marker.
    pub fn read_null(&mut self) -> CodecResult<()> {
        match self.take_value(ElementType::Null)? {
            Bson::Null => Ok(()),
            other => Err(mismatch(ElementType::Null, other)),
        }
    }

    /// Reads an object identifier.
    pub fn read_object_id(&mut self) -> CodecResult<ObjectId> {
        match self.take_value(ElementType::ObjectId)? {
            Bson::ObjectId(value) => Ok(*value),
            other => Err(mismatch(ElementType::ObjectId, other)),
        }
    }

    /// Reads a binary value.
    pub fn read_binary(&mut self) -> CodecResult<Binary> {
        match self.take_value(ElementType::Binary)? {
            Bson::Binary(value) => Ok(value.clone()),
            other => Err(mismatch(ElementType::Binary, other)),
        }
    }

    /// Reads the value under the cursor, whatever its type, including whole documents and
    /// arrays. Before the root document is entered this returns the root itself.
    pub fn read_value(&mut self) -> CodecResult<Bson> {
        if self.state == State::Initial {
            self.state = State::Done;
            return Ok(Bson::Document(self.root.clone()));
        }
        self.take_any().cloned()
    }

    /// Skips the value under the cursor, including all nested content.
    pub fn skip_value(&mut self) -> CodecResult<()> {
        self.take_any().map(|_| ())
    }

    fn take_value(&mut self, expected: ElementType) -> CodecResult<&'a Bson> {
        self.position_on_value()?;
        match self.current {
            Some((_, value)) if value.element_type() == expected => {
                self.consume();
                Ok(value)
            }
            Some((_, value)) => Err(mismatch(expected, value)),
            None => Err(CodecError::Decoding(format!(
                "expected a {expected:?} value but the container has ended"
            ))),
        }
    }

    fn take_any(&mut self) -> CodecResult<&'a Bson> {
        self.position_on_value()?;
        match self.current {
            Some((_, value)) => {
                self.consume();
                Ok(value)
            }
            None => Err(CodecError::Decoding(
                "expected a value but the container has ended".to_string(),
            )),
        }
    }

    /// Moves the cursor onto a value, implicitly reading the type and skipping the name.
    fn position_on_value(&mut self) -> CodecResult<()> {
        if self.state == State::Type {
            self.read_bson_type()?;
        }
        match self.state {
            State::Name => {
                self.state = State::Value;
                Ok(())
            }
            State::Value => Ok(()),
            state => Err(CodecError::Decoding(format!(
                "cannot read a value in state {state:?}"
            ))),
        }
    }

    fn consume(&mut self) {
        self.current = None;
        self.state = State::Type;
    }

    fn pop(&mut self) {
        self.stack.pop();
        self.current = None;
        self.state = if self.stack.is_empty() {
            State::Done
        } else {
            State::Type
        };
    }
}

fn mismatch(expected: ElementType, found: &Bson) -> CodecError {
    CodecError::unexpected_type(expected, found.element_type())
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    #[test]
    fn test_reads_fields_in_order() {
        let doc = doc! { "name": "Robin", "count": 51, "flag": true };
        let mut reader = BsonReader::new(&doc);

        reader.read_start_document().unwrap();
        let mut names = Vec::new();
        while let Some(element_type) = reader.read_bson_type().unwrap() {
            let name = reader.read_name().unwrap();
            match element_type {
                ElementType::String => assert_eq!(reader.read_string().unwrap(), "Robin"),
                ElementType::Int32 => assert_eq!(reader.read_int32().unwrap(), 51),
                ElementType::Boolean => assert!(reader.read_boolean().unwrap()),
                other => panic!("unexpected type {other:?}"),
            }
            names.push(name);
        }
        reader.read_end_document().unwrap();

        assert_eq!(names, vec!["name", "count", "flag"]);
        assert!(reader.is_done());
    }

    #[test]
    fn test_nested_document_and_array() {
        let doc = doc! { "inner": { "x": 1_i64 }, "list": [1, 2] };
        let mut reader = BsonReader::new(&doc);

        reader.read_start_document().unwrap();
        assert_eq!(reader.read_name().unwrap(), "inner");
        reader.read_start_document().unwrap();
        assert_eq!(reader.read_name().unwrap(), "x");
        assert_eq!(reader.read_int64().unwrap(), 1);
        reader.read_end_document().unwrap();

        assert_eq!(reader.read_name().unwrap(), "list");
        reader.read_start_array().unwrap();
        let mut items = Vec::new();
        while reader.read_bson_type().unwrap().is_some() {
            items.push(reader.read_int32().unwrap());
        }
        reader.read_end_array().unwrap();
        reader.read_end_document().unwrap();

        assert_eq!(items, vec![1, 2]);
    }

    #[test]
    fn test_type_mismatch_does_not_advance() {
        let doc = doc! { "flag": "yes" };
        let mut reader = BsonReader::new(&doc);

        reader.read_start_document().unwrap();
        reader.read_name().unwrap();
        assert!(matches!(reader.read_boolean(), Err(CodecError::Decoding(_))));
        assert_eq!(reader.current_bson_type(), Some(ElementType::String));
        assert_eq!(reader.read_string().unwrap(), "yes");
    }

    #[test]
    fn test_skip_value_skips_nested_content() {
        let doc = doc! { "extra": { "deep": [1, { "x": 2 }] }, "kept": 7 };
        let mut reader = BsonReader::new(&doc);

        reader.read_start_document().unwrap();
        assert_eq!(reader.read_name().unwrap(), "extra");
        reader.skip_value().unwrap();
        assert_eq!(reader.read_name().unwrap(), "kept");
        assert_eq!(reader.read_int32().unwrap(), 7);
        reader.read_end_document().unwrap();
    }

    #[test]
    fn test_end_document_with_unread_fields_fails() {
        let doc = doc! { "a": 1 };
        let mut reader = BsonReader::new(&doc);

        reader.read_start_document().unwrap();
        assert!(reader.read_end_document().is_err());
    }

    #[test]
    fn test_read_past_end_fails() {
        let doc = doc! {};
        let mut reader = BsonReader::new(&doc);

        reader.read_start_document().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), None);
        assert!(reader.read_int32().is_err());
        reader.read_end_document().unwrap();
    }

    #[test]
    fn test_read_value_at_root_returns_document() {
        let doc = doc! { "a": 1 };
        let mut reader = BsonReader::new(&doc);

        assert_eq!(reader.read_value().unwrap(), Bson::Document(doc.clone()));
        assert!(reader.is_done());
    }

    #[test]
    fn test_read_bson_type_outside_document_fails() {
        let doc = doc! {};
        let mut reader = BsonReader::new(&doc);
        assert!(reader.read_bson_type().is_err());
    }
}
