//! Ordered header field storage.
//!
//! A [`FieldStore`] is the insertion-ordered name/value collection backing a
//! request or response. Names keep their wire spelling verbatim but are
//! matched case-insensitively on lookup; duplicate names are permitted and
//! lookup returns the first match. Serialization order always equals
//! insertion order.

use bytes::{BufMut, BytesMut};
use httparse::Status;

use crate::MAX_HEADER_NUM;
use crate::protocol::ParseError;

/// A single header field: one name and one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// An insertion-ordered collection of header fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldStore {
    fields: Vec<Field>,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, preserving order. Duplicate names are allowed.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(Field::new(name, value));
    }

    /// Case-insensitive lookup returning the first matching value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)).map(|f| f.value.as_str())
    }

    /// Replaces the value of the first field named `name`, or appends the
    /// field when absent. Used by the framer to stamp `Date`,
    /// `Content-Length` and friends without disturbing field order.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.fields.iter_mut().find(|f| f.name.eq_ignore_ascii_case(&name)) {
            Some(field) => field.value = value.into(),
            None => self.fields.push(Field::new(name, value)),
        }
    }

    /// Removes every field named `name` (case-insensitive). Returns whether
    /// anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| !f.name.eq_ignore_ascii_case(name));
        self.fields.len() != before
    }

    /// Drops all fields, keeping the allocation for reuse.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates name/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|f| (f.name.as_str(), f.value.as_str()))
    }

    /// Serializes every field as `Name: Value\r\n` in insertion order.
    ///
    /// The blank-line terminator belongs to the enclosing message and is not
    /// written here, so an empty store contributes no bytes at all.
    pub fn encode(&self, dst: &mut BytesMut) {
        for field in &self.fields {
            dst.put_slice(field.name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(field.value.as_bytes());
            dst.put_slice(b"\r\n");
        }
    }

    /// Parses a complete header block (terminated by a blank line).
    ///
    /// Any line that fails to split into `name: value` fails the whole
    /// parse; partial success is treated as total failure.
    pub fn parse(block: &[u8]) -> Result<Self, ParseError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        match httparse::parse_headers(block, &mut headers)? {
            Status::Complete((_, parsed)) => Self::from_httparse(parsed),
            Status::Partial => Err(ParseError::invalid_header("truncated header block")),
        }
    }

    /// Builds a store from already-parsed `httparse` headers, keeping names
    /// verbatim.
    pub(crate) fn from_httparse(headers: &[httparse::Header<'_>]) -> Result<Self, ParseError> {
        let mut store = FieldStore { fields: Vec::with_capacity(headers.len()) };
        for header in headers {
            let value = std::str::from_utf8(header.value)
                .map_err(|_| ParseError::invalid_header(format!("non-utf8 value for {}", header.name)))?;
            store.append(header.name, value);
        }
        Ok(store)
    }

    /// Resolves the `Content-Length` field, if present.
    pub fn content_length(&self) -> Result<Option<usize>, ParseError> {
        let Some(value) = self.get("Content-Length") else {
            return Ok(None);
        };
        let length = value.trim().parse::<usize>().map_err(|_| ParseError::invalid_content_length(value))?;
        Ok(Some(length))
    }

    /// Whether a `Connection` field requests closing after this exchange.
    pub fn wants_close(&self) -> bool {
        let Some(value) = self.get("Connection") else {
            return false;
        };
        value.split(',').any(|token| token.trim().eq_ignore_ascii_case("close"))
    }
}
