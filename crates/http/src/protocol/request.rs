//! HTTP request model.
//!
//! A [`Request`] carries the parsed request line (method, target, version),
//! its [`FieldStore`] and an optional [`Content`]. Instances are designed
//! for reuse across exchanges: [`Request::reset`] clears the message back
//! to its default state without dropping the field allocation.

use std::mem::MaybeUninit;

use bytes::{BufMut, Bytes, BytesMut};
use httparse::Status;

use crate::MAX_HEADER_NUM;
use crate::protocol::{FieldStore, Method, ParseError, Version};

/// A message body with its resolved media type.
///
/// Content bytes are reference-counted [`Bytes`]: whoever holds the last
/// clone releases the buffer, so there is no separate hand-back step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    media_type: Option<String>,
    data: Bytes,
}

impl Content {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { media_type: None, data: data.into() }
    }

    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }
}

/// An HTTP request message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Request {
    method: Method,
    target: String,
    version: Version,
    fields: FieldStore,
    content: Option<Content>,
}

impl Request {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self { method, target: target.into(), ..Default::default() }
    }

    /// Clears the request back to its default state, keeping allocations.
    pub fn reset(&mut self) {
        self.method = Method::default();
        self.target.clear();
        self.version = Version::default();
        self.fields.clear();
        self.content = None;
    }

    /// Resets for reuse with a new method and target.
    pub fn reset_with(&mut self, method: Method, target: impl Into<String>) {
        self.reset();
        self.method = method;
        self.target = target.into();
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn fields(&self) -> &FieldStore {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldStore {
        &mut self.fields
    }

    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    pub fn set_content(&mut self, content: Option<Content>) {
        self.content = content;
    }

    pub fn take_content(&mut self) -> Option<Content> {
        self.content.take()
    }

    /// Serializes the request head: request line, fields, blank-line
    /// terminator — in that fixed order. Content bytes are not written.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_slice(self.method.as_str().as_bytes());
        dst.put_slice(b" ");
        dst.put_slice(self.target.as_bytes());
        dst.put_slice(b" ");
        dst.put_slice(self.version.as_str().as_bytes());
        dst.put_slice(b"\r\n");
        self.fields.encode(dst);
        dst.put_slice(b"\r\n");
    }

    /// Parses a complete header block (request line through blank line).
    ///
    /// Lone-LF line endings are tolerated. The block must be complete; a
    /// truncated block is an error here, not a "need more data" signal —
    /// incremental accumulation is the header scanner's job.
    pub fn parse(block: &[u8]) -> Result<Self, ParseError> {
        let mut parsed = httparse::Request::new(&mut []);
        let mut headers: [MaybeUninit<httparse::Header<'_>>; MAX_HEADER_NUM] =
            // SAFETY: an uninitialized array of MaybeUninit is always valid
            unsafe { MaybeUninit::uninit().assume_init() };

        match parsed.parse_with_uninit_headers(block, &mut headers)? {
            Status::Complete(_) => {}
            Status::Partial => return Err(ParseError::invalid_header("incomplete request header block")),
        }

        // httparse guarantees these are Some on Complete
        let method = Method::try_from(parsed.method.unwrap_or_default())?;
        let target = parsed.path.unwrap_or_default().to_owned();
        let version = Version::from_minor(parsed.version.unwrap_or(1))?;
        let fields = FieldStore::from_httparse(parsed.headers)?;

        Ok(Self { method, target, version, fields, content: None })
    }
}
