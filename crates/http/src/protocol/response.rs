//! HTTP response model.

use bytes::{BufMut, BytesMut};
use httparse::Status;

use crate::MAX_HEADER_NUM;
use crate::protocol::{Content, FieldStore, ParseError, StatusCode, Version};

/// An HTTP response message.
///
/// The reason phrase is optional: when absent it is synthesized from the
/// status code at serialization time, so `Response::new(StatusCode::OK)`
/// already produces a complete status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    version: Version,
    status: StatusCode,
    reason: Option<String>,
    fields: FieldStore,
    content: Option<Content>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self { version: Version::default(), status, reason: None, fields: FieldStore::new(), content: None }
    }

    /// Clears the response back to a default `200 OK`, keeping allocations.
    pub fn reset(&mut self) {
        self.version = Version::default();
        self.status = StatusCode::OK;
        self.reason = None;
        self.fields.clear();
        self.content = None;
    }

    /// Resets for reuse with a new status code.
    pub fn reset_with(&mut self, status: StatusCode) {
        self.reset();
        self.status = status;
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// The reason phrase: the parsed/assigned one if present, otherwise
    /// synthesized from the status code.
    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or_else(|| self.status.reason())
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.reason = Some(reason.into());
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

    /// Serializes the response head: status line, fields, blank-line
    /// terminator — in that fixed order. Content bytes are not written.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_slice(self.version.as_str().as_bytes());
        dst.put_slice(b" ");
        dst.put_slice(self.status.to_string().as_bytes());
        dst.put_slice(b" ");
        dst.put_slice(self.reason().as_bytes());
        dst.put_slice(b"\r\n");
        self.fields.encode(dst);
        dst.put_slice(b"\r\n");
    }

    /// Parses a complete response header block (status line through blank
    /// line), tolerating lone-LF line endings.
    pub fn parse(block: &[u8]) -> Result<Self, ParseError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut parsed = httparse::Response::new(&mut headers);

        match parsed.parse(block)? {
            Status::Complete(_) => {}
            Status::Partial => return Err(ParseError::invalid_header("incomplete response header block")),
        }

        let version = Version::from_minor(parsed.version.unwrap_or(1))?;
        let status = StatusCode::from_u16(parsed.code.unwrap_or(0))?;
        let reason = parsed.reason.filter(|r| !r.is_empty()).map(str::to_owned);
        let fields = FieldStore::from_httparse(parsed.headers)?;

        Ok(Self { version, status, reason, fields, content: None })
    }
}
