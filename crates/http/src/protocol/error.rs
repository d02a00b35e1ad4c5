use std::io;
use thiserror::Error;

/// Top-level error for one side of a connection: either the incoming
/// message could not be parsed or the outgoing one could not be sent.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("receive error: {source}")]
    Receive {
        #[from]
        source: ParseError,
    },

    #[error("send error: {source}")]
    Send {
        #[from]
        source: SendError,
    },
}

/// Errors detected while turning received bytes into a message.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {found}")]
    InvalidVersion { found: String },

    #[error("invalid http method: {found}")]
    InvalidMethod { found: String },

    #[error("invalid http status code: {code}")]
    InvalidStatus { code: u16 },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("embedded NUL byte before header terminator")]
    EmbeddedNul,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_method<S: ToString>(str: S) -> Self {
        Self::InvalidMethod { found: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

impl From<httparse::Error> for ParseError {
    fn from(e: httparse::Error) -> Self {
        match e {
            httparse::Error::TooManyHeaders => ParseError::too_many_headers(crate::MAX_HEADER_NUM),
            other => ParseError::invalid_header(other),
        }
    }
}

/// Errors detected while framing or transmitting an outgoing message.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
