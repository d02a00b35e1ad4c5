//! HTTP response status codes.

use std::fmt;

use crate::protocol::ParseError;

/// An HTTP status code.
///
/// Any code in `100..=599` is representable; the named constants cover the
/// codes the engine itself produces plus the common remainder. The reason
/// phrase can always be synthesized via [`StatusCode::reason`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const CONTINUE: StatusCode = StatusCode(100);
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const MOVED_PERMANENTLY: StatusCode = StatusCode(301);
    pub const FOUND: StatusCode = StatusCode(302);
    pub const NOT_MODIFIED: StatusCode = StatusCode(304);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const FORBIDDEN: StatusCode = StatusCode(403);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const REQUEST_TIMEOUT: StatusCode = StatusCode(408);
    pub const LENGTH_REQUIRED: StatusCode = StatusCode(411);
    pub const PAYLOAD_TOO_LARGE: StatusCode = StatusCode(413);
    pub const URI_TOO_LONG: StatusCode = StatusCode(414);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const NOT_IMPLEMENTED: StatusCode = StatusCode(501);
    pub const BAD_GATEWAY: StatusCode = StatusCode(502);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);
    pub const HTTP_VERSION_NOT_SUPPORTED: StatusCode = StatusCode(505);

    /// Validates a raw code; only `100..=599` is accepted.
    pub fn from_u16(code: u16) -> Result<Self, ParseError> {
        if (100..=599).contains(&code) {
            Ok(StatusCode(code))
        } else {
            Err(ParseError::InvalidStatus { code })
        }
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Whether this is a 2xx code.
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// The canonical reason phrase, synthesized from the code.
    ///
    /// Codes without a registered phrase fall back to the name of their
    /// class, so every representable status serializes to a well-formed
    /// status line.
    pub const fn reason(self) -> &'static str {
        match self.0 {
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            206 => "Partial Content",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            406 => "Not Acceptable",
            408 => "Request Timeout",
            409 => "Conflict",
            410 => "Gone",
            411 => "Length Required",
            413 => "Payload Too Large",
            414 => "URI Too Long",
            415 => "Unsupported Media Type",
            417 => "Expectation Failed",
            426 => "Upgrade Required",
            429 => "Too Many Requests",
            431 => "Request Header Fields Too Large",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            505 => "HTTP Version Not Supported",
            c if c < 200 => "Informational",
            c if c < 300 => "Success",
            c if c < 400 => "Redirection",
            c if c < 500 => "Client Error",
            _ => "Server Error",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u16_bounds() {
        assert_eq!(StatusCode::from_u16(200).unwrap(), StatusCode::OK);
        assert_eq!(StatusCode::from_u16(599).unwrap().as_u16(), 599);
        assert!(StatusCode::from_u16(99).is_err());
        assert!(StatusCode::from_u16(600).is_err());
    }

    #[test]
    fn reason_phrases() {
        assert_eq!(StatusCode::NOT_IMPLEMENTED.reason(), "Not Implemented");
        assert_eq!(StatusCode::REQUEST_TIMEOUT.reason(), "Request Timeout");
        // unregistered codes still synthesize a phrase
        assert_eq!(StatusCode::from_u16(299).unwrap().reason(), "Success");
        assert_eq!(StatusCode::from_u16(499).unwrap().reason(), "Client Error");
    }

    #[test]
    fn success_classification() {
        assert!(StatusCode::OK.is_success());
        assert!(!StatusCode::BAD_REQUEST.is_success());
        assert!(!StatusCode::CONTINUE.is_success());
    }
}
