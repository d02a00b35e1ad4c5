//! HTTP protocol versions.

use std::fmt;

use crate::protocol::ParseError;

/// An HTTP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    Http09,
    Http10,
    #[default]
    Http11,
    Http12,
}

impl Version {
    /// The wire spelling, e.g. `HTTP/1.1`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Version::Http09 => "HTTP/0.9",
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
            Version::Http12 => "HTTP/1.2",
        }
    }

    /// Maps the minor-digit form produced by `httparse` for `HTTP/1.x`
    /// first lines.
    pub(crate) fn from_minor(minor: u8) -> Result<Self, ParseError> {
        match minor {
            0 => Ok(Version::Http10),
            1 => Ok(Version::Http11),
            2 => Ok(Version::Http12),
            n => Err(ParseError::InvalidVersion { found: format!("HTTP/1.{n}") }),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Version {
    type Error = ParseError;

    fn try_from(str: &str) -> Result<Self, Self::Error> {
        match str {
            "HTTP/0.9" => Ok(Self::Http09),
            "HTTP/1.0" => Ok(Self::Http10),
            "HTTP/1.1" => Ok(Self::Http11),
            "HTTP/1.2" => Ok(Self::Http12),
            other => Err(ParseError::InvalidVersion { found: other.to_owned() }),
        }
    }
}
