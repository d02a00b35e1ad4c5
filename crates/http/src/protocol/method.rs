//! HTTP request methods and the supported-method set.

use std::fmt;

use crate::protocol::ParseError;

/// An HTTP request method (verb).
///
/// The full standard verb set is representable; which verbs a server is
/// willing to dispatch to its handler is configured separately through
/// [`MethodSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    /// The canonical wire spelling of this method.
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
        }
    }

    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Method {
    type Error = ParseError;

    /// Methods are case-sensitive on the wire; `"get"` is rejected.
    fn try_from(str: &str) -> Result<Self, Self::Error> {
        match str {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "CONNECT" => Ok(Self::Connect),
            "OPTIONS" => Ok(Self::Options),
            "TRACE" => Ok(Self::Trace),
            "PATCH" => Ok(Self::Patch),
            _ => Err(ParseError::invalid_method(str)),
        }
    }
}

/// A bitmask of request methods a server is willing to dispatch.
///
/// Requests carrying a method outside the set are answered with
/// `501 Not Implemented` by the session machine without ever reaching the
/// application handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSet(u16);

impl MethodSet {
    /// The empty set: every request is rejected with 501.
    pub const EMPTY: MethodSet = MethodSet(0);

    /// Every representable method.
    pub const ALL: MethodSet = MethodSet::of(&[
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Connect,
        Method::Options,
        Method::Trace,
        Method::Patch,
    ]);

    /// Builds a set from a list of methods.
    pub const fn of(methods: &[Method]) -> Self {
        let mut bits = 0u16;
        let mut i = 0;
        while i < methods.len() {
            bits |= methods[i].bit();
            i += 1;
        }
        MethodSet(bits)
    }

    /// Returns this set with `method` added.
    #[must_use]
    pub const fn with(self, method: Method) -> Self {
        MethodSet(self.0 | method.bit())
    }

    /// Returns this set with `method` removed.
    #[must_use]
    pub const fn without(self, method: Method) -> Self {
        MethodSet(self.0 & !method.bit())
    }

    /// Whether `method` is in the set.
    pub const fn contains(self, method: Method) -> bool {
        self.0 & method.bit() != 0
    }
}

impl Default for MethodSet {
    /// The common read/write verbs: GET, HEAD, POST, PUT, DELETE.
    fn default() -> Self {
        MethodSet::of(&[Method::Get, Method::Head, Method::Post, Method::Put, Method::Delete])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from() {
        let result = Method::try_from("GET");
        assert_eq!(result.unwrap(), Method::Get);

        let result = Method::try_from("PATCH");
        assert_eq!(result.unwrap(), Method::Patch);
    }

    #[test]
    fn test_method_from_error() {
        {
            let result = Method::try_from("get");
            assert!(result.is_err());
        }

        {
            let result = Method::try_from("");
            assert!(result.is_err());
        }
    }

    #[test]
    fn method_set_membership() {
        let set = MethodSet::of(&[Method::Get, Method::Head]);
        assert!(set.contains(Method::Get));
        assert!(set.contains(Method::Head));
        assert!(!set.contains(Method::Delete));

        let set = set.with(Method::Delete).without(Method::Head);
        assert!(set.contains(Method::Delete));
        assert!(!set.contains(Method::Head));
    }

    #[test]
    fn method_set_default_excludes_trace() {
        let set = MethodSet::default();
        assert!(set.contains(Method::Get));
        assert!(set.contains(Method::Delete));
        assert!(!set.contains(Method::Trace));
        assert!(!set.contains(Method::Connect));
    }
}
