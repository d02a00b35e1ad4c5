//! Server-side configuration.

use std::time::Duration;

use bytes::Bytes;

use crate::DEFAULT_MAX_HEADER_BYTES;
use crate::protocol::MethodSet;

/// Configuration shared by every connection of a server.
///
/// The configuration is read-only after construction and safe to share
/// across connections behind an `Arc`. Collaborators the engine does not
/// own — currently only the `Date` value source — are injected here
/// instead of being looked up through process-wide registries.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    methods: MethodSet,
    max_header_bytes: usize,
    idle_timeout: Duration,
    date_source: fn() -> Bytes,
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Methods the application handler accepts; everything else is
    /// answered with `501 Not Implemented`.
    #[must_use]
    pub fn with_methods(mut self, methods: MethodSet) -> Self {
        self.methods = methods;
        self
    }

    /// Hard capacity for an accumulated request header block. Reaching it
    /// without a terminator yields `413 Payload Too Large`.
    #[must_use]
    pub fn with_max_header_bytes(mut self, max_header_bytes: usize) -> Self {
        self.max_header_bytes = max_header_bytes;
        self
    }

    /// How long a connection may sit without a received chunk before it is
    /// closed (with a `408 Request Timeout` when an exchange was underway).
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Source of `Date` field values. Formatting is not this crate's
    /// business; the default delegates to `faf-http-date`.
    #[must_use]
    pub fn with_date_source(mut self, date_source: fn() -> Bytes) -> Self {
        self.date_source = date_source;
        self
    }

    pub fn methods(&self) -> MethodSet {
        self.methods
    }

    pub fn max_header_bytes(&self) -> usize {
        self.max_header_bytes
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub(crate) fn date(&self) -> Bytes {
        (self.date_source)()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            methods: MethodSet::default(),
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            idle_timeout: Duration::from_secs(60),
            date_source: default_date,
        }
    }
}

fn default_date() -> Bytes {
    let mut buf = faf_http_date::get_date_buff_no_key();
    faf_http_date::get_date_no_key(&mut buf);
    Bytes::from_owner(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Method;

    #[test]
    fn builder_overrides() {
        let config = ServerConfig::new()
            .with_methods(MethodSet::of(&[Method::Get]))
            .with_max_header_bytes(512)
            .with_idle_timeout(Duration::from_secs(5));

        assert!(config.methods().contains(Method::Get));
        assert!(!config.methods().contains(Method::Post));
        assert_eq!(config.max_header_bytes(), 512);
        assert_eq!(config.idle_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn default_date_is_nonempty() {
        let date = ServerConfig::default().date();
        assert!(!date.is_empty());
    }
}
