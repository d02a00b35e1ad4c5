//! Incremental header-boundary extraction.
//!
//! [`extract_header`] accumulates raw chunks into a bounded buffer and
//! locates the end of an HTTP header block. It is deliberately lenient
//! about the terminator: either `\n\r\n` or `\n\n` ends the block, which
//! covers strict `\r\n\r\n` framing as well as bare-LF peers.
//!
//! The function reports, per call, how many of the *newly supplied* bytes
//! it consumed, so a driver feeding arbitrary chunk boundaries can always
//! advance its cursor by exactly that amount and hand the remainder to the
//! body transfer. Feeding one buffer whole or split at any boundary yields
//! the same extracted header.

use bytes::BytesMut;
use tracing::trace;

/// Result of one [`extract_header`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderScan {
    /// The terminator was found. The accumulated buffer now holds the
    /// complete header block (terminator included); `consumed` counts how
    /// many of the newly supplied bytes belong to it.
    Complete { consumed: usize },
    /// No terminator yet. All supplied bytes were consumed into the
    /// accumulator; the caller must distinguish "need more data" from
    /// "header too large" by comparing the accumulated length against the
    /// capacity it passed.
    Partial { consumed: usize },
    /// A NUL byte arrived before any terminator. Zero bytes were consumed
    /// and the accumulator is unchanged; this is a protocol error, never
    /// "need more data".
    Nul,
}

/// Appends `chunk` to `acc` (bounded by `capacity`) and scans the whole
/// accumulated buffer for the first header terminator.
///
/// On success the accumulator is truncated right after the terminator;
/// bytes of `chunk` beyond it are left to the caller (they are the start
/// of the message body, or of nothing at all).
pub fn extract_header(acc: &mut BytesMut, chunk: &[u8], capacity: usize) -> HeaderScan {
    let previous = acc.len();
    let room = capacity.saturating_sub(previous);
    let take = chunk.len().min(room);
    acc.extend_from_slice(&chunk[..take]);

    if let Some(end) = find_terminator(acc) {
        acc.truncate(end);
        let consumed = end - previous;
        trace!(header_bytes = end, consumed, "header terminator located");
        return HeaderScan::Complete { consumed };
    }

    if chunk.contains(&0) {
        acc.truncate(previous);
        return HeaderScan::Nul;
    }

    HeaderScan::Partial { consumed: chunk.len() }
}

/// Finds the end offset (exclusive) of the first `\n\r\n` or `\n\n`
/// terminator in `buf`.
fn find_terminator(buf: &[u8]) -> Option<usize> {
    for (i, byte) in buf.iter().enumerate() {
        if *byte != b'\n' {
            continue;
        }
        if buf.len() > i + 2 && buf[i + 1] == b'\r' && buf[i + 2] == b'\n' {
            return Some(i + 3);
        }
        if buf.len() > i + 1 && buf[i + 1] == b'\n' {
            return Some(i + 2);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: usize = 1024;

    #[test]
    fn finds_crlf_terminator() {
        let mut acc = BytesMut::new();
        let wire = b"GET /x HTTP/1.1\r\nHost: h\r\n\r\n";
        match extract_header(&mut acc, wire, CAP) {
            HeaderScan::Complete { consumed } => assert_eq!(consumed, wire.len()),
            other => panic!("expected Complete, got {other:?}"),
        }
        assert_eq!(&acc[..], &wire[..]);
    }

    #[test]
    fn finds_bare_lf_terminator() {
        let mut acc = BytesMut::new();
        let wire = b"GET /x HTTP/1.1\nHost: h\n\n";
        match extract_header(&mut acc, wire, CAP) {
            HeaderScan::Complete { consumed } => assert_eq!(consumed, wire.len()),
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn leaves_body_bytes_to_the_caller() {
        let mut acc = BytesMut::new();
        let wire = b"POST /x HTTP/1.1\r\nHost: h\r\nContent-Length: 4\r\n\r\nwxyz";
        match extract_header(&mut acc, wire, CAP) {
            HeaderScan::Complete { consumed } => {
                assert_eq!(consumed, wire.len() - 4);
                assert_eq!(&wire[consumed..], b"wxyz");
            }
            other => panic!("expected Complete, got {other:?}"),
        }
        // the accumulator holds exactly the header block
        assert!(acc.ends_with(b"\r\n\r\n"));
    }

    #[test]
    fn chunk_boundary_invariance() {
        let wire = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\n\r\n";

        let mut whole = BytesMut::new();
        assert!(matches!(extract_header(&mut whole, wire, CAP), HeaderScan::Complete { .. }));

        // every split point must yield the same header block
        for split in 1..wire.len() - 1 {
            let mut acc = BytesMut::new();
            let first = extract_header(&mut acc, &wire[..split], CAP);
            match first {
                HeaderScan::Partial { consumed } => {
                    assert_eq!(consumed, split);
                    let second = extract_header(&mut acc, &wire[split..], CAP);
                    assert!(matches!(second, HeaderScan::Complete { .. }), "split at {split}");
                }
                HeaderScan::Complete { .. } => {}
                HeaderScan::Nul => panic!("unexpected NUL at split {split}"),
            }
            assert_eq!(&acc[..], &whole[..], "split at {split}");
        }
    }

    #[test]
    fn split_mid_header_line() {
        // request split right inside the Host field
        let mut acc = BytesMut::new();
        let a = b"GET /x HTTP/1.1\r\nHos";
        let b = b"t: h\r\n\r\n";

        assert_eq!(extract_header(&mut acc, a, CAP), HeaderScan::Partial { consumed: a.len() });
        match extract_header(&mut acc, b, CAP) {
            HeaderScan::Complete { consumed } => assert_eq!(consumed, b.len()),
            other => panic!("expected Complete, got {other:?}"),
        }
        assert_eq!(&acc[..], b"GET /x HTTP/1.1\r\nHost: h\r\n\r\n");
    }

    #[test]
    fn nul_before_terminator_consumes_nothing() {
        let mut acc = BytesMut::new();
        assert_eq!(extract_header(&mut acc, b"GET /x", CAP), HeaderScan::Partial { consumed: 6 });

        let before = acc.len();
        assert_eq!(extract_header(&mut acc, b" HT\0TP/1.1\r\n", CAP), HeaderScan::Nul);
        assert_eq!(acc.len(), before);
    }

    #[test]
    fn nul_after_terminator_is_body_data() {
        let mut acc = BytesMut::new();
        let wire = b"GET /x HTTP/1.1\r\nHost: h\r\n\r\n\0\0";
        match extract_header(&mut acc, wire, CAP) {
            HeaderScan::Complete { consumed } => assert_eq!(consumed, wire.len() - 2),
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn capacity_reached_is_distinguishable() {
        let mut acc = BytesMut::new();
        let chunk = vec![b'a'; 64];
        match extract_header(&mut acc, &chunk, 32) {
            HeaderScan::Partial { consumed } => assert_eq!(consumed, 64),
            other => panic!("expected Partial, got {other:?}"),
        }
        // accumulated length equals capacity: header too large, not "need more"
        assert_eq!(acc.len(), 32);
    }
}
