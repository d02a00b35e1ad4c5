//! Length-bounded content transfer.
//!
//! Two mirrored free functions move body bytes between arrival chunks and
//! message buffers, carrying their cursor state in the destination buffer
//! itself (bytes accumulated so far) plus an explicit total:
//!
//! - [`extract_content`]: receive side, fills a body accumulator up to the
//!   expected `Content-Length`
//! - [`insert_content`]: send side, fills a transmit buffer up to its
//!   frame capacity
//!
//! Both never write past their bound and report completion exactly when
//! the destination reaches it.

use std::cmp;

use bytes::BytesMut;

/// Result of one [`extract_content`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentExtract {
    /// How many bytes of the supplied chunk were consumed.
    pub consumed: usize,
    /// True exactly when the accumulated total equals the expected length.
    pub complete: bool,
}

/// Copies `min(chunk.len(), remaining)` bytes of `chunk` into `dst`, where
/// `remaining` is `expected` minus the bytes already accumulated in `dst`.
///
/// Unconsumed chunk bytes (anything past the expected total) are left to
/// the caller.
pub fn extract_content(dst: &mut BytesMut, expected: usize, chunk: &[u8]) -> ContentExtract {
    let remaining = expected.saturating_sub(dst.len());
    let take = cmp::min(chunk.len(), remaining);
    dst.extend_from_slice(&chunk[..take]);
    ContentExtract { consumed: take, complete: dst.len() == expected }
}

/// Result of one [`insert_content`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentInsert {
    /// How many bytes of the source were taken into the transmit buffer.
    pub taken: usize,
    /// True exactly when the transmit buffer reached its capacity.
    pub complete: bool,
}

/// Copies bytes from `src` into the transmit buffer `dst`, bounded by the
/// frame `capacity`.
///
/// A partial fill is legal; the caller resumes later with the remaining
/// source data, offset by the reported `taken`.
pub fn insert_content(dst: &mut BytesMut, capacity: usize, src: &[u8]) -> ContentInsert {
    let room = capacity.saturating_sub(dst.len());
    let take = cmp::min(src.len(), room);
    dst.extend_from_slice(&src[..take]);
    ContentInsert { taken: take, complete: dst.len() == capacity }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_transfer_over_any_partition() {
        let source: Vec<u8> = (0u8..=255).cycle().take(1000).collect();

        for chunk_size in [1, 3, 7, 100, 999, 1000] {
            let mut dst = BytesMut::with_capacity(source.len());
            let mut completions = 0;
            for chunk in source.chunks(chunk_size) {
                let status = extract_content(&mut dst, source.len(), chunk);
                assert_eq!(status.consumed, chunk.len());
                if status.complete {
                    completions += 1;
                }
            }
            // complete is signalled exactly once, on the chunk reaching N
            assert_eq!(completions, 1, "chunk size {chunk_size}");
            assert_eq!(&dst[..], &source[..], "chunk size {chunk_size}");
        }
    }

    #[test]
    fn never_writes_past_expected() {
        let mut dst = BytesMut::new();
        let status = extract_content(&mut dst, 4, b"abcdefgh");
        assert_eq!(status, ContentExtract { consumed: 4, complete: true });
        assert_eq!(&dst[..], b"abcd");

        // a follow-up call consumes nothing
        let status = extract_content(&mut dst, 4, b"ijkl");
        assert_eq!(status, ContentExtract { consumed: 0, complete: true });
    }

    #[test]
    fn insert_partial_fill_resumes() {
        let mut dst = BytesMut::new();
        dst.extend_from_slice(b"HEAD");

        let src = b"0123456789";
        let first = insert_content(&mut dst, 10, src);
        assert_eq!(first, ContentInsert { taken: 6, complete: true });
        assert_eq!(&dst[..], b"HEAD012345");

        // a second frame picks up where the first stopped
        let mut next = BytesMut::new();
        let second = insert_content(&mut next, 4, &src[first.taken..]);
        assert_eq!(second, ContentInsert { taken: 4, complete: true });
        assert_eq!(&next[..], b"6789");
    }

    #[test]
    fn insert_reports_incomplete_fill() {
        let mut dst = BytesMut::new();
        let status = insert_content(&mut dst, 8, b"abc");
        assert_eq!(status, ContentInsert { taken: 3, complete: false });
    }
}
