//! Byte buffer for unconsumed transport input.
//!
//! The analyzer streams continuously at 500 kbaud, so the buffer is bounded:
//! when it grows past a cap the oldest bytes are thrown away. Old sweeps are
//! worthless once newer ones exist, so the loss is silent and callers must
//! tolerate losing a partial frame that straddled the cut.

use bytes::{Buf, BytesMut};

/// Default cap on retained bytes.
pub const DEFAULT_MAX_LEN: usize = 8000;

/// Default number of bytes kept after an overflow.
pub const DEFAULT_RETAIN_LEN: usize = 4000;

/// Ordered, bounded store of bytes not yet consumed by the frame scanner.
#[derive(Debug, Default)]
pub struct ByteBuffer {
    buf: BytesMut,
}

impl ByteBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        ByteBuffer {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append freshly read bytes to the tail.
    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Discard everything before `offset`. Offsets past the end empty the
    /// buffer.
    pub fn trim_from(&mut self, offset: usize) {
        let offset = offset.min(self.buf.len());
        self.buf.advance(offset);
    }

    /// If the buffer holds more than `max_len` bytes, keep only the last
    /// `retain_len`.
    ///
    /// Returns the number of bytes dropped (zero when under the cap).
    pub fn cap_if_oversized(&mut self, max_len: usize, retain_len: usize) -> usize {
        if self.buf.len() <= max_len {
            return 0;
        }
        let dropped = self.buf.len().saturating_sub(retain_len);
        self.buf.advance(dropped);
        dropped
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// The buffered bytes, oldest first.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn append_and_trim() {
        let mut buffer = ByteBuffer::new();
        buffer.append(b"hello ");
        buffer.append(b"world");
        assert_eq!(buffer.as_slice(), b"hello world");

        buffer.trim_from(6);
        assert_eq!(buffer.as_slice(), b"world");
    }

    #[test]
    fn trim_past_end_empties() {
        let mut buffer = ByteBuffer::new();
        buffer.append(b"abc");
        buffer.trim_from(10);
        assert!(buffer.is_empty());
    }

    #[test]
    fn cap_under_limit_is_noop() {
        let mut buffer = ByteBuffer::new();
        buffer.append(&[7u8; 100]);
        assert_eq!(buffer.cap_if_oversized(100, 10), 0);
        assert_eq!(buffer.len(), 100);
    }

    #[test]
    fn cap_keeps_newest_bytes() {
        let mut buffer = ByteBuffer::new();
        let data: Vec<u8> = (0..=255).collect();
        buffer.append(&data);

        assert_eq!(buffer.cap_if_oversized(200, 16), 240);
        assert_eq!(buffer.as_slice(), &data[240..]);
    }

    proptest! {
        #[test]
        fn cap_retains_exactly_retain_len(
            (max_len, retain_len) in (1usize..512).prop_flat_map(|max| (Just(max), 0..max)),
            extra in 1usize..512,
        ) {
            let data: Vec<u8> = (0..max_len + extra).map(|i| (i % 251) as u8).collect();
            let mut buffer = ByteBuffer::new();
            buffer.append(&data);

            let dropped = buffer.cap_if_oversized(max_len, retain_len);
            prop_assert_eq!(buffer.len(), retain_len);
            prop_assert_eq!(dropped, data.len() - retain_len);
            prop_assert_eq!(buffer.as_slice(), &data[data.len() - retain_len..]);
        }
    }
}
