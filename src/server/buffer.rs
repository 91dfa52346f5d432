//! Per-direction socket byte buffers.
//!
//! A buffer holds the in-flight bytes of one direction of one connection,
//! split in two regions: `[released | unparsed]`. Bytes enter at the tail
//! via a non-blocking read; the decoder releases them once it has framed
//! and logged a complete message; released bytes leave at the head via a
//! non-blocking write to the opposite socket. The proxy never forwards a
//! byte it has not released.

use std::io;

use bytes::{Buf, BytesMut};

use super::stream::Stream;

/// Chunk reserved ahead of each read.
const READ_CHUNK: usize = 16 * 1024;
/// A direction exceeding this is treated as a hard error.
const MAX_BUFFER: usize = 64 * 1024 * 1024;

#[derive(Default)]
pub struct SocketBuffer {
    data: BytesMut,
    released: usize,
    message_size: Option<usize>,
    total_read: u64,
    total_written: u64,
}

impl SocketBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes awaiting decode.
    pub fn unparsed(&self) -> &[u8] {
        &self.data[self.released..]
    }

    pub fn unparsed_len(&self) -> usize {
        self.data.len() - self.released
    }

    /// Bytes released for forwarding but not yet written out.
    pub fn has_released(&self) -> bool {
        self.released > 0
    }

    pub fn released_len(&self) -> usize {
        self.released
    }

    /// Marks the next `n` unparsed bytes as forwardable. Clears the framed
    /// message marker.
    pub fn release(&mut self, n: usize) {
        debug_assert!(n <= self.unparsed_len());
        self.released += n;
        self.message_size = None;
    }

    /// Drops all unparsed bytes (half-close drain); returns how many.
    pub fn discard_unparsed(&mut self) -> usize {
        let n = self.unparsed_len();
        self.data.truncate(self.released);
        self.message_size = None;
        n
    }

    /// Framed size of the message currently being assembled, when known.
    pub fn message_size(&self) -> Option<usize> {
        self.message_size
    }

    pub fn set_message_size(&mut self, size: usize) {
        self.message_size = Some(size);
    }

    /// Whether the unparsed region holds the complete framed message.
    pub fn message_complete(&self) -> bool {
        self.message_size
            .is_some_and(|size| self.unparsed_len() >= size)
    }

    /// Whether the source socket should be read: nothing released is
    /// pending write, and the message being assembled (if its size is
    /// known) is still incomplete.
    pub fn wants_read(&self) -> bool {
        !self.has_released()
            && self
                .message_size
                .map_or(true, |size| self.unparsed_len() < size)
    }

    /// Appends bytes directly; used by the bootstrap clients and tests.
    pub fn load(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn total_read(&self) -> u64 {
        self.total_read
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Non-blocking read into the tail. `Ok(0)` is EOF;
    /// `ErrorKind::WouldBlock` is benign.
    pub fn read_from(&mut self, stream: &Stream) -> io::Result<usize> {
        if self.data.len() >= MAX_BUFFER {
            return Err(io::Error::other("connection buffer overflow"));
        }
        self.data.reserve(READ_CHUNK);
        let n = stream.try_read_buf(&mut self.data)?;
        self.total_read += n as u64;
        Ok(n)
    }

    /// Non-blocking write of released bytes from the head.
    pub fn write_to(&mut self, stream: &Stream) -> io::Result<usize> {
        if self.released == 0 {
            return Ok(0);
        }
        let n = stream.try_write(&self.data[..self.released])?;
        self.data.advance(n);
        self.released -= n;
        self.total_written += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_and_regions() {
        let mut buf = SocketBuffer::new();
        assert!(buf.is_empty());
        buf.load(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(buf.unparsed(), &[1, 2, 3, 4, 5, 6]);
        assert!(!buf.has_released());

        buf.release(4);
        assert_eq!(buf.unparsed(), &[5, 6]);
        assert_eq!(buf.released_len(), 4);
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn test_message_marker() {
        let mut buf = SocketBuffer::new();
        buf.set_message_size(8);
        buf.load(&[0; 4]);
        assert!(!buf.message_complete());
        assert!(buf.wants_read());
        buf.load(&[0; 4]);
        assert!(buf.message_complete());
        assert!(!buf.wants_read());
        buf.release(8);
        assert_eq!(buf.message_size(), None);
    }

    #[test]
    fn test_wants_read() {
        let mut buf = SocketBuffer::new();
        // empty: ready for input
        assert!(buf.wants_read());
        // incomplete header, size unknown
        buf.load(&[1, 0]);
        assert!(buf.wants_read());
        // released bytes apply backpressure until flushed
        buf.load(&[0, 0]);
        buf.release(4);
        assert!(!buf.wants_read());
    }

    #[test]
    fn test_discard_unparsed_keeps_released() {
        let mut buf = SocketBuffer::new();
        buf.load(&[1, 2, 3, 4, 5]);
        buf.release(2);
        assert_eq!(buf.discard_unparsed(), 3);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.released_len(), 2);
        assert_eq!(buf.discard_unparsed(), 0);
    }
}
