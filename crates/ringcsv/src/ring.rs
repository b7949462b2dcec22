//! Fixed-capacity ring of input bytes.
//!
//! The ring holds the unread tail of the input stream. Its state is two
//! integers:
//!
//! - `line_start`: physical index of the first unconsumed byte, always in
//!   `0..capacity`;
//! - `valid_length`: number of unconsumed bytes, always `<= capacity`.
//!
//! Callers address bytes by *logical* position. The record currently being
//! scanned starts at logical position `line_start` and may run up to
//! `line_start + valid_length`; logical positions are never reduced modulo
//! the capacity until [`RingBuffer::physical`] maps them to an index. Every
//! modulo in the crate goes through that helper.

use std::io::{self, Read};

use tracing::{debug, trace};

#[derive(Debug)]
pub(crate) struct RingBuffer {
    data: Box<[u8]>,
    line_start: usize,
    valid_length: usize,
    load_threshold: usize,
    eof: bool,
}

impl RingBuffer {
    /// Allocates `primary + load_threshold` bytes. This is the only
    /// allocation the ring ever makes.
    pub(crate) fn new(primary: usize, load_threshold: usize) -> Self {
        Self {
            data: vec![0; primary + load_threshold].into_boxed_slice(),
            line_start: 0,
            valid_length: 0,
            load_threshold,
            eof: false,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub(crate) fn line_start(&self) -> usize {
        self.line_start
    }

    #[inline]
    pub(crate) fn valid_length(&self) -> usize {
        self.valid_length
    }

    /// One past the last buffered logical position.
    #[inline]
    pub(crate) fn data_end(&self) -> usize {
        self.line_start + self.valid_length
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.valid_length == self.capacity()
    }

    #[inline]
    pub(crate) fn at_eof(&self) -> bool {
        self.eof
    }

    /// Maps a logical position to its index in the backing slice.
    #[inline(always)]
    pub(crate) fn physical(&self, logical: usize) -> usize {
        logical % self.capacity()
    }

    #[inline]
    pub(crate) fn byte_at(&self, logical: usize) -> u8 {
        self.data[self.physical(logical)]
    }

    /// Returns the logical range `start..end` as at most two contiguous
    /// slices: the part before the physical end of the ring and the part
    /// that wrapped to its head.
    pub(crate) fn slices(&self, start: usize, end: usize) -> (&[u8], &[u8]) {
        let len = end - start;
        if len == 0 {
            return (&[], &[]);
        }
        let first = self.physical(start);
        let tail_room = self.capacity() - first;
        if len <= tail_room {
            (&self.data[first..first + len], &[])
        } else {
            (&self.data[first..], &self.data[..len - tail_room])
        }
    }

    /// Tops up the ring from `source`.
    ///
    /// Unless `force` is set, nothing is read while the free space is below
    /// the load threshold. The free region may wrap, so a fill reads at most
    /// two segments: from the write position to the physical end, then from
    /// the physical start. Returns whether end-of-stream was observed during
    /// this call.
    pub(crate) fn fill<R: Read>(&mut self, source: &mut R, force: bool) -> io::Result<bool> {
        let free = self.capacity() - self.valid_length;
        if self.eof || free == 0 || (!force && free < self.load_threshold) {
            return Ok(false);
        }

        let write_at = self.physical(self.data_end());
        let tail_len = free.min(self.capacity() - write_at);
        let head_len = free - tail_len;

        let read = read_segment(source, &mut self.data[write_at..write_at + tail_len])?;
        self.valid_length += read;
        let mut short = read < tail_len;
        if !short && head_len > 0 {
            let read = read_segment(source, &mut self.data[..head_len])?;
            self.valid_length += read;
            short = read < head_len;
        }
        trace!(
            free,
            tail_len,
            head_len,
            valid_length = self.valid_length,
            eof = short,
            "filled ring"
        );

        if short {
            debug!(valid_length = self.valid_length, "end of stream");
            self.eof = true;
        }
        Ok(short)
    }

    /// Releases `len` bytes from the front of the ring.
    pub(crate) fn consume(&mut self, len: usize) {
        debug_assert!(len <= self.valid_length);
        self.line_start = self.physical(self.line_start + len);
        self.valid_length -= len;
    }
}

/// Reads until `buf` is full or the source reports end-of-stream.
fn read_segment<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn fill_loads_until_full() {
        let mut ring = RingBuffer::new(4, 2);
        let mut src = Cursor::new(b"abcdefgh".to_vec());
        let eof = ring.fill(&mut src, false).unwrap();
        assert!(!eof);
        assert!(ring.is_full());
        assert_eq!(ring.slices(0, 6), (&b"abcdef"[..], &b""[..]));
    }

    #[test]
    fn fill_reports_short_read_as_eof() {
        let mut ring = RingBuffer::new(8, 4);
        let mut src = Cursor::new(b"abc".to_vec());
        assert!(ring.fill(&mut src, false).unwrap());
        assert!(ring.at_eof());
        assert_eq!(ring.valid_length(), 3);
        // Nothing more is read once the end has been seen.
        assert!(!ring.fill(&mut src, true).unwrap());
    }

    #[test]
    fn fill_respects_threshold_unless_forced() {
        let mut ring = RingBuffer::new(4, 2);
        let mut src = Cursor::new(b"abcdefghij".to_vec());
        ring.fill(&mut src, false).unwrap();
        ring.consume(1);
        ring.fill(&mut src, false).unwrap();
        assert_eq!(
            ring.valid_length(),
            5,
            "one free byte is below the threshold"
        );
        ring.fill(&mut src, true).unwrap();
        assert_eq!(ring.valid_length(), 6);
    }

    #[test]
    fn wrapped_free_space_reads_tail_then_head() {
        let mut ring = RingBuffer::new(4, 2);
        let mut src = Cursor::new(b"abcdefghijkl".to_vec());
        ring.fill(&mut src, false).unwrap();
        ring.consume(5);
        ring.fill(&mut src, false).unwrap();
        ring.consume(2);
        assert_eq!((ring.line_start(), ring.valid_length()), (1, 4));
        // Free space is physical 5..6 and 0..1; only "l" is left to read.
        let eof = ring.fill(&mut src, true).unwrap();
        assert!(eof);
        assert_eq!(ring.valid_length(), 5);
        assert_eq!(ring.slices(1, 6), (&b"hijkl"[..], &b""[..]));
    }

    #[test]
    fn wrapped_record_reads_as_two_slices() {
        let mut ring = RingBuffer::new(4, 2);
        let mut src = Cursor::new(b"abcdefghijkl".to_vec());
        ring.fill(&mut src, false).unwrap();
        ring.consume(4);
        assert_eq!(ring.line_start(), 4);
        ring.fill(&mut src, false).unwrap();
        assert!(ring.is_full());
        let start = ring.line_start();
        let (tail, head) = ring.slices(start, ring.data_end());
        assert_eq!(tail, b"ef");
        assert_eq!(head, b"ghij");
        assert_eq!(ring.byte_at(start + 2), b'g');
    }

    #[test]
    fn consume_wraps_line_start() {
        let mut ring = RingBuffer::new(2, 1);
        let mut src = Cursor::new(b"xyzxyz".to_vec());
        ring.fill(&mut src, false).unwrap();
        ring.consume(2);
        ring.fill(&mut src, true).unwrap();
        ring.consume(3);
        assert_eq!(ring.line_start(), 2);
        assert_eq!(ring.valid_length(), 0);
    }
}
