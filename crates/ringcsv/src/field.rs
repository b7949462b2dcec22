//! Field boundaries and their conversion to text.
//!
//! A field is a logical byte range over the ring. For quoted fields the range
//! covers the enclosing quotes, so `""` occupies two bytes while producing an
//! empty value. Values are decoded lazily, once per record, into a string the
//! field keeps across records so steady-state tokenizing does not allocate.

use core::convert::Infallible;
use std::io::{self, Write};

use bstr::ByteSlice;

use crate::ring::RingBuffer;

/// Boundaries of a field as found by the scanner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) quoted: bool,
    pub(crate) closed: bool,
    pub(crate) escaped_quotes: usize,
}

impl Span {
    pub(crate) fn at(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
            ..Self::default()
        }
    }

    #[inline]
    pub(crate) fn has_content(&self) -> bool {
        self.end > self.start
    }

    /// Extends the span over `pos` as literal text. A span that was quoted
    /// becomes unquoted, keeping its quote characters verbatim; returns
    /// whether that happened.
    #[inline]
    pub(crate) fn push_content(&mut self, pos: usize) -> bool {
        let was_quoted = self.quoted;
        if was_quoted {
            self.quoted = false;
            self.closed = false;
            self.escaped_quotes = 0;
        }
        self.end = pos + 1;
        was_quoted
    }

    /// Range of the value bytes, without enclosing quotes.
    fn content(&self) -> (usize, usize) {
        if self.quoted {
            let end = if self.closed { self.end - 1 } else { self.end };
            (self.start + 1, end)
        } else {
            (self.start, self.end)
        }
    }

    fn needs_unescape(&self) -> bool {
        self.quoted && self.escaped_quotes > 0
    }
}

/// One field of the current record.
///
/// Fields are owned by the [`Tokenizer`](crate::Tokenizer) and reused for
/// every record; a `&Field` is only meaningful until the next
/// [`read_record`](crate::Tokenizer::read_record).
#[derive(Debug, Default)]
pub struct Field {
    span: Span,
    value: String,
    cached: bool,
}

impl Field {
    pub(crate) fn reset(&mut self, span: Span) {
        self.span = span;
        self.value.clear();
        self.cached = false;
    }

    /// Logical offset of the first byte of the field, opening quote included.
    #[must_use]
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// Logical offset one past the last byte of the field.
    #[must_use]
    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Number of raw bytes the field occupies, quotes included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.span.end - self.span.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_quoted(&self) -> bool {
        self.span.quoted
    }

    /// Number of `""` pairs inside the quoted span.
    #[must_use]
    pub fn escaped_quotes(&self) -> usize {
        self.span.escaped_quotes
    }

    /// Length of the value bytes without the enclosing quotes. Escaped
    /// quotes still count twice.
    pub(crate) fn raw_length(&self) -> usize {
        let (start, end) = self.span.content();
        end - start
    }

    /// Decodes the field on first use and returns the cached text.
    pub(crate) fn value(&mut self, ring: &RingBuffer, scratch: &mut Vec<u8>) -> &str {
        if !self.cached {
            materialize(ring, &self.span, scratch, &mut self.value);
            self.cached = true;
        }
        &self.value
    }

    /// Writes the value bytes to `sink` without going through the cache.
    pub(crate) fn copy_into<W: Write + ?Sized>(
        &self,
        ring: &RingBuffer,
        sink: &mut W,
    ) -> io::Result<usize> {
        let mut written = 0;
        write_runs::<io::Error>(ring, &self.span, |run| {
            sink.write_all(run)?;
            written += run.len();
            Ok(())
        })?;
        Ok(written)
    }
}

fn materialize(ring: &RingBuffer, span: &Span, scratch: &mut Vec<u8>, out: &mut String) {
    out.clear();
    let (start, end) = span.content();
    let (head, tail) = ring.slices(start, end);
    if tail.is_empty() && !span.needs_unescape() {
        out.push_str(&head.to_str_lossy());
        return;
    }

    // Wrapped or escaped: reassemble the bytes first so a scalar split by the
    // wrap decodes as one character.
    scratch.clear();
    let Ok(()) = write_runs::<Infallible>(ring, span, |run| {
        scratch.extend_from_slice(run);
        Ok(())
    });
    out.push_str(&scratch.to_str_lossy());
}

/// Feeds the value bytes of `span` to `emit` as contiguous runs, dropping the
/// second quote of every `""` pair when the span is quoted.
fn write_runs<E>(
    ring: &RingBuffer,
    span: &Span,
    mut emit: impl FnMut(&[u8]) -> Result<(), E>,
) -> Result<(), E> {
    let (start, end) = span.content();
    let (head, tail) = ring.slices(start, end);
    if !span.needs_unescape() {
        emit(head)?;
        return emit(tail);
    }

    let mut after_quote = false;
    for segment in [head, tail] {
        let mut run_start = 0;
        for (i, &b) in segment.iter().enumerate() {
            if b != b'"' {
                after_quote = false;
            } else if after_quote {
                emit(&segment[run_start..i])?;
                run_start = i + 1;
                after_quote = false;
            } else {
                after_quote = true;
            }
        }
        emit(&segment[run_start..])?;
    }
    Ok(())
}
