//! Record tokenizer over a fixed-size ring buffer.
//!
//! Overview
//! - [`Tokenizer`] pulls bytes from any [`Read`] into a [`RingBuffer`] and
//!   splits them into records of fields. Memory use is the ring plus the
//!   field pool; neither grows with the input.
//! - A record must fit in the ring. The scan of a record never moves
//!   `line_start`, so refilling in the middle of a record only appends after
//!   the buffered data and never invalidates offsets already recorded.
//! - Fields are recorded as logical byte ranges. They are decoded to text
//!   only when [`Tokenizer::value_of`] asks for them, and only once per
//!   record.
//!
//! Leniency
//! - A quote that follows unquoted content, or content that follows a closed
//!   quoted span, turns the whole field into literal text and disables quote
//!   handling for the rest of that field.
//! - A quoted span left open at end-of-stream ends at the last byte.
//! - Blank lines are skipped.
//!
//! Failures
//! - Running into a full buffer before the end of a record is fatal. Records
//!   are never truncated.


use std::io::{self, Read, Write};

use tracing::debug;

use crate::{
    error::{ErrorSource, TokenizerError},
    field::{Field, Span},
    options::{OptionsError, TokenizerOptions},
    records::Records,
    ring::RingBuffer,
};

/// What lies at a logical position once the ring has been topped up.
enum Lookahead {
    Byte(u8),
    EndOfStream,
    BufferFull,
}

/// Where a scanned record stopped.
struct RecordEnd {
    /// Logical position after the record, terminator included.
    next: usize,
    newlines: usize,
    /// The record ended in CR at the very end of a full buffer, so a following
    /// LF could not be checked yet.
    pending_lf: bool,
}

/// A streaming tokenizer for delimited text.
///
/// # Examples
///
/// ```rust
/// use ringcsv::Tokenizer;
///
/// let mut tokenizer = Tokenizer::new(&b"a,\"b,c\",,d\r\n"[..]);
/// assert!(tokenizer.read_record().unwrap());
/// assert_eq!(tokenizer.field_count(), 4);
/// assert_eq!(tokenizer.value_of(1), Some("b,c"));
/// assert_eq!(tokenizer.value_of(2), Some(""));
/// assert_eq!(tokenizer.value_of(4), None);
/// assert!(!tokenizer.read_record().unwrap());
/// ```
#[derive(Debug)]
pub struct Tokenizer<R> {
    source: R,
    ring: RingBuffer,
    options: TokenizerOptions,
    delimiter: Box<[u8]>,

    fields: Vec<Field>,
    field_count: usize,
    scratch: Vec<u8>,

    line: usize,
    record_line: usize,
    records_read: u64,
    skip_lf: bool,
}

impl<R: Read> Tokenizer<R> {
    /// Creates a tokenizer with default options: comma delimiter, 32 KiB
    /// buffer, trimming enabled.
    pub fn new(source: R) -> Self {
        Self::build(source, TokenizerOptions::default())
    }

    /// Creates a tokenizer with the given options.
    ///
    /// # Errors
    ///
    /// Returns an [`OptionsError`] if the options fail
    /// [`TokenizerOptions::validate`].
    pub fn with_options(source: R, options: TokenizerOptions) -> Result<Self, OptionsError> {
        options.validate()?;
        Ok(Self::build(source, options))
    }

    fn build(source: R, options: TokenizerOptions) -> Self {
        let ring = RingBuffer::new(options.buffer_size, options.effective_load_threshold());
        let delimiter = options.delimiter.as_bytes().into();
        Self {
            source,
            ring,
            options,
            delimiter,
            fields: Vec::new(),
            field_count: 0,
            scratch: Vec::new(),
            line: 1,
            record_line: 0,
            records_read: 0,
            skip_lf: false,
        }
    }

    /// Advances to the next non-blank record.
    ///
    /// Returns `Ok(false)` once the input is exhausted. Values of the previous
    /// record are invalidated.
    ///
    /// # Errors
    ///
    /// Fails if the source cannot be read, or if a record (or a quoted span
    /// within it) does not fit in the ring buffer. Both overflow conditions
    /// are permanent for this input.
    pub fn read_record(&mut self) -> Result<bool, TokenizerError> {
        loop {
            self.field_count = 0;
            self.ring
                .fill(&mut self.source, false)
                .map_err(|e| TokenizerError::new(e, self.line))?;
            if self.ring.valid_length() == 0 && self.ring.at_eof() {
                return Ok(false);
            }

            if core::mem::take(&mut self.skip_lf)
                && self.ring.valid_length() > 0
                && self.ring.byte_at(self.ring.line_start()) == b'\n'
            {
                self.ring.consume(1);
                continue;
            }

            let end = match self.scan_record() {
                Ok(end) => end,
                Err(e) => {
                    self.field_count = 0;
                    return Err(e);
                }
            };
            self.ring.consume(end.next - self.ring.line_start());
            self.skip_lf = end.pending_lf;
            self.record_line = self.line;
            self.line += end.newlines;

            if self.is_blank() {
                debug!(line = self.record_line, "skipping blank line");
                self.field_count = 0;
                continue;
            }
            self.records_read += 1;
            return Ok(true);
        }
    }

    fn is_blank(&self) -> bool {
        self.field_count == 1 && !self.fields[0].is_quoted() && self.fields[0].is_empty()
    }

    fn scan_record(&mut self) -> Result<RecordEnd, TokenizerError> {
        let trim = self.options.trim_fields;
        let first = self.delimiter[0];
        let delimiter_len = self.delimiter.len();

        let mut pos = self.ring.line_start();
        let mut field = Span::at(pos);
        let mut ignore_quote = false;
        let mut newlines = 0;

        let (next, pending_lf) = loop {
            let byte = match self.lookahead(pos)? {
                Lookahead::Byte(b) => b,
                Lookahead::EndOfStream => break (pos, false),
                Lookahead::BufferFull => return Err(self.record_too_long()),
            };

            // The delimiter never starts with a quote or line break, so
            // checking it first does not change the order of the arms below.
            let is_delimiter = byte == first && self.delimiter_at(pos)?;

            match byte {
                b'"' if ignore_quote => {
                    field.push_content(pos);
                    pos += 1;
                }
                b'"' if field.has_content() || field.quoted => {
                    field.push_content(pos);
                    ignore_quote = true;
                    pos += 1;
                }
                b'"' => {
                    pos = self.scan_quoted(&mut field, pos, &mut newlines)?;
                }
                b'\r' => {
                    newlines += 1;
                    match self.lookahead(pos + 1)? {
                        Lookahead::Byte(b'\n') => break (pos + 2, false),
                        Lookahead::BufferFull => break (pos + 1, true),
                        _ => break (pos + 1, false),
                    }
                }
                b'\n' => {
                    newlines += 1;
                    break (pos + 1, false);
                }
                _ if is_delimiter => {
                    self.push_field(field);
                    pos += delimiter_len;
                    field = Span::at(pos);
                    ignore_quote = false;
                }
                b' ' if trim => {
                    if !field.has_content() {
                        field = Span::at(pos + 1);
                    }
                    pos += 1;
                }
                _ => {
                    if field.push_content(pos) {
                        ignore_quote = true;
                    }
                    pos += 1;
                }
            }
        };

        self.push_field(field);
        Ok(RecordEnd {
            next,
            newlines,
            pending_lf,
        })
    }

    /// Scans a quoted span opening at `open` and returns the position after
    /// it.
    fn scan_quoted(
        &mut self,
        field: &mut Span,
        open: usize,
        newlines: &mut usize,
    ) -> Result<usize, TokenizerError> {
        *field = Span {
            quoted: true,
            ..Span::at(open)
        };
        let mut pos = open + 1;
        loop {
            match self.lookahead(pos)? {
                Lookahead::Byte(b'"') => match self.lookahead(pos + 1)? {
                    Lookahead::Byte(b'"') => {
                        field.escaped_quotes += 1;
                        pos += 2;
                    }
                    Lookahead::BufferFull => return Err(self.unterminated_quote()),
                    Lookahead::Byte(_) | Lookahead::EndOfStream => {
                        field.end = pos + 1;
                        field.closed = true;
                        return Ok(pos + 1);
                    }
                },
                Lookahead::Byte(b'\r') => {
                    // A CR directly followed by LF is counted at the LF.
                    match self.lookahead(pos + 1)? {
                        Lookahead::Byte(b'\n') => {}
                        Lookahead::BufferFull => return Err(self.unterminated_quote()),
                        Lookahead::Byte(_) | Lookahead::EndOfStream => *newlines += 1,
                    }
                    pos += 1;
                }
                Lookahead::Byte(b) => {
                    if b == b'\n' {
                        *newlines += 1;
                    }
                    pos += 1;
                }
                Lookahead::EndOfStream => {
                    field.end = pos;
                    return Ok(pos);
                }
                Lookahead::BufferFull => return Err(self.unterminated_quote()),
            }
        }
    }

    /// Whether the whole delimiter starts at `pos`. The caller has already
    /// matched its first byte.
    fn delimiter_at(&mut self, pos: usize) -> Result<bool, TokenizerError> {
        for k in 1..self.delimiter.len() {
            match self.lookahead(pos + k)? {
                Lookahead::Byte(b) if b == self.delimiter[k] => {}
                Lookahead::Byte(_) | Lookahead::EndOfStream => return Ok(false),
                Lookahead::BufferFull => return Err(self.record_too_long()),
            }
        }
        Ok(true)
    }

    /// Returns the byte at `pos`, refilling the ring when `pos` is just past
    /// the buffered data.
    fn lookahead(&mut self, pos: usize) -> Result<Lookahead, TokenizerError> {
        loop {
            if pos < self.ring.data_end() {
                return Ok(Lookahead::Byte(self.ring.byte_at(pos)));
            }
            if self.ring.at_eof() {
                return Ok(Lookahead::EndOfStream);
            }
            if self.ring.is_full() {
                return Ok(Lookahead::BufferFull);
            }
            self.ring
                .fill(&mut self.source, true)
                .map_err(|e| TokenizerError::new(e, self.line))?;
        }
    }

    fn push_field(&mut self, span: Span) {
        if let Some(field) = self.fields.get_mut(self.field_count) {
            field.reset(span);
        } else {
            let mut field = Field::default();
            field.reset(span);
            self.fields.push(field);
        }
        self.field_count += 1;
    }

    fn record_too_long(&self) -> TokenizerError {
        let capacity = self.ring.capacity();
        debug!(line = self.line, capacity, "record does not fit in buffer");
        TokenizerError::new(ErrorSource::RecordTooLong { capacity }, self.line)
    }

    fn unterminated_quote(&self) -> TokenizerError {
        let capacity = self.ring.capacity();
        debug!(
            line = self.line,
            capacity,
            "quoted field does not fit in buffer"
        );
        TokenizerError::new(ErrorSource::UnterminatedQuote { capacity }, self.line)
    }

    /// Converts the tokenizer into an iterator of owned records.
    pub fn records(self) -> Records<R> {
        Records::new(self)
    }
}

impl<R> Tokenizer<R> {
    /// Number of fields in the current record; `0` before the first record
    /// and after the input is exhausted.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Read-only view of the fields of the current record.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields[..self.field_count]
    }

    #[must_use]
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields().get(index)
    }

    /// Text of field `index`, or `None` if the record has no such field.
    ///
    /// Quoted fields lose their enclosing quotes and have `""` collapsed to
    /// `"`; unquoted fields are returned as written. An empty field is
    /// `Some("")`. The text is decoded on first access and cached until the
    /// next record; invalid UTF-8 is replaced with U+FFFD.
    pub fn value_of(&mut self, index: usize) -> Option<&str> {
        if index >= self.field_count {
            return None;
        }
        Some(self.fields[index].value(&self.ring, &mut self.scratch))
    }

    /// Byte length of field `index` without its enclosing quotes, `0` if the
    /// record has no such field. Escaped quotes are counted as written.
    #[must_use]
    pub fn raw_length(&self, index: usize) -> usize {
        self.field(index).map_or(0, Field::raw_length)
    }

    /// Writes the bytes of field `index` straight from the ring to `sink`,
    /// bypassing the cached text. Returns the number of bytes written, `0` if
    /// the record has no such field.
    ///
    /// # Errors
    ///
    /// Propagates errors from `sink`.
    pub fn copy_into<W: Write + ?Sized>(&self, index: usize, sink: &mut W) -> io::Result<usize> {
        match self.field(index) {
            Some(field) => field.copy_into(&self.ring, sink),
            None => Ok(0),
        }
    }

    /// 1-based line on which the current record starts.
    ///
    /// Before the first record this is `0`.
    #[must_use]
    pub fn line(&self) -> usize {
        self.record_line
    }

    /// Number of records returned so far, blank lines excluded.
    #[must_use]
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Physical size of the ring buffer, which is also the longest record
    /// that can be tokenized.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    #[must_use]
    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    /// Returns the underlying reader. Bytes already buffered are lost.
    pub fn into_inner(self) -> R {
        self.source
    }
}
