use std::io::{self, Read};

use crate::{Tokenizer, TokenizerError, TokenizerOptions};

/// Reader handing out at most `chunk` bytes per call, to exercise refills at
/// arbitrary boundaries.
pub(crate) struct ChunkedReader<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl<'a> ChunkedReader<'a> {
    pub(crate) fn new(data: &'a [u8], chunk: usize) -> Self {
        Self {
            data,
            chunk: chunk.max(1),
        }
    }
}

impl Read for ChunkedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

pub(crate) fn tokenize_with(
    input: &str,
    options: TokenizerOptions,
) -> Result<Vec<Vec<String>>, TokenizerError> {
    Tokenizer::with_options(input.as_bytes(), options)
        .expect("valid options")
        .records()
        .collect()
}

pub(crate) fn tokenize(input: &str) -> Vec<Vec<String>> {
    tokenize_with(input, TokenizerOptions::default()).expect("tokenize")
}

pub(crate) fn small_buffer(buffer_size: usize, load_threshold: usize) -> TokenizerOptions {
    TokenizerOptions {
        buffer_size,
        load_threshold: Some(load_threshold),
        ..Default::default()
    }
}

/// Encodes `rows` with every field quoted.
pub(crate) fn quote_rows(rows: &[Vec<String>], delimiter: &str, crlf: bool) -> String {
    let mut out = String::new();
    for row in rows {
        for (i, field) in row.iter().enumerate() {
            if i > 0 {
                out.push_str(delimiter);
            }
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        }
        out.push_str(if crlf { "\r\n" } else { "\n" });
    }
    out
}
