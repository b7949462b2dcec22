use std::io;

use thiserror::Error;

/// A fatal tokenizer failure, tagged with the line on which the offending
/// record starts.
#[derive(Error, Debug)]
#[error("{source} at line {line}")]
pub struct TokenizerError {
    pub(crate) source: ErrorSource,
    pub(crate) line: usize,
}

#[derive(Error, Debug)]
pub enum ErrorSource {
    /// A quoted span ran to the end of a full buffer while more input remains.
    #[error("unterminated quoted field does not fit in the {capacity}-byte buffer")]
    UnterminatedQuote { capacity: usize },
    /// A record ran to the end of a full buffer without a line terminator.
    #[error("record does not fit in the {capacity}-byte buffer")]
    RecordTooLong { capacity: usize },
    #[error("read error: {0}")]
    Io(#[from] io::Error),
}

impl TokenizerError {
    pub(crate) fn new(source: impl Into<ErrorSource>, line: usize) -> Self {
        Self {
            source: source.into(),
            line,
        }
    }

    /// What went wrong.
    #[must_use]
    pub fn source_kind(&self) -> &ErrorSource {
        &self.source
    }

    /// 1-based line on which the failing record starts.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Whether the input violated the buffer bound, as opposed to failing to
    /// be read.
    #[must_use]
    pub fn is_overflow(&self) -> bool {
        matches!(
            self.source,
            ErrorSource::UnterminatedQuote { .. } | ErrorSource::RecordTooLong { .. }
        )
    }
}
