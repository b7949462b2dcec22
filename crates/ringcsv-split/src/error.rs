use std::{io, path::PathBuf};

use ringcsv::{OptionsError, TokenizerError};
use thiserror::Error;

use crate::Summary;

/// Everything that makes a split run fail.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The input file name is not `<name>.csv` with a dot-free name.
    #[error("input must be named <name>.csv, got `{0}`")]
    InvalidInputName(String),

    /// The input file does not exist.
    #[error("input file `{}` not found", .0.display())]
    InputNotFound(PathBuf),

    /// At least one output file is already present; all of them are listed.
    #[error("output file(s) already exist, rename or remove them: {}", join_paths(.0))]
    OutputsExist(Vec<PathBuf>),

    /// The tokenizer options given on the command line are invalid.
    #[error("invalid tokenizer options: {0}")]
    Options(#[from] OptionsError),

    /// The input could not be tokenized.
    #[error(transparent)]
    Tokenize(#[from] TokenizerError),

    /// The trailer row's second field is not an unsigned integer.
    #[error("trailer at line {line} does not carry a total: `{value}`")]
    BadTrailer {
        /// Line the trailer starts on.
        line: usize,
        /// The offending text.
        value: String,
    },

    /// The input ended without a trailer row.
    #[error("input has no trailer row with the expected total")]
    MissingTrailer {
        /// Totals accounted before the input ended.
        summary: Summary,
    },

    /// The accumulated counts no longer fit in a `u64`.
    #[error("running total overflows at line {line}")]
    SumOverflow {
        /// Line the overflowing row starts on.
        line: usize,
    },

    /// The accounted total differs from the trailer total.
    #[error("checksum mismatch: computed {computed}, trailer says {expected}")]
    ChecksumMismatch {
        /// Sum of the orders and books totals.
        computed: u64,
        /// Total carried by the trailer.
        expected: u64,
        /// Totals of the run, per category.
        summary: Summary,
    },

    /// Reading the input or writing an output failed.
    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying failure.
        source: io::Error,
    },
}

impl SplitError {
    /// Totals of a run that was fully accounted but did not balance.
    #[must_use]
    pub fn summary(&self) -> Option<&Summary> {
        match self {
            Self::MissingTrailer { summary } | Self::ChecksumMismatch { summary, .. } => {
                Some(summary)
            }
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
