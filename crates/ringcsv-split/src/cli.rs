use std::path::PathBuf;

use clap::Parser;
use ringcsv::{DEFAULT_BUFFER_SIZE, TokenizerOptions};

/// Command-line configuration of `ringcsv-split`.
#[derive(Debug, Clone, Parser)]
#[command(name = "ringcsv-split", version)]
#[command(about = "Splits a viewer access log into order and book totals")]
#[command(
    long_about = "Reads <name>.csv, sums the count column per order and per book, writes \
                  <name>-orders.csv and <name>-books.csv next to the input and checks the \
                  sums against the trailer row."
)]
pub struct Cli {
    /// Access log to split, named `<name>.csv`
    pub input: PathBuf,

    /// Field delimiter, one or more characters
    #[arg(short, long, default_value = ",")]
    pub delimiter: String,

    /// Bytes of input held in memory; bounds the longest record
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    pub buffer_size: usize,

    /// Keep spaces around field values
    #[arg(long)]
    pub no_trim: bool,

    /// Log skipped rows and other details to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Tokenizer options selected by the flags.
    #[must_use]
    pub fn tokenizer_options(&self) -> TokenizerOptions {
        TokenizerOptions {
            delimiter: self.delimiter.clone(),
            buffer_size: self.buffer_size,
            load_threshold: None,
            trim_fields: !self.no_trim,
        }
    }
}
