//! A streaming, memory-bounded tokenizer for delimited text.
//!
//! [`Tokenizer`] reads records (rows of fields) from any [`std::io::Read`]
//! while holding only a fixed-size ring buffer, whatever the size of the
//! input. It handles quoted fields with `""` escapes, delimiters longer than
//! one character, and LF, CR or CRLF line endings. Records are pulled one at a
//! time; the values of a record are valid until the next one is read.
//!
//! ```rust
//! use ringcsv::Tokenizer;
//!
//! let input = "x,\"y\"\"z\"\n\n,12345\n";
//! let mut tokenizer = Tokenizer::new(input.as_bytes());
//!
//! assert!(tokenizer.read_record().unwrap());
//! assert_eq!(tokenizer.value_of(0), Some("x"));
//! assert_eq!(tokenizer.value_of(1), Some("y\"z"));
//!
//! // The blank line is skipped.
//! assert!(tokenizer.read_record().unwrap());
//! assert_eq!(tokenizer.value_of(0), Some(""));
//! assert_eq!(tokenizer.value_of(1), Some("12345"));
//! assert!(!tokenizer.read_record().unwrap());
//! ```

#![allow(missing_docs)]

mod error;
mod field;
mod options;
mod records;
mod ring;
mod tokenizer;

#[cfg(test)]
mod tests;

pub use error::{ErrorSource, TokenizerError};
pub use field::Field;
pub use options::{DEFAULT_BUFFER_SIZE, MAX_LOAD_THRESHOLD, OptionsError, TokenizerOptions};
pub use records::Records;
pub use tokenizer::Tokenizer;
