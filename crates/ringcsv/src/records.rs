use core::iter::FusedIterator;
use std::io::Read;

use crate::{Tokenizer, TokenizerError};

/// Iterator over owned records, created by [`Tokenizer::records`].
///
/// Each item copies the values of one record out of the tokenizer. Iteration
/// stops after the first error.
#[derive(Debug)]
pub struct Records<R> {
    tokenizer: Tokenizer<R>,
    done: bool,
}

impl<R: Read> Records<R> {
    pub(crate) fn new(tokenizer: Tokenizer<R>) -> Self {
        Self {
            tokenizer,
            done: false,
        }
    }

    /// Returns the tokenizer, positioned after the last record yielded.
    pub fn into_tokenizer(self) -> Tokenizer<R> {
        self.tokenizer
    }

    fn current(&mut self) -> Vec<String> {
        let count = self.tokenizer.field_count();
        let mut values = Vec::with_capacity(count);
        for i in 0..count {
            values.push(self.tokenizer.value_of(i).unwrap_or_default().to_owned());
        }
        values
    }
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<Vec<String>, TokenizerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.tokenizer.read_record() {
            Ok(true) => Some(Ok(self.current())),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> FusedIterator for Records<R> {}
