use thiserror::Error;

/// Default logical capacity of the ring buffer, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Upper bound of the derived load threshold.
pub const MAX_LOAD_THRESHOLD: usize = 8 * 1024;

/// Configuration options for the [`Tokenizer`](crate::Tokenizer).
///
/// # Examples
///
/// ```rust
/// use ringcsv::{Tokenizer, TokenizerOptions};
///
/// let options = TokenizerOptions {
///     delimiter: "::".into(),
///     trim_fields: false,
///     ..Default::default()
/// };
/// let mut tokenizer = Tokenizer::with_options(&b"p::q::r\n"[..], options).unwrap();
/// assert!(tokenizer.read_record().unwrap());
/// assert_eq!(tokenizer.value_of(2), Some("r"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TokenizerOptions {
    /// Field separator. May be longer than one character; it is matched
    /// byte-for-byte and may not contain `"`, CR or LF.
    ///
    /// # Default
    ///
    /// `","`
    pub delimiter: String,

    /// Primary size of the ring buffer in bytes.
    ///
    /// The physical buffer is `buffer_size` plus the load threshold, and its
    /// total size bounds the longest record (terminator included) that can be
    /// tokenized. Longer records fail instead of being truncated.
    ///
    /// # Default
    ///
    /// `32768`
    pub buffer_size: usize,

    /// Amount of free space that triggers a refill at the start of a record.
    ///
    /// `None` derives `min(buffer_size, 8192)`.
    ///
    /// # Default
    ///
    /// `None`
    pub load_threshold: Option<usize>,

    /// Whether to drop spaces before and after field content.
    ///
    /// Spaces inside a quoted span and spaces between two non-space
    /// characters are always kept.
    ///
    /// # Default
    ///
    /// `true`
    pub trim_fields: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            delimiter: ",".into(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            load_threshold: None,
            trim_fields: true,
        }
    }
}

impl TokenizerOptions {
    /// The load threshold actually used by the ring buffer.
    #[must_use]
    pub fn effective_load_threshold(&self) -> usize {
        self.load_threshold
            .unwrap_or_else(|| self.buffer_size.min(MAX_LOAD_THRESHOLD))
    }

    /// Total physical size of the ring buffer, `None` if it does not fit in
    /// a `usize`.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.buffer_size.checked_add(self.effective_load_threshold())
    }

    /// Checks that the options describe a usable tokenizer.
    ///
    /// # Errors
    ///
    /// Returns an [`OptionsError`] for an empty delimiter, a zero buffer size,
    /// a buffer whose total size overflows `usize`, or a delimiter containing
    /// a quote or a line break.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.delimiter.is_empty() {
            return Err(OptionsError::EmptyDelimiter);
        }
        if self.buffer_size == 0 {
            return Err(OptionsError::ZeroBufferSize);
        }
        if self.capacity().is_none() {
            return Err(OptionsError::BufferTooLarge {
                buffer_size: self.buffer_size,
                load_threshold: self.effective_load_threshold(),
            });
        }
        if self
            .delimiter
            .bytes()
            .any(|b| matches!(b, b'"' | b'\r' | b'\n'))
        {
            return Err(OptionsError::ReservedDelimiter(self.delimiter.clone()));
        }
        Ok(())
    }
}

/// Rejected [`TokenizerOptions`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("delimiter must not be empty")]
    EmptyDelimiter,
    #[error("buffer size must be greater than zero")]
    ZeroBufferSize,
    #[error("buffer size {buffer_size} plus load threshold {load_threshold} overflows")]
    BufferTooLarge {
        buffer_size: usize,
        load_threshold: usize,
    },
    #[error("delimiter {0:?} contains a quote or line break")]
    ReservedDelimiter(String),
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults_derive_threshold_from_buffer_size() {
        let options = TokenizerOptions::default();
        assert_eq!(options.effective_load_threshold(), 8192);
        assert_eq!(options.capacity(), Some(32768 + 8192));

        let small = TokenizerOptions {
            buffer_size: 100,
            ..Default::default()
        };
        assert_eq!(small.effective_load_threshold(), 100);
        assert_eq!(small.capacity(), Some(200));
    }

    #[rstest]
    #[case("", OptionsError::EmptyDelimiter)]
    #[case("\"", OptionsError::ReservedDelimiter("\"".into()))]
    #[case(";\n", OptionsError::ReservedDelimiter(";\n".into()))]
    fn rejects_bad_delimiters(#[case] delimiter: &str, #[case] expected: OptionsError) {
        let options = TokenizerOptions {
            delimiter: delimiter.into(),
            ..Default::default()
        };
        assert_eq!(options.validate(), Err(expected));
    }

    #[test]
    fn rejects_zero_buffer() {
        let options = TokenizerOptions {
            buffer_size: 0,
            ..Default::default()
        };
        assert_eq!(options.validate(), Err(OptionsError::ZeroBufferSize));
    }

    #[rstest]
    #[case::derived_threshold(usize::MAX, None, 8192)]
    #[case::explicit_threshold(16, Some(usize::MAX), usize::MAX)]
    #[case::one_past_max(usize::MAX - 7, Some(8), 8)]
    fn rejects_buffer_larger_than_address_space(
        #[case] buffer_size: usize,
        #[case] load_threshold: Option<usize>,
        #[case] effective: usize,
    ) {
        let options = TokenizerOptions {
            buffer_size,
            load_threshold,
            ..Default::default()
        };
        assert_eq!(options.capacity(), None);
        assert_eq!(
            options.validate(),
            Err(OptionsError::BufferTooLarge {
                buffer_size,
                load_threshold: effective,
            })
        );
    }

    #[test]
    fn accepts_buffer_at_the_limit() {
        let options = TokenizerOptions {
            buffer_size: usize::MAX - 8,
            load_threshold: Some(8),
            ..Default::default()
        };
        assert_eq!(options.capacity(), Some(usize::MAX));
        assert_eq!(options.validate(), Ok(()));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_partial_config() {
        let options: TokenizerOptions =
            serde_json::from_str(r#"{"delimiter": ";", "trim_fields": false}"#).unwrap();
        assert_eq!(options.delimiter, ";");
        assert!(!options.trim_fields);
        assert_eq!(options.buffer_size, DEFAULT_BUFFER_SIZE);
    }
}
