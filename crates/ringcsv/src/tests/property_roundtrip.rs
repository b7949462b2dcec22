use quickcheck::{QuickCheck, TestResult};

use super::utils::{ChunkedReader, quote_rows};
use crate::{Tokenizer, TokenizerOptions};

const DELIMITERS: [&str; 4] = [",", "::", ";", "¦"];

fn tests() -> u64 {
    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;
    tests
}

/// Property: quoting every field and tokenizing the result gives back the
/// original rows, whatever the read chunking and buffer size, as long as the
/// longest record fits in the buffer.
#[test]
fn quoted_rows_roundtrip_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(rows: Vec<Vec<String>>, chunk: u8, slack: u8, pick: u8, crlf: bool) -> TestResult {
        let rows: Vec<Vec<String>> = rows.into_iter().filter(|r| !r.is_empty()).collect();
        let delimiter = DELIMITERS[usize::from(pick) % DELIMITERS.len()];
        let input = quote_rows(&rows, delimiter, crlf);

        let longest = input.split_inclusive('\n').map(str::len).max().unwrap_or(0);
        // Embedded line breaks make the split above undercount a record, so
        // size the buffer for the whole input in that case.
        let buffer_size = if rows.iter().flatten().any(|f| f.contains(['\r', '\n'])) {
            input.len().max(1)
        } else {
            longest.max(1)
        } + usize::from(slack);

        let options = TokenizerOptions {
            delimiter: delimiter.into(),
            buffer_size,
            load_threshold: Some(usize::from(slack) % (buffer_size + 1)),
            ..Default::default()
        };
        let reader = ChunkedReader::new(input.as_bytes(), usize::from(chunk));
        let mut tokenizer = Tokenizer::with_options(reader, options).unwrap();

        for row in &rows {
            match tokenizer.read_record() {
                Ok(true) => {}
                other => return TestResult::error(format!("expected a record, got {other:?}")),
            }
            if tokenizer.field_count() != row.len() {
                return TestResult::failed();
            }
            for (i, expected) in row.iter().enumerate() {
                let field = tokenizer.field(i).unwrap();
                let (len, escapes) = (field.len(), field.escaped_quotes());
                let mut copied = Vec::new();
                tokenizer.copy_into(i, &mut copied).unwrap();
                let value = tokenizer.value_of(i).unwrap();
                if value != expected.as_str()
                    || value.len() != len - 2 - escapes
                    || copied != value.as_bytes()
                {
                    return TestResult::failed();
                }
            }
        }
        TestResult::from_bool(matches!(tokenizer.read_record(), Ok(false)))
    }

    QuickCheck::new()
        .tests(tests())
        .quickcheck(prop as fn(Vec<Vec<String>>, u8, u8, u8, bool) -> TestResult);
}
