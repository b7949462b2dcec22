#![no_main]
use std::cell::RefCell;
use std::io::{self, Read};

use arbitrary::Arbitrary;
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use ringcsv::{Tokenizer, TokenizerOptions};

const HEADER: usize = 5; // 1 flag + 4-byte seed

thread_local! {
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

static DELIMITERS: &[&str] = &[",", ";", "\t", "::", "¦"];

/// Bytes that drive the scanner's state changes.
static TOKENS: &[&[u8]] = &[
    b",", b";", b"\t", b":", b"::", b"\"", b"\"\"", b" ", b"  ", b"\r", b"\n", b"\r\n",
    "¦".as_bytes(), "é".as_bytes(),
];

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size < HEADER || max_size < HEADER || seed.is_multiple_of(10) {
        if max_size < HEADER {
            return fuzzer_mutate(data, size, max_size);
        }
        data[0] = with_rng(|rng| rng.next_u32() as u8);
        data[1..5].copy_from_slice(&with_rng(|rng| rng.next_u32().to_le_bytes()));

        let mut prefix = HEADER;
        let target = size.clamp(HEADER + 1, max_size);
        while prefix < target {
            let written = append_record(&mut data[prefix..max_size]);
            if written == 0 {
                break;
            }
            prefix += written;
        }
        prefix
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

/// Appends one generated record, never writing past `buf`. Returns the
/// number of bytes written.
fn append_record(buf: &mut [u8]) -> usize {
    let record = loop {
        let bytes: Vec<u8> = with_rng(|rng| {
            let n = rng.random_range(4..64);
            (0..n).map(|_| rng.random::<u8>()).collect()
        });
        if let Ok(record) = ArbitraryRecord::arbitrary(&mut arbitrary::Unstructured::new(&bytes)) {
            break record;
        }
    };
    let len = record.0.len().min(buf.len());
    buf[..len].copy_from_slice(&record.0[..len]);
    len
}

#[derive(Debug)]
struct ArbitraryRecord(Vec<u8>);

impl<'a> Arbitrary<'a> for ArbitraryRecord {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let mut out = Vec::new();
        let pieces = u.int_in_range(1..=12)?;
        for _ in 0..pieces {
            match u.choose_index(4)? {
                0 | 1 => out.extend_from_slice(TOKENS[u.choose_index(TOKENS.len())?]),
                2 => {
                    let text: String = u.arbitrary()?;
                    out.extend_from_slice(text.as_bytes());
                }
                _ => {
                    let text: String = u.arbitrary()?;
                    out.push(b'"');
                    out.extend_from_slice(text.replace('"', "\"\"").as_bytes());
                    out.push(b'"');
                }
            }
        }
        out.extend_from_slice(if u.arbitrary()? { b"\r\n" } else { b"\n" });
        Ok(ArbitraryRecord(out))
    }
}

/// Hands out the input in chunks whose sizes follow a fixed seed.
struct SeededReader<'a> {
    data: &'a [u8],
    seed: u64,
}

impl Read for SeededReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.seed = self
            .seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        let n = ((self.seed >> 33) as usize % 7 + 1).min(buf.len());
        self.data.read(&mut buf[..n])
    }
}

fn collect(
    data: &[u8],
    seed: u64,
    options: TokenizerOptions,
) -> Option<Vec<Vec<String>>> {
    let reader = SeededReader { data, seed };
    let mut tokenizer = Tokenizer::with_options(reader, options).ok()?;
    let mut records = Vec::new();
    loop {
        match tokenizer.read_record() {
            Ok(true) => {}
            Ok(false) => return Some(records),
            Err(err) => {
                assert_eq!(tokenizer.field_count(), 0);
                let again = tokenizer.read_record();
                assert!(again.is_err(), "errors are permanent: {err}");
                return None;
            }
        }
        let mut record = Vec::with_capacity(tokenizer.field_count());
        for i in 0..tokenizer.field_count() {
            let mut copied = Vec::new();
            tokenizer.copy_into(i, &mut copied).unwrap();
            let value = tokenizer.value_of(i).unwrap().to_owned();
            assert_eq!(String::from_utf8_lossy(&copied), value);
            assert!(tokenizer.raw_length(i) >= copied.len());
            record.push(value);
        }
        records.push(record);
    }
}

fn tokenize(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }

    let flags = data[0];
    let split_seed = u64::from(u32::from_le_bytes([data[1], data[2], data[3], data[4]]));
    let data = &data[HEADER..];

    let delimiter = DELIMITERS[usize::from(flags & 7) % DELIMITERS.len()];
    let trim_fields = flags & 8 != 0;
    let buffer_size = 4 + usize::from(flags >> 4) * 3;

    let small = TokenizerOptions {
        delimiter: delimiter.to_owned(),
        buffer_size,
        load_threshold: Some(buffer_size / 2 + 1),
        trim_fields,
    };
    let large = TokenizerOptions {
        buffer_size: data.len() + 16,
        load_threshold: None,
        ..small.clone()
    };

    // Errors only come from records that overflow the ring, so a ring that
    // holds the whole input never fails, and agrees with any smaller ring
    // that succeeds.
    let from_large = collect(data, split_seed, large).expect("whole input fits the ring");
    if let Some(records) = collect(data, split_seed, small) {
        assert_eq!(records, from_large);
    }
}

fuzz_target!(|data: &[u8]| tokenize(data));
