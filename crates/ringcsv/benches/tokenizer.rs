//! Benchmark – `ringcsv::Tokenizer`
#![allow(missing_docs)]

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ringcsv::{Tokenizer, TokenizerOptions};

/// Produce a *deterministic* log of roughly `target_len` bytes mixing plain
/// rows, quoted rows with escapes, and blank lines.
fn make_payload(target_len: usize) -> String {
    let mut s = String::with_capacity(target_len + 64);
    let mut i = 0usize;
    while s.len() < target_len {
        let row = match i % 4 {
            0 => format!("/Bookreader/Viewer?bookID=RU_{i}&p=1,{}\r\n", i % 97),
            1 => format!("/Bookreader/Viewer?OrderId={i},{}\n", i % 13),
            2 => format!("\"say \"\"{i}\"\", a, b\",{}\n", i % 7),
            _ => "\n".to_owned(),
        };
        s.push_str(&row);
        i += 1;
    }
    s
}

/// Tokenizes `payload` and materializes every field, returning the number of
/// fields so the work cannot be optimised away.
fn run_tokenizer(payload: &[u8], options: &TokenizerOptions, materialize: bool) -> usize {
    let mut tokenizer = Tokenizer::with_options(payload, options.clone()).unwrap();
    let mut fields = 0usize;
    while tokenizer.read_record().unwrap() {
        for i in 0..tokenizer.field_count() {
            if materialize {
                black_box(tokenizer.value_of(i));
            } else {
                black_box(tokenizer.raw_length(i));
            }
        }
        fields += tokenizer.field_count();
    }
    fields
}

fn bench_tokenizer(c: &mut Criterion) {
    let payload = make_payload(1_000_000);

    let mut group = c.benchmark_group("tokenizer");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for &buffer_size in &[256usize, 4_096, 32_768] {
        let options = TokenizerOptions {
            buffer_size,
            ..Default::default()
        };
        for materialize in [false, true] {
            let name = if materialize { "values" } else { "raw_length" };
            let id = BenchmarkId::new(name, buffer_size);
            group.bench_with_input(id, &options, |b, options| {
                b.iter(|| {
                    let count = run_tokenizer(black_box(payload.as_bytes()), options, materialize);
                    black_box(count);
                });
            });
        }
    }
    group.finish();
}

fn criterion() -> Criterion {
    let mut c = Criterion::default();
    if cfg!(feature = "bench-fast") {
        c = c
            .warm_up_time(Duration::from_millis(10))
            .measurement_time(Duration::from_millis(100))
            .sample_size(10);
    } else {
        c = c
            .warm_up_time(Duration::from_secs(5))
            .measurement_time(Duration::from_secs(10));
    }
    c
}

criterion_group! { name = benches; config = criterion(); targets = bench_tokenizer }
criterion_main!(benches);
