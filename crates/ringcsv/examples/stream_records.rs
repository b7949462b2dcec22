//! Streams a delimited file record by record and prints each field.
//!
//! Only the tokenizer's ring buffer is held in memory, so the input can be
//! arbitrarily large. Run with
//!
//! ```bash
//! cargo run -p ringcsv --example stream_records -- data.csv ';'
//! ```
//!
//! Without arguments a small built-in sample is tokenized.

use std::{env, fs::File, io::Read};

use ringcsv::{Tokenizer, TokenizerOptions};

const SAMPLE: &str = "\
/Bookreader/Viewer?bookID=RU_12&page=2,4\r\n\
\"/Bookreader/Viewer?OrderId=77&note=\"\"a,b\"\"\",9\r\n\
\r\n\
,13\r\n";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let source: Box<dyn Read> = match args.next() {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(SAMPLE.as_bytes()),
    };
    let options = TokenizerOptions {
        delimiter: args.next().unwrap_or_else(|| ",".into()),
        ..Default::default()
    };

    let mut tokenizer = Tokenizer::with_options(source, options)?;
    while tokenizer.read_record()? {
        let line = tokenizer.line();
        print!("{line:>6}:");
        for i in 0..tokenizer.field_count() {
            // Every index below field_count() has a value.
            let value = tokenizer.value_of(i).unwrap_or_default();
            print!(" [{value}]");
        }
        println!();
    }
    println!("{} records", tokenizer.records_read());
    Ok(())
}
