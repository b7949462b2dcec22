//! Splits a viewer access log into per-order and per-book totals.
//!
//! The log is a delimited file of `<locator>,<count>` rows closed by a
//! trailer row whose first field is empty and whose second field is the
//! expected grand total:
//!
//! ```text
//! /Bookreader/Viewer?OrderId=7&page=1,5
//! /Bookreader/Viewer?bookID=RU_12&page=2,10
//! ,15
//! ```
//!
//! [`run`] writes `<name>-orders.csv` and `<name>-books.csv` next to
//! `<name>.csv` and fails unless the two sums add up to the trailer total.
//! The accounting itself lives in [`Splitter`], which works on any reader.

use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter},
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use tracing::info;

mod cli;
mod error;
pub mod locator;
mod split;

pub use cli::Cli;
pub use error::SplitError;
pub use split::{BOOKS_HEADER, ORDERS_HEADER, Splitter, Summary, Tally};

static INPUT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<stem>[^.]+)\.(?:csv|CSV)$").expect("input name pattern is valid")
});

/// Locations of the two files a run writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    /// `<name>-orders.csv`
    pub orders: PathBuf,
    /// `<name>-books.csv`
    pub books: PathBuf,
}

impl Outputs {
    /// Derives the output paths from an input named `<name>.csv`.
    ///
    /// # Errors
    ///
    /// [`SplitError::InvalidInputName`] if the file name does not have that
    /// shape.
    pub fn for_input(input: &Path) -> Result<Self, SplitError> {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let caps = INPUT_NAME
            .captures(&name)
            .ok_or_else(|| SplitError::InvalidInputName(input.display().to_string()))?;
        let stem = &caps["stem"];
        let dir = input.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self {
            orders: dir.join(format!("{stem}-orders.csv")),
            books: dir.join(format!("{stem}-books.csv")),
        })
    }

    /// Fails listing every output that is already present.
    ///
    /// # Errors
    ///
    /// [`SplitError::OutputsExist`] if at least one output exists.
    pub fn ensure_absent(&self) -> Result<(), SplitError> {
        let existing: Vec<PathBuf> = [&self.orders, &self.books]
            .into_iter()
            .filter(|path| path.exists())
            .cloned()
            .collect();
        if existing.is_empty() {
            Ok(())
        } else {
            Err(SplitError::OutputsExist(existing))
        }
    }

    fn write(&self, tally: &Tally) -> Result<(), SplitError> {
        let orders = create_new(&self.orders)?;
        tally
            .write_orders(orders)
            .map_err(|e| SplitError::io(&self.orders, e))?;
        let books = create_new(&self.books)?;
        tally
            .write_books(books)
            .map_err(|e| SplitError::io(&self.books, e))
    }
}

fn create_new(path: &Path) -> Result<BufWriter<File>, SplitError> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(BufWriter::new(file)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            Err(SplitError::OutputsExist(vec![path.to_owned()]))
        }
        Err(e) => Err(SplitError::io(path, e)),
    }
}

/// Splits the file named by `cli` and checks its totals.
///
/// Output files are checked before the input is read and created only
/// once the whole input has been accounted, never overwriting a file.
///
/// # Errors
///
/// Any [`SplitError`]; a checksum mismatch is reported after the outputs
/// are written.
pub fn run(cli: &Cli) -> Result<Summary, SplitError> {
    let outputs = Outputs::for_input(&cli.input)?;
    outputs.ensure_absent()?;
    let splitter = Splitter::new(cli.tokenizer_options())?;

    let input = File::open(&cli.input).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SplitError::InputNotFound(cli.input.clone()),
        _ => SplitError::io(&cli.input, e),
    })?;
    info!(input = %cli.input.display(), "splitting");
    let tally = splitter.tally(input)?;
    outputs.write(&tally)?;

    let summary = tally.summary();
    info!(
        orders = summary.orders,
        books = summary.books,
        trailer = ?summary.trailer,
        rows = summary.rows,
        skipped = summary.skipped,
        "accounted"
    );
    summary.verify()?;
    Ok(summary)
}
