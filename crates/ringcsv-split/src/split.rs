//! Accounting over a tokenized access log.
//!
//! Every data row is `<viewer locator>,<count>`. Counts are summed per order
//! or per book until the trailer row (empty first field), whose second field
//! carries the total the two sums must add up to.

use std::{
    collections::HashMap,
    fmt,
    io::{self, Read, Write},
};

use ringcsv::{Tokenizer, TokenizerOptions};
use tracing::{debug, info};

use crate::{
    SplitError,
    locator::{self, Route},
};

/// Header line of the orders output.
pub const ORDERS_HEADER: &str = "ORDERID,NUM";
/// Header line of the books output.
pub const BOOKS_HEADER: &str = "FUND,PIN,NUM";

/// Reads access logs with a fixed set of tokenizer options.
#[derive(Debug, Clone, Default)]
pub struct Splitter {
    options: TokenizerOptions,
}

impl Splitter {
    /// Creates a splitter that tokenizes with `options`.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::Options`] if the options are invalid.
    pub fn new(options: TokenizerOptions) -> Result<Self, SplitError> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Accumulates the counts of `input` up to and including its trailer.
    ///
    /// Rows that are neither a book nor an order, or whose count is not an
    /// unsigned integer, are skipped. Rows after the trailer are not read.
    ///
    /// # Errors
    ///
    /// Fails if the input cannot be tokenized, if the trailer total is not a
    /// number, or if the running total overflows.
    pub fn tally<R: Read>(&self, input: R) -> Result<Tally, SplitError> {
        let mut tokenizer = Tokenizer::with_options(input, self.options.clone())?;
        let mut tally = Tally::default();

        while tokenizer.read_record()? {
            let line = tokenizer.line();
            let locator = tokenizer.value_of(0).unwrap_or_default().to_owned();
            let count = tokenizer.value_of(1);

            if locator.is_empty() {
                let value = count.unwrap_or_default();
                let total = locator::parse_count(value).ok_or_else(|| SplitError::BadTrailer {
                    line,
                    value: value.to_owned(),
                })?;
                info!(line, total, "found trailer");
                tally.trailer = Some(total);
                break;
            }

            let (Some(route), Some(count)) = (
                locator::route(&locator),
                count.and_then(locator::parse_count),
            ) else {
                debug!(line, %locator, "skipping row");
                tally.skipped += 1;
                continue;
            };
            tally.add(route, count, line)?;
        }

        if tally.trailer.is_none() {
            debug!(rows = tally.rows, "input ended without a trailer");
        }
        Ok(tally)
    }
}

/// Per-key sums collected by [`Splitter::tally`].
#[derive(Debug, Default)]
pub struct Tally {
    orders: HashMap<String, u64>,
    books: HashMap<(String, String), u64>,
    orders_sum: u64,
    books_sum: u64,
    trailer: Option<u64>,
    rows: u64,
    skipped: u64,
}

impl Tally {
    fn add(&mut self, route: Route, count: u64, line: usize) -> Result<(), SplitError> {
        // Both sums are bounded by their total, so checking it covers them.
        self.orders_sum
            .checked_add(self.books_sum)
            .and_then(|total| total.checked_add(count))
            .ok_or(SplitError::SumOverflow { line })?;
        match route {
            Route::Order { id } => {
                *self.orders.entry(id).or_default() += count;
                self.orders_sum += count;
            }
            Route::Book { fund, pin } => {
                *self.books.entry((fund, pin)).or_default() += count;
                self.books_sum += count;
            }
        }
        self.rows += 1;
        Ok(())
    }

    /// Writes the orders header and one `id,sum` line per order.
    ///
    /// # Errors
    ///
    /// Propagates write failures of `out`.
    pub fn write_orders<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{ORDERS_HEADER}")?;
        for (id, sum) in ranked(&self.orders) {
            writeln!(out, "{id},{sum}")?;
        }
        out.flush()
    }

    /// Writes the books header and one `fund,pin,sum` line per book.
    ///
    /// # Errors
    ///
    /// Propagates write failures of `out`.
    pub fn write_books<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{BOOKS_HEADER}")?;
        for ((fund, pin), sum) in ranked(&self.books) {
            writeln!(out, "{fund},{pin},{sum}")?;
        }
        out.flush()
    }

    /// Totals of the run.
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            orders: self.orders_sum,
            books: self.books_sum,
            trailer: self.trailer,
            rows: self.rows,
            skipped: self.skipped,
        }
    }
}

/// Entries by descending sum, ties by ascending key.
fn ranked<K: Ord>(sums: &HashMap<K, u64>) -> Vec<(&K, u64)> {
    let mut entries: Vec<_> = sums.iter().map(|(k, &v)| (k, v)).collect();
    entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Sum over all orders.
    pub orders: u64,
    /// Sum over all books.
    pub books: u64,
    /// Total carried by the trailer, if one was read.
    pub trailer: Option<u64>,
    /// Number of accounted rows.
    pub rows: u64,
    /// Number of rows that matched neither route.
    pub skipped: u64,
}

impl Summary {
    /// Sum of both categories.
    #[must_use]
    pub fn computed(&self) -> u64 {
        // `Tally::add` keeps this sum within range.
        self.orders.saturating_add(self.books)
    }

    /// Checks the computed total against the trailer.
    ///
    /// # Errors
    ///
    /// [`SplitError::MissingTrailer`] without a trailer and
    /// [`SplitError::ChecksumMismatch`] when the totals differ.
    pub fn verify(&self) -> Result<(), SplitError> {
        let expected = self
            .trailer
            .ok_or(SplitError::MissingTrailer { summary: *self })?;
        let computed = self.computed();
        if computed == expected {
            Ok(())
        } else {
            Err(SplitError::ChecksumMismatch {
                computed,
                expected,
                summary: *self,
            })
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "orders sum:     {}", self.orders)?;
        writeln!(f, "books sum:      {}", self.books)?;
        writeln!(f, "computed total: {}", self.computed())?;
        match self.trailer {
            Some(total) => write!(f, "trailer total:  {total}"),
            None => write!(f, "trailer total:  missing"),
        }
    }
}
