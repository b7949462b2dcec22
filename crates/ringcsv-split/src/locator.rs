//! Classification of viewer locators such as
//! `/Bookreader/Viewer?bookID=RU_12&page=3`.

use std::sync::LazyLock;

use regex::Regex;

/// Path every accounted row's first field starts with.
pub const VIEWER_PREFIX: &str = "/Bookreader/Viewer?";

static BOOK_ID: LazyLock<Regex> = LazyLock::new(|| {
    // `\w+` is greedy, so the split happens at the last underscore.
    Regex::new(r"^(?P<fund>\w+)_(?P<pin>[0-9]+)$").expect("book id pattern is valid")
});

/// Where a row's count is accounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A title with authors' rights, keyed by fund and pin.
    Book {
        /// Collection code, `RU` in `bookID=RU_12`.
        fund: String,
        /// Numeric title id, `12` in `bookID=RU_12`.
        pin: String,
    },
    /// A plain order.
    Order {
        /// Digits of the `OrderId` parameter.
        id: String,
    },
}

/// Classifies `locator`, or returns `None` when it is not a viewer locator
/// or names neither a book nor an order.
///
/// A well-formed `bookID` takes precedence over `OrderId`, wherever the two
/// appear in the query.
#[must_use]
pub fn route(locator: &str) -> Option<Route> {
    let query = locator.strip_prefix(VIEWER_PREFIX)?;
    let mut order = None;
    for (key, value) in query.split('&').filter_map(|pair| pair.split_once('=')) {
        match key {
            "bookID" => {
                if let Some(caps) = BOOK_ID.captures(value) {
                    return Some(Route::Book {
                        fund: caps["fund"].to_owned(),
                        pin: caps["pin"].to_owned(),
                    });
                }
            }
            "OrderId" if order.is_none() && is_digits(value) => order = Some(value),
            _ => {}
        }
    }
    order.map(|id| Route::Order { id: id.to_owned() })
}

/// Parses a count column: ASCII digits only, fitting `u64`.
#[must_use]
pub fn parse_count(text: &str) -> Option<u64> {
    if is_digits(text) {
        text.parse().ok()
    } else {
        None
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
