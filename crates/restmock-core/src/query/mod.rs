//! GET-time query mini-language: filtering and sorting.
//!
//! - [`filter`]: MongoDB-style filter documents (equality plus six
//!   comparison operators), AND-combined across fields
//! - [`sort`]: field→direction maps applied as stable per-key resorts

pub mod filter;
pub mod sort;

pub use filter::{evaluate, FilterError, FilterOp};
pub use sort::{apply_sort, parse_sort, SortError, SortKey};
