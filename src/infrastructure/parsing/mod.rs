//! Rendered-page parsing: the listing normalizer, the sold-date resolver,
//! and their shared pattern vocabulary.

pub mod date_parser;
pub mod listing_parser;
pub mod vocabulary;

pub use date_parser::parse_sold_date;
pub use listing_parser::{extract_listings, normalize_card};
