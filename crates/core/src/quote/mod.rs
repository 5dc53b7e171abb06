//! Quote domain: line resolution, totals, numbering, status machine.
//!
//! Money is integer cents. Per-line VAT is rounded half-up to the cent and
//! the quote VAT is the sum of the rounded line amounts.

mod error;
mod totals;
mod types;

pub use error::QuoteError;
pub use totals::{QuoteTotals, line_amounts, resolve_line};
pub use types::{
    NewQuote, NewQuoteLine, ProductDefaults, Quote, QuoteLine, QuoteLineDraft, QuoteStatus,
    QuoteWithLines, generate_quote_number,
};
