//! Input validation for client-supplied scalar fields.

mod input;

pub use input::{normalize_currency, parse_amount, parse_date, InputError, DEFAULT_CURRENCY};
