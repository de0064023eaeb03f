//! Fiscal calendar.
//!
//! The organization's fiscal year runs May 1 through April 30 and is labeled
//! by its starting calendar year. Resolution always happens in the
//! organization's timezone, never in UTC, so a document recorded late in the
//! evening of April 30 local time stays in the closing year.

mod year;

pub use year::{fiscal_year_of, FiscalYearResolver, UnknownTimezone, FISCAL_CUTOVER_MONTH};
