//! Parsers for the scalar formats accepted on the wire.
//!
//! Clients send dates as `YYYY-MM-DD` strings and monetary amounts as decimal
//! strings, never floats. Everything here is pure; callers translate
//! [`InputError`] into their own 400 responses.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Currency assumed when a document does not name one.
pub const DEFAULT_CURRENCY: &str = "CAD";

/// A client-supplied field that failed to parse. The message is safe to echo
/// back verbatim in a response body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    Date(String),

    #[error("invalid amount '{0}': expected a decimal number")]
    Amount(String),

    #[error("amount must not be negative")]
    NegativeAmount,

    #[error("invalid currency '{0}': expected a 3-letter code")]
    Currency(String),
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, InputError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| InputError::Date(raw.to_string()))
}

/// Parses a decimal amount and rejects negative values. Amounts travel as
/// strings so no binary float ever touches a monetary value.
pub fn parse_amount(raw: &str) -> Result<Decimal, InputError> {
    let amount =
        Decimal::from_str(raw.trim()).map_err(|_| InputError::Amount(raw.to_string()))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(InputError::NegativeAmount);
    }
    Ok(amount)
}

/// Uppercases and checks a 3-letter currency code.
pub fn normalize_currency(raw: &str) -> Result<String, InputError> {
    let code = raw.trim();
    if code.len() == 3 && code.bytes().all(|b| b.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(InputError::Currency(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    #[rstest]
    #[case("2025-05-01", 2025, 5, 1)]
    #[case(" 2026-04-30 ", 2026, 4, 30)]
    fn accepts_iso_dates(#[case] raw: &str, #[case] y: i32, #[case] m: u32, #[case] d: u32) {
        assert_eq!(
            parse_date(raw).unwrap(),
            NaiveDate::from_ymd_opt(y, m, d).unwrap()
        );
    }

    #[rstest]
    #[case("01/05/2025")]
    #[case("2025-13-01")]
    #[case("yesterday")]
    #[case("")]
    fn rejects_malformed_dates(#[case] raw: &str) {
        assert_eq!(parse_date(raw).unwrap_err(), InputError::Date(raw.to_string()));
    }

    #[test]
    fn parses_decimal_amounts_exactly() {
        assert_eq!(parse_amount("1234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_amount(" 0 ").unwrap(), dec!(0));
        assert_eq!(parse_amount("-0.00").unwrap(), dec!(0));
    }

    #[test]
    fn rejects_negative_amounts() {
        assert_eq!(parse_amount("-5.00").unwrap_err(), InputError::NegativeAmount);
    }

    #[test]
    fn rejects_non_numeric_amounts() {
        assert_eq!(
            parse_amount("12,50").unwrap_err(),
            InputError::Amount("12,50".to_string())
        );
    }

    #[rstest]
    #[case("cad", "CAD")]
    #[case(" usd ", "USD")]
    #[case("EUR", "EUR")]
    fn normalizes_currency_codes(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_currency(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("CA")]
    #[case("CAD$")]
    #[case("12X")]
    fn rejects_bad_currency_codes(#[case] raw: &str) {
        assert!(matches!(
            normalize_currency(raw).unwrap_err(),
            InputError::Currency(_)
        ));
    }
}
