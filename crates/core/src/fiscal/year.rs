//! Fiscal year resolution.

use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Month in which a new fiscal year begins (May).
pub const FISCAL_CUTOVER_MONTH: u32 = 5;

/// Raised when the configured timezone name is not in the IANA database.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown timezone: {0}")]
pub struct UnknownTimezone(pub String);

/// Fiscal year of a calendar date: the year itself from May onward,
/// the previous year before May.
#[must_use]
pub fn fiscal_year_of(date: NaiveDate) -> i32 {
    if date.month() >= FISCAL_CUTOVER_MONTH {
        date.year()
    } else {
        date.year() - 1
    }
}

/// Maps instants to fiscal years through the organization's timezone.
///
/// Derived values are never stored as authoritative state; every resolution
/// goes through this type so the cutover rule lives in exactly one place.
#[derive(Debug, Clone, Copy)]
pub struct FiscalYearResolver {
    tz: Tz,
}

impl FiscalYearResolver {
    /// Creates a resolver for the given timezone.
    #[must_use]
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Creates a resolver from an IANA timezone name such as
    /// `America/Toronto`.
    pub fn from_name(name: &str) -> Result<Self, UnknownTimezone> {
        Tz::from_str(name)
            .map(Self::new)
            .map_err(|_| UnknownTimezone(name.to_string()))
    }

    /// Fiscal year containing the given instant, observed in the
    /// organization's timezone.
    #[must_use]
    pub fn resolve(&self, instant: DateTime<Utc>) -> i32 {
        fiscal_year_of(instant.with_timezone(&self.tz).date_naive())
    }

    /// Fiscal year containing the present moment.
    #[must_use]
    pub fn current(&self) -> i32 {
        self.resolve(Utc::now())
    }

    /// Today's calendar date in the organization's timezone. Used when a
    /// stored filename embeds the day a document was received.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    /// The timezone this resolver observes.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.tz
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(2025, 4, 30, 2024)]
    #[case(2025, 5, 1, 2025)]
    #[case(2025, 12, 31, 2025)]
    #[case(2026, 1, 1, 2025)]
    #[case(2026, 4, 30, 2025)]
    #[case(2026, 5, 1, 2026)]
    fn cutover_boundaries(
        #[case] year: i32,
        #[case] month: u32,
        #[case] day: u32,
        #[case] expected: i32,
    ) {
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        assert_eq!(fiscal_year_of(date), expected);
    }

    #[test]
    fn resolution_uses_local_date_not_utc() {
        // 2025-05-01 03:30 UTC is still April 30 in Toronto, so it belongs
        // to fiscal year 2024 even though the UTC month already flipped.
        let resolver = FiscalYearResolver::from_name("America/Toronto").unwrap();
        let instant = Utc.with_ymd_and_hms(2025, 5, 1, 3, 30, 0).unwrap();
        assert_eq!(resolver.resolve(instant), 2024);

        // Four hours later Toronto has crossed into May.
        let instant = Utc.with_ymd_and_hms(2025, 5, 1, 7, 30, 0).unwrap();
        assert_eq!(resolver.resolve(instant), 2025);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let err = FiscalYearResolver::from_name("Mars/Olympus").unwrap_err();
        assert_eq!(err, UnknownTimezone("Mars/Olympus".to_string()));
    }

    proptest! {
        #[test]
        fn every_date_maps_to_its_containing_year(
            year in 1990i32..2100,
            month in 1u32..=12,
            day in 1u32..=28,
        ) {
            let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
            let fy = fiscal_year_of(date);
            // The fiscal year starts on May 1 of `fy` and ends April 30 of
            // `fy + 1`; the date must fall inside that window.
            let start = NaiveDate::from_ymd_opt(fy, 5, 1).unwrap();
            let end = NaiveDate::from_ymd_opt(fy + 1, 4, 30).unwrap();
            prop_assert!(date >= start && date <= end);
        }
    }
}
