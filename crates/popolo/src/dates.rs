//! Partial dates
//!
//! Popolo dates are strings of the shape `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
//! Only the shape is checked: `1990-02-30` is a well-formed partial date.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Pattern every partial date must match.
pub const PARTIAL_DATE_PATTERN: &str = r"^[0-9]{4}(-[0-9]{2}){0,2}$";

static PARTIAL_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(PARTIAL_DATE_PATTERN).expect("valid partial date regex"));

/// Whether a string has the shape of a partial date.
pub fn is_partial_date(value: &str) -> bool {
    PARTIAL_DATE_RE.is_match(value)
}

/// A date known to year, month or day precision.
///
/// Components are kept as written; no calendar check is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialDate {
    pub year: u16,
    pub month: Option<u8>,
    pub day: Option<u8>,
}

/// Returned when a string is not a partial date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialDateError(pub String);

impl fmt::Display for PartialDateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' does not match the pattern {}",
            self.0, PARTIAL_DATE_PATTERN
        )
    }
}

impl std::error::Error for PartialDateError {}

impl FromStr for PartialDate {
    type Err = PartialDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_partial_date(s) {
            return Err(PartialDateError(s.to_string()));
        }
        let mut parts = s.split('-');
        let err = || PartialDateError(s.to_string());
        let year = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        let month = parts.next().map(str::parse).transpose().map_err(|_| err())?;
        let day = parts.next().map(str::parse).transpose().map_err(|_| err())?;
        Ok(Self { year, month, day })
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)?;
        if let Some(month) = self.month {
            write!(f, "-{:02}", month)?;
            if let Some(day) = self.day {
                write!(f, "-{:02}", day)?;
            }
        }
        Ok(())
    }
}

impl PartialDate {
    /// Number of known components (1 to 3).
    pub fn precision(&self) -> usize {
        match (self.month, self.day) {
            (None, _) => 1,
            (Some(_), None) => 2,
            (Some(_), Some(_)) => 3,
        }
    }

    /// Compare two dates at the coarser of their precisions.
    ///
    /// `2000` and `2000-05` compare equal: the year-only date covers May.
    pub fn cmp_coarse(&self, other: &PartialDate) -> Ordering {
        let depth = self.precision().min(other.precision());
        let mut ordering = self.year.cmp(&other.year);
        if depth >= 2 {
            ordering = ordering.then(self.month.cmp(&other.month));
        }
        if depth >= 3 {
            ordering = ordering.then(self.day.cmp(&other.day));
        }
        ordering
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_shapes() {
        for ok in ["1990", "1990-02", "1990-02-30", "0000-99-99"] {
            assert!(is_partial_date(ok), "{} should match", ok);
        }
        for bad in ["90", "1990-2", "1990-02-1", "1990/02/01", "1990-02-01-01", "", " 1990"] {
            assert!(!is_partial_date(bad), "{} should not match", bad);
        }
    }

    #[test]
    fn test_parse_keeps_components() {
        let date: PartialDate = "1990-02-30".parse().unwrap();
        assert_eq!(date.year, 1990);
        assert_eq!(date.month, Some(2));
        assert_eq!(date.day, Some(30));
        assert_eq!(date.precision(), 3);
        assert_eq!(date.to_string(), "1990-02-30");

        let year: PartialDate = "2004".parse().unwrap();
        assert_eq!(year.precision(), 1);
        assert!("2004-1".parse::<PartialDate>().is_err());
    }

    #[test]
    fn test_cmp_coarse() {
        let year: PartialDate = "2000".parse().unwrap();
        let may: PartialDate = "2000-05".parse().unwrap();
        let may_first: PartialDate = "2000-05-01".parse().unwrap();
        let june: PartialDate = "2000-06".parse().unwrap();

        assert_eq!(year.cmp_coarse(&may), Ordering::Equal);
        assert_eq!(may.cmp_coarse(&year), Ordering::Equal);
        assert_eq!(may_first.cmp_coarse(&may), Ordering::Equal);
        assert_eq!(june.cmp_coarse(&may_first), Ordering::Greater);
        assert_eq!(may.cmp_coarse(&june), Ordering::Less);
    }
}
