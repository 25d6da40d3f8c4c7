//! Exact two-decimal quantities.
//!
//! Credit values (and numeric scores) are stored as integer hundredths.
//! Summing hundreds of `0.5`-credit labs must give the same total in any
//! order, which binary floating point does not guarantee.

use crate::locale::{clean_cell, LOCALE};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

static RE_FIXED2: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,6})(?:\.(\d{1,2}))?$").unwrap());

/// Parse a plain non-negative decimal with at most two fractional digits
/// into hundredths. Full-width digits are accepted.
///
/// `"3"` → 300, `"2.5"` → 250, `"０.５"` → 50; `"三"`, `"3*"`, `"-1"`,
/// `"1.234"` → `None`.
pub fn parse_hundredths(input: &str) -> Option<u64> {
    let cleaned = clean_cell(input);
    let caps = RE_FIXED2.captures(&cleaned)?;
    let whole: u64 = caps[1].parse().ok()?;
    let frac = match caps.get(2) {
        None => 0,
        Some(m) if m.as_str().len() == 1 => m.as_str().parse::<u64>().ok()? * 10,
        Some(m) => m.as_str().parse::<u64>().ok()?,
    };
    Some(whole * 100 + frac)
}

/// A non-negative credit amount with two exact decimal places.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Credits(u64);

/// The credit cell could not be read as a number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a credit value: {0:?}")]
pub struct ParseCreditsError(pub String);

impl Credits {
    pub const ZERO: Credits = Credits(0);

    pub const fn from_hundredths(hundredths: u64) -> Self {
        Credits(hundredths)
    }

    /// Whole credits. Saturates at `u64::MAX` hundredths.
    pub const fn whole(credits: u64) -> Self {
        Credits(credits.saturating_mul(100))
    }

    pub const fn hundredths(self) -> u64 {
        self.0
    }

    /// Parse a transcript credit cell.
    ///
    /// Accepts what [`parse_hundredths`] accepts, optionally followed by a
    /// unit word (`3學分`, `2 credits`). Anything else is rejected rather than
    /// read as zero.
    pub fn parse_cell(input: &str) -> Result<Self, ParseCreditsError> {
        let cleaned = clean_cell(input);
        let lower = cleaned.to_lowercase();
        let number = LOCALE
            .credit_units
            .iter()
            .find_map(|unit| lower.strip_suffix(unit))
            .unwrap_or(&lower)
            .trim();
        parse_hundredths(number)
            .map(Credits)
            .ok_or_else(|| ParseCreditsError(input.to_string()))
    }

    /// Absolute difference, for "still needed" / "exceeded by" reporting.
    pub const fn abs_diff(self, other: Credits) -> Credits {
        Credits(self.0.abs_diff(other.0))
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Credits {
    type Err = ParseCreditsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Credits::parse_cell(s)
    }
}

impl TryFrom<String> for Credits {
    type Error = ParseCreditsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Credits> for String {
    fn from(value: Credits) -> Self {
        value.to_string()
    }
}

impl Add for Credits {
    type Output = Credits;

    fn add(self, rhs: Credits) -> Credits {
        Credits(self.0 + rhs.0)
    }
}

impl Sum for Credits {
    fn sum<I: Iterator<Item = Credits>>(iter: I) -> Credits {
        iter.fold(Credits::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Credits> for Credits {
    fn sum<I: Iterator<Item = &'a Credits>>(iter: I) -> Credits {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_and_decimal_cells() {
        assert_eq!(Credits::parse_cell("3").unwrap(), Credits::whole(3));
        assert_eq!(Credits::parse_cell("2.5").unwrap().hundredths(), 250);
        assert_eq!(Credits::parse_cell(" 0.25 ").unwrap().hundredths(), 25);
        assert_eq!(Credits::parse_cell("３").unwrap(), Credits::whole(3));
        assert_eq!(Credits::parse_cell("3學分").unwrap(), Credits::whole(3));
        assert_eq!(Credits::parse_cell("2 Credits").unwrap(), Credits::whole(2));
    }

    #[test]
    fn rejects_annotations_instead_of_zeroing() {
        for bad in ["三學分", "3*", "N/A", "", "-1", "1.234", "3.", "學分"] {
            assert!(Credits::parse_cell(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn display_has_two_decimals() {
        assert_eq!(Credits::whole(3).to_string(), "3.00");
        assert_eq!(Credits::from_hundredths(50).to_string(), "0.50");
        assert_eq!(Credits::from_hundredths(12_805).to_string(), "128.05");
    }

    #[test]
    fn sum_is_exact() {
        let tenths = std::iter::repeat_n(Credits::from_hundredths(10), 1000);
        assert_eq!(tenths.sum::<Credits>(), Credits::whole(100));
    }

    #[test]
    fn whole_saturates_instead_of_overflowing() {
        assert_eq!(Credits::whole(u64::MAX).hundredths(), u64::MAX);
        assert_eq!(Credits::whole(u64::MAX / 100 + 1).hundredths(), u64::MAX);
    }

    #[test]
    fn abs_diff_both_directions() {
        let a = Credits::whole(128);
        let b = Credits::from_hundredths(12_050);
        assert_eq!(a.abs_diff(b).to_string(), "7.50");
        assert_eq!(b.abs_diff(a).to_string(), "7.50");
    }

    #[test]
    fn serde_uses_decimal_string() {
        let json = serde_json::to_string(&Credits::from_hundredths(350)).unwrap();
        assert_eq!(json, "\"3.50\"");
        let back: Credits = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hundredths(), 350);
    }
}
