//! Amount type for handling Rupiah values.
//!
//! Cells in the sheet may hold plain numbers (`150000`), numbers with thousands separators
//! (`150,000` or, Indonesian style, `150.000`) or a currency prefix (`Rp 150,000`). `Amount`
//! parses all of these and always writes plain numbers back to the sheet.
//!
//! Magnitudes above `i64::MAX` are rejected so that sums over a sheet cannot overflow.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// Represents a Rupiah amount.
///
/// ```
/// # use reefficiency::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("Rp 1,500,000").unwrap();
/// assert_eq!(amount.to_string(), "Rp 1,500,000");
/// assert_eq!(amount.plain(), "1500000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// The value as a lossy `f64`, used for percentages.
    pub fn as_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// The number as it should be written into a sheet cell, e.g. `150000`.
    pub fn plain(&self) -> String {
        self.0.normalize().to_string()
    }

    /// The sum, or `None` if it does not fit.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Returns true if the magnitude is at most `i64::MAX`.
    pub fn is_in_range(&self) -> bool {
        self.0.abs() <= Decimal::from(i64::MAX)
    }

    /// Returns true if the amount has no fractional part.
    pub fn is_whole(&self) -> bool {
        self.0.fract().is_zero()
    }

    /// Divides the amount by a whole number, e.g. for monthly averages.
    pub fn div_whole(&self, n: u32) -> Amount {
        if n == 0 {
            return Amount::ZERO;
        }
        Amount(self.0 / Decimal::from(n))
    }

    /// Parses a user-typed amount. Both `,` and `.` are treated as thousands separators, so
    /// `1.500.000` and `1,500,000` both mean one and a half million. The result must be a whole
    /// number.
    pub fn parse_input(s: &str) -> Result<Amount, AmountError> {
        let trimmed = strip_currency(s.trim());
        let digits: String = trimmed.chars().filter(|c| *c != ',' && *c != '.').collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(AmountError(format!("'{s}' is not a whole number")));
        }
        let value = Decimal::from_str(&digits).map_err(|e| AmountError(e.to_string()))?;
        check_range(s, value)
    }
}

fn check_range(s: &str, value: Decimal) -> Result<Amount, AmountError> {
    if !Amount(value).is_in_range() {
        return Err(AmountError(format!("'{s}' is too large to be an amount")));
    }
    Ok(Amount(value))
}

/// True for `150.000` and `1.500.000`: dots grouping digits in threes.
fn dotted_thousands(s: &str) -> bool {
    let mut groups = s.split('.');
    let lead_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.chars().all(|c| c.is_ascii_digit()));
    let mut rest = 0;
    for group in groups {
        if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        rest += 1;
    }
    lead_ok && rest > 0
}

fn strip_currency(s: &str) -> &str {
    s.strip_prefix("Rp")
        .or_else(|| s.strip_prefix("rp"))
        .or_else(|| s.strip_prefix("RP"))
        .map(|rest| rest.trim_start_matches('.').trim_start())
        .unwrap_or(s)
}

/// An error that can occur when parsing strings into `Amount` values.
#[derive(Clone, PartialEq, Eq)]
pub struct AmountError(String);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses a cell value. Blank cells are zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::ZERO);
        }

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };

        let mut cleaned: String = strip_currency(unsigned)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if dotted_thousands(&cleaned) {
            cleaned.retain(|c| c != '.');
        } else {
            cleaned.retain(|c| c != ',');
        }

        let value = Decimal::from_str(&cleaned)
            .map_err(|e| AmountError(format!("Unable to parse '{s}' as an amount: {e}")))?;
        check_range(s, if negative { -value } else { value })
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.abs();
        let num = abs.to_f64().unwrap_or_default();
        if abs.fract().is_zero() {
            write!(f, "{sign}Rp {}", format_num::format_num!(",.0f", num))
        } else {
            write!(f, "{sign}Rp {}", format_num::format_num!(",.2f", num))
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.plain())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount(Decimal::from(value))
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(amt("50000").value(), Decimal::from(50000));
    }

    #[test]
    fn test_parse_with_commas() {
        assert_eq!(amt("25,000").value(), Decimal::from(25000));
        assert_eq!(amt("1,234,567.89").value(), Decimal::from_str("1234567.89").unwrap());
    }

    #[test]
    fn test_parse_dotted_thousands() {
        assert_eq!(amt("150.000").value(), Decimal::from(150_000));
        assert_eq!(amt("1.500.000").value(), Decimal::from(1_500_000));
        assert_eq!(amt("Rp 2.750.000").value(), Decimal::from(2_750_000));
        assert_eq!(amt("-1.000").value(), Decimal::from(-1000));
        // A single fractional group of another width is still a decimal point.
        assert_eq!(amt("12.5").value(), Decimal::from_str("12.5").unwrap());
        assert_eq!(amt("1234.500").value(), Decimal::from_str("1234.5").unwrap());
    }

    #[test]
    fn test_out_of_range() {
        assert!(Amount::from_str("79228162514264337593543950335").is_err());
        assert!(Amount::parse_input("79228162514264337593543950335").is_err());
        assert!(Amount::parse_input(&i64::MAX.to_string()).is_ok());
        let big = Amount::new(Decimal::MAX);
        assert_eq!(big + Amount::from(1), big);
        assert_eq!(big.checked_add(Amount::from(1)), None);
        let mut total = big;
        total += big;
        assert_eq!(total, big);
    }

    #[test]
    fn test_parse_with_currency() {
        assert_eq!(amt("Rp 150,000").value(), Decimal::from(150000));
        assert_eq!(amt("Rp150000").value(), Decimal::from(150000));
        assert_eq!(amt("-Rp 5,000").value(), Decimal::from(-5000));
    }

    #[test]
    fn test_parse_blank_is_zero() {
        assert!(amt("").is_zero());
        assert!(amt("   ").is_zero());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("bad").is_err());
        assert!(Amount::from_str("12abc").is_err());
    }

    #[test]
    fn test_parse_input() {
        let a = Amount::parse_input("1.500.000").unwrap();
        assert_eq!(a.value(), Decimal::from(1_500_000));
        let b = Amount::parse_input("2,000,000").unwrap();
        assert_eq!(b.value(), Decimal::from(2_000_000));
        let c = Amount::parse_input("150000").unwrap();
        assert_eq!(c.value(), Decimal::from(150_000));
        assert!(Amount::parse_input("seratus").is_err());
        assert!(Amount::parse_input("").is_err());
        assert!(Amount::parse_input("-5").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from(150000).to_string(), "Rp 150,000");
        assert_eq!(Amount::from(-5000).to_string(), "-Rp 5,000");
        assert_eq!(Amount::ZERO.to_string(), "Rp 0");
        assert_eq!(amt("1234.5").to_string(), "Rp 1,234.50");
    }

    #[test]
    fn test_plain() {
        assert_eq!(amt("Rp 150,000").plain(), "150000");
        assert_eq!(amt("150000.00").plain(), "150000");
        assert_eq!(Amount::from(-10).plain(), "-10");
    }

    #[test]
    fn test_sign_predicates() {
        assert!(Amount::from(1).is_positive());
        assert!(!Amount::ZERO.is_positive());
        assert!(!Amount::ZERO.is_negative());
        assert!(Amount::from(-1).is_negative());
    }

    #[test]
    fn test_arithmetic() {
        let total: Amount = vec![Amount::from(50000), Amount::ZERO, Amount::from(25000)]
            .into_iter()
            .sum();
        assert_eq!(total, Amount::from(75000));
        assert_eq!(total - Amount::from(100000), Amount::from(-25000));
        assert_eq!(Amount::from(1200).div_whole(12), Amount::from(100));
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&Amount::from(5000)).unwrap();
        assert_eq!(json, "\"5000\"");
        let back: Amount = serde_json::from_str("\"Rp 5,000\"").unwrap();
        assert_eq!(back, Amount::from(5000));
    }
}
