//! Fixed-point price type.

use crate::error::PriceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A non-negative price with exactly two decimal places.
///
/// Stored as whole cents, so the "at most two decimals" and "not negative"
/// rules hold by construction. Parsing accepts `12`, `12.5` and `12.50`
/// (all the same value) with `.` as the decimal point regardless of locale.
/// Display always prints two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Price(u64);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Creates a price from a number of cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the price in cents.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }
        if s.starts_with('-') {
            return Err(PriceError::Negative);
        }

        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (s, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PriceError::Invalid);
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PriceError::Invalid);
        }
        if fraction.len() > 2 {
            return Err(PriceError::TooManyDecimals);
        }

        let whole: u64 = whole.parse().map_err(|_| PriceError::Overflow)?;
        let fraction: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| PriceError::Invalid)? * 10,
            _ => fraction.parse().map_err(|_| PriceError::Invalid)?,
        };

        whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .map(Self)
            .ok_or(PriceError::Overflow)
    }
}

impl TryFrom<String> for Price {
    type Error = PriceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_common_forms() {
        assert_eq!("9.99".parse::<Price>().unwrap().cents(), 999);
        assert_eq!("12".parse::<Price>().unwrap().cents(), 1200);
        assert_eq!("12.5".parse::<Price>().unwrap().cents(), 1250);
        assert_eq!("0.05".parse::<Price>().unwrap().cents(), 5);
        assert_eq!(" 3.10 ".parse::<Price>().unwrap().cents(), 310);
        assert_eq!("7.".parse::<Price>().unwrap().cents(), 700);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!("".parse::<Price>(), Err(PriceError::Empty));
        assert_eq!("-1.00".parse::<Price>(), Err(PriceError::Negative));
        assert_eq!("1.999".parse::<Price>(), Err(PriceError::TooManyDecimals));
        assert_eq!("1,50".parse::<Price>(), Err(PriceError::Invalid));
        assert_eq!("abc".parse::<Price>(), Err(PriceError::Invalid));
        assert_eq!(".50".parse::<Price>(), Err(PriceError::Invalid));
        assert_eq!("1e3".parse::<Price>(), Err(PriceError::Invalid));
        assert_eq!(
            "99999999999999999999".parse::<Price>(),
            Err(PriceError::Overflow)
        );
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Price::from_cents(999).to_string(), "9.99");
        assert_eq!(Price::from_cents(1000).to_string(), "10.00");
        assert_eq!(Price::from_cents(5).to_string(), "0.05");
        assert_eq!(Price::ZERO.to_string(), "0.00");
    }

    #[test]
    fn serde_uses_decimal_string() {
        let json = serde_json::to_string(&Price::from_cents(1999)).unwrap();
        assert_eq!(json, "\"19.99\"");

        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cents(), 1999);
        assert!(serde_json::from_str::<Price>("\"-2\"").is_err());
    }

    proptest! {
        #[test]
        fn display_parses_back(cents in 0u64..10_000_000_000) {
            let price = Price::from_cents(cents);
            prop_assert_eq!(price.to_string().parse::<Price>(), Ok(price));
        }
    }
}
