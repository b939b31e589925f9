//! Token amounts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A non-negative token amount.
///
/// Serialized as a decimal string so that records stay readable and are not
/// subject to JSON number precision limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u128);

impl Amount {
    /// Zero amount.
    pub const ZERO: Self = Amount(0);

    /// Create an amount from a raw value.
    pub const fn new(value: u128) -> Self {
        Amount(value)
    }

    /// Get the raw value.
    pub fn get(&self) -> u128 {
        self.0
    }

    /// Check if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition. Returns None on overflow.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Checked subtraction. Returns None if the result would be negative.
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Amount(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error parsing an amount from its decimal form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount '{0}'")]
pub struct AmountError(pub String);

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError(s.to_string()));
        }
        s.parse::<u128>()
            .map(Amount)
            .map_err(|_| AmountError(s.to_string()))
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(value: Amount) -> Self {
        value.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!("450".parse::<Amount>(), Ok(Amount::new(450)));
        assert!("-1".parse::<Amount>().is_err());
        assert!("".parse::<Amount>().is_err());
        assert!("1e3".parse::<Amount>().is_err());
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::new(10);
        assert_eq!(a.checked_sub(Amount::new(11)), None);
        assert_eq!(a.checked_sub(Amount::new(4)), Some(Amount::new(6)));
        assert_eq!(Amount::new(u128::MAX).checked_add(a), None);
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Amount::new(1000)).unwrap();
        assert_eq!(json, "\"1000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Amount::new(1000));
    }
}
