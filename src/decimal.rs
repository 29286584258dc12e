//! Fixed-point money type with 2 decimal places.
//!
//! Uses `rust_decimal` internally with scale enforcement. Amounts written into
//! barcodes and batch records are always expressed in cents (value × 100,
//! truncated, zero-padded).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A decimal type that maintains exactly 2 decimal places of precision.
///
/// Extra fractional digits are truncated toward zero, never rounded, so the
/// cents embedded in a barcode always match what the caller typed.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use boleto_engine::Decimal2;
///
/// let amount = Decimal2::from_str("123.459").unwrap();
/// assert_eq!(amount.to_string(), "123.45");
/// assert_eq!(amount.cents(), Some(12345));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Decimal2(Decimal);

impl Decimal2 {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Decimal2(Decimal::ZERO);

    /// Creates a new `Decimal2`, truncating to 2 decimal places.
    pub fn new(value: Decimal) -> Self {
        let mut truncated = value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::ToZero);
        truncated.rescale(Self::SCALE);
        Decimal2(truncated)
    }

    /// Builds an amount from an integer number of cents.
    pub fn from_cents(cents: u64) -> Self {
        Decimal2::new(Decimal::from(cents) / Decimal::ONE_HUNDRED)
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this value is below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// The value in cents, or `None` for negative amounts.
    pub fn cents(&self) -> Option<u64> {
        if self.is_negative() {
            return None;
        }
        (self.0 * Decimal::ONE_HUNDRED).trunc().to_u64()
    }

    /// The underlying decimal.
    pub fn inner(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Decimal2 {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)?;
        Ok(Decimal2::new(decimal))
    }
}

impl fmt::Display for Decimal2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Decimal2 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:.2}", self.0))
    }
}

impl<'de> Deserialize<'de> for Decimal2 {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Decimal2::from_str(&s).map_err(serde::de::Error::custom)
    }
}
