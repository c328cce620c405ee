//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
    /// The amount is above [`Price::MAX`].
    #[error("price must be at most {max}: {amount}")]
    TooLarge {
        /// The rejected amount.
        amount: Decimal,
        /// Largest accepted amount.
        max: Decimal,
    },
    /// The amount has more than [`Price::MAX_SCALE`] decimal places.
    #[error("price must have at most {max} decimal places: {amount}")]
    TooPrecise {
        /// The rejected amount.
        amount: Decimal,
        /// Most decimal places accepted.
        max: u32,
    },
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A unit price in the store's currency.
///
/// Stored as a JSON number (e.g. `10.5`) so cart snapshots stay readable by
/// anything that understands plain JSON. Unit prices are limited to 15
/// significant digits ([`Price::MAX`], [`Price::MAX_SCALE`]), which a JSON
/// number carries exactly; deserialization applies the same limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest unit price: `99999999999.9999`.
    pub const MAX: Self = Self(Decimal::from_parts(0x_A4C6_7FFF, 0x_0003_8D7E, 0, false, 4));

    /// Most decimal places a unit price may carry.
    pub const MAX_SCALE: u32 = 4;

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns an error if `amount` is negative, above [`Self::MAX`], or has
    /// more than [`Self::MAX_SCALE`] decimal places.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge {
                amount,
                max: Self::MAX.0,
            });
        }
        if amount.normalize().scale() > Self::MAX_SCALE {
            return Err(PriceError::TooPrecise {
                amount,
                max: Self::MAX_SCALE,
            });
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Total for `quantity` units at this price.
    ///
    /// Saturates at the largest representable decimal instead of overflowing.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(amount)
    }
}

impl std::ops::Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, p| acc + p)
    }
}

// Going through the decimal text keeps both directions correctly rounded, so
// any amount within the 15-digit limit comes back unchanged.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self
            .0
            .to_string()
            .parse::<f64>()
            .map_err(ser::Error::custom)?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() {
            return Err(de::Error::custom(format!("invalid price: {value}")));
        }
        let amount = value
            .to_string()
            .parse::<Decimal>()
            .map_err(|e| de::Error::custom(PriceError::Invalid(e.to_string())))?;
        Self::new(amount).map_err(de::Error::custom)
    }
}
