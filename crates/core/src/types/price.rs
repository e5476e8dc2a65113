//! Monetary amounts using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(12,2)` and serialized as decimal strings
//! (`"19.99"`) so no value ever passes through a float.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price cannot be negative")]
    Negative,
    #[error("price must have at most {max} decimal places")]
    TooPrecise { max: u32 },
    #[error("price overflow")]
    Overflow,
}

/// A non-negative amount in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Maximum number of fractional digits (cents).
    pub const MAX_SCALE: u32 = 2;

    /// Zero, the identity for summing line totals.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest amount a `NUMERIC(12, 2)` column holds: 9,999,999,999.99.
    pub const MAX: Self = Self(Decimal::from_parts(3_567_587_327, 232, 0, false, 2));

    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero and
    /// [`PriceError::TooPrecise`] for fractions of a cent.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let mut normalized = amount.normalize();
        if normalized.scale() > Self::MAX_SCALE {
            return Err(PriceError::TooPrecise {
                max: Self::MAX_SCALE,
            });
        }
        normalized.rescale(Self::MAX_SCALE);
        Ok(Self(normalized))
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for a negative quantity and
    /// [`PriceError::Overflow`] if the product does not fit in a `Decimal`.
    pub fn times(self, quantity: i32) -> Result<Self, PriceError> {
        if quantity < 0 {
            return Err(PriceError::Negative);
        }
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .ok_or(PriceError::Overflow)
    }

    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the sum does not fit in a `Decimal`.
    pub fn checked_add(self, other: Self) -> Result<Self, PriceError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(PriceError::Overflow)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        Price::new(s.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(
            Price::new(Decimal::new(-1, 2)),
            Err(PriceError::Negative)
        );
    }

    #[test]
    fn test_accepts_zero_and_negative_zero() {
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
        assert_eq!(Price::new(-Decimal::ZERO).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_rejects_fractional_cents() {
        assert!(matches!(
            Price::new("1.005".parse().unwrap()),
            Err(PriceError::TooPrecise { max: 2 })
        ));
        // trailing zeros are not extra precision
        assert!(Price::new("1.500".parse().unwrap()).is_ok());
    }

    #[test]
    fn test_times_and_checked_add() {
        let total = price("19.99")
            .times(3)
            .unwrap()
            .checked_add(price("0.01").times(1).unwrap())
            .unwrap();
        assert_eq!(total, price("59.98"));
    }

    #[test]
    fn test_max_is_largest_column_value() {
        assert_eq!(Price::MAX.to_string(), "9999999999.99");
        assert_eq!(Price::MAX, price("9999999999.99"));
        assert!(price("10000000000.00") > Price::MAX);
    }

    #[test]
    fn test_times_negative_quantity() {
        assert_eq!(price("1").times(-1), Err(PriceError::Negative));
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(price("5").to_string(), "5.00");
        assert_eq!(price("5.5").to_string(), "5.50");
    }

    #[test]
    fn test_serde_string_form() {
        let json = serde_json::to_string(&price("10.25")).unwrap();
        assert_eq!(json, "\"10.25\"");
        assert_eq!(serde_json::to_string(&price("3")).unwrap(), "\"3.00\"");
        let back: Price = serde_json::from_str("\"10.25\"").unwrap();
        assert_eq!(back, price("10.25"));
        assert!(serde_json::from_str::<Price>("\"-3\"").is_err());
    }
}
