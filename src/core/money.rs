use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use thiserror::Error;

/// A fixed-point currency amount in integer minor units (cents).
///
/// `Money` is signed: expense amounts are positive by validation, while
/// net balances use the same type with positive meaning "is owed" and
/// negative meaning "owes". Arithmetic is plain integer arithmetic, so
/// sums of balances are exact — there is no floating point anywhere.
///
/// The serde representation is a decimal string in major units
/// ("12.34"), matching the wire shape of the surrounding service.
///
/// # Examples
///
/// ```
/// use split_engine::core::money::Money;
/// use rust_decimal_macros::dec;
///
/// let price = Money::try_from_decimal(dec!(12.34)).unwrap();
/// assert_eq!(price.minor_units(), 1234);
/// assert_eq!(price.to_string(), "12.34");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Money(i64);

/// Errors arising from converting external decimal amounts into `Money`.
#[derive(Debug, Error)]
pub enum MoneyError {
    #[error("amount {0} has more than two decimal places")]
    PrecisionLoss(Decimal),
    #[error("amount {0} does not fit in minor units")]
    OutOfRange(Decimal),
}

impl Money {
    pub const ZERO: Money = Money(0);

    /// Create from a raw count of minor units (cents).
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Create from a whole number of major units (e.g. `300` -> 300.00).
    pub const fn from_major(major: i64) -> Self {
        Self(major * 100)
    }

    /// The raw count of minor units.
    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    /// Exact conversion from a decimal major-unit amount.
    ///
    /// Fails if the amount carries sub-cent precision or overflows.
    pub fn try_from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        let scaled = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::OutOfRange(amount))?;
        if scaled != scaled.trunc() {
            return Err(MoneyError::PrecisionLoss(amount));
        }
        let minor = scaled.to_i64().ok_or(MoneyError::OutOfRange(amount))?;
        Ok(Self(minor))
    }

    /// Rounding conversion from a decimal major-unit amount.
    ///
    /// Rounds half-away-from-zero to the nearest cent. Used for derived
    /// amounts such as bill surcharge lines; validated input goes through
    /// [`Money::try_from_decimal`] instead.
    pub fn from_decimal_rounded(amount: Decimal) -> Result<Self, MoneyError> {
        let scaled = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::OutOfRange(amount))?;
        let rounded = scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let minor = rounded.to_i64().ok_or(MoneyError::OutOfRange(amount))?;
        Ok(Self(minor))
    }

    /// The amount as a decimal in major units, scale 2.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    pub const fn abs(&self) -> Money {
        Money(self.0.abs())
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        Money(iter.map(|m| m.0).sum())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::str::serialize(&self.to_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let decimal = rust_decimal::serde::str::deserialize(deserializer)?;
        Money::try_from_decimal(decimal).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exact_conversion() {
        let m = Money::try_from_decimal(dec!(12.34)).unwrap();
        assert_eq!(m.minor_units(), 1234);
        assert_eq!(m.to_decimal(), dec!(12.34));
    }

    #[test]
    fn test_whole_amount() {
        let m = Money::try_from_decimal(dec!(300)).unwrap();
        assert_eq!(m.minor_units(), 30000);
        assert_eq!(m, Money::from_major(300));
    }

    #[test]
    fn test_sub_cent_rejected() {
        let result = Money::try_from_decimal(dec!(0.125));
        assert!(matches!(result, Err(MoneyError::PrecisionLoss(_))));
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(
            Money::from_decimal_rounded(dec!(0.125)).unwrap().minor_units(),
            13
        );
        assert_eq!(
            Money::from_decimal_rounded(dec!(-0.125)).unwrap().minor_units(),
            -13
        );
        assert_eq!(
            Money::from_decimal_rounded(dec!(0.124)).unwrap().minor_units(),
            12
        );
    }

    #[test]
    fn test_arithmetic_is_exact() {
        let a = Money::from_minor(3334);
        let b = Money::from_minor(3333);
        assert_eq!(a + b + b, Money::from_major(100));
        assert_eq!(a - a, Money::ZERO);
        assert_eq!(-a + a, Money::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1234).to_string(), "12.34");
        assert_eq!(Money::from_minor(-50).to_string(), "-0.50");
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let m = Money::from_minor(1234);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"12.34\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_deserialize_rejects_sub_cent() {
        let result: Result<Money, _> = serde_json::from_str("\"0.125\"");
        assert!(result.is_err());
    }
}
