//! Fixed-point currency amounts.
//!
//! Amounts are held as integer cents so sums and percentages never drift.
//! Equal shares of an amount are exact [`Decimal`] values and only get
//! rounded to the cent when displayed. On the wire an amount is a plain JSON
//! number in major units (`1500.75`), which is the shape the durable ledger
//! record has always used.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Largest magnitude accepted for a single amount: 999 999 999 999.99.
///
/// Every value up to this bound survives the cents -> f64 -> cents trip exactly.
pub const MAX_CENTS: i64 = 99_999_999_999_999;

/// Signed currency amount with two implied decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates an amount from cents without range checking.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from cents, rejecting values beyond [`MAX_CENTS`].
    pub fn checked_from_cents(cents: i64) -> Result<Self, MoneyRangeError> {
        if cents.checked_abs().map_or(true, |abs| abs > MAX_CENTS) {
            return Err(MoneyRangeError::TooLarge);
        }
        Ok(Self(cents))
    }

    /// Converts a major-unit float (as found in JSON) to cents.
    ///
    /// The shortest decimal form of `value` must have at most two fractional
    /// digits; `0.005` is refused instead of being rounded to a cent.
    pub fn from_major(value: f64) -> Result<Self, MoneyRangeError> {
        if !value.is_finite() {
            return Err(MoneyRangeError::NotFinite);
        }
        if value.abs() > MAX_CENTS as f64 / 100.0 {
            return Err(MoneyRangeError::TooLarge);
        }
        let decimal = Decimal::from_str(&value.to_string())
            .map_err(|_| MoneyRangeError::SubCent)?
            .normalize();
        if decimal.scale() > 2 {
            return Err(MoneyRangeError::SubCent);
        }
        Self::checked_from_cents(decimal_cents(decimal))
    }

    /// Rounds an exact value to the nearest cent, half away from zero.
    pub fn rounded_from(value: Decimal) -> Self {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self(decimal_cents(rounded))
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Whole units, truncated toward zero.
    pub const fn whole_units(self) -> i64 {
        self.0 / 100
    }

    /// Cents portion (0-99) of the absolute value.
    pub const fn cents_part(self) -> i64 {
        (self.0 % 100).abs()
    }

    /// `percent`% of this amount, rounded half away from zero to the cent.
    pub fn percent_of(self, percent: u8) -> Self {
        Self(div_round_half_away(
            self.0 as i128 * percent as i128,
            100,
        ))
    }

    /// One of `parts` equal shares, unrounded.
    ///
    /// A zero divisor is treated as a single share.
    pub fn share(self, parts: u32) -> Decimal {
        self.to_decimal() / Decimal::from(parts.max(1))
    }
}

/// Cents held by a value with at most two fractional digits.
fn decimal_cents(mut value: Decimal) -> i64 {
    value.rescale(2);
    value.mantissa().clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

fn div_round_half_away(numerator: i128, denominator: i128) -> i64 {
    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        -((-numerator + half) / denominator)
    };
    rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Locale-neutral rendering (`-83.33`); user-facing text goes through the mask codec.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02}",
            sign,
            self.whole_units().abs(),
            self.cents_part()
        )
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.to_major())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a currency amount as a JSON number")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Money, E> {
        value
            .checked_mul(100)
            .ok_or(MoneyRangeError::TooLarge)
            .and_then(Money::checked_from_cents)
            .map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Money, E> {
        let value = i64::try_from(value).map_err(|_| E::custom(MoneyRangeError::TooLarge))?;
        self.visit_i64(value)
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Money, E> {
        Money::from_major(value).map_err(E::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Reasons an amount cannot be represented exactly.
pub enum MoneyRangeError {
    TooLarge,
    NotFinite,
    SubCent,
}

impl fmt::Display for MoneyRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyRangeError::TooLarge => f.write_str("amount exceeds 999999999999.99"),
            MoneyRangeError::NotFinite => f.write_str("amount is not a finite number"),
            MoneyRangeError::SubCent => f.write_str("amount has more than two decimal places"),
        }
    }
}

impl std::error::Error for MoneyRangeError {}
