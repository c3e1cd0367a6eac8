//! Monetary amounts, percentage rates and user-input clamping.
//!
//! Amounts are plain `f64` decimals. Nothing here rounds internally; rounding
//! only happens when an amount is rendered for display.

use core::fmt;
use core::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Parse user input as a non-negative number.
///
/// Surrounding whitespace is ignored and empty input reads as zero. Only
/// decimal notation is accepted, so `0x10` reads as zero. Anything that fails
/// to parse, is NaN or infinite, or is negative becomes `0.0`.
pub fn parse_non_negative(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// A US-dollar amount.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(f64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0.0);

    pub fn new(amount: f64) -> Self {
        Self(amount)
    }

    pub fn amount(self) -> f64 {
        self.0
    }
}

impl From<f64> for Money {
    fn from(value: f64) -> Self {
        Self(value)
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

impl Mul<f64> for Money {
    type Output = Money;

    fn mul(self, rhs: f64) -> Money {
        Money(self.0 * rhs)
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

/// `$1,234.50` / `-$11.00`: two decimals, comma thousands separators.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_nan() {
            return f.write_str("$NaN");
        }
        if self.0.is_infinite() {
            let sign = if self.0 < 0.0 { "-" } else { "" };
            return write!(f, "{sign}$∞");
        }

        let fixed = format!("{:.2}", self.0.abs());
        let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        let negative = self.0 < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        if negative {
            f.write_str("-")?;
        }
        write!(f, "${grouped}.{cents}")
    }
}

/// A non-negative percentage rate (tax, discount).
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(f64);

impl ValueObject for Percentage {}

impl Percentage {
    pub const ZERO: Percentage = Percentage(0.0);

    /// Negative or non-finite values clamp to zero.
    pub fn new(value: f64) -> Self {
        if value.is_finite() && value > 0.0 {
            Self(value)
        } else {
            Self(0.0)
        }
    }

    /// Clamp raw user input (see [`parse_non_negative`]).
    pub fn from_input(raw: &str) -> Self {
        Self(parse_non_negative(raw))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// The rate as a fraction (`8%` → `0.08`).
    pub fn fraction(self) -> f64 {
        self.0 / 100.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
