//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In many ordering systems:                                              │
//! │    €12.20 / 1.10 = €11.090909...  → Which cent does the till keep?     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + Round Once                               │
//! │    Intermediate math runs in i128 sub-cent units at full precision.    │
//! │    A value becomes whole cents exactly once, when it is final.         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use crema_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // €10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;            // €21.98
//! let total = price + Money::from_cents(500); // €15.99
//!
//! // NEVER do this:
//! // let bad = Money::from_float(10.99); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for EUR).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds, drift deltas
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  StandardBeverage.price_cents ──┐                                       │
/// │  CupSize.base_price + surcharges├──► unit price ──► LineAmounts        │
/// │  Dessert.price_cents ───────────┘         │                             │
/// │                                           ▼                             │
/// │  Order.total ◄── grand total ◄── Σ per-line gross                      │
/// │                                                                         │
/// │  EVERY monetary value in the engine flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use crema_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents €10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    ///
    /// ## Why Cents?
    /// Using the smallest unit eliminates all floating-point concerns.
    /// The store, calculations, and API all use cents.
    /// Only the UI converts to euros for display.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (euros and cents).
    ///
    /// ## Example
    /// ```rust
    /// use crema_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99); // €10.99
    /// assert_eq!(price.cents(), 1099);
    ///
    /// let negative = Money::from_major_minor(-5, 50); // -€5.50 (refund)
    /// assert_eq!(negative.cents(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -€5.50, not -€4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        // Handle sign: if major is negative, minor should subtract
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Rounds a full-precision quotient to whole cents, half away from zero.
    ///
    /// This is THE rounding point of the engine: every multi-term
    /// computation accumulates its numerator at full precision (i128) and
    /// calls this exactly once when the value becomes final.
    ///
    /// ## Example
    /// ```rust
    /// use crema_core::money::Money;
    ///
    /// // 12_200_000 / 11_000 = 1109.09... → €11.09
    /// assert_eq!(Money::from_ratio(12_200_000, 11_000).cents(), 1109);
    ///
    /// // Exact halves round up: 655_000 / 10_000 = 65.5 → 66 cents
    /// assert_eq!(Money::from_ratio(655_000, 10_000).cents(), 66);
    /// ```
    ///
    /// ## Panics
    /// Panics in debug builds if `denominator` is not positive.
    pub fn from_ratio(numerator: i128, denominator: i128) -> Self {
        debug_assert!(denominator > 0, "Money::from_ratio denominator must be positive");
        let half = denominator / 2;
        let cents = if numerator >= 0 {
            (numerator + half) / denominator
        } else {
            (numerator - half) / denominator
        };
        Money(cents as i64)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (euros) portion.
    ///
    /// ## Example
    /// ```rust
    /// use crema_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.euros(), 10);
    ///
    /// let negative = Money::from_cents(-550);
    /// assert_eq!(negative.euros(), -5);
    /// ```
    #[inline]
    pub const fn euros(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    ///
    /// ## Example
    /// ```rust
    /// use crema_core::money::Money;
    ///
    /// let delta = Money::from_cents(-550);
    /// assert_eq!(delta.abs().cents(), 550);
    /// ```
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use crema_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // €2.99
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897); // €8.97
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Arguments
    /// * `discount_bps` - Discount in basis points (1000 = 10%)
    ///
    /// ## Example
    /// ```rust
    /// use crema_core::money::Money;
    ///
    /// let gross = Money::from_cents(10000); // €100.00
    /// let discounted = gross.apply_percentage_discount(1000); // 10% off
    /// assert_eq!(discounted.cents(), 9000); // €90.00
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        // Calculate discount amount at full precision, round once, subtract
        let discount = Money::from_ratio(self.0 as i128 * discount_bps as i128, 10_000);
        Money(self.0 - discount.cents())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. Use frontend formatting for actual UI
/// display to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}€{}.{:02}", sign, self.euros().abs(), self.cents_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.euros(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        let money = Money::from_major_minor(10, 99);
        assert_eq!(money.cents(), 1099);

        let negative = Money::from_major_minor(-5, 50);
        assert_eq!(negative.cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "€10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "€5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-€5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "€0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_from_ratio_rounds_half_up() {
        // 65.5 cents rounds up to 66
        assert_eq!(Money::from_ratio(655_000, 10_000).cents(), 66);
        // 65.4999... stays at 65
        assert_eq!(Money::from_ratio(654_999, 10_000).cents(), 65);
        // Exact quotients are untouched
        assert_eq!(Money::from_ratio(650_000, 10_000).cents(), 65);
    }

    #[test]
    fn test_from_ratio_negative_rounds_away_from_zero() {
        assert_eq!(Money::from_ratio(-655_000, 10_000).cents(), -66);
        assert_eq!(Money::from_ratio(-654_999, 10_000).cents(), -65);
    }

    #[test]
    fn test_percentage_discount() {
        let gross = Money::from_cents(10000); // €100.00
        let discounted = gross.apply_percentage_discount(1000); // 10%
        assert_eq!(discounted.cents(), 9000); // €90.00
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_cents(100);
        assert!(!positive.is_zero());
        assert!(positive.is_positive());
        assert!(!positive.is_negative());

        let negative = Money::from_cents(-100);
        assert!(!negative.is_zero());
        assert!(!negative.is_positive());
        assert!(negative.is_negative());
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_cents(299);
        let line_total = unit_price.multiply_quantity(3);
        assert_eq!(line_total.cents(), 897);
    }
}
