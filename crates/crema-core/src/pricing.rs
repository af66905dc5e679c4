//! # Pure Price Formulas
//!
//! The custom-beverage composition formula, as a pure function over
//! already-resolved catalog records. Lookups live in crema-engine;
//! this module only does the math.
//!
//! ## The Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Custom-Beverage Price                                                  │
//! │                                                                         │
//! │  price = cupSize.basePrice                                              │
//! │        + Σ (ingredient.surcharge × cupSize.multiplier)                 │
//! │          over AVAILABLE chosen ingredients only                         │
//! │                                                                         │
//! │  Example: base €3.00, multiplier ×1.30                                 │
//! │           chosen [€0.50 available, €0.30 unavailable]                  │
//! │                                                                         │
//! │  price = 3.00 + 0.50 × 1.30 = €3.65                                    │
//! │          (the unavailable €0.30 contributes nothing)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unavailable ingredients are excluded silently - they do not make the
//! beverage unorderable in the pricing engine.

use crate::money::Money;
use crate::types::{CupSize, Ingredient};

/// Computes the unit price of a custom beverage from its cup size and
/// chosen ingredients.
///
/// The surcharge × multiplier products are accumulated at full precision
/// in i128 sub-cent units and rounded to whole cents exactly once, so a
/// long ingredient list never accumulates per-term rounding error.
///
/// ## Example
/// ```rust
/// use crema_core::money::Money;
/// use crema_core::pricing::custom_beverage_price;
/// use crema_core::types::{CupSize, Ingredient};
///
/// let cup = CupSize {
///     id: "medium".to_string(),
///     name: "medium".to_string(),
///     base_price_cents: 300,
///     multiplier_bps: 13_000, // ×1.30
/// };
/// let chosen = vec![
///     Ingredient { id: "i1".into(), name: "syrup".into(), surcharge_cents: 50, available: true },
///     Ingredient { id: "i2".into(), name: "cream".into(), surcharge_cents: 30, available: false },
/// ];
///
/// assert_eq!(custom_beverage_price(&cup, &chosen), Money::from_cents(365));
/// ```
pub fn custom_beverage_price(cup_size: &CupSize, chosen: &[Ingredient]) -> Money {
    // Full-precision accumulator: cents × bps, i.e. 1/10000-cent units
    let surcharge_sum: i128 = chosen
        .iter()
        .filter(|ingredient| ingredient.available)
        .map(|ingredient| ingredient.surcharge_cents as i128 * cup_size.multiplier_bps as i128)
        .sum();

    cup_size.base_price() + Money::from_ratio(surcharge_sum, 10_000)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cup(base_cents: i64, multiplier_bps: u32) -> CupSize {
        CupSize {
            id: "cup".to_string(),
            name: "cup".to_string(),
            base_price_cents: base_cents,
            multiplier_bps,
        }
    }

    fn ingredient(surcharge_cents: i64, available: bool) -> Ingredient {
        Ingredient {
            id: format!("ing-{}", surcharge_cents),
            name: "ingredient".to_string(),
            surcharge_cents,
            available,
        }
    }

    #[test]
    fn test_medium_cup_with_mixed_availability() {
        // base €3.00, ×1.30, [€0.50 available, €0.30 unavailable] → €3.65
        let price = custom_beverage_price(
            &cup(300, 13_000),
            &[ingredient(50, true), ingredient(30, false)],
        );
        assert_eq!(price.cents(), 365);
    }

    #[test]
    fn test_no_ingredients_is_base_price() {
        assert_eq!(custom_beverage_price(&cup(300, 13_000), &[]).cents(), 300);
    }

    #[test]
    fn test_all_unavailable_is_base_price() {
        let price = custom_beverage_price(
            &cup(250, 15_000),
            &[ingredient(50, false), ingredient(80, false)],
        );
        assert_eq!(price.cents(), 250);
    }

    #[test]
    fn test_zero_multiplier_charges_base_only() {
        // multiplier 0: ingredients are free in this size
        let price = custom_beverage_price(
            &cup(200, 0),
            &[ingredient(50, true), ingredient(80, true)],
        );
        assert_eq!(price.cents(), 200);
    }

    #[test]
    fn test_rounds_once_over_the_whole_sum() {
        // Three ×1.25 surcharges of €0.33: exact sum is 123.75 sub-cents
        // → 0.4125 + ... accumulate first, round once at the end.
        // 3 × 33 × 12500 = 1_237_500 → 123.75 cents → 124 (half-up)
        let price = custom_beverage_price(
            &cup(0, 12_500),
            &[ingredient(33, true), ingredient(33, true), ingredient(33, true)],
        );
        assert_eq!(price.cents(), 124);

        // Per-term rounding would give 41 + 41 + 41 = 123. The difference
        // is exactly what the full-precision accumulator exists to avoid.
    }
}
