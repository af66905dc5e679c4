//! # Tax Math Module
//!
//! Pure, stateless VAT-inclusive decomposition. No I/O.
//!
//! ## Inclusive VAT
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INCLUSIVE VAT (EU model): the menu price already contains the tax     │
//! │                                                                         │
//! │  gross = €12.20 @ 22% VAT                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  net (imponibile) = gross / (1 + rate)                                 │
//! │  tax              = gross - net                                        │
//! │                                                                         │
//! │  Identity: net + tax == gross, EXACTLY (integer cents)                 │
//! │                                                                         │
//! │  All intermediates run at full precision; the result is rounded to    │
//! │  whole cents exactly once, at return time.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The 22.00% Fallback
//! Tax rates are always looked up, never assumed. An unresolvable rate id
//! is the one lookup failure that is NEVER an error: it silently resolves
//! to the 22.00% default through [`resolve_rate_or_default`] - the single
//! place that fallback lives.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{TaxRate, VatRate};

/// Default VAT in basis points (22.00%, the Italian standard rate).
///
/// Used whenever a requested tax-rate id cannot be resolved.
pub const DEFAULT_VAT_BPS: u32 = 2200;

/// Upper bound for a valid rate: 10000 bps = 100%.
pub const MAX_RATE_BPS: u32 = 10_000;

// =============================================================================
// Decomposition
// =============================================================================

/// Derives the net (tax-exclusive) amount from a gross (tax-inclusive) one.
///
/// `net = gross / (1 + rate)`, computed in integer sub-cent units and
/// rounded half-up once at return time.
///
/// ## Example
/// ```rust
/// use crema_core::money::Money;
/// use crema_core::tax::gross_to_net;
/// use crema_core::types::TaxRate;
///
/// // €12.20 at 10% → €11.09
/// let net = gross_to_net(Money::from_cents(1220), TaxRate::from_bps(1000));
/// assert_eq!(net.cents(), 1109);
/// ```
pub fn gross_to_net(gross: Money, rate: TaxRate) -> Money {
    let divisor = 10_000u32 + rate.bps();
    Money::from_ratio(gross.cents() as i128 * 10_000, divisor as i128)
}

/// Derives the tax portion contained in a gross amount.
///
/// Defined as `gross - gross_to_net(gross, rate)` so the reassembly
/// identity `net + tax == gross` holds exactly, with no second rounding.
pub fn tax_portion(gross: Money, rate: TaxRate) -> Money {
    gross - gross_to_net(gross, rate)
}

/// Net ("imponibile") of `unit_price × quantity` under the inclusive-VAT
/// formula. The multiplication happens before decomposition, so the sum
/// is never rounded term by term.
pub fn imponibile(unit_price: Money, quantity: i64, rate: TaxRate) -> Money {
    gross_to_net(unit_price.multiply_quantity(quantity), rate)
}

// =============================================================================
// Rate Resolution
// =============================================================================

/// Resolves a looked-up VAT rate row, falling back to the 22.00% default.
///
/// This is the single place the default-rate fallback is implemented;
/// callers must not reimplement it. A stored rate above 100% is treated
/// as unresolvable too - the table row is corrupt, not the request.
///
/// ## Example
/// ```rust
/// use crema_core::tax::{resolve_rate_or_default, DEFAULT_VAT_BPS};
///
/// assert_eq!(resolve_rate_or_default(None).bps(), DEFAULT_VAT_BPS);
/// ```
pub fn resolve_rate_or_default(row: Option<&VatRate>) -> TaxRate {
    match row {
        Some(rate) if rate.rate_bps <= MAX_RATE_BPS => rate.rate(),
        _ => TaxRate::from_bps(DEFAULT_VAT_BPS),
    }
}

// =============================================================================
// Line Amounts
// =============================================================================

/// The complete money breakdown of one order line.
///
/// Produced by the "complete price" operation: unit price (derived or
/// overridden) + quantity + VAT rate in, all four amounts out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    /// Unit price, VAT inclusive.
    pub unit_price: Money,
    /// Net line amount (tax-exclusive).
    pub imponibile: Money,
    /// VAT contained in the gross line amount.
    pub tax: Money,
    /// Gross line total (what the customer pays).
    pub gross: Money,
}

/// Computes the full breakdown for one order line.
///
/// ## Flow
/// ```text
/// gross = unit_price × quantity
///       │ (optional percentage discount, rounded once)
///       ▼
/// imponibile = gross / (1 + rate)
/// tax        = gross - imponibile
/// ```
///
/// Input validation (quantity > 0, discount within range) is the caller's
/// job; see `crema_core::validation`.
pub fn line_amounts(
    unit_price: Money,
    quantity: i64,
    rate: TaxRate,
    discount_bps: Option<u32>,
) -> LineAmounts {
    let mut gross = unit_price.multiply_quantity(quantity);
    if let Some(discount) = discount_bps {
        gross = gross.apply_percentage_discount(discount);
    }

    let net = gross_to_net(gross, rate);
    LineAmounts {
        unit_price,
        imponibile: net,
        tax: gross - net,
        gross,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gross_to_net_reference_values() {
        // €12.20 at 10%: net = 12.20 / 1.10 = 11.0909... → €11.09
        let net = gross_to_net(Money::from_cents(1220), TaxRate::from_bps(1000));
        assert_eq!(net.cents(), 1109);

        // tax = 12.20 - 11.09 = €1.11
        let tax = tax_portion(Money::from_cents(1220), TaxRate::from_bps(1000));
        assert_eq!(tax.cents(), 111);
    }

    #[test]
    fn test_reassembly_identity() {
        // net + tax == gross exactly, across rates and amounts
        for gross_cents in [0i64, 1, 99, 100, 1220, 9999, 123_456] {
            for bps in [0u32, 400, 1000, 2200, 10_000] {
                let gross = Money::from_cents(gross_cents);
                let rate = TaxRate::from_bps(bps);
                assert_eq!(
                    gross_to_net(gross, rate) + tax_portion(gross, rate),
                    gross,
                    "identity failed for {} at {} bps",
                    gross,
                    bps
                );
            }
        }
    }

    #[test]
    fn test_zero_rate_is_pass_through() {
        let gross = Money::from_cents(1500);
        assert_eq!(gross_to_net(gross, TaxRate::zero()), gross);
        assert_eq!(tax_portion(gross, TaxRate::zero()), Money::zero());
    }

    #[test]
    fn test_imponibile_multiplies_before_decomposing() {
        // 3 × €12.20 = €36.60 at 10% → 36.60 / 1.10 = €33.27 (rounded once)
        let net = imponibile(Money::from_cents(1220), 3, TaxRate::from_bps(1000));
        assert_eq!(net.cents(), 3327);
    }

    #[test]
    fn test_resolve_rate_or_default() {
        // Missing row → 22.00%
        assert_eq!(resolve_rate_or_default(None).bps(), DEFAULT_VAT_BPS);

        // Valid row resolves to its own rate
        let row = VatRate {
            id: "vat-10".to_string(),
            rate_bps: 1000,
        };
        assert_eq!(resolve_rate_or_default(Some(&row)).bps(), 1000);

        // Corrupt row (> 100%) falls back too
        let corrupt = VatRate {
            id: "vat-bad".to_string(),
            rate_bps: 12_000,
        };
        assert_eq!(resolve_rate_or_default(Some(&corrupt)).bps(), DEFAULT_VAT_BPS);
    }

    #[test]
    fn test_line_amounts() {
        // 2 × €6.10 = €12.20 gross at 10%
        let amounts = line_amounts(Money::from_cents(610), 2, TaxRate::from_bps(1000), None);
        assert_eq!(amounts.gross.cents(), 1220);
        assert_eq!(amounts.imponibile.cents(), 1109);
        assert_eq!(amounts.tax.cents(), 111);
        assert_eq!(amounts.imponibile + amounts.tax, amounts.gross);
    }

    #[test]
    fn test_line_amounts_with_discount() {
        // €100.00 gross, 10% discount → €90.00, then decomposed at 22%
        let amounts = line_amounts(
            Money::from_cents(10_000),
            1,
            TaxRate::from_bps(2200),
            Some(1000),
        );
        assert_eq!(amounts.gross.cents(), 9000);
        // 9000 / 1.22 = 7377.04... → 7377
        assert_eq!(amounts.imponibile.cents(), 7377);
        assert_eq!(amounts.tax.cents(), 1623);
    }
}
