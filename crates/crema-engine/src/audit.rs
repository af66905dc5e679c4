//! # Consistency Validator
//!
//! Audits persisted money against fresh recomputation: stored order
//! totals against a cache-bypassing refold, and claimed single prices
//! against current derivation.
//!
//! ## Drift Scan
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Drift Scan                                           │
//! │                                                                         │
//! │  open orders ──► recompute from scratch (NO cache)                     │
//! │       │              │                                                  │
//! │       │              ▼                                                  │
//! │       │         |stored − recomputed| > tolerance?  ──► flagged        │
//! │       │                                                                 │
//! │       └── an order failing to recompute is recorded and the scan       │
//! │           moves on; the scan never writes corrections back             │
//! │                                                                         │
//! │  Terminal orders are never scanned: their totals are frozen            │
//! │  financial records, drift there is a ledger question, not a bug.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two tolerances apply, deliberately distinct: drift uses a flat absolute
//! bound in cents, price claims a relative bound in basis points. See
//! `crate::config`.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crema_core::money::Money;
use crema_core::types::ArticleKind;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::orders::OrderTotalizer;
use crate::store::{CatalogStore, OrderStore};

// =============================================================================
// Reports
// =============================================================================

/// One order whose stored total deviates beyond tolerance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalDrift {
    pub order_id: String,
    /// The grand total persisted on the order row.
    pub stored: Money,
    /// The freshly recomputed grand total.
    pub recomputed: Money,
    /// `stored − recomputed`, signed.
    pub drift: Money,
}

/// Outcome of one drift scan over the open orders.
#[derive(Debug)]
pub struct DriftReport {
    /// How many open orders the scan examined.
    pub scanned: usize,
    /// Orders deviating beyond the tolerance.
    pub drifted: Vec<TotalDrift>,
    /// Orders whose recomputation failed, with the failure.
    pub failed: Vec<(String, EngineError)>,
    /// True when the scan stopped early on the cancel flag; unexamined
    /// orders appear in neither list.
    pub cancelled: bool,
}

impl DriftReport {
    /// True when every examined order was consistent.
    pub fn is_clean(&self) -> bool {
        self.drifted.is_empty() && self.failed.is_empty()
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Cross-checks persisted money against fresh, cache-bypassing
/// recomputation. Read-only: it flags, it never repairs.
#[derive(Debug)]
pub struct ConsistencyValidator<C, O> {
    totalizer: OrderTotalizer<C, O>,
    drift_tolerance: Money,
    claim_tolerance_bps: u32,
}

impl<C, O> ConsistencyValidator<C, O>
where
    C: CatalogStore,
    O: OrderStore,
{
    /// Creates a validator with the configured tolerances.
    pub fn new(totalizer: OrderTotalizer<C, O>, config: &EngineConfig) -> Self {
        ConsistencyValidator {
            totalizer,
            drift_tolerance: Money::from_cents(config.drift_tolerance_cents),
            claim_tolerance_bps: config.price_claim_tolerance_bps,
        }
    }

    /// Scans every open order, recomputing its total from scratch and
    /// flagging those whose stored value drifts beyond tolerance.
    ///
    /// One order failing to recompute is recorded in the report and the
    /// scan moves on. Only the initial open-order listing can fail the
    /// whole scan.
    pub async fn find_invalid_totals(
        &self,
        cancel: Option<&AtomicBool>,
    ) -> EngineResult<DriftReport> {
        let open = self.totalizer.orders().open_orders().await?;

        let mut report = DriftReport {
            scanned: 0,
            drifted: Vec::new(),
            failed: Vec::new(),
            cancelled: false,
        };

        for order in open {
            if cancel.map(|flag| flag.load(Ordering::Relaxed)).unwrap_or(false) {
                report.cancelled = true;
                break;
            }
            report.scanned += 1;

            match self.totalizer.recompute_from_scratch(&order.id).await {
                Ok(totals) => {
                    let drift = order.total() - totals.grand_total;
                    if drift.abs() > self.drift_tolerance {
                        warn!(
                            order_id = %order.id,
                            stored = %order.total(),
                            recomputed = %totals.grand_total,
                            "Stored order total drifted"
                        );
                        report.drifted.push(TotalDrift {
                            order_id: order.id.clone(),
                            stored: order.total(),
                            recomputed: totals.grand_total,
                            drift,
                        });
                    }
                }
                Err(err) => {
                    warn!(order_id = %order.id, error = %err, "Order failed to recompute");
                    report.failed.push((order.id.clone(), err));
                }
            }
        }

        info!(
            scanned = report.scanned,
            drifted = report.drifted.len(),
            failed = report.failed.len(),
            cancelled = report.cancelled,
            "Drift scan finished"
        );
        Ok(report)
    }

    /// Checks a claimed unit price against fresh derivation, within the
    /// relative tolerance.
    ///
    /// Custom beverages are always accepted: their price follows the
    /// personalization, so there is no fixed menu price to check against.
    /// A zero expected price accepts only a zero claim (no relative
    /// tolerance exists around zero).
    pub async fn validate_price_claim(
        &self,
        kind: ArticleKind,
        article_id: &str,
        claimed: Money,
    ) -> EngineResult<bool> {
        if kind == ArticleKind::CustomBeverage {
            return Ok(true);
        }

        let expected = self
            .totalizer
            .pricing()
            .unit_price_uncached(kind, article_id)
            .await?;

        if expected.is_zero() {
            return Ok(claimed.is_zero());
        }

        // |claimed − expected| / expected ≤ tolerance, in integer math
        let diff = (claimed - expected).abs().cents() as i128 * 10_000;
        let bound = self.claim_tolerance_bps as i128 * expected.cents() as i128;
        Ok(diff <= bound)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PriceCache;
    use crate::memory::{MemoryCatalog, MemoryOrders};
    use crate::pricing::PriceService;
    use chrono::Utc;
    use crema_core::types::{Dessert, Order, OrderLine, OrderStatus};
    use std::sync::Arc;

    fn validator(
        catalog: MemoryCatalog,
        orders: Arc<MemoryOrders>,
    ) -> ConsistencyValidator<MemoryCatalog, MemoryOrders> {
        let config = EngineConfig::default();
        let pricing = PriceService::new(Arc::new(catalog), Arc::new(PriceCache::new(&config)));
        ConsistencyValidator::new(OrderTotalizer::new(pricing, orders), &config)
    }

    fn seeded_catalog() -> MemoryCatalog {
        let catalog = MemoryCatalog::new();
        catalog.add_dessert(Dessert {
            id: "tiramisu".to_string(),
            name: "Tiramisù".to_string(),
            price_cents: 450,
        });
        catalog
    }

    fn order(id: &str, status: OrderStatus, total_cents: i64) -> Order {
        Order {
            id: id.to_string(),
            status,
            total_cents,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn dessert_line(id: &str, order_id: &str, article_id: &str, quantity: i64) -> OrderLine {
        OrderLine {
            id: id.to_string(),
            order_id: order_id.to_string(),
            article_id: article_id.to_string(),
            kind: ArticleKind::Dessert,
            quantity,
            tax_rate_id: None,
            unit_price_cents: None,
            discount_bps: None,
            total_cents: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_scan_flags_drifted_orders_only() {
        let orders = Arc::new(MemoryOrders::new());
        // consistent: stored 450 == recomputed 450
        orders.add_order(order("o-good", OrderStatus::Open, 450));
        orders.add_line(dessert_line("l1", "o-good", "tiramisu", 1));
        // drifted: stored 500, recomputed 450
        orders.add_order(order("o-bad", OrderStatus::Open, 500));
        orders.add_line(dessert_line("l2", "o-bad", "tiramisu", 1));
        // terminal: never scanned, however wrong
        orders.add_order(order("o-done", OrderStatus::Completed, 9999));

        let report = validator(seeded_catalog(), orders)
            .find_invalid_totals(None)
            .await
            .unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.drifted.len(), 1);
        assert_eq!(report.drifted[0].order_id, "o-bad");
        assert_eq!(report.drifted[0].drift.cents(), 50);
        assert!(report.failed.is_empty());
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_drift_within_tolerance_is_not_flagged() {
        let orders = Arc::new(MemoryOrders::new());
        // off by exactly the 1-cent tolerance: not flagged
        orders.add_order(order("o1", OrderStatus::Open, 451));
        orders.add_line(dessert_line("l1", "o1", "tiramisu", 1));

        let report = validator(seeded_catalog(), orders)
            .find_invalid_totals(None)
            .await
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(report.scanned, 1);
    }

    #[tokio::test]
    async fn test_failing_order_is_recorded_and_scan_continues() {
        let orders = Arc::new(MemoryOrders::new());
        orders.add_order(order("o-broken", OrderStatus::Open, 100));
        orders.add_line(dessert_line("l1", "o-broken", "gone", 1));
        orders.add_order(order("o-good", OrderStatus::Open, 450));
        orders.add_line(dessert_line("l2", "o-good", "tiramisu", 1));

        let report = validator(seeded_catalog(), orders)
            .find_invalid_totals(None)
            .await
            .unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "o-broken");
        assert!(report.failed[0].1.is_not_found());
        assert!(report.drifted.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_scan_examines_nothing_more() {
        let orders = Arc::new(MemoryOrders::new());
        orders.add_order(order("o1", OrderStatus::Open, 450));

        let cancel = AtomicBool::new(true);
        let report = validator(seeded_catalog(), orders)
            .find_invalid_totals(Some(&cancel))
            .await
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.scanned, 0);
    }

    #[tokio::test]
    async fn test_price_claim_within_tolerance() {
        let validator = validator(seeded_catalog(), Arc::new(MemoryOrders::new()));

        // expected 450, 5% tolerance → within 22 cents accepted
        for (claimed, ok) in [(450, true), (470, true), (428, true), (480, false), (400, false)] {
            let valid = validator
                .validate_price_claim(ArticleKind::Dessert, "tiramisu", Money::from_cents(claimed))
                .await
                .unwrap();
            assert_eq!(valid, ok, "claimed {} cents", claimed);
        }
    }

    #[tokio::test]
    async fn test_price_claim_for_custom_beverage_is_always_valid() {
        let validator = validator(MemoryCatalog::new(), Arc::new(MemoryOrders::new()));
        // No catalog lookup happens at all
        let valid = validator
            .validate_price_claim(ArticleKind::CustomBeverage, "p1", Money::from_cents(1))
            .await
            .unwrap();
        assert!(valid);
    }

    #[tokio::test]
    async fn test_price_claim_against_zero_expected() {
        let catalog = MemoryCatalog::new();
        catalog.add_dessert(Dessert {
            id: "freebie".to_string(),
            name: "Freebie".to_string(),
            price_cents: 0,
        });
        let validator = validator(catalog, Arc::new(MemoryOrders::new()));

        assert!(validator
            .validate_price_claim(ArticleKind::Dessert, "freebie", Money::zero())
            .await
            .unwrap());
        assert!(!validator
            .validate_price_claim(ArticleKind::Dessert, "freebie", Money::from_cents(1))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_price_claim_for_missing_article_is_an_error() {
        let validator = validator(seeded_catalog(), Arc::new(MemoryOrders::new()));
        let err = validator
            .validate_price_claim(ArticleKind::Dessert, "missing", Money::from_cents(100))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
