//! # Order Total Aggregator
//!
//! Folds an order's lines into subtotal, tax total and grand total, and
//! writes the grand total back through the order store.
//!
//! ## Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Totals                                         │
//! │                                                                         │
//! │  for each line:  unit price (frozen override, else derived)            │
//! │                  × quantity, − discount, VAT-decomposed                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal    = Σ line imponibile   (net)                               │
//! │  tax_total   = Σ line tax                                               │
//! │  grand_total = Σ line gross        == subtotal + tax_total, exactly    │
//! │                                                                         │
//! │  Terminal order (completed / cancelled)  →  InvalidOrderStatus         │
//! │  Empty order                             →  all-zero totals (valid)    │
//! │  Any line failing to price               →  the whole computation      │
//! │                                             fails (totals are all-or-  │
//! │                                             nothing, never partial)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crema_core::error::CoreError;
use crema_core::money::Money;
use crema_core::tax::LineAmounts;
use crema_core::types::{ArticleKind, Order};

use crate::error::{EngineError, EngineResult};
use crate::pricing::{PriceRequest, PriceService};
use crate::store::{CatalogStore, OrderStore};

// =============================================================================
// Totals
// =============================================================================

/// The priced breakdown of one order line inside a totals computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineBreakdown {
    pub line_id: String,
    pub article_id: String,
    pub kind: ArticleKind,
    pub quantity: i64,
    pub amounts: LineAmounts,
}

/// The complete totals of one order.
///
/// `grand_total == subtotal + tax_total` holds exactly: each line's
/// decomposition is exact, and the totals are plain sums over lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTotals {
    pub order_id: String,
    /// Net sum over lines (imponibile).
    pub subtotal: Money,
    /// VAT sum over lines.
    pub tax_total: Money,
    /// Gross sum over lines (what the customer pays).
    pub grand_total: Money,
    pub lines: Vec<LineBreakdown>,
}

/// Result of persisting a freshly recomputed grand total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalAdjustment {
    pub order_id: String,
    /// The total stored before recomputation.
    pub previous: Money,
    /// The freshly recomputed total now stored.
    pub recomputed: Money,
    /// `recomputed − previous`, signed. Zero when the stored value was
    /// already correct.
    pub delta: Money,
    /// False when the stored value was already correct. The write is
    /// issued either way.
    pub changed: bool,
}

// =============================================================================
// Totalizer
// =============================================================================

/// Computes and persists order totals over the store seams.
#[derive(Debug)]
pub struct OrderTotalizer<C, O> {
    pricing: PriceService<C>,
    orders: Arc<O>,
}

impl<C, O> Clone for OrderTotalizer<C, O> {
    fn clone(&self) -> Self {
        OrderTotalizer {
            pricing: self.pricing.clone(),
            orders: Arc::clone(&self.orders),
        }
    }
}

impl<C, O> OrderTotalizer<C, O>
where
    C: CatalogStore,
    O: OrderStore,
{
    /// Creates a totalizer over a price service and an order store.
    pub fn new(pricing: PriceService<C>, orders: Arc<O>) -> Self {
        OrderTotalizer { pricing, orders }
    }

    /// The price service this totalizer folds with.
    pub fn pricing(&self) -> &PriceService<C> {
        &self.pricing
    }

    /// The order store this totalizer reads and writes.
    pub fn orders(&self) -> &Arc<O> {
        &self.orders
    }

    /// Computes the totals of an open order, reading prices through the
    /// cache. Does not write anything.
    pub async fn compute_order_total(&self, order_id: &str) -> EngineResult<OrderTotals> {
        Ok(self.fold(order_id, true).await?.1)
    }

    /// Computes the totals of an open order straight from the store,
    /// bypassing every cache. This is the validator's reference value.
    pub async fn recompute_from_scratch(&self, order_id: &str) -> EngineResult<OrderTotals> {
        Ok(self.fold(order_id, false).await?.1)
    }

    /// Recomputes an open order's grand total and persists it.
    ///
    /// The write is unconditional: this call always goes through
    /// `save_order_total`, which is what distinguishes it from the
    /// read-only [`OrderTotalizer::compute_order_total`].
    pub async fn update_order_total(&self, order_id: &str) -> EngineResult<TotalAdjustment> {
        let (order, totals) = self.fold(order_id, true).await?;

        let previous = order.total();
        self.orders
            .save_order_total(order_id, totals.grand_total)
            .await?;

        let changed = previous != totals.grand_total;
        if changed {
            info!(
                order_id,
                previous = %previous,
                recomputed = %totals.grand_total,
                "Order total updated"
            );
        } else {
            debug!(order_id, total = %previous, "Order total rewritten unchanged");
        }

        Ok(TotalAdjustment {
            order_id: order_id.to_string(),
            previous,
            recomputed: totals.grand_total,
            delta: totals.grand_total - previous,
            changed,
        })
    }

    /// Fetches the order, guards its status, prices every line and sums.
    async fn fold(&self, order_id: &str, use_cache: bool) -> EngineResult<(Order, OrderTotals)> {
        let order = self
            .orders
            .order(order_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Order", order_id))?;

        // Terminal orders are frozen financial records.
        if order.status.is_terminal() {
            return Err(CoreError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                current_status: order.status.to_string(),
            }
            .into());
        }

        let lines = self.orders.order_lines(order_id).await?;

        let mut subtotal = Money::zero();
        let mut tax_total = Money::zero();
        let mut grand_total = Money::zero();
        let mut breakdowns = Vec::with_capacity(lines.len());

        for line in &lines {
            let request = PriceRequest::from_order_line(line);
            let amounts = if use_cache {
                self.pricing.line_price(&request).await?
            } else {
                self.pricing.line_price_uncached(&request).await?
            };

            subtotal += amounts.imponibile;
            tax_total += amounts.tax;
            grand_total += amounts.gross;
            breakdowns.push(LineBreakdown {
                line_id: line.id.clone(),
                article_id: line.article_id.clone(),
                kind: line.kind,
                quantity: line.quantity,
                amounts,
            });
        }

        debug!(
            order_id,
            lines = breakdowns.len(),
            grand_total = %grand_total,
            "Order totals computed"
        );

        Ok((
            order,
            OrderTotals {
                order_id: order_id.to_string(),
                subtotal,
                tax_total,
                grand_total,
                lines: breakdowns,
            },
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
