//! # Price Derivation Service
//!
//! Resolves catalog records through the [`CatalogStore`] seam and turns
//! them into money, using the pure formulas from `crema-core`.
//!
//! ## Derivation Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Unit Price Derivation                                │
//! │                                                                         │
//! │  StandardBeverage ──► fixed price_cents from the catalog record        │
//! │  Dessert          ──► fixed price_cents from the catalog record        │
//! │  CustomBeverage   ──► personalization → cup size → chosen ingredients  │
//! │                       base + Σ (surcharge × multiplier), available only│
//! │                                                                         │
//! │  Missing article / personalization / cup size  →  NotFound             │
//! │  Unresolvable tax-rate id                      →  22.00% default       │
//! │                       (the ONE lookup that never fails a price)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every path exists in a cached and an uncached flavor. The consistency
//! validator uses the uncached one: an audit that trusted the cache would
//! be auditing the cache.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crema_core::money::Money;
use crema_core::pricing::custom_beverage_price;
use crema_core::tax::{line_amounts, resolve_rate_or_default, LineAmounts};
use crema_core::types::{ArticleKind, OrderLine, TaxRate};
use crema_core::validation::{validate_discount_bps, validate_price_cents, validate_quantity};

use crate::cache::{PriceCache, PriceKey};
use crate::error::{EngineError, EngineResult};
use crate::store::CatalogStore;

// =============================================================================
// Price Request
// =============================================================================

/// One line-pricing request: which article, how many, under which rate.
#[derive(Debug, Clone)]
pub struct PriceRequest {
    /// Kind discriminator for the referenced article.
    pub kind: ArticleKind,

    /// Article id; for custom beverages, the personalization id.
    pub article_id: String,

    /// Quantity ordered. Validated to 1..=999.
    pub quantity: i64,

    /// VAT rate reference. `None` or an unresolvable id both fall back
    /// to the 22.00% default.
    pub tax_rate_id: Option<String>,

    /// When present, skips derivation entirely (frozen historical price).
    /// The override still flows through the same VAT math.
    pub fixed_unit_price: Option<Money>,

    /// Optional line discount in basis points (1000 = 10%).
    pub discount_bps: Option<u32>,
}

impl PriceRequest {
    /// Creates a plain derivation request.
    pub fn new(kind: ArticleKind, article_id: impl Into<String>, quantity: i64) -> Self {
        PriceRequest {
            kind,
            article_id: article_id.into(),
            quantity,
            tax_rate_id: None,
            fixed_unit_price: None,
            discount_bps: None,
        }
    }

    /// Sets the VAT rate reference.
    pub fn with_tax_rate(mut self, tax_rate_id: impl Into<String>) -> Self {
        self.tax_rate_id = Some(tax_rate_id.into());
        self
    }

    /// Sets a fixed unit price, skipping derivation.
    pub fn with_fixed_price(mut self, unit_price: Money) -> Self {
        self.fixed_unit_price = Some(unit_price);
        self
    }

    /// Sets a line discount in basis points.
    pub fn with_discount(mut self, discount_bps: u32) -> Self {
        self.discount_bps = Some(discount_bps);
        self
    }

    /// Builds the request that reproduces an order line's price: the
    /// line's frozen unit price (when present and positive) wins over
    /// fresh derivation.
    pub fn from_order_line(line: &OrderLine) -> Self {
        PriceRequest {
            kind: line.kind,
            article_id: line.article_id.clone(),
            quantity: line.quantity,
            tax_rate_id: line.tax_rate_id.clone(),
            fixed_unit_price: line.price_override(),
            discount_bps: line.discount_bps,
        }
    }
}

// =============================================================================
// Batch Outcome
// =============================================================================

/// Aggregate result of a batch pricing run.
///
/// Items are processed independently: one failure never aborts the batch,
/// it is recorded here alongside the successes. `cancelled` means the run
/// stopped early and the remaining items appear in neither list.
#[derive(Debug)]
pub struct BatchOutcome {
    pub succeeded: Vec<(PriceRequest, LineAmounts)>,
    pub failed: Vec<(PriceRequest, EngineError)>,
    pub cancelled: bool,
}

impl BatchOutcome {
    /// True when every submitted item was priced.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }
}

// =============================================================================
// Price Service
// =============================================================================

/// Derives unit prices and complete line breakdowns over a catalog store.
#[derive(Debug)]
pub struct PriceService<C> {
    catalog: Arc<C>,
    cache: Arc<PriceCache>,
}

impl<C> Clone for PriceService<C> {
    fn clone(&self) -> Self {
        PriceService {
            catalog: Arc::clone(&self.catalog),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<C: CatalogStore> PriceService<C> {
    /// Creates a price service over a catalog store and a cache.
    pub fn new(catalog: Arc<C>, cache: Arc<PriceCache>) -> Self {
        PriceService { catalog, cache }
    }

    /// The cache this service reads through.
    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    // -------------------------------------------------------------------------
    // Unit price
    // -------------------------------------------------------------------------

    /// Derives the current unit price of an article, reading through the
    /// unit-price cache.
    pub async fn unit_price(&self, kind: ArticleKind, article_id: &str) -> EngineResult<Money> {
        let key = PriceKey::new(kind, article_id);
        let ttl = self.cache.unit_prices.default_ttl();
        self.cache
            .unit_prices
            .get_or_try_insert_with(key, ttl, || self.derive_unit_price(kind, article_id))
            .await
    }

    /// Derives the current unit price straight from the store, bypassing
    /// the cache in both directions (no read, no write-back).
    pub async fn unit_price_uncached(
        &self,
        kind: ArticleKind,
        article_id: &str,
    ) -> EngineResult<Money> {
        self.derive_unit_price(kind, article_id).await
    }

    async fn derive_unit_price(&self, kind: ArticleKind, article_id: &str) -> EngineResult<Money> {
        match kind {
            ArticleKind::StandardBeverage => {
                let beverage = self
                    .catalog
                    .standard_beverage(article_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("StandardBeverage", article_id))?;
                Ok(beverage.price())
            }
            ArticleKind::Dessert => {
                let dessert = self
                    .catalog
                    .dessert(article_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Dessert", article_id))?;
                Ok(dessert.price())
            }
            ArticleKind::CustomBeverage => {
                let personalization = self
                    .catalog
                    .personalization(article_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Personalization", article_id))?;

                // A personalization pointing at a missing cup size is a
                // broken reference, reported as the cup size being absent.
                let cup_size = self
                    .catalog
                    .cup_size(&personalization.cup_size_id)
                    .await?
                    .ok_or_else(|| {
                        EngineError::not_found("CupSize", personalization.cup_size_id.clone())
                    })?;

                let chosen = self.catalog.chosen_ingredients(article_id).await?;
                let price = custom_beverage_price(&cup_size, &chosen);
                debug!(
                    personalization_id = article_id,
                    chosen = chosen.len(),
                    price = %price,
                    "Derived custom beverage price"
                );
                Ok(price)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Tax rate resolution
    // -------------------------------------------------------------------------

    /// Resolves a VAT rate reference to a rate, reading through the
    /// tax-rate cache. Infallible: absence, corruption, and even store
    /// failure all degrade to the 22.00% default.
    async fn resolve_rate(&self, tax_rate_id: Option<&str>, use_cache: bool) -> TaxRate {
        let Some(id) = tax_rate_id else {
            return resolve_rate_or_default(None);
        };

        if use_cache {
            if let Some(row) = self.cache.tax_rates.get(id) {
                return resolve_rate_or_default(Some(&row));
            }
        }

        match self.catalog.tax_rate(id).await {
            Ok(Some(row)) => {
                if use_cache {
                    self.cache.tax_rates.insert(id.to_string(), row.clone());
                }
                resolve_rate_or_default(Some(&row))
            }
            Ok(None) => {
                debug!(tax_rate_id = id, "Tax rate id unresolved, using default");
                resolve_rate_or_default(None)
            }
            Err(err) => {
                // A failing rate lookup must not fail the price.
                warn!(tax_rate_id = id, error = %err, "Tax rate lookup failed, using default");
                resolve_rate_or_default(None)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Line price
    // -------------------------------------------------------------------------

    /// Computes the complete breakdown for one line (cached reads).
    pub async fn line_price(&self, request: &PriceRequest) -> EngineResult<LineAmounts> {
        self.line_price_inner(request, true).await
    }

    /// Computes the complete breakdown for one line straight from the
    /// store. Used by the consistency validator.
    pub async fn line_price_uncached(&self, request: &PriceRequest) -> EngineResult<LineAmounts> {
        self.line_price_inner(request, false).await
    }

    async fn line_price_inner(
        &self,
        request: &PriceRequest,
        use_cache: bool,
    ) -> EngineResult<LineAmounts> {
        validate_quantity(request.quantity)?;
        if let Some(discount) = request.discount_bps {
            validate_discount_bps(discount)?;
        }
        if let Some(fixed) = request.fixed_unit_price {
            validate_price_cents(fixed.cents())?;
        }

        let unit_price = match request.fixed_unit_price {
            Some(fixed) => fixed,
            None if use_cache => self.unit_price(request.kind, &request.article_id).await?,
            None => {
                self.unit_price_uncached(request.kind, &request.article_id)
                    .await?
            }
        };

        let rate = self
            .resolve_rate(request.tax_rate_id.as_deref(), use_cache)
            .await;

        Ok(line_amounts(
            unit_price,
            request.quantity,
            rate,
            request.discount_bps,
        ))
    }

    // -------------------------------------------------------------------------
    // Batch pricing
    // -------------------------------------------------------------------------

    /// Prices a batch of requests, each independently.
    ///
    /// A failing item is recorded in the outcome and the batch moves on.
    /// The cancel flag is checked between items: once set, the remaining
    /// items are skipped and `cancelled` is reported.
    pub async fn price_batch(
        &self,
        requests: Vec<PriceRequest>,
        cancel: Option<&AtomicBool>,
    ) -> BatchOutcome {
        let total = requests.len();
        let mut outcome = BatchOutcome {
            succeeded: Vec::new(),
            failed: Vec::new(),
            cancelled: false,
        };

        for request in requests {
            if cancel.map(|flag| flag.load(Ordering::Relaxed)).unwrap_or(false) {
                outcome.cancelled = true;
                break;
            }

            match self.line_price(&request).await {
                Ok(amounts) => outcome.succeeded.push((request, amounts)),
                Err(err) => {
                    debug!(article_id = %request.article_id, error = %err, "Batch item failed");
                    outcome.failed.push((request, err));
                }
            }
        }

        info!(
            total,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            cancelled = outcome.cancelled,
            "Batch pricing finished"
        );
        outcome
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
