//! # Store Traits
//!
//! The narrow read/write contracts the engine has with the surrounding
//! CRUD layer. The engine never owns a database connection: catalog
//! lookups and order persistence go through these seams, and the host
//! service supplies the implementation.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Store Contract                                       │
//! │                                                                         │
//! │  Absent id        →  Ok(None)      (graceful: caller decides whether   │
//! │                                     that's NotFound or a fallback)     │
//! │  Store failure    →  Err(Store)    (connection, query, timeout)        │
//! │                                                                         │
//! │  The ONLY write the engine performs is save_order_total: catalog       │
//! │  entities are strictly read-only here.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Write serialization for the same order row is the host layer's job;
//! the engine takes no per-order lock.

use async_trait::async_trait;

use crema_core::money::Money;
use crema_core::types::{
    ArticleKind, CupSize, Dessert, Ingredient, Order, OrderLine, Personalization,
    StandardBeverage, VatRate,
};

use crate::error::EngineResult;

// =============================================================================
// Catalog Store
// =============================================================================

/// Read-only lookups over the priced catalog.
///
/// Implementations must return `Ok(None)` for absent ids rather than an
/// error; the pricing layer decides which absences are `NotFound` (missing
/// article, missing cup size) and which fall back gracefully (tax rate).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Resolves the kind discriminator for an article id.
    async fn article_kind(&self, id: &str) -> EngineResult<Option<ArticleKind>>;

    /// Fetches a standard beverage by id.
    async fn standard_beverage(&self, id: &str) -> EngineResult<Option<StandardBeverage>>;

    /// Fetches a custom-beverage personalization by id.
    async fn personalization(&self, id: &str) -> EngineResult<Option<Personalization>>;

    /// Fetches a cup size by id.
    async fn cup_size(&self, id: &str) -> EngineResult<Option<CupSize>>;

    /// Fetches an ingredient by id.
    async fn ingredient(&self, id: &str) -> EngineResult<Option<Ingredient>>;

    /// Resolves the chosen-ingredient set of a personalization, in
    /// chosen order. Each chosen ingredient counts once.
    async fn chosen_ingredients(&self, personalization_id: &str)
        -> EngineResult<Vec<Ingredient>>;

    /// Fetches a dessert by id.
    async fn dessert(&self, id: &str) -> EngineResult<Option<Dessert>>;

    /// Fetches a VAT rate row by id. `Ok(None)` triggers the 22.00%
    /// default downstream - never an error.
    async fn tax_rate(&self, id: &str) -> EngineResult<Option<VatRate>>;

    /// Lists the full VAT rate table (cache preload).
    async fn all_tax_rates(&self) -> EngineResult<Vec<VatRate>>;

    /// Lists all cup sizes (cache preload).
    async fn all_cup_sizes(&self) -> EngineResult<Vec<CupSize>>;

    /// Lists all ingredients (cache preload).
    async fn all_ingredients(&self) -> EngineResult<Vec<Ingredient>>;
}

// =============================================================================
// Order Store
// =============================================================================

/// Read access to orders plus the single write-back the engine performs.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetches an order by id.
    async fn order(&self, id: &str) -> EngineResult<Option<Order>>;

    /// Fetches the lines of an order, in line order.
    async fn order_lines(&self, order_id: &str) -> EngineResult<Vec<OrderLine>>;

    /// Persists a freshly computed grand total on the order.
    ///
    /// The surrounding transaction layer is responsible for serializing
    /// concurrent writes to the same order row.
    async fn save_order_total(&self, order_id: &str, total: Money) -> EngineResult<()>;

    /// Lists non-terminal orders (the consistency validator's scan set).
    async fn open_orders(&self) -> EngineResult<Vec<Order>>;
}
