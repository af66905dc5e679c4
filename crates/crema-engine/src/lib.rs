//! # CremaPOS Engine
//!
//! The async pricing engine: catalog-backed price derivation, order total
//! aggregation, a best-effort TTL cache, and the consistency validator
//! that audits persisted money against fresh recomputation.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         crema-engine                                    │
//! │                                                                         │
//! │  ┌──────────────┐     ┌──────────────┐     ┌──────────────────────┐    │
//! │  │ PriceService │────►│  PriceCache  │     │ ConsistencyValidator │    │
//! │  │ (derivation) │     │  (TTL, best  │     │ (audit, cache-       │    │
//! │  └──────┬───────┘     │   effort)    │     │  bypassing)          │    │
//! │         │             └──────────────┘     └──────────┬───────────┘    │
//! │         ▼                                             │                │
//! │  ┌──────────────┐                                     │                │
//! │  │OrderTotalizer│◄────────────────────────────────────┘                │
//! │  │ (aggregate + │                                                      │
//! │  │  write back) │                                                      │
//! │  └──────┬───────┘                                                      │
//! │         │                                                              │
//! │         ▼                                                              │
//! │  CatalogStore / OrderStore traits ──► host CRUD layer (or the         │
//! │                                       in-memory stores for tests)      │
//! │                                                                        │
//! │  Pure math (money, VAT, composition) lives in crema-core.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use crema_engine::cache::PriceCache;
//! use crema_engine::config::EngineConfig;
//! use crema_engine::memory::{MemoryCatalog, MemoryOrders};
//! use crema_engine::orders::OrderTotalizer;
//! use crema_engine::pricing::PriceService;
//!
//! # async fn run() -> crema_engine::error::EngineResult<()> {
//! let config = EngineConfig::default();
//! let pricing = PriceService::new(
//!     Arc::new(MemoryCatalog::new()),
//!     Arc::new(PriceCache::new(&config)),
//! );
//! let totalizer = OrderTotalizer::new(pricing, Arc::new(MemoryOrders::new()));
//! let totals = totalizer.compute_order_total("some-order-id").await?;
//! println!("grand total: {}", totals.grand_total);
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod cache;
pub mod config;
pub mod error;
pub mod memory;
pub mod orders;
pub mod pricing;
pub mod store;

pub use audit::{ConsistencyValidator, DriftReport, TotalDrift};
pub use cache::{CacheStats, PriceCache, PriceKey, TtlCache};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use orders::{OrderTotalizer, OrderTotals, TotalAdjustment};
pub use pricing::{BatchOutcome, PriceRequest, PriceService};
pub use store::{CatalogStore, OrderStore};
