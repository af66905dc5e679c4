//! # Domain Types
//!
//! Core domain types consumed by the pricing engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │ StandardBeverage │   │ Personalization  │   │     Dessert      │    │
//! │  │  ──────────────  │   │  ──────────────  │   │  ──────────────  │    │
//! │  │  price_cents     │   │  cup_size_id     │   │  price_cents     │    │
//! │  │  always_orderable│   │  (+ chosen       │   └──────────────────┘    │
//! │  │  priority        │   │   ingredients)   │                           │
//! │  └──────────────────┘   └──────────────────┘                           │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │     CupSize      │   │    Ingredient    │   │     TaxRate      │    │
//! │  │  ──────────────  │   │  ──────────────  │   │  ──────────────  │    │
//! │  │  base_price      │   │  surcharge_cents │   │  bps (u32)       │    │
//! │  │  multiplier_bps  │   │  available       │   │  2200 = 22.00%   │    │
//! │  └──────────────────┘   └──────────────────┘   └──────────────────┘    │
//! │                                                                         │
//! │  Order { status, total_cents } ──1:N──► OrderLine { kind, quantity,    │
//! │                                          tax_rate_id, total_cents }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has a UUID v4 `id` - immutable, used for store relations.
//! The engine never mutates catalog entities; it only reads them and writes
//! back order totals through the order store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2200 bps = 22.00% (Italian standard VAT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Article Kind
// =============================================================================

/// The kind discriminator for priceable articles.
///
/// ## Closed Set
/// This is a closed enum: every pricing path matches on it exhaustively,
/// so adding a kind is a compile-time exhaustiveness failure in each match
/// rather than a silent default branch. Unknown discriminators coming from
/// outside the type system (e.g. a raw store column) are rejected at parse
/// time with [`CoreError::UnsupportedKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleKind {
    /// Fixed-price beverage from the standard menu.
    StandardBeverage,
    /// Fully custom beverage priced from its personalization
    /// (cup size + chosen ingredients).
    CustomBeverage,
    /// Fixed-price dessert.
    Dessert,
}

impl fmt::Display for ArticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArticleKind::StandardBeverage => "standard_beverage",
            ArticleKind::CustomBeverage => "custom_beverage",
            ArticleKind::Dessert => "dessert",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ArticleKind {
    type Err = CoreError;

    /// Parses a raw kind discriminator.
    ///
    /// This is the single entry point for discriminators arriving from
    /// outside the type system; anything outside the three known kinds
    /// is an `UnsupportedKind` error, never a default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard_beverage" => Ok(ArticleKind::StandardBeverage),
            "custom_beverage" => Ok(ArticleKind::CustomBeverage),
            "dessert" => Ok(ArticleKind::Dessert),
            other => Err(CoreError::UnsupportedKind {
                kind: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Catalog Records
// =============================================================================

/// A beverage from the standard menu with a fixed unit price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardBeverage {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the menu.
    pub name: String,

    /// Fixed unit price in cents.
    pub price_cents: i64,

    /// `true`: always orderable; `false`: orderable only while the linked
    /// personalization's ingredients are available. Availability is computed
    /// by an external collaborator - it never affects the price.
    pub always_orderable: bool,

    /// Display ranking on the menu. Irrelevant to pricing.
    pub priority: i32,
}

impl StandardBeverage {
    /// Returns the fixed unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A cup size with a base price and an ingredient surcharge multiplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CupSize {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name ("small", "medium", ...).
    pub name: String,

    /// Base price in cents for an empty cup of this size.
    pub base_price_cents: i64,

    /// Surcharge multiplier in basis points (10000 = ×1.00, 13000 = ×1.30).
    /// Applied to every ingredient surcharge for this size. Never negative.
    pub multiplier_bps: u32,
}

impl CupSize {
    /// Returns the base price as Money.
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

/// An ingredient that can be added to a custom beverage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Per-unit surcharge in cents, before the cup-size multiplier.
    pub surcharge_cents: i64,

    /// Unavailable ingredients contribute nothing to a custom-beverage
    /// price. They do not make the beverage unorderable here.
    pub available: bool,
}

impl Ingredient {
    /// Returns the surcharge as Money.
    #[inline]
    pub fn surcharge(&self) -> Money {
        Money::from_cents(self.surcharge_cents)
    }
}

/// A custom-beverage personalization: a cup size plus an ordered set of
/// chosen ingredients (each chosen ingredient counts once - there is no
/// per-ingredient quantity).
///
/// The chosen-ingredient set is resolved through the catalog store
/// (`chosen_ingredients(personalization_id)`), mirroring the join table
/// in the surrounding CRUD schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personalization {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The cup size this personalization is built on.
    pub cup_size_id: String,
}

/// A dessert with a fixed unit price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dessert {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Fixed unit price in cents.
    pub price_cents: i64,
}

impl Dessert {
    /// Returns the fixed unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A row of the VAT rate table.
///
/// Rates are always looked up by id; an unresolvable id falls back to the
/// 22.00% default via [`crate::tax::resolve_rate_or_default`], never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VatRate {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The rate in basis points (2200 = 22.00%). Valid range 0..=10000.
    pub rate_bps: u32,
}

impl VatRate {
    /// Returns the rate as a TaxRate.
    #[inline]
    pub fn rate(&self) -> TaxRate {
        TaxRate::from_bps(self.rate_bps)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order is in progress; totals may be recomputed.
    Open,
    /// Order has been paid and finalized.
    Completed,
    /// Order was cancelled.
    Cancelled,
}

impl OrderStatus {
    /// Terminal orders are frozen financial records: the aggregator
    /// refuses to recompute them.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Open
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Open => "open",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Order & Order Line
// =============================================================================

/// An order: a collection of lines plus a persisted grand total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    /// Persisted grand total in cents (VAT inclusive). This is the value
    /// the consistency validator compares against a fresh recomputation.
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the persisted grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item on an order.
/// Uses the snapshot pattern to freeze the agreed price at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,

    /// For standard beverages and desserts this is the article id;
    /// for custom beverages it is the personalization id.
    pub article_id: String,

    /// Kind discriminator for the referenced article.
    pub kind: ArticleKind,

    /// Quantity ordered. Must be > 0.
    pub quantity: i64,

    /// VAT rate reference. `None` or an unresolvable id both fall back
    /// to the 22.00% default.
    pub tax_rate_id: Option<String>,

    /// Agreed unit price in cents, frozen at order time. When present and
    /// positive it overrides derivation (historical order reproduction);
    /// the override still flows through the same VAT math.
    pub unit_price_cents: Option<i64>,

    /// Optional line discount in basis points (1000 = 10%).
    pub discount_bps: Option<u32>,

    /// Persisted pre-computed gross line total in cents (the "stored
    /// total" the validator may re-derive and compare against).
    pub total_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    /// Returns the stored gross line total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the frozen unit price override, if present and positive.
    #[inline]
    pub fn price_override(&self) -> Option<Money> {
        self.unit_price_cents
            .filter(|cents| *cents > 0)
            .map(Money::from_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
