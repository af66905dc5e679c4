//! # crema-core: Pure Business Logic for the CremaPOS Pricing Engine
//!
//! This crate is the **heart** of the pricing engine. It contains all
//! price and VAT math as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     CremaPOS Pricing Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Host Service (ordering backend, CRUD layer)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ store traits                           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    crema-engine                                 │   │
//! │  │    PriceService, TtlCache, OrderTotalizer, drift audit          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ crema-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   types   │  │   money   │  │    tax    │  │  pricing  │   │   │
//! │  │   │  Article  │  │   Money   │  │ gross/net │  │  custom   │   │   │
//! │  │   │ OrderLine │  │  rounding │  │ imponibile│  │  beverage │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (articles, cup sizes, orders, `TaxRate`)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`tax`] - Inclusive-VAT decomposition (gross → net/imponibile/tax)
//! - [`pricing`] - Pure price formulas (custom-beverage composition)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Round Once**: Intermediate math runs at full precision; values are
//!    rounded to whole cents only when they become final
//! 5. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use crema_core::money::Money;
//! use crema_core::tax::{gross_to_net, tax_portion};
//! use crema_core::types::TaxRate;
//!
//! // A VAT-inclusive price of €12.20 at 10% VAT
//! let gross = Money::from_cents(1220);
//! let rate = TaxRate::from_bps(1000); // 10.00%
//!
//! assert_eq!(gross_to_net(gross, rate).cents(), 1109); // €11.09 net
//! assert_eq!(tax_portion(gross, rate).cents(), 111);   // €1.11 VAT
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use crema_core::Money` instead of
// `use crema_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use tax::{LineAmounts, DEFAULT_VAT_BPS};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single article on an order line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
/// Can be made configurable per-venue in future versions.
pub const MAX_LINE_QUANTITY: i64 = 999;
