//! # Validation Module
//!
//! Input validation for pricing requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Host service / API surface                                   │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate caller feedback                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - engine preconditions                           │
//! │  ├── quantity > 0                                                      │
//! │  ├── rate / discount within [0, 100]%                                  │
//! │  └── price ≥ 0                                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store (constraints owned by the CRUD layer)                  │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use crema_core::validation::{validate_quantity, validate_discount_bps};
//!
//! validate_quantity(3).unwrap();
//! validate_discount_bps(1000).unwrap(); // 10%
//! ```

use crate::error::ValidationError;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order-line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
///
/// Note this guards explicit caller-supplied rates. Unresolvable rate
/// *ids* are not an error - they fall back to the default rate instead.
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates a discount in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_discount_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Rules
/// - Must be a valid UUID format
/// - 36 characters with hyphens: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
