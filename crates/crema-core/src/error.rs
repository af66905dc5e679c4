//! # Error Types
//!
//! Domain-specific error types for crema-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  crema-core errors (this file)                                         │
//! │  ├── CoreError        - Pricing domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  crema-engine errors (separate crate)                                  │
//! │  └── EngineError      - Core errors + store failures                   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Host service        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity, id, kind)
//! 3. Errors are enum variants, never String
//! 4. Tax-rate resolution failure is NOT here: an unresolvable rate id
//!    silently falls back to the default rate, by contract

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Pricing domain errors.
///
/// These errors represent business rule violations or derivation failures.
/// Single-item derivation errors always propagate to the immediate caller;
/// only batch operations catch and record them per item.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity has no matching record for its kind.
    ///
    /// ## When This Occurs
    /// - Article id with no standard-beverage / dessert record
    /// - Personalization id that does not exist
    /// - Personalization referencing a non-existent cup size
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Kind discriminator outside the three known article kinds.
    ///
    /// Only reachable when parsing a raw discriminator coming from outside
    /// the type system; in-process code carries `ArticleKind` and is
    /// checked exhaustively at compile time.
    #[error("Unsupported article kind: {kind}")]
    UnsupportedKind { kind: String },

    /// Order is in a terminal state not eligible for recomputation.
    ///
    /// ## When This Occurs
    /// - Recomputing totals for a completed order
    /// - Recomputing totals for a cancelled order
    #[error("Order {order_id} is {current_status}, cannot recompute totals")]
    InvalidOrderStatus {
        order_id: String,
        current_status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before derivation runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::not_found("CupSize", "c-42");
        assert_eq!(err.to_string(), "CupSize not found: c-42");

        let err = CoreError::InvalidOrderStatus {
            order_id: "o-1".to_string(),
            current_status: "completed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Order o-1 is completed, cannot recompute totals"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "article_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
