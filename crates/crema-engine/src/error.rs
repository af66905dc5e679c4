//! # Engine Error Types
//!
//! Error types for engine operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  CoreError (crema-core)          Store failure (collaborator)          │
//! │       │                               │                                 │
//! │       └───────────┬───────────────────┘                                 │
//! │                   ▼                                                     │
//! │  EngineError (this module) ← one surface for engine callers            │
//! │       │                                                                 │
//! │       ├── single-item operations: propagated to the caller             │
//! │       │                                                                 │
//! │       └── batch operations: caught per item, recorded in the           │
//! │           aggregate outcome, never aborting the batch                  │
//! │                                                                         │
//! │  Cache failures are NOT here: a cold or failing cache degrades to      │
//! │  "recompute directly", logged but never raised.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crema_core::error::{CoreError, ValidationError};
use thiserror::Error;

/// Engine operation errors.
///
/// Wraps core domain errors and adds the store-failure surface the
/// collaborating persistence layer can report through.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A pricing domain error (NotFound, UnsupportedKind, terminal order,
    /// invalid argument).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The collaborator store failed (connection, query, timeout).
    ///
    /// ## When This Occurs
    /// - Database connection failures in the host CRUD layer
    /// - Query errors surfaced through a store trait implementation
    #[error("Store operation failed: {0}")]
    Store(String),
}

impl EngineError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        EngineError::Core(CoreError::not_found(entity, id))
    }

    /// Creates a store-failure error.
    pub fn store(message: impl Into<String>) -> Self {
        EngineError::Store(message.into())
    }

    /// True when this error is a missing-entity error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::Core(CoreError::NotFound { .. }))
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_helper() {
        let err = EngineError::not_found("Dessert", "d-7");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Dessert not found: d-7");
    }

    #[test]
    fn test_validation_converts_through_core() {
        let err: EngineError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::Core(CoreError::Validation(_))));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_store_error_message() {
        let err = EngineError::store("connection reset");
        assert_eq!(err.to_string(), "Store operation failed: connection reset");
    }
}
