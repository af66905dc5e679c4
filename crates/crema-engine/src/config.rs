//! # Engine Configuration
//!
//! Tunable cache TTLs and validation tolerances, loaded from environment
//! variables with fallback to defaults.
//!
//! ## Cache Domain TTLs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Domain               Default TTL    Why                               │
//! │  ──────────────────   ───────────    ────────────────────────────────  │
//! │  VAT rate table       24 hours       changes rarely                    │
//! │  Cup sizes /          1 hour         catalog edits are infrequent      │
//! │   ingredients                                                          │
//! │  Per-article price    30 minutes     derived, invalidated on edits     │
//! │  Menu snapshots       15 minutes     most volatile aggregates          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Tolerances, Deliberately
//! Order-total drift uses a flat absolute tolerance (default 1 cent);
//! single-price claim validation uses a relative tolerance (default 5%).
//! They are kept separate and separately configurable - unifying them
//! would silently change which records get flagged.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// TTL for cached VAT rate rows.
    pub tax_rate_ttl: Duration,

    /// TTL for cached cup-size / ingredient catalog records.
    pub catalog_ttl: Duration,

    /// TTL for cached per-article derived unit prices.
    pub unit_price_ttl: Duration,

    /// TTL for cached menu / statistics snapshots.
    pub menu_ttl: Duration,

    /// Absolute order-total drift tolerance in cents. A stored total
    /// deviating from a fresh recomputation by MORE than this is flagged.
    pub drift_tolerance_cents: i64,

    /// Relative tolerance for single-price claim validation, in basis
    /// points (500 = 5%). Absorbs rounding artifacts in claimed prices.
    pub price_claim_tolerance_bps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            tax_rate_ttl: Duration::from_secs(24 * 60 * 60),
            catalog_ttl: Duration::from_secs(60 * 60),
            unit_price_ttl: Duration::from_secs(30 * 60),
            menu_ttl: Duration::from_secs(15 * 60),
            drift_tolerance_cents: 1,
            price_claim_tolerance_bps: 500,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; missing ones keep their default.
    ///
    /// | Variable                          | Unit    |
    /// |-----------------------------------|---------|
    /// | `CREMA_TAX_RATE_TTL_SECS`         | seconds |
    /// | `CREMA_CATALOG_TTL_SECS`          | seconds |
    /// | `CREMA_UNIT_PRICE_TTL_SECS`       | seconds |
    /// | `CREMA_MENU_TTL_SECS`             | seconds |
    /// | `CREMA_DRIFT_TOLERANCE_CENTS`     | cents   |
    /// | `CREMA_PRICE_CLAIM_TOLERANCE_BPS` | bps     |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = EngineConfig::default();

        Ok(EngineConfig {
            tax_rate_ttl: env_duration_secs("CREMA_TAX_RATE_TTL_SECS", defaults.tax_rate_ttl)?,
            catalog_ttl: env_duration_secs("CREMA_CATALOG_TTL_SECS", defaults.catalog_ttl)?,
            unit_price_ttl: env_duration_secs(
                "CREMA_UNIT_PRICE_TTL_SECS",
                defaults.unit_price_ttl,
            )?,
            menu_ttl: env_duration_secs("CREMA_MENU_TTL_SECS", defaults.menu_ttl)?,
            drift_tolerance_cents: env_parse(
                "CREMA_DRIFT_TOLERANCE_CENTS",
                defaults.drift_tolerance_cents,
            )?,
            price_claim_tolerance_bps: env_parse(
                "CREMA_PRICE_CLAIM_TOLERANCE_BPS",
                defaults.price_claim_tolerance_bps,
            )?,
        })
    }
}

fn env_duration_secs(var: &str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidValue(var.to_string())),
        Err(_) => Ok(default),
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(var.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
