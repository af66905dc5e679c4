//! # Cache Layer
//!
//! A generic key→value store with per-entry TTL, plus the `PriceCache`
//! façade that groups the engine's known cache domains.
//!
//! ## Position In The Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cache Layer                                        │
//! │                                                                         │
//! │  PriceService ──► unit_prices (30 min) ──miss──► CatalogStore          │
//! │       │                                                                 │
//! │       ├────────► tax_rates   (24 h)    ──miss──► CatalogStore          │
//! │       │                                                                 │
//! │       └────────► cup_sizes / ingredients (1 h)                         │
//! │                                                                         │
//! │  BEST EFFORT, NEVER A SOURCE OF TRUTH:                                 │
//! │  a cold, cleared, or expired cache only means "recompute directly".    │
//! │  Correctness never depends on the cache being warm.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! Entries live behind `std::sync::RwLock`; hit/miss counters are atomics.
//! Callers never need to lock around cache calls. `get_or_*` helpers do
//! NOT hold the lock across the factory: concurrent callers missing the
//! same key may each run the factory (factories are pure and idempotent,
//! so duplicate computation under races is tolerated, not prevented).

use std::borrow::Borrow;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crema_core::money::Money;
use crema_core::types::{ArticleKind, CupSize, Ingredient, VatRate};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::store::CatalogStore;

// =============================================================================
// Statistics
// =============================================================================

/// Cumulative hit/miss counters for one cache instance.
///
/// Owned by the cache (shared via `Arc`), NOT process-global: lifecycle
/// and reset are tied to the instance that records into it.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Total recorded hits.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total recorded misses.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Total accesses (hits + misses).
    pub fn accesses(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// `hits / (hits + misses)`, defined as 0.0 when nothing was accessed.
    pub fn hit_rate(&self) -> f64 {
        let accesses = self.accesses();
        if accesses == 0 {
            0.0
        } else {
            self.hits() as f64 / accesses as f64
        }
    }

    /// Zeroes both counters.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Point-in-time copy for reporting.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// Serializable statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

// =============================================================================
// TTL Cache
// =============================================================================

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A thread-safe key→value cache with per-entry TTL.
///
/// Once an entry's TTL elapses it is no longer authoritative: reads treat
/// it as a miss and evict it lazily. Expired entries are also reclaimed
/// by [`TtlCache::purge_expired`].
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    stats: Arc<CacheStats>,
    default_ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache with its own statistics instance.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_stats(default_ttl, Arc::new(CacheStats::default()))
    }

    /// Creates a cache recording into a shared statistics instance
    /// (used by `PriceCache` to aggregate across domains).
    pub fn with_stats(default_ttl: Duration, stats: Arc<CacheStats>) -> Self {
        TtlCache {
            entries: RwLock::new(HashMap::new()),
            stats,
            default_ttl,
        }
    }

    /// The statistics this cache records into.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// The TTL used when none is given explicitly.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the cached value, or `None` on miss.
    ///
    /// An expired entry counts as a miss and is evicted on the spot.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        {
            let entries = self.entries.read().expect("cache lock poisoned");
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    self.stats.record_hit();
                    return Some(entry.value.clone());
                }
                Some(_) => {} // expired: fall through to evict
                None => {
                    self.stats.record_miss();
                    return None;
                }
            }
        }

        // Lazy eviction of the expired entry. Re-check under the write
        // lock: another thread may have refreshed it meanwhile.
        let mut entries = self.entries.write().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Stores a value under an explicit TTL.
    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(
            key,
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Stores a value under the cache's default TTL.
    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    /// Removes an entry. Returns `true` if it was present.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.remove(key).is_some()
    }

    /// `true` if a fresh (unexpired) entry exists. Does not touch
    /// the hit/miss counters - existence checks are not accesses.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let entries = self.entries.read().expect("cache lock poisoned");
        entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    /// Re-arms an existing entry under a new TTL without recomputing its
    /// value. Returns `false` (no-op) if the key is absent or expired.
    pub fn refresh<Q>(&self, key: &Q, new_ttl: Duration) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let mut entries = self.entries.write().expect("cache lock poisoned");
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.expires_at = now + new_ttl;
                true
            }
            _ => false,
        }
    }

    /// Returns the cached value, or runs `factory`, stores its result
    /// under `ttl`, and returns it.
    ///
    /// Concurrent callers missing the same key may each run the factory;
    /// the last insert wins. See the module docs.
    pub fn get_or_insert_with<F>(&self, key: K, ttl: Duration, factory: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = factory();
        self.insert_with_ttl(key, value.clone(), ttl);
        value
    }

    /// Async, fallible variant of [`TtlCache::get_or_insert_with`].
    /// A factory error is returned to the caller and nothing is cached.
    pub async fn get_or_try_insert_with<E, F, Fut>(
        &self,
        key: K,
        ttl: Duration,
        factory: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = factory().await?;
        self.insert_with_ttl(key, value.clone(), ttl);
        Ok(value)
    }

    /// Looks up each key independently.
    pub fn get_many(&self, keys: &[K]) -> BulkLookup<K, V> {
        let mut outcome = BulkLookup {
            found: Vec::new(),
            missing: Vec::new(),
        };
        for key in keys {
            match self.get(key) {
                Some(value) => outcome.found.push((key.clone(), value)),
                None => outcome.missing.push(key.clone()),
            }
        }
        outcome
    }

    /// Stores each pair independently under one TTL. Returns the number
    /// of entries stored.
    pub fn insert_many(&self, items: Vec<(K, V)>, ttl: Duration) -> usize {
        let expires_at = Instant::now() + ttl;
        let mut entries = self.entries.write().expect("cache lock poisoned");
        let count = items.len();
        for (key, value) in items {
            entries.insert(key, Entry { value, expires_at });
        }
        count
    }

    /// Removes each key independently, reporting which were present.
    pub fn remove_many(&self, keys: &[K]) -> BulkRemoval<K> {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        let mut outcome = BulkRemoval {
            removed: Vec::new(),
            missing: Vec::new(),
        };
        for key in keys {
            if entries.remove(key).is_some() {
                outcome.removed.push(key.clone());
            } else {
                outcome.missing.push(key.clone());
            }
        }
        outcome
    }

    /// Number of stored entries, expired ones included
    /// (call [`TtlCache::purge_expired`] first for an exact live count).
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    /// `true` when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. Statistics are left untouched.
    pub fn clear(&self) {
        self.entries.write().expect("cache lock poisoned").clear();
    }

    /// Eagerly drops expired entries. Returns how many were reclaimed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().expect("cache lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}

/// Aggregate result of a bulk lookup: every key is processed
/// independently, and a single miss never fails the batch.
#[derive(Debug, Clone)]
pub struct BulkLookup<K, V> {
    pub found: Vec<(K, V)>,
    pub missing: Vec<K>,
}

/// Aggregate result of a bulk removal.
#[derive(Debug, Clone)]
pub struct BulkRemoval<K> {
    pub removed: Vec<K>,
    pub missing: Vec<K>,
}

// =============================================================================
// Price Cache (known domains)
// =============================================================================

/// Cache key for a derived per-article unit price.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceKey {
    pub kind: ArticleKind,
    /// Article id, or personalization id for custom beverages.
    pub article_id: String,
}

impl PriceKey {
    pub fn new(kind: ArticleKind, article_id: impl Into<String>) -> Self {
        PriceKey {
            kind,
            article_id: article_id.into(),
        }
    }
}

/// The engine's known cache domains, with one shared statistics instance.
///
/// ## Domains
/// - `tax_rates`: VAT rate table rows (long TTL, changes rarely)
/// - `cup_sizes` / `ingredients`: catalog snapshots
/// - `unit_prices`: derived per-article unit prices
/// - `menu`: aggregated menu/statistics snapshots (most volatile)
///
/// `preload`/`clear_all` are operational escape hatches, not part of the
/// pricing correctness contract.
#[derive(Debug)]
pub struct PriceCache {
    stats: Arc<CacheStats>,
    pub tax_rates: TtlCache<String, VatRate>,
    pub cup_sizes: TtlCache<String, CupSize>,
    pub ingredients: TtlCache<String, Ingredient>,
    pub unit_prices: TtlCache<PriceKey, Money>,
    pub menu: TtlCache<String, serde_json::Value>,
}

impl PriceCache {
    /// Creates the domain caches with the configured TTLs.
    pub fn new(config: &EngineConfig) -> Self {
        let stats = Arc::new(CacheStats::default());
        PriceCache {
            tax_rates: TtlCache::with_stats(config.tax_rate_ttl, Arc::clone(&stats)),
            cup_sizes: TtlCache::with_stats(config.catalog_ttl, Arc::clone(&stats)),
            ingredients: TtlCache::with_stats(config.catalog_ttl, Arc::clone(&stats)),
            unit_prices: TtlCache::with_stats(config.unit_price_ttl, Arc::clone(&stats)),
            menu: TtlCache::with_stats(config.menu_ttl, Arc::clone(&stats)),
            stats,
        }
    }

    /// Aggregate hit/miss statistics across all domains.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Drops a derived unit price (e.g. after a catalog edit).
    /// Returns `true` if an entry was present.
    pub fn invalidate_unit_price(&self, key: &PriceKey) -> bool {
        debug!(article_id = %key.article_id, "Invalidating cached unit price");
        self.unit_prices.remove(key)
    }

    /// Eagerly populates the tax-rate and catalog domains from the store.
    pub async fn preload<C>(&self, catalog: &C) -> EngineResult<PreloadReport>
    where
        C: CatalogStore + ?Sized,
    {
        let rates = catalog.all_tax_rates().await?;
        let report_rates = self.tax_rates.insert_many(
            rates.into_iter().map(|r| (r.id.clone(), r)).collect(),
            self.tax_rates.default_ttl(),
        );

        let cups = catalog.all_cup_sizes().await?;
        let report_cups = self.cup_sizes.insert_many(
            cups.into_iter().map(|c| (c.id.clone(), c)).collect(),
            self.cup_sizes.default_ttl(),
        );

        let ingredients = catalog.all_ingredients().await?;
        let report_ingredients = self.ingredients.insert_many(
            ingredients.into_iter().map(|i| (i.id.clone(), i)).collect(),
            self.ingredients.default_ttl(),
        );

        let report = PreloadReport {
            tax_rates: report_rates,
            cup_sizes: report_cups,
            ingredients: report_ingredients,
        };
        info!(
            tax_rates = report.tax_rates,
            cup_sizes = report.cup_sizes,
            ingredients = report.ingredients,
            "Cache preloaded"
        );
        Ok(report)
    }

    /// Drops every known domain and resets statistics.
    pub fn clear_all(&self) {
        self.tax_rates.clear();
        self.cup_sizes.clear();
        self.ingredients.clear();
        self.unit_prices.clear();
        self.menu.clear();
        self.stats.reset();
        info!("All cache domains cleared, statistics reset");
    }
}

/// How many entries each domain received during preload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadReport {
    pub tax_rates: usize,
    pub cup_sizes: usize,
    pub ingredients: usize,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_round_trip() {
        let cache: TtlCache<String, i64> = TtlCache::new(TTL);
        cache.insert("a".to_string(), 42);
        assert_eq!(cache.get("a"), Some(42));
        assert!(cache.contains("a"));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache: TtlCache<String, i64> = TtlCache::new(TTL);
        cache.insert_with_ttl("a".to_string(), 42, Duration::from_millis(5));

        thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.get("a"), None);
        assert!(!cache.contains("a"));
        // The expired entry was lazily evicted
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_and_contains() {
        let cache: TtlCache<String, i64> = TtlCache::new(TTL);
        cache.insert("a".to_string(), 1);

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert!(!cache.contains("a"));
    }

    #[test]
    fn test_refresh_extends_and_reports_absence() {
        let cache: TtlCache<String, i64> = TtlCache::new(TTL);
        cache.insert_with_ttl("a".to_string(), 1, Duration::from_millis(30));

        // Re-arm well past the original deadline
        assert!(cache.refresh("a", Duration::from_secs(60)));
        thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("a"), Some(1));

        // Absent key: no-op failure
        assert!(!cache.refresh("missing", Duration::from_secs(60)));
    }

    #[test]
    fn test_hit_rate_bookkeeping() {
        let cache: TtlCache<String, i64> = TtlCache::new(TTL);
        assert_eq!(cache.stats().hit_rate(), 0.0); // no accesses yet

        cache.insert("a".to_string(), 1);
        cache.get("a"); // hit
        cache.get("a"); // hit
        cache.get("b"); // miss

        assert_eq!(cache.stats().hits(), 2);
        assert_eq!(cache.stats().misses(), 1);
        assert!((cache.stats().hit_rate() - 2.0 / 3.0).abs() < 1e-9);

        cache.stats().reset();
        assert_eq!(cache.stats().accesses(), 0);
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }

    #[test]
    fn test_contains_does_not_count_as_access() {
        let cache: TtlCache<String, i64> = TtlCache::new(TTL);
        cache.insert("a".to_string(), 1);
        cache.contains("a");
        cache.contains("b");
        assert_eq!(cache.stats().accesses(), 0);
    }

    #[test]
    fn test_get_or_insert_with_runs_factory_once_cached() {
        let cache: TtlCache<String, i64> = TtlCache::new(TTL);

        let v = cache.get_or_insert_with("a".to_string(), TTL, || 7);
        assert_eq!(v, 7);

        // Second call must come from cache, not the factory
        let v = cache.get_or_insert_with("a".to_string(), TTL, || unreachable!());
        assert_eq!(v, 7);
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with_propagates_factory_error() {
        let cache: TtlCache<String, i64> = TtlCache::new(TTL);

        let result: Result<i64, &str> = cache
            .get_or_try_insert_with("a".to_string(), TTL, || async { Err("boom") })
            .await;
        assert_eq!(result, Err("boom"));
        // Nothing cached on failure
        assert!(!cache.contains("a"));

        let result: Result<i64, &str> = cache
            .get_or_try_insert_with("a".to_string(), TTL, || async { Ok(9) })
            .await;
        assert_eq!(result, Ok(9));
        assert_eq!(cache.get("a"), Some(9));
    }

    #[test]
    fn test_bulk_operations_process_keys_independently() {
        let cache: TtlCache<String, i64> = TtlCache::new(TTL);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);

        let lookup = cache.get_many(&["a".to_string(), "x".to_string(), "b".to_string()]);
        assert_eq!(lookup.found.len(), 2);
        assert_eq!(lookup.missing, vec!["x".to_string()]);

        let stored = cache.insert_many(
            vec![("c".to_string(), 3), ("d".to_string(), 4)],
            TTL,
        );
        assert_eq!(stored, 2);

        let removal = cache.remove_many(&["a".to_string(), "x".to_string(), "c".to_string()]);
        assert_eq!(removal.removed, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(removal.missing, vec!["x".to_string()]);
    }

    #[test]
    fn test_purge_expired() {
        let cache: TtlCache<String, i64> = TtlCache::new(TTL);
        cache.insert_with_ttl("dead".to_string(), 1, Duration::from_millis(5));
        cache.insert("alive".to_string(), 2);

        thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("alive"), Some(2));
    }

    #[test]
    fn test_price_cache_shares_stats_and_clears_all() {
        let cache = PriceCache::new(&EngineConfig::default());

        cache.unit_prices.insert(
            PriceKey::new(ArticleKind::Dessert, "d1"),
            Money::from_cents(400),
        );
        cache.unit_prices.get(&PriceKey::new(ArticleKind::Dessert, "d1")); // hit
        cache.tax_rates.get("missing"); // miss

        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 1);

        cache.clear_all();
        assert!(cache.unit_prices.is_empty());
        assert_eq!(cache.stats().accesses(), 0);
    }

    #[tokio::test]
    async fn test_preload_populates_domains() {
        use crate::memory::MemoryCatalog;

        let catalog = MemoryCatalog::new();
        catalog.add_vat_rate(VatRate {
            id: "vat-22".to_string(),
            rate_bps: 2200,
        });
        catalog.add_vat_rate(VatRate {
            id: "vat-10".to_string(),
            rate_bps: 1000,
        });
        catalog.add_cup_size(CupSize {
            id: "c1".to_string(),
            name: "small".to_string(),
            base_price_cents: 250,
            multiplier_bps: 10_000,
        });
        catalog.add_ingredient(Ingredient {
            id: "i1".to_string(),
            name: "syrup".to_string(),
            surcharge_cents: 50,
            available: true,
        });

        let cache = PriceCache::new(&EngineConfig::default());
        let report = cache.preload(&catalog).await.unwrap();

        assert_eq!(report.tax_rates, 2);
        assert_eq!(report.cup_sizes, 1);
        assert_eq!(report.ingredients, 1);
        assert!(cache.tax_rates.contains("vat-10"));
        assert!(cache.cup_sizes.contains("c1"));
    }
}
