//! # In-Memory Stores
//!
//! `HashMap`-backed implementations of the store traits.
//!
//! ## Thread Safety
//! State lives behind `std::sync::RwLock` because:
//! 1. Multiple engine tasks may read catalog data concurrently
//! 2. Lock hold times are short (clone out, release)
//! 3. No lock is ever held across an await point
//!
//! ## When To Use
//! - Unit and integration tests of the engine
//! - Embedders that load a catalog snapshot up front (kiosk mode)
//!
//! Production deployments implement [`CatalogStore`]/[`OrderStore`] over
//! the host CRUD layer instead.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crema_core::money::Money;
use crema_core::types::{
    ArticleKind, CupSize, Dessert, Ingredient, Order, OrderLine, Personalization,
    StandardBeverage, VatRate,
};

use crate::error::{EngineError, EngineResult};
use crate::store::{CatalogStore, OrderStore};

// =============================================================================
// Memory Catalog
// =============================================================================

#[derive(Debug, Default)]
struct CatalogData {
    kinds: HashMap<String, ArticleKind>,
    standard_beverages: HashMap<String, StandardBeverage>,
    personalizations: HashMap<String, Personalization>,
    cup_sizes: HashMap<String, CupSize>,
    ingredients: HashMap<String, Ingredient>,
    desserts: HashMap<String, Dessert>,
    vat_rates: HashMap<String, VatRate>,
    /// personalization id → chosen ingredient ids, in chosen order
    chosen: HashMap<String, Vec<String>>,
}

/// In-memory catalog store.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    data: RwLock<CatalogData>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a standard beverage (and its kind mapping).
    pub fn add_standard_beverage(&self, beverage: StandardBeverage) {
        let mut data = self.data.write().expect("catalog lock poisoned");
        data.kinds
            .insert(beverage.id.clone(), ArticleKind::StandardBeverage);
        data.standard_beverages.insert(beverage.id.clone(), beverage);
    }

    /// Registers a dessert (and its kind mapping).
    pub fn add_dessert(&self, dessert: Dessert) {
        let mut data = self.data.write().expect("catalog lock poisoned");
        data.kinds.insert(dessert.id.clone(), ArticleKind::Dessert);
        data.desserts.insert(dessert.id.clone(), dessert);
    }

    /// Registers a personalization with its chosen ingredient ids.
    pub fn add_personalization(&self, personalization: Personalization, chosen_ids: Vec<String>) {
        let mut data = self.data.write().expect("catalog lock poisoned");
        data.kinds
            .insert(personalization.id.clone(), ArticleKind::CustomBeverage);
        data.chosen.insert(personalization.id.clone(), chosen_ids);
        data.personalizations
            .insert(personalization.id.clone(), personalization);
    }

    /// Registers a cup size.
    pub fn add_cup_size(&self, cup_size: CupSize) {
        let mut data = self.data.write().expect("catalog lock poisoned");
        data.cup_sizes.insert(cup_size.id.clone(), cup_size);
    }

    /// Registers an ingredient.
    pub fn add_ingredient(&self, ingredient: Ingredient) {
        let mut data = self.data.write().expect("catalog lock poisoned");
        data.ingredients.insert(ingredient.id.clone(), ingredient);
    }

    /// Registers a VAT rate row.
    pub fn add_vat_rate(&self, rate: VatRate) {
        let mut data = self.data.write().expect("catalog lock poisoned");
        data.vat_rates.insert(rate.id.clone(), rate);
    }

    /// Flips an ingredient's availability flag. Returns false if absent.
    pub fn set_ingredient_available(&self, id: &str, available: bool) -> bool {
        let mut data = self.data.write().expect("catalog lock poisoned");
        match data.ingredients.get_mut(id) {
            Some(ingredient) => {
                ingredient.available = available;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn article_kind(&self, id: &str) -> EngineResult<Option<ArticleKind>> {
        let data = self.data.read().expect("catalog lock poisoned");
        Ok(data.kinds.get(id).copied())
    }

    async fn standard_beverage(&self, id: &str) -> EngineResult<Option<StandardBeverage>> {
        let data = self.data.read().expect("catalog lock poisoned");
        Ok(data.standard_beverages.get(id).cloned())
    }

    async fn personalization(&self, id: &str) -> EngineResult<Option<Personalization>> {
        let data = self.data.read().expect("catalog lock poisoned");
        Ok(data.personalizations.get(id).cloned())
    }

    async fn cup_size(&self, id: &str) -> EngineResult<Option<CupSize>> {
        let data = self.data.read().expect("catalog lock poisoned");
        Ok(data.cup_sizes.get(id).cloned())
    }

    async fn ingredient(&self, id: &str) -> EngineResult<Option<Ingredient>> {
        let data = self.data.read().expect("catalog lock poisoned");
        Ok(data.ingredients.get(id).cloned())
    }

    async fn chosen_ingredients(
        &self,
        personalization_id: &str,
    ) -> EngineResult<Vec<Ingredient>> {
        let data = self.data.read().expect("catalog lock poisoned");
        let ids = data.chosen.get(personalization_id);
        // Dangling ingredient references are a store-level inconsistency;
        // they resolve to nothing rather than failing the lookup.
        Ok(ids
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| data.ingredients.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn dessert(&self, id: &str) -> EngineResult<Option<Dessert>> {
        let data = self.data.read().expect("catalog lock poisoned");
        Ok(data.desserts.get(id).cloned())
    }

    async fn tax_rate(&self, id: &str) -> EngineResult<Option<VatRate>> {
        let data = self.data.read().expect("catalog lock poisoned");
        Ok(data.vat_rates.get(id).cloned())
    }

    async fn all_tax_rates(&self) -> EngineResult<Vec<VatRate>> {
        let data = self.data.read().expect("catalog lock poisoned");
        Ok(data.vat_rates.values().cloned().collect())
    }

    async fn all_cup_sizes(&self) -> EngineResult<Vec<CupSize>> {
        let data = self.data.read().expect("catalog lock poisoned");
        Ok(data.cup_sizes.values().cloned().collect())
    }

    async fn all_ingredients(&self) -> EngineResult<Vec<Ingredient>> {
        let data = self.data.read().expect("catalog lock poisoned");
        Ok(data.ingredients.values().cloned().collect())
    }
}

// =============================================================================
// Memory Orders
// =============================================================================

#[derive(Debug, Default)]
struct OrderData {
    orders: HashMap<String, Order>,
    /// order id → lines, in line order
    lines: HashMap<String, Vec<OrderLine>>,
}

/// In-memory order store.
#[derive(Debug, Default)]
pub struct MemoryOrders {
    data: RwLock<OrderData>,
}

impl MemoryOrders {
    /// Creates an empty order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an order.
    pub fn add_order(&self, order: Order) {
        let mut data = self.data.write().expect("order lock poisoned");
        data.orders.insert(order.id.clone(), order);
    }

    /// Appends a line to its order.
    pub fn add_line(&self, line: OrderLine) {
        let mut data = self.data.write().expect("order lock poisoned");
        data.lines.entry(line.order_id.clone()).or_default().push(line);
    }

    /// Overwrites an order's stored total without recomputation
    /// (test helper for simulating drift).
    pub fn set_stored_total(&self, order_id: &str, total_cents: i64) -> bool {
        let mut data = self.data.write().expect("order lock poisoned");
        match data.orders.get_mut(order_id) {
            Some(order) => {
                order.total_cents = total_cents;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl OrderStore for MemoryOrders {
    async fn order(&self, id: &str) -> EngineResult<Option<Order>> {
        let data = self.data.read().expect("order lock poisoned");
        Ok(data.orders.get(id).cloned())
    }

    async fn order_lines(&self, order_id: &str) -> EngineResult<Vec<OrderLine>> {
        let data = self.data.read().expect("order lock poisoned");
        Ok(data.lines.get(order_id).cloned().unwrap_or_default())
    }

    async fn save_order_total(&self, order_id: &str, total: Money) -> EngineResult<()> {
        let mut data = self.data.write().expect("order lock poisoned");
        match data.orders.get_mut(order_id) {
            Some(order) => {
                order.total_cents = total.cents();
                order.updated_at = Utc::now();
                Ok(())
            }
            None => Err(EngineError::not_found("Order", order_id)),
        }
    }

    async fn open_orders(&self) -> EngineResult<Vec<Order>> {
        let data = self.data.read().expect("order lock poisoned");
        let mut open: Vec<Order> = data
            .orders
            .values()
            .filter(|order| !order.status.is_terminal())
            .cloned()
            .collect();
        // Deterministic scan order for reproducible audit reports
        open.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(open)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
