//! End-to-end engine flow: seed a catalog, price an order, persist its
//! total, then let the consistency validator confirm (and catch) drift.

use std::sync::Arc;

use chrono::Utc;

use crema_core::money::Money;
use crema_core::types::{
    ArticleKind, CupSize, Dessert, Ingredient, Order, OrderLine, OrderStatus, Personalization,
    StandardBeverage, VatRate,
};
use crema_engine::audit::ConsistencyValidator;
use crema_engine::cache::PriceCache;
use crema_engine::config::EngineConfig;
use crema_engine::memory::{MemoryCatalog, MemoryOrders};
use crema_engine::orders::OrderTotalizer;
use crema_engine::pricing::{PriceRequest, PriceService};

/// Engine logs show up under `RUST_LOG=debug cargo test`. try_init
/// because every test in the binary races to install the subscriber.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn seed_catalog() -> MemoryCatalog {
    let catalog = MemoryCatalog::new();
    catalog.add_standard_beverage(StandardBeverage {
        id: "espresso".to_string(),
        name: "Espresso".to_string(),
        price_cents: 120,
        always_orderable: true,
        priority: 1,
    });
    catalog.add_dessert(Dessert {
        id: "tiramisu".to_string(),
        name: "Tiramisù".to_string(),
        price_cents: 450,
    });
    catalog.add_cup_size(CupSize {
        id: "medium".to_string(),
        name: "medium".to_string(),
        base_price_cents: 300,
        multiplier_bps: 13_000,
    });
    catalog.add_ingredient(Ingredient {
        id: "syrup".to_string(),
        name: "hazelnut syrup".to_string(),
        surcharge_cents: 50,
        available: true,
    });
    catalog.add_ingredient(Ingredient {
        id: "cream".to_string(),
        name: "whipped cream".to_string(),
        surcharge_cents: 30,
        available: false,
    });
    catalog.add_personalization(
        Personalization {
            id: "my-latte".to_string(),
            cup_size_id: "medium".to_string(),
        },
        vec!["syrup".to_string(), "cream".to_string()],
    );
    catalog.add_vat_rate(VatRate {
        id: "vat-10".to_string(),
        rate_bps: 1000,
    });
    catalog
}

fn open_order(id: &str) -> Order {
    Order {
        id: id.to_string(),
        status: OrderStatus::Open,
        total_cents: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn line(
    id: &str,
    order_id: &str,
    article_id: &str,
    kind: ArticleKind,
    quantity: i64,
    tax_rate_id: Option<&str>,
) -> OrderLine {
    OrderLine {
        id: id.to_string(),
        order_id: order_id.to_string(),
        article_id: article_id.to_string(),
        kind,
        quantity,
        tax_rate_id: tax_rate_id.map(str::to_string),
        unit_price_cents: None,
        discount_bps: None,
        total_cents: 0,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn order_flow_from_pricing_to_drift_scan() {
    init_tracing();
    let config = EngineConfig::default();
    let catalog = Arc::new(seed_catalog());
    let orders = Arc::new(MemoryOrders::new());
    let cache = Arc::new(PriceCache::new(&config));

    let pricing = PriceService::new(Arc::clone(&catalog), Arc::clone(&cache));
    let totalizer = OrderTotalizer::new(pricing, Arc::clone(&orders));
    let validator = ConsistencyValidator::new(totalizer.clone(), &config);

    // An order with all three article kinds:
    //   2 × espresso     @ 10%          = 2.40 gross
    //   1 × tiramisù     @ 22% default  = 4.50 gross
    //   1 × custom latte @ 22% default  = 3.65 gross (3.00 + 0.50 × 1.30)
    orders.add_order(open_order("o1"));
    orders.add_line(line(
        "l1",
        "o1",
        "espresso",
        ArticleKind::StandardBeverage,
        2,
        Some("vat-10"),
    ));
    orders.add_line(line("l2", "o1", "tiramisu", ArticleKind::Dessert, 1, None));
    orders.add_line(line(
        "l3",
        "o1",
        "my-latte",
        ArticleKind::CustomBeverage,
        1,
        None,
    ));

    // Compute and persist
    let adjustment = totalizer.update_order_total("o1").await.unwrap();
    assert!(adjustment.changed);
    assert_eq!(adjustment.recomputed.cents(), 1055);

    let totals = totalizer.compute_order_total("o1").await.unwrap();
    assert_eq!(totals.grand_total.cents(), 1055);
    assert_eq!(totals.subtotal + totals.tax_total, totals.grand_total);
    assert_eq!(totals.lines.len(), 3);

    // The stored total now matches a fresh recomputation
    let report = validator.find_invalid_totals(None).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.scanned, 1);

    // Someone scribbles on the stored total behind the engine's back
    assert!(orders.set_stored_total("o1", 1155));
    let report = validator.find_invalid_totals(None).await.unwrap();
    assert_eq!(report.drifted.len(), 1);
    assert_eq!(report.drifted[0].drift.cents(), 100);

    // Repair through the aggregator, scan comes back clean
    let adjustment = totalizer.update_order_total("o1").await.unwrap();
    assert!(adjustment.changed);
    let report = validator.find_invalid_totals(None).await.unwrap();
    assert!(report.is_clean());
}

#[tokio::test]
async fn catalog_price_change_is_invisible_until_the_cache_expires() {
    init_tracing();
    let config = EngineConfig::default();
    let catalog = Arc::new(seed_catalog());
    let cache = Arc::new(PriceCache::new(&config));
    let pricing = PriceService::new(Arc::clone(&catalog), Arc::clone(&cache));

    let before = pricing
        .unit_price(ArticleKind::Dessert, "tiramisu")
        .await
        .unwrap();
    assert_eq!(before.cents(), 450);

    // Price bump in the catalog: the cached value keeps serving
    catalog.add_dessert(Dessert {
        id: "tiramisu".to_string(),
        name: "Tiramisù".to_string(),
        price_cents: 500,
    });
    let cached = pricing
        .unit_price(ArticleKind::Dessert, "tiramisu")
        .await
        .unwrap();
    assert_eq!(cached.cents(), 450);

    // The uncached path sees it immediately
    let fresh = pricing
        .unit_price_uncached(ArticleKind::Dessert, "tiramisu")
        .await
        .unwrap();
    assert_eq!(fresh.cents(), 500);

    // Explicit invalidation brings the cached path up to date too
    cache.invalidate_unit_price(&crema_engine::cache::PriceKey::new(
        ArticleKind::Dessert,
        "tiramisu",
    ));
    let after = pricing
        .unit_price(ArticleKind::Dessert, "tiramisu")
        .await
        .unwrap();
    assert_eq!(after.cents(), 500);
}

#[tokio::test]
async fn batch_pricing_survives_bad_items_and_preload_warms_rates() {
    init_tracing();
    let config = EngineConfig::default();
    let catalog = Arc::new(seed_catalog());
    let cache = Arc::new(PriceCache::new(&config));
    let pricing = PriceService::new(Arc::clone(&catalog), Arc::clone(&cache));

    let report = cache.preload(catalog.as_ref()).await.unwrap();
    assert_eq!(report.tax_rates, 1);
    assert_eq!(report.cup_sizes, 1);
    assert_eq!(report.ingredients, 2);

    let outcome = pricing
        .price_batch(
            vec![
                PriceRequest::new(ArticleKind::StandardBeverage, "espresso", 1)
                    .with_tax_rate("vat-10"),
                PriceRequest::new(ArticleKind::Dessert, "nonexistent", 1),
                PriceRequest::new(ArticleKind::CustomBeverage, "my-latte", 2),
                PriceRequest::new(ArticleKind::Dessert, "tiramisu", 1)
                    .with_fixed_price(Money::from_cents(400)),
            ],
            None,
        )
        .await;

    assert_eq!(outcome.succeeded.len(), 3);
    assert_eq!(outcome.failed.len(), 1);
    assert!(!outcome.cancelled);

    // 2 × 3.65 custom latte
    let (_, custom) = outcome
        .succeeded
        .iter()
        .find(|(req, _)| req.article_id == "my-latte")
        .unwrap();
    assert_eq!(custom.gross.cents(), 730);

    // The frozen 4.00 wins over the 4.50 catalog price
    let (_, frozen) = outcome
        .succeeded
        .iter()
        .find(|(req, _)| req.article_id == "tiramisu")
        .unwrap();
    assert_eq!(frozen.gross.cents(), 400);
}
