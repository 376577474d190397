//! Benchmark harness helpers.
//!
//! This module provides utilities for setting up and running benchmarks.

use std::sync::Arc;

use materia_core::catalog::EntityType;
use materia_core::query::EntityQuery;
use materia_core::{Database, DatabaseConfig, Entity, EntityId, StorageEngine};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::fixtures::{
    generate_products, product_type, Scale, CATALOG_NAVIGATION, LOCALES, PRODUCT,
};

/// Test context for benchmarks.
///
/// Manages a temporary database for isolated benchmark runs.
pub struct TestContext {
    pub db: Database,
    pub product: Arc<EntityType>,
    pub ids: Vec<EntityId>,
    _storage_dir: tempfile::TempDir,
}

impl TestContext {
    /// Create a test context with the product type registered and no data.
    pub fn new() -> Self {
        let storage_dir = tempfile::tempdir().unwrap();
        let db = Database::open(DatabaseConfig::new(storage_dir.path())).unwrap();
        let product = db.register(product_type()).unwrap();

        Self {
            db,
            product,
            ids: Vec::new(),
            _storage_dir: storage_dir,
        }
    }

    /// Create a test context populated with products.
    pub fn with_scale(scale: Scale) -> Self {
        let mut ctx = Self::new();
        ctx.ids = populate_storage(&ctx.db, scale);
        ctx
    }

    /// Start a product query in `locale`.
    pub fn query(&self, locale: &str) -> EntityQuery<'_, StorageEngine> {
        EntityQuery::new(self.db.storage(), self.product.clone(), locale)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Populate the database with products at the specified scale.
///
/// Returns the generated ids in generation order.
pub fn populate_storage(db: &Database, scale: Scale) -> Vec<EntityId> {
    let products = generate_products(scale.count());
    let mut ids = Vec::with_capacity(products.len());

    for (i, product) in products.iter().enumerate() {
        let mut entity = Entity::new(0, PRODUCT, product.identifier.as_str())
            .with_published(product.published)
            .with_created(i as i64 * 1_000)
            .with_modified(i as i64 * 1_000);
        entity.set_attribute("color", product.color.as_str());
        entity.set_attribute("size", product.size.as_str());
        entity.set_attribute("price", product.price);
        entity.set_attribute("stock", product.stock);
        let id = db.insert(entity).unwrap();

        for (locale, title) in LOCALES.iter().zip(&product.titles) {
            db.set_field(PRODUCT, id, "title", Some(*locale), title.as_str())
                .unwrap();
        }
        db.set_field(
            PRODUCT,
            id,
            "description",
            None,
            product.description.as_str(),
        )
        .unwrap();

        if product.in_catalog {
            db.attach_navigation(CATALOG_NAVIGATION, id).unwrap();
        }
        ids.push(id);
    }

    db.flush().unwrap();
    info!(products = ids.len(), scale = scale.label(), "Benchmark data populated");
    ids
}

/// Install a formatting subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "materia_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_populated_context() {
        let ctx = TestContext::with_scale(Scale::Tiny);
        assert_eq!(ctx.ids.len(), 10);

        // Product 0 is outside the catalog navigation
        let result = ctx.query("de").find().unwrap();
        assert_eq!(result.len(), 9);
        let first = &result[&ctx.ids[1]];
        assert_eq!(
            first.attribute("title").and_then(|v| v.as_str()),
            Some("Produkt 1")
        );
        assert!(first.has_attribute("price"));
    }
}
