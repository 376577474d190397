//! Test data generation for benchmarks.
//!
//! This module provides consistent data generators for benchmark reproducibility.

use materia_core::catalog::{EntityTypeDef, FieldDef, NavigationId, ValueColumn};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Entity type name used by the benchmarks.
pub const PRODUCT: &str = "Product";

/// Navigation category products are placed in.
pub const CATALOG_NAVIGATION: NavigationId = 7;

/// Locales localized fields are written in.
pub const LOCALES: [&str; 2] = ["en", "de"];

/// Color values, assigned round-robin.
pub const COLORS: [&str; 5] = ["red", "blue", "green", "black", "white"];

/// Size values, assigned round-robin.
pub const SIZES: [&str; 4] = ["S", "M", "L", "XL"];

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug, Default)]
pub enum Scale {
    /// Tiny scale: 10 products.
    /// Use for quick tests and development iteration.
    Tiny,
    /// Small scale: 100 products
    Small,
    /// Medium scale: 2,000 products
    #[default]
    Medium,
    /// Large scale: 20,000 products
    Large,
}

impl Scale {
    /// Get the product count for this scale.
    pub fn count(&self) -> usize {
        match self {
            Scale::Tiny => 10,
            Scale::Small => 100,
            Scale::Medium => 2_000,
            Scale::Large => 20_000,
        }
    }

    /// Short label for benchmark ids.
    pub fn label(&self) -> &'static str {
        match self {
            Scale::Tiny => "tiny",
            Scale::Small => "small",
            Scale::Medium => "medium",
            Scale::Large => "large",
        }
    }
}

/// Product entity data for benchmarks.
pub struct ProductData {
    pub identifier: String,
    pub published: bool,
    pub in_catalog: bool,
    pub color: String,
    pub size: String,
    /// Title per entry in [`LOCALES`].
    pub titles: [String; 2],
    pub description: String,
    pub price: i64,
    pub stock: i64,
}

/// The benchmark product type: two plain text fields, two localized text
/// fields and two numeric fields, in one navigation category.
pub fn product_type() -> EntityTypeDef {
    EntityTypeDef::new(PRODUCT)
        .with_navigation(CATALOG_NAVIGATION)
        .with_field(FieldDef::new(1, "color"))
        .with_field(FieldDef::new(2, "size"))
        .with_field(FieldDef::localized(3, "title"))
        .with_field(FieldDef::localized(4, "description"))
        .with_field(FieldDef::new(5, "price").with_column(ValueColumn::Numeric))
        .with_field(FieldDef::new(6, "stock").with_column(ValueColumn::Numeric))
}

/// Generate a random string of specified length.
fn random_string(rng: &mut StdRng, len: usize) -> String {
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

/// Generate products with realistic field distribution.
///
/// Nine in ten products are in the catalog navigation, four in five are
/// published.
pub fn generate_products(count: usize) -> Vec<ProductData> {
    const SEED: u64 = 12345;
    let mut rng = StdRng::seed_from_u64(SEED);

    (0..count)
        .map(|i| ProductData {
            identifier: format!("product-{}", i),
            published: i % 5 != 0,
            in_catalog: i % 10 != 0,
            color: COLORS[i % COLORS.len()].to_string(),
            size: SIZES[i % SIZES.len()].to_string(),
            titles: [format!("Product {}", i), format!("Produkt {}", i)],
            description: random_string(&mut rng, 64),
            price: rng.gen_range(100..100_000),
            stock: rng.gen_range(0..500),
        })
        .collect()
}
