//! Materia Benchmark Suite
//!
//! This crate provides Criterion benchmarks for the entity query pipeline.
//!
//! # Benchmark Categories
//!
//! - **Find**: full `find()` runs with and without navigation, filters and selections
//! - **Fetch**: the bulk additional-field fetch on its own

pub mod fixtures;
pub mod harness;

pub use fixtures::{generate_products, product_type, Scale};
pub use harness::TestContext;
