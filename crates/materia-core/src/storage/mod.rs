//! Storage layer for Materia.
//!
//! This module provides a sled-based storage engine for entities, additional
//! field values and navigation membership.

mod config;
mod engine;
mod evaluator;
mod field_value;
mod record;
mod row;

pub use config::StorageConfig;
pub use engine::StorageEngine;
pub use evaluator::ConditionEvaluator;
pub use field_value::FieldValue;
pub use record::{current_timestamp, Record};
pub use row::{entity_columns, field_value_columns, navigation_columns, Column, Row, Table};
