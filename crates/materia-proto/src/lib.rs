//! Materia protocol types.
//!
//! This crate defines the values and condition trees exchanged between the
//! query layer and the collaborators that execute conditions against storage.
//!
//! # Modules
//!
//! - [`value`] - Runtime values for entity columns and additional fields
//! - [`condition`] - Boolean condition trees and predicate relations
//! - [`error`] - Protocol error types

pub mod condition;
pub mod error;
pub mod value;

pub use condition::{Argument, Combinator, Condition, Relation};
pub use error::Error;
pub use value::Value;
