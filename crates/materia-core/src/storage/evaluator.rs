//! Condition evaluation against stored rows.

use std::cmp::Ordering;

use materia_proto::{Argument, Combinator, Condition, Relation, Value};

use super::Row;

/// Evaluates condition trees against rows.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluate a condition against a row.
    ///
    /// An empty conjunction matches every row, an empty disjunction matches
    /// none. A predicate on a missing column does not match.
    pub fn evaluate(condition: &Condition, row: &Row) -> bool {
        match condition.combinator {
            Combinator::Conjunction => condition
                .arguments
                .iter()
                .all(|argument| Self::evaluate_argument(argument, row)),
            Combinator::Disjunction => condition
                .arguments
                .iter()
                .any(|argument| Self::evaluate_argument(argument, row)),
        }
    }

    fn evaluate_argument(argument: &Argument, row: &Row) -> bool {
        match argument {
            Argument::Compare {
                field,
                relation,
                value,
            } => match row.get(field) {
                Some(column) => Self::compare(column, *relation, value),
                None => false,
            },
            Argument::In { field, values } => match row.get(field) {
                Some(column) => values.iter().any(|v| Self::values_equal(column, v)),
                None => false,
            },
            Argument::Group(nested) => Self::evaluate(nested, row),
        }
    }

    /// Apply a relation between a column value and a predicate value.
    pub fn compare(column: &Value, relation: Relation, value: &Value) -> bool {
        match relation {
            Relation::Equal => Self::values_equal(column, value),
            Relation::NotEqual => !Self::values_equal(column, value),
            Relation::Less => Self::compare_values(column, value).is_some_and(Ordering::is_lt),
            Relation::LessOrEqual => {
                Self::compare_values(column, value).is_some_and(Ordering::is_le)
            }
            Relation::Greater => Self::compare_values(column, value).is_some_and(Ordering::is_gt),
            Relation::GreaterOrEqual => {
                Self::compare_values(column, value).is_some_and(Ordering::is_ge)
            }
        }
    }

    /// Check if two values are equal, widening across integer types.
    pub fn values_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Int64(x), Value::UInt64(y)) | (Value::UInt64(y), Value::Int64(x)) => {
                i128::from(*x) == i128::from(*y)
            }
            _ => a == b,
        }
    }

    /// Compare two values, returning their ordering if comparable.
    fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::UInt64(a), Value::UInt64(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::UInt64(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (Value::UInt64(a), Value::Int64(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (Value::Float64(a), Value::Float64(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None, // Incompatible types
        }
    }
}
