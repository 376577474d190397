//! Condition trees consumed by storage collaborators.
//!
//! A [`Condition`] is a conjunction or disjunction of [`Argument`]s. Arguments
//! are column predicates, membership tests, or nested conditions, so trees of
//! any depth can be composed, e.g. `entity_id IN (..) AND deleted = false AND
//! ((field_id = 2 AND locale = 'en') OR field_id = 1)`.
//!
//! Conditions are built in-process and handed to a collaborator by reference;
//! they derive serde for diagnostics but are not archived with rkyv because
//! the type is recursive.

use std::fmt;
use std::str::FromStr;

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use crate::error::Error;
use crate::value::Value;

/// Relation between a column and a value in a predicate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Archive,
    Serialize,
    Deserialize,
    SerdeSerialize,
    SerdeDeserialize,
)]
pub enum Relation {
    /// Column equals value.
    #[default]
    Equal,
    /// Column does not equal value.
    NotEqual,
    /// Column is less than value.
    Less,
    /// Column is less than or equal to value.
    LessOrEqual,
    /// Column is greater than value.
    Greater,
    /// Column is greater than or equal to value.
    GreaterOrEqual,
}

impl Relation {
    /// The operator token for this relation.
    pub fn symbol(&self) -> &'static str {
        match self {
            Relation::Equal => "=",
            Relation::NotEqual => "!=",
            Relation::Less => "<",
            Relation::LessOrEqual => "<=",
            Relation::Greater => ">",
            Relation::GreaterOrEqual => ">=",
        }
    }

    /// Whether this is the equality relation.
    pub fn is_equal(&self) -> bool {
        matches!(self, Relation::Equal)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Relation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" | "==" => Ok(Relation::Equal),
            "!=" | "<>" => Ok(Relation::NotEqual),
            "<" => Ok(Relation::Less),
            "<=" => Ok(Relation::LessOrEqual),
            ">" => Ok(Relation::Greater),
            ">=" => Ok(Relation::GreaterOrEqual),
            other => Err(Error::InvalidRelation(other.to_string())),
        }
    }
}

/// How the arguments of a condition are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, SerdeSerialize, SerdeDeserialize)]
pub enum Combinator {
    /// All arguments must hold. An empty conjunction holds.
    #[default]
    Conjunction,
    /// At least one argument must hold. An empty disjunction never holds.
    Disjunction,
}

/// A single argument of a condition.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub enum Argument {
    /// Column compared to a value.
    Compare {
        field: String,
        relation: Relation,
        value: Value,
    },
    /// Column equals one of the values.
    In { field: String, values: Vec<Value> },
    /// Nested condition.
    Group(Condition),
}

/// A boolean condition tree.
#[derive(Debug, Clone, PartialEq, Default, SerdeSerialize, SerdeDeserialize)]
pub struct Condition {
    /// How the arguments are combined.
    pub combinator: Combinator,
    /// Arguments in declaration order.
    pub arguments: Vec<Argument>,
}

impl Condition {
    /// Create an empty condition with the given combinator.
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            arguments: Vec::new(),
        }
    }

    /// Create an empty conjunction.
    pub fn and() -> Self {
        Self::new(Combinator::Conjunction)
    }

    /// Create an empty disjunction.
    pub fn or() -> Self {
        Self::new(Combinator::Disjunction)
    }

    /// Add an equality predicate.
    pub fn add(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_relation(field, value, Relation::Equal)
    }

    /// Add a predicate with an explicit relation.
    pub fn add_relation(
        mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
        relation: Relation,
    ) -> Self {
        self.push_relation(field, value, relation);
        self
    }

    /// Add a membership predicate.
    pub fn add_in(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.arguments.push(Argument::In {
            field: field.into(),
            values,
        });
        self
    }

    /// Add a nested condition.
    pub fn add_condition(mut self, condition: Condition) -> Self {
        self.arguments.push(Argument::Group(condition));
        self
    }

    /// Push a predicate in place, for builders holding a condition by `&mut`.
    pub fn push_relation(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
        relation: Relation,
    ) {
        self.arguments.push(Argument::Compare {
            field: field.into(),
            relation,
            value: value.into(),
        });
    }

    /// Check if the condition has no arguments.
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Number of top-level arguments.
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    /// Check if this is a disjunction.
    pub fn is_disjunction(&self) -> bool {
        self.combinator == Combinator::Disjunction
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arguments.is_empty() {
            return f.write_str(if self.is_disjunction() { "FALSE" } else { "TRUE" });
        }

        let joiner = if self.is_disjunction() { " OR " } else { " AND " };
        for (i, argument) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(joiner)?;
            }
            match argument {
                Argument::Compare {
                    field,
                    relation,
                    value,
                } => write!(f, "{} {} {}", field, relation, value)?,
                Argument::In { field, values } => {
                    write!(f, "{} IN (", field)?;
                    for (j, value) in values.iter().enumerate() {
                        if j > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", value)?;
                    }
                    f.write_str(")")?;
                }
                Argument::Group(nested) => write!(f, "({})", nested)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_builder() {
        let condition = Condition::and()
            .add("deleted", false)
            .add_relation("created", Value::Timestamp(100), Relation::Greater)
            .add_in("entity_id", vec![1u64.into(), 2u64.into()]);

        assert_eq!(condition.len(), 3);
        assert!(!condition.is_disjunction());
        assert_eq!(
            condition.arguments[1],
            Argument::Compare {
                field: "created".into(),
                relation: Relation::Greater,
                value: Value::Timestamp(100),
            }
        );
    }

    #[test]
    fn test_nested_display() {
        let fields = Condition::or()
            .add_condition(Condition::and().add("field_id", 2u64).add("locale", "en"))
            .add("field_id", 1u64);
        let condition = Condition::and()
            .add_in("entity_id", vec![5u64.into(), 6u64.into()])
            .add_condition(fields);

        assert_eq!(
            condition.to_string(),
            "entity_id IN (5, 6) AND ((field_id = 2 AND locale = 'en') OR field_id = 1)"
        );
        assert_eq!(Condition::and().to_string(), "TRUE");
        assert_eq!(Condition::or().to_string(), "FALSE");
    }

    #[test]
    fn test_relation_tokens() {
        assert_eq!("=".parse::<Relation>().unwrap(), Relation::Equal);
        assert_eq!("<>".parse::<Relation>().unwrap(), Relation::NotEqual);
        assert_eq!(" >= ".parse::<Relation>().unwrap(), Relation::GreaterOrEqual);
        assert!("LIKE".parse::<Relation>().is_err());
        assert_eq!(Relation::default(), Relation::Equal);
        assert_eq!(Relation::LessOrEqual.to_string(), "<=");
    }

    #[test]
    fn test_condition_json() {
        let condition = Condition::or()
            .add("field_id", 1u64)
            .add_condition(Condition::and().add("locale", "de"));

        let json = serde_json::to_string(&condition).unwrap();
        let decoded: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(condition, decoded);
    }
}
