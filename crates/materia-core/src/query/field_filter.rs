//! Additional-field value filter stage.

use materia_proto::Condition;
use tracing::debug;

use super::{Candidates, FieldFilter, RowSource};
use crate::catalog::FieldRegistry;
use crate::error::Error;
use crate::storage::{field_value_columns as columns, Table};

/// Narrows candidates to entities whose additional fields hold the required
/// values.
pub struct FieldValueFilter<'a, S: RowSource + ?Sized> {
    source: &'a S,
    fields: &'a FieldRegistry,
    locale: &'a str,
}

impl<'a, S: RowSource + ?Sized> FieldValueFilter<'a, S> {
    /// Create a filter resolving fields against `fields` in `locale`.
    pub fn new(source: &'a S, fields: &'a FieldRegistry, locale: &'a str) -> Self {
        Self {
            source,
            fields,
            locale,
        }
    }

    /// Apply every filter in declaration order, one lookup per field.
    ///
    /// Stops without further lookups once no candidate is left.
    pub fn apply(&self, filter: &FieldFilter, mut candidates: Candidates) -> Result<Candidates, Error> {
        for (field_id, value) in filter.iter() {
            if candidates.is_empty() {
                debug!(field_id, "Candidate set empty, skipping remaining field filters");
                break;
            }

            let column = self
                .fields
                .column_for(field_id)
                .ok_or(Error::InconsistentMetadata { field_id })?;

            let mut condition = Condition::and()
                .add(columns::FIELD_ID, field_id)
                .add(columns::DELETED, false)
                .add(column.name(), value.clone());
            if self.fields.is_localized(field_id) {
                condition = condition.add(columns::LOCALE, self.locale);
            }
            let condition = candidates.scope(condition, columns::ENTITY_ID);

            let rows = self.source.select(Table::FieldValues, &condition)?;
            let matched = Candidates::only(rows.iter().filter_map(|row| row.get_id(columns::ENTITY_ID)));
            candidates = candidates.intersect(&matched);

            debug!(
                field_id,
                rows = rows.len(),
                candidates = ?candidates.len(),
                "Field filter applied"
            );
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldDef;
    use crate::storage::Row;
    use materia_proto::{Argument, Value};
    use std::cell::RefCell;

    /// Returns canned rows and records every condition it receives.
    struct Recorder {
        rows: Vec<Vec<Row>>,
        seen: RefCell<Vec<Condition>>,
    }

    impl RowSource for Recorder {
        fn select(&self, _table: Table, condition: &Condition) -> Result<Vec<Row>, Error> {
            let mut seen = self.seen.borrow_mut();
            let rows = self.rows.get(seen.len()).cloned().unwrap_or_default();
            seen.push(condition.clone());
            Ok(rows)
        }
    }

    fn row(entity_id: u64) -> Row {
        Row::new().with("entity_id", entity_id)
    }

    fn registry() -> FieldRegistry {
        FieldRegistry::build(&[FieldDef::new(1, "color"), FieldDef::localized(2, "title")]).unwrap()
    }

    #[test]
    fn test_localized_field_adds_locale() {
        let fields = registry();
        let source = Recorder {
            rows: vec![vec![row(4), row(5)]],
            seen: RefCell::new(Vec::new()),
        };
        let mut filter = FieldFilter::new();
        filter.insert(2, Value::from("Shirt"));

        let result = FieldValueFilter::new(&source, &fields, "en")
            .apply(&filter, Candidates::All)
            .unwrap();
        assert_eq!(result, Candidates::Only(vec![4, 5]));

        let seen = source.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].arguments.contains(&Argument::Compare {
            field: "locale".into(),
            relation: Default::default(),
            value: Value::from("en"),
        }));
        assert!(!seen[0]
            .arguments
            .iter()
            .any(|a| matches!(a, Argument::In { .. })));
    }

    #[test]
    fn test_second_lookup_is_scoped() {
        let fields = registry();
        let source = Recorder {
            rows: vec![vec![row(4), row(5)], vec![row(5)]],
            seen: RefCell::new(Vec::new()),
        };
        let mut filter = FieldFilter::new();
        filter.insert(1, Value::from("red"));
        filter.insert(2, Value::from("Shirt"));

        let result = FieldValueFilter::new(&source, &fields, "en")
            .apply(&filter, Candidates::All)
            .unwrap();
        assert_eq!(result, Candidates::Only(vec![5]));

        let seen = source.seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].arguments.contains(&Argument::In {
            field: "entity_id".into(),
            values: vec![Value::UInt64(4), Value::UInt64(5)],
        }));
    }

    #[test]
    fn test_short_circuits_on_empty() {
        let fields = registry();
        let source = Recorder {
            rows: vec![vec![], vec![row(1)]],
            seen: RefCell::new(Vec::new()),
        };
        let mut filter = FieldFilter::new();
        filter.insert(1, Value::from("purple"));
        filter.insert(2, Value::from("Shirt"));

        let result = FieldValueFilter::new(&source, &fields, "en")
            .apply(&filter, Candidates::All)
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(source.seen.borrow().len(), 1);

        // An empty seed never reaches the source
        let result = FieldValueFilter::new(&source, &fields, "en")
            .apply(&filter, Candidates::Only(vec![]))
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(source.seen.borrow().len(), 1);
    }

    #[test]
    fn test_unknown_field_is_inconsistent() {
        let fields = registry();
        let source = Recorder {
            rows: vec![],
            seen: RefCell::new(Vec::new()),
        };
        let mut filter = FieldFilter::new();
        filter.insert(99, Value::from("x"));

        let result = FieldValueFilter::new(&source, &fields, "en").apply(&filter, Candidates::All);
        assert!(matches!(
            result,
            Err(Error::InconsistentMetadata { field_id: 99 })
        ));
    }
}
