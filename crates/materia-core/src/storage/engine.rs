//! Storage engine implementation.

use materia_proto::{Argument, Condition, Value};
use sled::{Db, Tree};
use tracing::trace;

use super::{
    entity_columns, field_value_columns, navigation_columns, ConditionEvaluator, FieldValue,
    Record, Row, StorageConfig, Table,
};
use crate::catalog::{FieldId, NavigationId};
use crate::entity::{Entity, EntityId};
use crate::error::Error;
use crate::query::{Candidates, EntityLoader, NavigationIndex, RowSource};

/// Tree name for entity records.
const ENTITY_TREE: &str = "data:entities";

/// Tree name for additional field value records.
const FIELD_VALUE_TREE: &str = "data:field_values";

/// Tree name for entity type index.
const TYPE_INDEX_TREE: &str = "index:entity_type";

/// Tree name for navigation membership (navigation_id + entity_id -> empty).
const NAVIGATION_TREE: &str = "index:navigation";

/// The embedded storage engine wrapping sled.
///
/// Implements every collaborator the query pipeline needs: condition
/// execution over the entity, field value and navigation tables, navigation
/// membership lookups, and entity loading.
pub struct StorageEngine {
    /// The underlying sled database.
    db: Db,

    /// Tree for entity records keyed by entity id.
    entity_tree: Tree,

    /// Tree for field value records.
    field_value_tree: Tree,

    /// Tree for entity type index (entity_type + 0 + entity_id -> empty).
    type_index_tree: Tree,

    /// Tree for navigation membership.
    navigation_tree: Tree,
}

impl StorageEngine {
    /// Open or create a storage engine with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        let entity_tree = db.open_tree(ENTITY_TREE)?;
        let field_value_tree = db.open_tree(FIELD_VALUE_TREE)?;
        let type_index_tree = db.open_tree(TYPE_INDEX_TREE)?;
        let navigation_tree = db.open_tree(NAVIGATION_TREE)?;

        Ok(Self {
            db,
            entity_tree,
            field_value_tree,
            type_index_tree,
            navigation_tree,
        })
    }

    /// Generate a new entity id. Ids are unique and never zero.
    ///
    /// Ids already taken by an explicitly keyed entity are skipped.
    pub fn generate_id(&self) -> Result<EntityId, Error> {
        loop {
            let id = self.db.generate_id()? + 1;
            if !self.entity_tree.contains_key(id.to_be_bytes())? {
                return Ok(id);
            }
            trace!(id, "Skipping generated id already in use");
        }
    }

    // ========== Entities ==========

    /// Insert or replace an entity's built-in columns.
    ///
    /// The attribute bag is not stored here; additional fields are written
    /// with [`put_field_value`](Self::put_field_value).
    pub fn put_entity(&self, entity: &Entity) -> Result<(), Error> {
        let mut record = Record::new(entity.to_row());
        record.deleted = entity.deleted;

        self.entity_tree
            .insert(entity.id.to_be_bytes(), record.to_bytes()?)?;

        let index_key = self.type_index_key(&entity.entity_type, entity.id);
        self.type_index_tree.insert(index_key, &[] as &[u8])?;

        Ok(())
    }

    /// Get a non-deleted entity by id.
    pub fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, Error> {
        match self.get_entity_record(id)? {
            Some(record) if !record.deleted => Ok(Some(Entity::from_row(&record.row, false)?)),
            _ => Ok(None),
        }
    }

    /// Soft delete an entity.
    ///
    /// Returns `false` if the entity does not exist or is already deleted.
    pub fn delete_entity(&self, id: EntityId) -> Result<bool, Error> {
        match self.get_entity_record(id)? {
            Some(record) if !record.deleted => {
                let record = record.into_deleted();
                self.entity_tree.insert(id.to_be_bytes(), record.to_bytes()?)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn get_entity_record(&self, id: EntityId) -> Result<Option<Record>, Error> {
        match self.entity_tree.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(Record::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Scan the ids of all entities of a type (including deleted).
    fn scan_type_ids(
        &self,
        entity_type: &str,
    ) -> impl Iterator<Item = Result<EntityId, Error>> + '_ {
        let prefix = self.type_index_prefix(entity_type);
        let prefix_len = prefix.len();

        self.type_index_tree.scan_prefix(prefix).map(move |result| {
            let (key, _) = result?;
            decode_id(&key[prefix_len..])
        })
    }

    /// Get the index key for an entity type + entity ID.
    fn type_index_key(&self, entity_type: &str, id: EntityId) -> Vec<u8> {
        let mut key = self.type_index_prefix(entity_type);
        key.extend_from_slice(&id.to_be_bytes());
        key
    }

    /// Get the prefix for scanning all entities of a type.
    fn type_index_prefix(&self, entity_type: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(entity_type.len() + 1 + 8);
        prefix.extend_from_slice(entity_type.as_bytes());
        prefix.push(0); // Null separator
        prefix
    }

    // ========== Additional field values ==========

    /// Insert or replace an additional field value.
    pub fn put_field_value(&self, value: &FieldValue) -> Result<(), Error> {
        let record = Record::new(value.to_row());
        self.field_value_tree.insert(value.key(), record.to_bytes()?)?;
        Ok(())
    }

    /// Soft delete an additional field value.
    ///
    /// Returns `false` if no live value exists for the key.
    pub fn delete_field_value(
        &self,
        entity_id: EntityId,
        field_id: FieldId,
        locale: &str,
    ) -> Result<bool, Error> {
        let key = FieldValue::encode_key(entity_id, field_id, locale);
        match self.field_value_tree.get(&key)? {
            Some(bytes) => {
                let record = Record::from_bytes(&bytes)?;
                if record.deleted {
                    return Ok(false);
                }
                self.field_value_tree
                    .insert(key, record.into_deleted().to_bytes()?)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Soft delete every live additional field value of an entity.
    ///
    /// Returns the number of values deleted.
    pub fn clear_field_values(&self, entity_id: EntityId) -> Result<usize, Error> {
        let mut cleared = 0;
        for entry in self.field_value_tree.scan_prefix(entity_id.to_be_bytes()) {
            let (key, bytes) = entry?;
            let record = Record::from_bytes(&bytes)?;
            if record.deleted {
                continue;
            }
            self.field_value_tree
                .insert(key, record.into_deleted().to_bytes()?)?;
            cleared += 1;
        }
        Ok(cleared)
    }

    // ========== Navigation ==========

    /// Add an entity to a navigation category.
    pub fn attach_navigation(
        &self,
        navigation_id: NavigationId,
        entity_id: EntityId,
    ) -> Result<(), Error> {
        self.navigation_tree
            .insert(navigation_key(navigation_id, entity_id), &[] as &[u8])?;
        Ok(())
    }

    /// Remove an entity from a navigation category.
    pub fn detach_navigation(
        &self,
        navigation_id: NavigationId,
        entity_id: EntityId,
    ) -> Result<bool, Error> {
        Ok(self
            .navigation_tree
            .remove(navigation_key(navigation_id, entity_id))?
            .is_some())
    }

    /// Members of one navigation category, ascending.
    fn navigation_members(&self, navigation_id: NavigationId) -> Result<Vec<EntityId>, Error> {
        self.navigation_tree
            .scan_prefix(navigation_id.to_be_bytes())
            .map(|result| {
                let (key, _) = result?;
                decode_id(&key[8..])
            })
            .collect()
    }

    // ========== Maintenance ==========

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Get database size in bytes.
    pub fn size_on_disk(&self) -> Result<u64, Error> {
        Ok(self.db.size_on_disk()?)
    }

    /// Get the underlying sled database (for opening new trees).
    pub fn db(&self) -> &Db {
        &self.db
    }

    fn select_records(&self, tree: &Tree, condition: &Condition) -> Result<Vec<Row>, Error> {
        let mut rows = Vec::new();
        for entry in tree.iter() {
            let (_, bytes) = entry?;
            push_matching(&mut rows, &bytes, condition)?;
        }
        Ok(rows)
    }

    fn select_field_values(&self, condition: &Condition) -> Result<Vec<Row>, Error> {
        let Some(entity_ids) = scoped_entity_ids(condition) else {
            return self.select_records(&self.field_value_tree, condition);
        };

        // Entity-scoped lookups only touch the scoped entities' key ranges.
        let mut rows = Vec::new();
        for entity_id in entity_ids {
            for entry in self.field_value_tree.scan_prefix(entity_id.to_be_bytes()) {
                let (_, bytes) = entry?;
                push_matching(&mut rows, &bytes, condition)?;
            }
        }
        Ok(rows)
    }

    fn select_navigation(&self, condition: &Condition) -> Result<Vec<Row>, Error> {
        let mut rows = Vec::new();
        for entry in self.navigation_tree.iter() {
            let (key, _) = entry?;
            if key.len() != 16 {
                return Err(Error::InvalidKey);
            }
            let row = Row::new()
                .with(navigation_columns::NAVIGATION_ID, decode_id(&key[..8])?)
                .with(navigation_columns::ENTITY_ID, decode_id(&key[8..])?);
            if ConditionEvaluator::evaluate(condition, &row) {
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

impl RowSource for StorageEngine {
    fn select(&self, table: Table, condition: &Condition) -> Result<Vec<Row>, Error> {
        let rows = match table {
            Table::Entities => self.select_records(&self.entity_tree, condition)?,
            Table::FieldValues => self.select_field_values(condition)?,
            Table::Navigation => self.select_navigation(condition)?,
        };
        trace!(%table, %condition, rows = rows.len(), "Condition executed");
        Ok(rows)
    }
}

impl NavigationIndex for StorageEngine {
    fn ids_by_navigation(
        &self,
        navigation_ids: &[NavigationId],
        seed: &Candidates,
    ) -> Result<Candidates, Error> {
        let Some((first, rest)) = navigation_ids.split_first() else {
            return Ok(seed.clone());
        };

        let mut members = Candidates::Only(self.navigation_members(*first)?);
        for navigation_id in rest {
            if members.is_empty() {
                break;
            }
            members = members.intersect(&Candidates::Only(self.navigation_members(*navigation_id)?));
        }

        Ok(members.intersect(seed))
    }
}

impl EntityLoader for StorageEngine {
    fn load(
        &self,
        entity_type: &str,
        candidates: &Candidates,
        condition: &Condition,
    ) -> Result<Vec<Entity>, Error> {
        let ids: Vec<EntityId> = match candidates.ids() {
            Some(ids) => ids.to_vec(),
            None => self.scan_type_ids(entity_type).collect::<Result<_, _>>()?,
        };

        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(record) = self.get_entity_record(id)? else {
                continue;
            };
            if record.deleted {
                continue;
            }
            let type_matches = record
                .row
                .get(entity_columns::ENTITY_TYPE)
                .and_then(Value::as_str)
                == Some(entity_type);
            if !type_matches || !ConditionEvaluator::evaluate(condition, &record.visible_row()) {
                continue;
            }
            entities.push(Entity::from_row(&record.row, false)?);
        }

        Ok(entities)
    }
}

/// Decode a big-endian entity or navigation id.
fn decode_id(bytes: &[u8]) -> Result<u64, Error> {
    let bytes: [u8; 8] = bytes.try_into().map_err(|_| Error::InvalidKey)?;
    Ok(u64::from_be_bytes(bytes))
}

fn navigation_key(navigation_id: NavigationId, entity_id: EntityId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&navigation_id.to_be_bytes());
    key[8..].copy_from_slice(&entity_id.to_be_bytes());
    key
}

fn push_matching(rows: &mut Vec<Row>, bytes: &[u8], condition: &Condition) -> Result<(), Error> {
    let row = Record::from_bytes(bytes)?.visible_row();
    if ConditionEvaluator::evaluate(condition, &row) {
        rows.push(row);
    }
    Ok(())
}

/// Entity ids a conjunction restricts `entity_id` to, if any.
fn scoped_entity_ids(condition: &Condition) -> Option<Vec<EntityId>> {
    if condition.is_disjunction() {
        return None;
    }
    condition.arguments.iter().find_map(|argument| match argument {
        Argument::In { field, values } if field == field_value_columns::ENTITY_ID => {
            values.iter().map(Value::as_u64).collect()
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ValueColumn;

    struct TestDb {
        engine: StorageEngine,
        _dir: tempfile::TempDir, // Keep the temp dir alive
    }

    impl std::ops::Deref for TestDb {
        type Target = StorageEngine;
        fn deref(&self) -> &Self::Target {
            &self.engine
        }
    }

    fn test_engine() -> TestDb {
        let dir = tempfile::tempdir().unwrap();
        let engine = StorageEngine::open(StorageConfig::new(dir.path())).unwrap();
        TestDb { engine, _dir: dir }
    }

    fn product(engine: &StorageEngine, identifier: &str) -> EntityId {
        let id = engine.generate_id().unwrap();
        engine
            .put_entity(&Entity::new(id, "Product", identifier).with_published(true))
            .unwrap();
        id
    }

    #[test]
    fn test_put_and_get_entity() {
        let engine = test_engine();
        let id = product(&engine, "shirt");

        let entity = engine.get_entity(id).unwrap().unwrap();
        assert_eq!(entity.identifier, "shirt");
        assert!(entity.published);
        assert!(engine.get_entity(id + 1000).unwrap().is_none());
    }

    #[test]
    fn test_generate_id_unique() {
        let engine = test_engine();
        let a = engine.generate_id().unwrap();
        let b = engine.generate_id().unwrap();
        assert_ne!(a, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_id_skips_explicit_ids() {
        let engine = test_engine();
        for id in 1..=3 {
            engine
                .put_entity(&Entity::new(id, "Product", "explicit"))
                .unwrap();
        }

        let generated = engine.generate_id().unwrap();
        assert!(generated > 3);
        assert!(engine.get_entity(generated).unwrap().is_none());
    }

    #[test]
    fn test_soft_delete_entity() {
        let engine = test_engine();
        let id = product(&engine, "shirt");

        assert!(engine.delete_entity(id).unwrap());
        assert!(!engine.delete_entity(id).unwrap());
        assert!(engine.get_entity(id).unwrap().is_none());

        // Row is kept with the deletion flag visible to conditions
        let rows = engine
            .select(Table::Entities, &Condition::and().add("deleted", true))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_id("id"), Some(id));
    }

    #[test]
    fn test_load_by_type_and_condition() {
        let engine = test_engine();
        let shirt = product(&engine, "shirt");
        let hat = product(&engine, "hat");
        let deleted = product(&engine, "old");
        engine.delete_entity(deleted).unwrap();

        let news = engine.generate_id().unwrap();
        engine.put_entity(&Entity::new(news, "News", "launch")).unwrap();

        let all = engine
            .load("Product", &Candidates::All, &Condition::and())
            .unwrap();
        let ids: Vec<_> = all.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![shirt, hat]);

        let only_hat = engine
            .load("Product", &Candidates::All, &Condition::and().add("identifier", "hat"))
            .unwrap();
        assert_eq!(only_hat.len(), 1);
        assert_eq!(only_hat[0].id, hat);

        // Restricted loads skip other types and unknown ids
        let restricted = engine
            .load("Product", &Candidates::only([news, hat, 9999]), &Condition::and())
            .unwrap();
        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted[0].id, hat);
    }

    #[test]
    fn test_field_value_select() {
        let engine = test_engine();
        engine.put_field_value(&FieldValue::new(1, 10, "red")).unwrap();
        engine
            .put_field_value(&FieldValue::new(1, 11, "Shirt").in_locale("en"))
            .unwrap();
        engine
            .put_field_value(&FieldValue::new(1, 11, "Hemd").in_locale("de"))
            .unwrap();
        engine
            .put_field_value(&FieldValue::new(2, 12, 25i64).in_column(ValueColumn::Numeric))
            .unwrap();

        let scoped = Condition::and()
            .add_in("entity_id", vec![1u64.into()])
            .add("locale", "de");
        let rows = engine.select(Table::FieldValues, &scoped).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("value"), Some(&Value::String("Hemd".into())));

        let unscoped = Condition::and().add("numeric_value", 25i64);
        let rows = engine.select(Table::FieldValues, &unscoped).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_id("entity_id"), Some(2));
    }

    #[test]
    fn test_field_value_soft_delete() {
        let engine = test_engine();
        engine.put_field_value(&FieldValue::new(1, 10, "red")).unwrap();

        assert!(engine.delete_field_value(1, 10, "").unwrap());
        assert!(!engine.delete_field_value(1, 10, "").unwrap());
        assert!(!engine.delete_field_value(1, 99, "").unwrap());

        let live = Condition::and().add("deleted", false);
        assert!(engine.select(Table::FieldValues, &live).unwrap().is_empty());

        // Writing again revives the value
        engine.put_field_value(&FieldValue::new(1, 10, "blue")).unwrap();
        assert_eq!(engine.select(Table::FieldValues, &live).unwrap().len(), 1);
    }

    #[test]
    fn test_clear_field_values() {
        let engine = test_engine();
        engine.put_field_value(&FieldValue::new(1, 10, "red")).unwrap();
        engine
            .put_field_value(&FieldValue::new(1, 11, "Shirt").in_locale("en"))
            .unwrap();
        engine.put_field_value(&FieldValue::new(2, 10, "blue")).unwrap();
        engine.delete_field_value(1, 10, "").unwrap();

        // Only the live value of entity 1 is counted
        assert_eq!(engine.clear_field_values(1).unwrap(), 1);
        assert_eq!(engine.clear_field_values(1).unwrap(), 0);

        let live = Condition::and().add("deleted", false);
        let rows = engine.select(Table::FieldValues, &live).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_id("entity_id"), Some(2));
    }

    #[test]
    fn test_navigation_requires_every_category() {
        let engine = test_engine();
        engine.attach_navigation(7, 1).unwrap();
        engine.attach_navigation(7, 2).unwrap();
        engine.attach_navigation(7, 3).unwrap();
        engine.attach_navigation(8, 2).unwrap();
        engine.attach_navigation(8, 3).unwrap();

        assert_eq!(
            engine.ids_by_navigation(&[7], &Candidates::All).unwrap(),
            Candidates::Only(vec![1, 2, 3])
        );
        assert_eq!(
            engine.ids_by_navigation(&[7, 8], &Candidates::All).unwrap(),
            Candidates::Only(vec![2, 3])
        );
        assert_eq!(
            engine
                .ids_by_navigation(&[7, 8], &Candidates::only([3, 1]))
                .unwrap(),
            Candidates::Only(vec![3])
        );
        assert_eq!(
            engine.ids_by_navigation(&[42], &Candidates::All).unwrap(),
            Candidates::Only(vec![])
        );

        assert!(engine.detach_navigation(8, 3).unwrap());
        assert_eq!(
            engine.ids_by_navigation(&[7, 8], &Candidates::All).unwrap(),
            Candidates::Only(vec![2])
        );
    }

    #[test]
    fn test_no_navigation_keeps_seed() {
        let engine = test_engine();
        assert_eq!(
            engine.ids_by_navigation(&[], &Candidates::All).unwrap(),
            Candidates::All
        );
        assert_eq!(
            engine.ids_by_navigation(&[], &Candidates::only([4])).unwrap(),
            Candidates::Only(vec![4])
        );
    }

    #[test]
    fn test_navigation_rows() {
        let engine = test_engine();
        engine.attach_navigation(7, 1).unwrap();
        engine.attach_navigation(9, 1).unwrap();

        let rows = engine
            .select(Table::Navigation, &Condition::and().add("navigation_id", 9u64))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_id("entity_id"), Some(1));
    }

    #[test]
    fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(dir.path());

        let id;
        {
            let engine = StorageEngine::open(config.clone()).unwrap();
            id = product(&engine, "shirt");
            engine.put_field_value(&FieldValue::new(id, 1, "red")).unwrap();
            engine.flush().unwrap();
        }

        let engine = StorageEngine::open(config).unwrap();
        assert!(engine.get_entity(id).unwrap().is_some());
        let rows = engine
            .select(Table::FieldValues, &Condition::and().add("entity_id", id))
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
