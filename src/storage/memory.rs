//! In-memory reference backends.
//!
//! These adapters keep everything in process memory: the entity store holds
//! a registry of entity type definitions and the instances saved against
//! them, the table store holds named tables of rows. Both hand out
//! sequential integer ids and retain what they stored so tests (and
//! embedding hosts) can inspect the outcome of a dispatch.

use crate::mapping::ResolvedRecord;
use crate::submission::FieldValue;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::{EntityHandle, EntityStore, StorageError, StorageId, TableStore};

/// What an entity type does with assignments to undeclared fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownFieldPolicy {
    /// Reject the assignment with a validation error.
    Reject,
    /// Accept the assignment as-is.
    PassThrough,
}

#[derive(Debug, Clone)]
struct TypeDef {
    /// Declared field names; `None` accepts any field.
    fields: Option<HashSet<String>>,
    policy: UnknownFieldPolicy,
}

/// A persisted entity instance, kept for inspection.
#[derive(Debug, Clone)]
pub struct SavedEntity {
    pub id: i64,
    pub entity_type: String,
    pub fields: IndexMap<String, FieldValue>,
}

#[derive(Default)]
struct EntityStoreInner {
    types: HashMap<String, TypeDef>,
    saved: Vec<SavedEntity>,
    next_id: i64,
}

/// In-memory entity store.
///
/// Entity types must be registered before instances can be created against
/// them; creating an unregistered type is an [`StorageError::UnknownEntityType`].
/// Clones share the same underlying store.
///
/// # Example
/// ```
/// use formsink::storage::memory::MemoryEntityStore;
/// use formsink::storage::EntityStore;
/// use formsink::submission::FieldValue;
///
/// let store = MemoryEntityStore::new();
/// store.register_type("profile_note");
///
/// let mut entity = store.create("profile_note").unwrap();
/// entity.set_field("name", FieldValue::String("Alice".to_string())).unwrap();
/// let id = entity.save().unwrap();
/// assert_eq!(id.to_string(), "1");
/// ```
#[derive(Clone, Default)]
pub struct MemoryEntityStore {
    inner: Arc<Mutex<EntityStoreInner>>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type that accepts any field name.
    pub fn register_type(&self, name: impl Into<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.types.insert(
                name.into(),
                TypeDef {
                    fields: None,
                    policy: UnknownFieldPolicy::PassThrough,
                },
            );
        }
    }

    /// Register an entity type with a declared field set and a policy for
    /// assignments outside it.
    pub fn register_type_with_fields(
        &self,
        name: impl Into<String>,
        fields: &[&str],
        policy: UnknownFieldPolicy,
    ) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.types.insert(
                name.into(),
                TypeDef {
                    fields: Some(fields.iter().map(|f| f.to_string()).collect()),
                    policy,
                },
            );
        }
    }

    /// All saved instances, in save order.
    pub fn saved(&self) -> Vec<SavedEntity> {
        self.inner
            .lock()
            .map(|inner| inner.saved.clone())
            .unwrap_or_default()
    }

    /// Saved instances of one entity type.
    pub fn saved_of_type(&self, type_name: &str) -> Vec<SavedEntity> {
        self.saved()
            .into_iter()
            .filter(|e| e.entity_type == type_name)
            .collect()
    }
}

impl EntityStore for MemoryEntityStore {
    fn create(&self, type_name: &str) -> Result<Box<dyn EntityHandle>, StorageError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StorageError::Backend("entity store lock poisoned".to_string()))?;

        let def = inner
            .types
            .get(type_name)
            .ok_or_else(|| StorageError::UnknownEntityType(type_name.to_string()))?
            .clone();

        Ok(Box::new(MemoryEntityHandle {
            store: Arc::clone(&self.inner),
            entity_type: type_name.to_string(),
            def,
            fields: IndexMap::new(),
        }))
    }
}

struct MemoryEntityHandle {
    store: Arc<Mutex<EntityStoreInner>>,
    entity_type: String,
    def: TypeDef,
    fields: IndexMap<String, FieldValue>,
}

impl EntityHandle for MemoryEntityHandle {
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), StorageError> {
        if let Some(declared) = &self.def.fields {
            if !declared.contains(name) && self.def.policy == UnknownFieldPolicy::Reject {
                return Err(StorageError::UnknownField {
                    entity_type: self.entity_type.clone(),
                    field: name.to_string(),
                });
            }
        }
        self.fields.insert(name.to_string(), value);
        Ok(())
    }

    fn save(self: Box<Self>) -> Result<StorageId, StorageError> {
        let mut inner = self
            .store
            .lock()
            .map_err(|_| StorageError::Backend("entity store lock poisoned".to_string()))?;

        inner.next_id += 1;
        let id = inner.next_id;
        inner.saved.push(SavedEntity {
            id,
            entity_type: self.entity_type,
            fields: self.fields,
        });
        Ok(StorageId::Int(id))
    }
}

/// A persisted table row, kept for inspection.
#[derive(Debug, Clone)]
pub struct TableRow {
    pub id: i64,
    pub columns: IndexMap<String, FieldValue>,
}

/// In-memory table store.
///
/// Tables are created on first insert; each table assigns sequential row
/// ids starting at 1. Clones share the same underlying store.
#[derive(Clone, Default)]
pub struct MemoryTableStore {
    tables: Arc<Mutex<HashMap<String, Vec<TableRow>>>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows of one table, in insert order.
    pub fn rows(&self, table_name: &str) -> Vec<TableRow> {
        self.tables
            .lock()
            .map(|tables| tables.get(table_name).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl TableStore for MemoryTableStore {
    fn insert(&self, table_name: &str, row: &ResolvedRecord) -> Result<StorageId, StorageError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StorageError::Backend("table store lock poisoned".to_string()))?;

        let rows = tables.entry(table_name.to_string()).or_default();
        let id = rows.len() as i64 + 1;
        rows.push(TableRow {
            id,
            columns: row.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        });
        Ok(StorageId::Int(id))
    }
}
