//! Storage backend capability traits.
//!
//! The dispatcher routes resolved records through these traits; the concrete
//! adapter decides what a field assignment or a row insert means. The crate
//! ships an in-memory reference implementation ([`memory`]) and a
//! Diesel-backed relational adapter (`diesel_backend`).

pub mod memory;

use crate::mapping::ResolvedRecord;
use crate::submission::FieldValue;
use std::fmt;

/// Error type for backend operations
#[derive(Debug, Clone)]
pub enum StorageError {
    UnknownEntityType(String),
    UnknownField {
        entity_type: String,
        field: String,
    },
    InvalidIdentifier(String),
    Backend(String),
}

impl StorageError {
    /// Validation-class errors come from name/field checking; everything
    /// else is a storage-engine failure.
    pub fn is_validation(&self) -> bool {
        !matches!(self, StorageError::Backend(_))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::UnknownEntityType(name) => {
                write!(f, "Unknown entity type: {}", name)
            }
            StorageError::UnknownField { entity_type, field } => {
                write!(f, "Entity type '{}' has no field '{}'", entity_type, field)
            }
            StorageError::InvalidIdentifier(name) => {
                write!(f, "Invalid identifier: {}", name)
            }
            StorageError::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Identifier generated by a backend for a persisted record.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageId {
    Int(i64),
    Text(String),
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageId::Int(id) => write!(f, "{}", id),
            StorageId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// A not-yet-persisted entity instance.
///
/// Field assignment is explicit rather than reflective: unknown field names
/// are accepted or rejected per the backend's own policy, never silently
/// turned into dynamic attributes.
pub trait EntityHandle {
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), StorageError>;

    /// Persist the instance, returning its generated identifier.
    fn save(self: Box<Self>) -> Result<StorageId, StorageError>;
}

/// Create/assign/save abstraction over a typed record store.
pub trait EntityStore: Send + Sync {
    fn create(&self, type_name: &str) -> Result<Box<dyn EntityHandle>, StorageError>;
}

/// Insert-row abstraction over a table store.
pub trait TableStore: Send + Sync {
    fn insert(&self, table_name: &str, row: &ResolvedRecord) -> Result<StorageId, StorageError>;
}
