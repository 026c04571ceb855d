//! Storage dispatch.
//!
//! The dispatcher routes a resolved record to the configured backend adapter
//! and recovers every backend failure into a reported outcome. Nothing here
//! propagates an error to the caller: the submission-save flow that triggers
//! dispatch must complete regardless of storage outcome.

use crate::config::{StorageConfig, StorageType};
use crate::logging::{StorageLog, TracingLog};
use crate::mapping::ResolvedRecord;
use crate::storage::{EntityStore, StorageError, StorageId, TableStore};
use std::fmt;
use std::sync::Arc;

/// Outcome of one dispatch call. No partial success: either the backend
/// persisted the whole record and generated an id, or nothing was stored.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Dispatched(StorageId),
    NotDispatched(NotDispatchedReason),
}

/// Why a record was not dispatched.
#[derive(Debug, Clone, PartialEq)]
pub enum NotDispatchedReason {
    /// Storage type or storage key missing; reported, caller logs it.
    ConfigurationIncomplete(String),
    /// The backend rejected a field or identifier.
    ValidationError(String),
    /// The storage engine failed the write.
    StorageError(String),
}

impl fmt::Display for NotDispatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotDispatchedReason::ConfigurationIncomplete(msg) => {
                write!(f, "configuration incomplete: {}", msg)
            }
            NotDispatchedReason::ValidationError(msg) => write!(f, "validation error: {}", msg),
            NotDispatchedReason::StorageError(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

/// Routes resolved records to the configured backend.
///
/// Holds no state between calls; each dispatch is a single synchronous
/// backend write.
pub struct StorageDispatcher {
    entities: Box<dyn EntityStore>,
    tables: Box<dyn TableStore>,
    log: Arc<dyn StorageLog>,
}

impl StorageDispatcher {
    pub fn new(entities: Box<dyn EntityStore>, tables: Box<dyn TableStore>) -> Self {
        Self::with_logger(entities, tables, Arc::new(TracingLog))
    }

    pub fn with_logger(
        entities: Box<dyn EntityStore>,
        tables: Box<dyn TableStore>,
        log: Arc<dyn StorageLog>,
    ) -> Self {
        Self {
            entities,
            tables,
            log,
        }
    }

    /// Dispatch a resolved record to the backend selected by `config`.
    ///
    /// Preconditions: `storage_type` present and `storage_key` non-empty;
    /// otherwise this is a no-op reporting
    /// [`NotDispatchedReason::ConfigurationIncomplete`] for the caller to log.
    /// Backend failures are logged here and recovered into the outcome.
    pub fn dispatch(&self, config: &StorageConfig, record: &ResolvedRecord) -> DispatchOutcome {
        let storage_type = match config.storage_type {
            Some(storage_type) => storage_type,
            None => {
                return DispatchOutcome::NotDispatched(
                    NotDispatchedReason::ConfigurationIncomplete(
                        "storage type is not set".to_string(),
                    ),
                )
            }
        };
        if config.storage_key.is_empty() {
            return DispatchOutcome::NotDispatched(NotDispatchedReason::ConfigurationIncomplete(
                "storage key is empty".to_string(),
            ));
        }

        let result = match storage_type {
            StorageType::Entity => self.submit_entity(config, record),
            StorageType::Table => self.submit_table(config, record),
        };

        match result {
            Ok(id) => DispatchOutcome::Dispatched(id),
            Err(e) => {
                match storage_type {
                    StorageType::Entity => self
                        .log
                        .error(&format!("Error creating entity {}: {}", config.storage_key, e)),
                    StorageType::Table => self.log.error(&format!(
                        "Error inserting to table {}: {}",
                        config.storage_key, e
                    )),
                }
                let reason = if e.is_validation() {
                    NotDispatchedReason::ValidationError(e.to_string())
                } else {
                    NotDispatchedReason::StorageError(e.to_string())
                };
                DispatchOutcome::NotDispatched(reason)
            }
        }
    }

    /// Create an instance of the configured entity type, assign every record
    /// entry as a field in template order, and persist it. No schema checking
    /// happens here; unknown field names go to the backend's own policy.
    fn submit_entity(
        &self,
        config: &StorageConfig,
        record: &ResolvedRecord,
    ) -> Result<StorageId, StorageError> {
        let mut entity = self.entities.create(&config.storage_key)?;
        for (name, value) in record.iter() {
            entity.set_field(name, value.clone())?;
        }
        let id = entity.save()?;

        if config.debug {
            self.log.info(&format!(
                "Entity {} successfully created with id: {}",
                config.storage_key, id
            ));
        }
        Ok(id)
    }

    /// Insert the record as column→value pairs into the configured table.
    fn submit_table(
        &self,
        config: &StorageConfig,
        record: &ResolvedRecord,
    ) -> Result<StorageId, StorageError> {
        let id = self.tables.insert(&config.storage_key, record)?;

        if config.debug {
            self.log.info(&format!(
                "Insert to table {} successfully created row with id: {}",
                config.storage_key, id
            ));
        }
        Ok(id)
    }
}
