//! # Formsink: Configuration-Driven Submission Routing
//!
//! Formsink takes structured form-submission data, applies a field-mapping
//! transformation, and persists the result into a configurable storage
//! backend: a generic entity store or a generic relational table.
//!
//! ## Features
//!
//! - **Token substitution**: `[namespace:key]` placeholders resolved against
//!   the submission through a pluggable provider registry
//! - **YAML mapping templates**: `target_field: token_expression` per line,
//!   decoded into a resolved field→value record
//! - **Two backend adapters**: entity store (create/assign/save) and
//!   relational table (insert row), selected by configuration
//! - **Recovered failures**: storage errors are logged and reported, never
//!   propagated into the host's submission-save flow
//! - **Debug echo**: optional pre-dispatch and post-dispatch log entries for
//!   troubleshooting a handler configuration
//!
//! ## Example: handler configuration
//!
//! ```yaml
//! storage_type: entity
//! storage_key: profile_note
//! storage_fields_mapping: |
//!   field_name: '[submission:first_name]'
//!   field_note: '[submission:note]'
//! debug: false
//! ```
//!
//! ## Example: post-save flow
//!
//! ```
//! use formsink::{
//!     MappingResolver, MemoryEntityStore, MemoryTableStore, StorageConfig,
//!     StorageDispatcher, StorageType, SubmissionContext, SubmissionStorageHandler,
//! };
//!
//! let entities = MemoryEntityStore::new();
//! entities.register_type("profile_note");
//!
//! let handler = SubmissionStorageHandler::new(
//!     StorageConfig {
//!         storage_type: Some(StorageType::Entity),
//!         storage_key: "profile_note".to_string(),
//!         storage_fields_mapping: "name: '[submission:first_name]'".to_string(),
//!         debug: false,
//!     },
//!     MappingResolver::default(),
//!     StorageDispatcher::new(Box::new(entities.clone()), Box::new(MemoryTableStore::new())),
//! );
//!
//! let submission = SubmissionContext::new().with_value("first_name", "Alice");
//! handler.post_save(&submission);
//! ```

// Core modules
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod logging;
pub mod mapping;
pub mod submission;
pub mod token;

// Storage backend traits and adapters
pub mod storage;

// Diesel-backed relational adapter
pub mod diesel_backend;

// Re-export key types
pub use config::{StorageConfig, StorageType};
pub use dispatch::{DispatchOutcome, NotDispatchedReason, StorageDispatcher};
pub use handler::{HandlerOutcome, SkipReason, SubmissionStorageHandler};
pub use logging::{StorageLog, TracingLog};
pub use mapping::{MappingError, MappingResolver, ResolvedRecord};
pub use storage::{EntityHandle, EntityStore, StorageError, StorageId, TableStore};
pub use submission::{FieldValue, SubmissionContext};
pub use token::{TokenFn, TokenRegistry};

// Re-export memory backends
pub use storage::memory::{MemoryEntityStore, MemoryTableStore, UnknownFieldPolicy};

// Re-export diesel_backend types
pub use diesel_backend::{Database, DatabaseConfig, DieselTableStore};
