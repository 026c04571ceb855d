//! Post-save submission handling.
//!
//! [`SubmissionStorageHandler`] is the piece a host invokes after a form
//! submission has been persisted. It resolves the configured fields mapping
//! against the submission, echoes the attempt when debug is enabled, and
//! hands the record to the dispatcher. The call is infallible by signature:
//! every failure is logged and folded into the returned outcome, so the
//! host's submission-save flow can never be broken by storage.

use crate::config::StorageConfig;
use crate::dispatch::{DispatchOutcome, NotDispatchedReason, StorageDispatcher};
use crate::logging::{StorageLog, TracingLog};
use crate::mapping::MappingResolver;
use crate::storage::StorageId;
use crate::submission::SubmissionContext;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Outcome of handling one saved submission.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    Stored(StorageId),
    Skipped(SkipReason),
}

/// Why a submission was not stored.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// No storage type configured at all.
    ConfigurationMissing,
    /// Storage type set but the configuration is unusable (empty key).
    ConfigurationIncomplete(String),
    /// The substituted template did not decode as a mapping.
    MalformedMapping(String),
    /// The template resolved to an empty record; nothing to store.
    EmptyMapping,
    /// The backend rejected a field or identifier.
    ValidationError(String),
    /// The storage engine failed the write.
    StorageError(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ConfigurationMissing => write!(f, "storage type is not configured"),
            SkipReason::ConfigurationIncomplete(msg) => {
                write!(f, "configuration incomplete: {}", msg)
            }
            SkipReason::MalformedMapping(msg) => write!(f, "malformed mapping: {}", msg),
            SkipReason::EmptyMapping => write!(f, "mapping resolved to an empty record"),
            SkipReason::ValidationError(msg) => write!(f, "validation error: {}", msg),
            SkipReason::StorageError(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

/// Handles saved submissions for one configured storage target.
///
/// # Example
/// ```
/// use formsink::config::{StorageConfig, StorageType};
/// use formsink::dispatch::StorageDispatcher;
/// use formsink::handler::SubmissionStorageHandler;
/// use formsink::mapping::MappingResolver;
/// use formsink::storage::memory::{MemoryEntityStore, MemoryTableStore};
/// use formsink::submission::SubmissionContext;
///
/// let entities = MemoryEntityStore::new();
/// entities.register_type("profile_note");
///
/// let handler = SubmissionStorageHandler::new(
///     StorageConfig {
///         storage_type: Some(StorageType::Entity),
///         storage_key: "profile_note".to_string(),
///         storage_fields_mapping: "name: '[submission:first_name]'".to_string(),
///         debug: false,
///     },
///     MappingResolver::default(),
///     StorageDispatcher::new(Box::new(entities.clone()), Box::new(MemoryTableStore::new())),
/// );
///
/// let submission = SubmissionContext::new().with_value("first_name", "Alice");
/// handler.post_save(&submission);
/// assert_eq!(entities.saved_of_type("profile_note").len(), 1);
/// ```
pub struct SubmissionStorageHandler {
    config: StorageConfig,
    resolver: MappingResolver,
    dispatcher: StorageDispatcher,
    log: Arc<dyn StorageLog>,
}

impl SubmissionStorageHandler {
    pub fn new(
        config: StorageConfig,
        resolver: MappingResolver,
        dispatcher: StorageDispatcher,
    ) -> Self {
        Self::with_logger(config, resolver, dispatcher, Arc::new(TracingLog))
    }

    pub fn with_logger(
        config: StorageConfig,
        resolver: MappingResolver,
        dispatcher: StorageDispatcher,
        log: Arc<dyn StorageLog>,
    ) -> Self {
        Self {
            config,
            resolver,
            dispatcher,
            log,
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Process one saved submission: resolve the mapping, optionally echo the
    /// attempt, dispatch, report.
    ///
    /// Failures surface only through the log channel and the returned
    /// outcome; one submission's failure has no effect on any other.
    pub fn post_save(&self, submission: &SubmissionContext) -> HandlerOutcome {
        if !self.config.is_configured() {
            self.log
                .error("Storage type is not configured. Check submission handler settings");
            return HandlerOutcome::Skipped(SkipReason::ConfigurationMissing);
        }

        let record = match self
            .resolver
            .resolve(&self.config.storage_fields_mapping, submission)
        {
            Ok(record) => record,
            Err(e) => {
                self.log
                    .error(&format!("Fields mapping could not be resolved: {}", e));
                return HandlerOutcome::Skipped(SkipReason::MalformedMapping(e.to_string()));
            }
        };

        if record.is_empty() {
            return HandlerOutcome::Skipped(SkipReason::EmptyMapping);
        }

        if self.config.debug {
            // The echoed record is the same snapshot handed to dispatch below,
            // never recomputed.
            self.log.info(&format!(
                "Config data: {}, Data: {}",
                json_or_placeholder(&record),
                json_or_placeholder(submission.values()),
            ));
        }

        match self.dispatcher.dispatch(&self.config, &record) {
            DispatchOutcome::Dispatched(id) => HandlerOutcome::Stored(id),
            DispatchOutcome::NotDispatched(reason) => {
                if let NotDispatchedReason::ConfigurationIncomplete(msg) = &reason {
                    self.log
                        .error(&format!("Storage configuration is incomplete: {}", msg));
                }
                HandlerOutcome::Skipped(match reason {
                    NotDispatchedReason::ConfigurationIncomplete(msg) => {
                        SkipReason::ConfigurationIncomplete(msg)
                    }
                    NotDispatchedReason::ValidationError(msg) => SkipReason::ValidationError(msg),
                    NotDispatchedReason::StorageError(msg) => SkipReason::StorageError(msg),
                })
            }
        }
    }
}

/// Debug logging must never fail the dispatch; serialization problems
/// degrade to a placeholder.
fn json_or_placeholder<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<unserializable>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageType;
    use crate::storage::memory::{MemoryEntityStore, MemoryTableStore};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingLog {
        infos: Mutex<Vec<String>>,
        errors: Mutex<Vec<String>>,
    }

    impl StorageLog for CollectingLog {
        fn info(&self, message: &str) {
            self.infos.lock().unwrap().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    fn handler_with(
        config: StorageConfig,
        entities: MemoryEntityStore,
        tables: MemoryTableStore,
        log: Arc<CollectingLog>,
    ) -> SubmissionStorageHandler {
        SubmissionStorageHandler::with_logger(
            config,
            MappingResolver::default(),
            StorageDispatcher::with_logger(Box::new(entities), Box::new(tables), log.clone()),
            log,
        )
    }

    #[test]
    fn test_unconfigured_handler_logs_exactly_once_and_skips() {
        let log = Arc::new(CollectingLog::default());
        let handler = handler_with(
            StorageConfig::default(),
            MemoryEntityStore::new(),
            MemoryTableStore::new(),
            log.clone(),
        );

        let outcome = handler.post_save(&SubmissionContext::new().with_value("a", "b"));

        assert_eq!(outcome, HandlerOutcome::Skipped(SkipReason::ConfigurationMissing));
        assert_eq!(log.errors.lock().unwrap().len(), 1);
        assert_eq!(log.infos.lock().unwrap().len(), 0);
    }

    #[test]
    fn test_empty_mapping_skips_without_error() {
        let log = Arc::new(CollectingLog::default());
        let handler = handler_with(
            StorageConfig {
                storage_type: Some(StorageType::Entity),
                storage_key: "profile_note".to_string(),
                ..StorageConfig::default()
            },
            MemoryEntityStore::new(),
            MemoryTableStore::new(),
            log.clone(),
        );

        let outcome = handler.post_save(&SubmissionContext::new());

        assert_eq!(outcome, HandlerOutcome::Skipped(SkipReason::EmptyMapping));
        assert!(log.errors.lock().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_mapping_logs_and_never_dispatches() {
        let entities = MemoryEntityStore::new();
        entities.register_type("profile_note");
        let log = Arc::new(CollectingLog::default());
        let handler = handler_with(
            StorageConfig {
                storage_type: Some(StorageType::Entity),
                storage_key: "profile_note".to_string(),
                storage_fields_mapping: "bad: [unclosed\n  - worse".to_string(),
                ..StorageConfig::default()
            },
            entities.clone(),
            MemoryTableStore::new(),
            log.clone(),
        );

        let outcome = handler.post_save(&SubmissionContext::new().with_value("x", "y"));

        assert!(matches!(
            outcome,
            HandlerOutcome::Skipped(SkipReason::MalformedMapping(_))
        ));
        assert_eq!(log.errors.lock().unwrap().len(), 1);
        assert!(entities.saved().is_empty());
    }

    #[test]
    fn test_debug_success_produces_two_log_entries() {
        let entities = MemoryEntityStore::new();
        entities.register_type("profile_note");
        let log = Arc::new(CollectingLog::default());
        let handler = handler_with(
            StorageConfig {
                storage_type: Some(StorageType::Entity),
                storage_key: "profile_note".to_string(),
                storage_fields_mapping: "name: '[submission:first_name]'".to_string(),
                debug: true,
            },
            entities,
            MemoryTableStore::new(),
            log.clone(),
        );

        let outcome =
            handler.post_save(&SubmissionContext::new().with_value("first_name", "Alice"));

        assert_eq!(outcome, HandlerOutcome::Stored(StorageId::Int(1)));
        let infos = log.infos.lock().unwrap();
        assert_eq!(infos.len(), 2);
        // Pre-dispatch echo carries the resolved record and the raw values.
        assert!(infos[0].contains("\"name\":\"Alice\""));
        assert!(infos[0].contains("\"first_name\":\"Alice\""));
        // Post-dispatch entry reports the generated id.
        assert!(infos[1].contains("id: 1"));
    }

    #[test]
    fn test_debug_off_produces_no_info_logs() {
        let entities = MemoryEntityStore::new();
        entities.register_type("profile_note");
        let log = Arc::new(CollectingLog::default());
        let handler = handler_with(
            StorageConfig {
                storage_type: Some(StorageType::Entity),
                storage_key: "profile_note".to_string(),
                storage_fields_mapping: "name: '[submission:first_name]'".to_string(),
                debug: false,
            },
            entities,
            MemoryTableStore::new(),
            log.clone(),
        );

        handler.post_save(&SubmissionContext::new().with_value("first_name", "Alice"));

        assert!(log.infos.lock().unwrap().is_empty());
    }

    #[test]
    fn test_incomplete_configuration_is_logged_by_handler() {
        let log = Arc::new(CollectingLog::default());
        let handler = handler_with(
            StorageConfig {
                storage_type: Some(StorageType::Table),
                storage_key: String::new(),
                storage_fields_mapping: "email: '[submission:email]'".to_string(),
                ..StorageConfig::default()
            },
            MemoryEntityStore::new(),
            MemoryTableStore::new(),
            log.clone(),
        );

        let outcome = handler.post_save(&SubmissionContext::new().with_value("email", "a@b.com"));

        assert!(matches!(
            outcome,
            HandlerOutcome::Skipped(SkipReason::ConfigurationIncomplete(_))
        ));
        assert_eq!(log.errors.lock().unwrap().len(), 1);
    }
}
