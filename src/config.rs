//! Handler configuration.
//!
//! Mirrors the configuration surface a host exposes for one storage handler:
//! the backend selector, the target entity type or table name, the raw
//! fields-mapping template, and the debug flag. Loaded once per handler and
//! consumed read-only by the resolve/dispatch flow.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Which backend a resolved record is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Entity,
    Table,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::Entity => write!(f, "entity"),
            StorageType::Table => write!(f, "table"),
        }
    }
}

/// Configuration for one storage handler.
///
/// The default configuration is entirely empty: no storage type, no storage
/// key, no mapping, debug off. Hosts that persist the selector as an empty
/// string get `None` back on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend selector; `None` means the handler is not configured and no
    /// dispatch occurs.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub storage_type: Option<StorageType>,

    /// Entity type name or database table name, depending on storage_type.
    #[serde(default)]
    pub storage_key: String,

    /// YAML mapping template: `target_field: token_expression` per line.
    #[serde(default)]
    pub storage_fields_mapping: String,

    /// When true, the handler echoes attempted data and results to the log.
    #[serde(default)]
    pub debug: bool,
}

impl StorageConfig {
    /// Load a handler configuration from a YAML file.
    ///
    /// # Errors
    /// Returns error if file doesn't exist or has invalid format
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        serde_yaml::from_str(&contents).map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// A storage type has been selected at all.
    pub fn is_configured(&self) -> bool {
        self.storage_type.is_some()
    }

    /// Both the storage type and the storage key are present.
    pub fn is_complete(&self) -> bool {
        self.storage_type.is_some() && !self.storage_key.is_empty()
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<StorageType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some("entity") => Ok(Some(StorageType::Entity)),
        Some("table") => Ok(Some(StorageType::Table)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "unknown storage type '{}', expected 'entity' or 'table'",
            other
        ))),
    }
}
