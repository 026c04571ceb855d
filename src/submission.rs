//! Submission field values and the per-submission context.
//!
//! A [`SubmissionContext`] is an immutable snapshot of a saved form
//! submission: the element values plus submission-level metadata. It is the
//! source that token expressions in a mapping template resolve against.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Represents the different kinds of values a submission field can carry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<FieldValue>),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    /// Renders the value the way it appears after token substitution.
    /// Multi-value fields join with `", "`; null renders empty so a missing
    /// element value never leaks a literal `null` into a mapped field.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::List(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", rendered.join(", "))
            }
            FieldValue::Null => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Immutable record of a saved submission.
///
/// Holds the submitted element values and any submission metadata (form id,
/// serial number, etc.). Created fresh per submission and discarded after
/// dispatch; nothing here is retained between submissions.
///
/// # Example
/// ```
/// use formsink::submission::SubmissionContext;
///
/// let submission = SubmissionContext::new()
///     .with_value("first_name", "Alice")
///     .with_value("age", 30i64)
///     .with_metadata("form_id", "contact");
///
/// assert_eq!(submission.metadata("form_id"), Some("contact"));
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubmissionContext {
    values: HashMap<String, FieldValue>,
    metadata: HashMap<String, String>,
}

impl SubmissionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context directly from a map of element values.
    pub fn from_values(values: HashMap<String, FieldValue>) -> Self {
        Self {
            values,
            metadata: HashMap::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Get a submitted element value by name.
    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Get a submission metadata field by name.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    /// All submitted element values, as captured at save time.
    pub fn values(&self) -> &HashMap<String, FieldValue> {
        &self.values
    }
}
