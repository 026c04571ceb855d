//! Mapping template resolution.
//!
//! A mapping template is a YAML string, one `target_field: token_expression`
//! per line. Resolution substitutes tokens from the submission context into
//! the raw template text, then decodes the substituted text as a YAML mapping
//! into a [`ResolvedRecord`].

use crate::submission::{FieldValue, SubmissionContext};
use crate::token::TokenRegistry;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Error type for mapping resolution
#[derive(Debug, Clone)]
pub enum MappingError {
    MalformedMapping(String),
    DuplicateKey { key: String },
    NotAMapping { actual: &'static str },
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::MalformedMapping(msg) => write!(f, "Malformed mapping: {}", msg),
            MappingError::DuplicateKey { key } => {
                write!(f, "Duplicate key '{}' in mapping template", key)
            }
            MappingError::NotAMapping { actual } => {
                write!(f, "Mapping template must decode to a mapping, got {}", actual)
            }
        }
    }
}

impl std::error::Error for MappingError {}

/// A resolved field→value record, ready for dispatch.
///
/// Keys are the target-field names declared by the mapping template; values
/// are the substituted, decoded results. Iteration order is the template's
/// declaration order, which keeps relational column order deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedRecord {
    fields: IndexMap<String, FieldValue>,
}

impl ResolvedRecord {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: IndexMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }
}

impl FromIterator<(String, FieldValue)> for ResolvedRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Resolves mapping templates against submission contexts.
///
/// # Example
/// ```
/// use formsink::mapping::MappingResolver;
/// use formsink::submission::SubmissionContext;
///
/// let resolver = MappingResolver::default();
/// let submission = SubmissionContext::new().with_value("first_name", "Alice");
///
/// let record = resolver
///     .resolve("field_name: [submission:first_name]", &submission)
///     .unwrap();
/// assert_eq!(record.get("field_name").unwrap().to_string(), "Alice");
/// ```
pub struct MappingResolver {
    tokens: TokenRegistry,
}

impl MappingResolver {
    pub fn new(tokens: TokenRegistry) -> Self {
        Self { tokens }
    }

    /// Resolve a mapping template against a submission.
    ///
    /// A blank template resolves to an empty record; the caller is expected
    /// to short-circuit dispatch in that case. Token substitution never
    /// fails, but the substituted text must decode as a YAML mapping with
    /// unique string keys.
    ///
    /// Duplicate target-field keys are rejected rather than silently
    /// collapsed; the offending key is named in the error.
    ///
    /// # Errors
    /// Returns [`MappingError`] if the substituted text is not a valid
    /// mapping. The caller must not dispatch in that case.
    pub fn resolve(
        &self,
        template: &str,
        context: &SubmissionContext,
    ) -> Result<ResolvedRecord, MappingError> {
        if template.trim().is_empty() {
            return Ok(ResolvedRecord::empty());
        }

        let substituted = self.tokens.substitute(template, context);
        decode_mapping(&substituted)
    }
}

impl Default for MappingResolver {
    fn default() -> Self {
        Self::new(TokenRegistry::with_defaults())
    }
}

fn decode_mapping(text: &str) -> Result<ResolvedRecord, MappingError> {
    let value: serde_yaml::Value = serde_yaml::from_str(text)
        .map_err(|e| MappingError::MalformedMapping(e.to_string()))?;

    let mapping = match value {
        serde_yaml::Value::Mapping(mapping) => mapping,
        serde_yaml::Value::Null => return Ok(ResolvedRecord::empty()),
        other => {
            return Err(MappingError::NotAMapping {
                actual: yaml_kind(&other),
            })
        }
    };

    let mut fields = IndexMap::new();
    for (key, value) in mapping {
        let key = match key {
            serde_yaml::Value::String(key) => key,
            _ => {
                return Err(MappingError::MalformedMapping(
                    "mapping keys must be strings".to_string(),
                ))
            }
        };
        if fields.insert(key.clone(), yaml_to_field_value(value)).is_some() {
            return Err(MappingError::DuplicateKey { key });
        }
    }

    Ok(ResolvedRecord::from_fields(fields))
}

/// Convert a decoded YAML value to a FieldValue.
///
/// Lists pass through as [`FieldValue::List`]; nested mappings are opaque to
/// this crate and are carried as their JSON string rendering for the backend
/// to interpret.
fn yaml_to_field_value(value: serde_yaml::Value) -> FieldValue {
    match value {
        serde_yaml::Value::Null => FieldValue::Null,
        serde_yaml::Value::Bool(b) => FieldValue::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::Null
            }
        }
        serde_yaml::Value::String(s) => FieldValue::String(s),
        serde_yaml::Value::Sequence(items) => {
            FieldValue::List(items.into_iter().map(yaml_to_field_value).collect())
        }
        mapping @ serde_yaml::Value::Mapping(_) => {
            FieldValue::String(serde_json::to_string(&mapping).unwrap_or_default())
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_field_value(tagged.value),
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}
