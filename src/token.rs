//! Token substitution registry for mapping templates.
//!
//! Template text may embed placeholder expressions of the form
//! `[namespace:key]`. Each namespace is backed by a registered provider that
//! resolves keys against the current [`SubmissionContext`]. Substitution is
//! best-effort: an unknown namespace or key substitutes to the empty string,
//! never an error.

use crate::submission::SubmissionContext;
use regex::Regex;
use std::collections::HashMap;

/// Trait for token providers.
///
/// A provider resolves keys within a single namespace. Returning `None`
/// means the key is unknown; the registry substitutes an empty string.
pub trait TokenFn: Send + Sync {
    fn resolve(&self, key: &str, context: &SubmissionContext) -> Option<String>;
}

/// Simple function-based implementation of TokenFn
impl<F> TokenFn for F
where
    F: Fn(&str, &SubmissionContext) -> Option<String> + Send + Sync,
{
    fn resolve(&self, key: &str, context: &SubmissionContext) -> Option<String> {
        self(key, context)
    }
}

/// Registry of token providers, keyed by namespace.
pub struct TokenRegistry {
    providers: HashMap<String, Box<dyn TokenFn>>,
    pattern: Regex,
}

impl TokenRegistry {
    /// Create an empty registry with no providers.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            // Namespace, then a key which may itself be a colon path.
            pattern: Regex::new(r"\[([A-Za-z0-9_]+):([^\[\]\s]+)\]")
                .expect("token pattern is a valid regex"),
        }
    }

    /// Create a registry with the built-in providers registered:
    /// `submission` (element values) and `form` (submission metadata).
    ///
    /// # Example
    /// ```
    /// use formsink::submission::SubmissionContext;
    /// use formsink::token::TokenRegistry;
    ///
    /// let registry = TokenRegistry::with_defaults();
    /// let submission = SubmissionContext::new().with_value("name", "Alice");
    ///
    /// let text = registry.substitute("hello [submission:name]", &submission);
    /// assert_eq!(text, "hello Alice");
    /// ```
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            "submission",
            Box::new(|key: &str, context: &SubmissionContext| {
                context.value(key).map(|v| v.to_string())
            }),
        );
        registry.register(
            "form",
            Box::new(|key: &str, context: &SubmissionContext| {
                context.metadata(key).map(|s| s.to_string())
            }),
        );
        registry
    }

    /// Register a token provider for a namespace.
    ///
    /// Registering a namespace twice replaces the previous provider.
    pub fn register(&mut self, namespace: impl Into<String>, provider: Box<dyn TokenFn>) {
        self.providers.insert(namespace.into(), provider);
    }

    /// Check if a namespace has a registered provider.
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.providers.contains_key(namespace)
    }

    /// Substitute every token expression in `template` against the context.
    ///
    /// Text outside token expressions passes through untouched. Tokens whose
    /// namespace or key cannot be resolved substitute to an empty string.
    pub fn substitute(&self, template: &str, context: &SubmissionContext) -> String {
        self.pattern
            .replace_all(template, |caps: &regex::Captures<'_>| {
                let namespace = &caps[1];
                let key = &caps[2];
                self.providers
                    .get(namespace)
                    .and_then(|provider| provider.resolve(key, context))
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_submission_values() {
        let registry = TokenRegistry::with_defaults();
        let submission = SubmissionContext::new()
            .with_value("first_name", "Alice")
            .with_value("age", 30i64);

        let out = registry.substitute(
            "name: [submission:first_name]\nage: [submission:age]",
            &submission,
        );
        assert_eq!(out, "name: Alice\nage: 30");
    }

    #[test]
    fn test_unknown_token_becomes_empty_string() {
        let registry = TokenRegistry::with_defaults();
        let submission = SubmissionContext::new();

        assert_eq!(registry.substitute("x: [submission:missing]", &submission), "x: ");
        assert_eq!(registry.substitute("x: [nope:key]", &submission), "x: ");
    }

    #[test]
    fn test_token_free_text_passes_through() {
        let registry = TokenRegistry::with_defaults();
        let submission = SubmissionContext::new();

        let text = "plain: value\nlist: [a, b]";
        assert_eq!(registry.substitute(text, &submission), text);
    }

    #[test]
    fn test_form_metadata_namespace() {
        let registry = TokenRegistry::with_defaults();
        let submission = SubmissionContext::new().with_metadata("form_id", "contact");

        assert_eq!(
            registry.substitute("source: [form:form_id]", &submission),
            "source: contact"
        );
    }

    #[test]
    fn test_custom_provider() {
        let mut registry = TokenRegistry::new();
        registry.register(
            "upper",
            Box::new(|key: &str, _context: &SubmissionContext| Some(key.to_uppercase())),
        );

        let submission = SubmissionContext::new();
        assert_eq!(registry.substitute("v: [upper:abc]", &submission), "v: ABC");
        assert!(registry.has_namespace("upper"));
        assert!(!registry.has_namespace("submission"));
    }
}
