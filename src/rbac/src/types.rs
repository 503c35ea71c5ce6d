//! Request-scoped context passed to assertions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Opaque request context (client IP, owner id, time of day, ...)
///
/// The engine never interprets the attributes; they are handed to the
/// configured [`Assertion`](crate::assertion::Assertion) as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessContext {
    attributes: HashMap<String, Value>,
}

impl AccessContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute to the context
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set an attribute in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Look up an attribute
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Look up a string attribute
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the context carries no attributes
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl From<HashMap<String, Value>> for AccessContext {
    fn from(attributes: HashMap<String, Value>) -> Self {
        Self { attributes }
    }
}

impl FromIterator<(String, Value)> for AccessContext {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_attributes() {
        let context = AccessContext::new()
            .with_attribute("owner", "alice")
            .with_attribute("level", 3);

        assert_eq!(context.len(), 2);
        assert_eq!(context.get_str("owner"), Some("alice"));
        assert_eq!(context.get("level"), Some(&json!(3)));
        assert_eq!(context.get_str("level"), None);
        assert!(context.get("missing").is_none());
    }

    #[test]
    fn test_context_serializes_as_plain_map() {
        let context = AccessContext::new().with_attribute("ip", "10.0.0.1");
        let value = serde_json::to_value(&context).unwrap();
        assert_eq!(value, json!({ "ip": "10.0.0.1" }));

        let parsed: AccessContext = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, context);
    }
}
