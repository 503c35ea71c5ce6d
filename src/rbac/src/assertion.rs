//! Contextual assertions
//!
//! An [`Assertion`] can veto a grant that static permission membership would
//! allow. The request context is passed as an argument on every call, so one
//! assertion instance may be shared by concurrent checks.

use crate::graph::RoleGraph;
use crate::role::Role;
use crate::types::AccessContext;
use serde_json::Value;
use thiserror::Error;

/// Failure raised while evaluating an assertion
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Assertion failed: {message}")]
pub struct AssertionError {
    message: String,
}

impl AssertionError {
    /// Create an error with a human-readable reason
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Reason the assertion could not be evaluated
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Contextual predicate consulted after the permission check succeeded
///
/// Returning `Ok(false)` denies access. Returning an error aborts the check and
/// is reported to the caller as an authorization failure.
pub trait Assertion: Send + Sync {
    /// Decide whether `role` may access `resource` given `context`
    fn assert(
        &self,
        graph: &RoleGraph,
        role: &Role,
        resource: &str,
        context: Option<&AccessContext>,
    ) -> Result<bool, AssertionError>;
}

impl<F> Assertion for F
where
    F: Fn(&Role, &str, Option<&AccessContext>) -> bool + Send + Sync,
{
    fn assert(
        &self,
        _graph: &RoleGraph,
        role: &Role,
        resource: &str,
        context: Option<&AccessContext>,
    ) -> Result<bool, AssertionError> {
        Ok(self(role, resource, context))
    }
}

/// Grants only when a context attribute equals an expected value
///
/// A missing context or attribute denies.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeEquals {
    key: String,
    expected: Value,
}

impl AttributeEquals {
    /// Require attribute `key` to equal `expected`
    pub fn new(key: impl Into<String>, expected: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            expected: expected.into(),
        }
    }
}

impl Assertion for AttributeEquals {
    fn assert(
        &self,
        _graph: &RoleGraph,
        _role: &Role,
        _resource: &str,
        context: Option<&AccessContext>,
    ) -> Result<bool, AssertionError> {
        Ok(context
            .and_then(|ctx| ctx.get(&self.key))
            .is_some_and(|value| *value == self.expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RoleGraphBuilder;

    fn graph_with(role: &str) -> RoleGraph {
        let mut builder = RoleGraphBuilder::new();
        builder.add_role(role, Vec::<String>::new()).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_closure_assertion() {
        let graph = graph_with("editor");
        let role = graph.get_role("editor").unwrap();

        let only_posts = |_: &Role, resource: &str, _: Option<&AccessContext>| {
            resource.starts_with("admin.posts")
        };

        assert_eq!(only_posts.assert(&graph, role, "admin.posts", None), Ok(true));
        assert_eq!(only_posts.assert(&graph, role, "admin.settings", None), Ok(false));
    }

    #[test]
    fn test_attribute_equals() {
        let graph = graph_with("editor");
        let role = graph.get_role("editor").unwrap();
        let assertion = AttributeEquals::new("owner", "alice");

        let alice = AccessContext::new().with_attribute("owner", "alice");
        let bob = AccessContext::new().with_attribute("owner", "bob");

        assert_eq!(assertion.assert(&graph, role, "doc", Some(&alice)), Ok(true));
        assert_eq!(assertion.assert(&graph, role, "doc", Some(&bob)), Ok(false));
        assert_eq!(assertion.assert(&graph, role, "doc", Some(&AccessContext::new())), Ok(false));
        assert_eq!(assertion.assert(&graph, role, "doc", None), Ok(false));
    }

    #[test]
    fn test_assertion_error_message() {
        let err = AssertionError::new("context store unavailable");
        assert_eq!(err.message(), "context store unavailable");
        assert_eq!(err.to_string(), "Assertion failed: context store unavailable");
    }
}
