//! Grant decisions over a role graph
//!
//! ```text
//! is_granted(role, resource, context)
//!     │
//!     ├─ empty role/resource ──────────────► default decision (deny)
//!     ├─ RoleGraph::has_permission ── no ──► false
//!     └─ Assertion::assert(context) ───────► true / false
//! ```
//!
//! Lookup and assertion failures are returned as
//! [`RbacError::AuthorizationCheck`]; a denial is always `Ok(false)`.

use crate::assertion::Assertion;
use crate::config::RbacConfig;
use crate::error::{RbacError, Result};
use crate::graph::RoleGraph;
use crate::metrics::{DecisionCounters, DecisionStats, Outcome};
use crate::types::AccessContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decision returned when role or resource is empty and no check is performed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultDecision {
    /// Grant access
    Allow,
    /// Refuse access
    #[default]
    Deny,
}

impl DefaultDecision {
    /// Whether this decision grants access
    pub fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Authorizer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizerConfig {
    /// Decision for checks with an empty role or resource
    pub default_decision: DefaultDecision,
}

/// Answers "may this role act on this resource"
///
/// Cloning is cheap; clones share the graph, the assertion and the decision
/// counters.
///
/// # Example
///
/// ```
/// use cretoai_rbac::{Authorizer, RoleGraphBuilder};
///
/// let mut builder = RoleGraphBuilder::new();
/// builder.add_role("administrator", Vec::<String>::new())?;
/// builder.add_role("editor", ["administrator"])?;
/// builder.add_permission("administrator", "admin.settings")?;
///
/// let authorizer = Authorizer::new(builder.build()?);
/// assert!(authorizer.is_granted("editor", "admin.settings", None)?);
/// assert!(!authorizer.is_granted("", "admin.settings", None)?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Authorizer {
    graph: Arc<RoleGraph>,
    assertion: Option<Arc<dyn Assertion>>,
    config: AuthorizerConfig,
    counters: Arc<DecisionCounters>,
}

impl Authorizer {
    /// Create an authorizer without assertion, denying degenerate input
    pub fn new(graph: RoleGraph) -> Self {
        Self {
            graph: Arc::new(graph),
            assertion: None,
            config: AuthorizerConfig::default(),
            counters: Arc::new(DecisionCounters::default()),
        }
    }

    /// Build the role graph from configuration and wrap it
    pub fn from_config(config: &RbacConfig) -> Result<Self> {
        let graph = config.build_graph()?;
        Ok(Self::new(graph).with_config(AuthorizerConfig {
            default_decision: config.default_decision,
        }))
    }

    /// Consult `assertion` for every grant
    pub fn with_assertion(mut self, assertion: Arc<dyn Assertion>) -> Self {
        self.assertion = Some(assertion);
        self
    }

    /// Replace the authorizer configuration
    pub fn with_config(mut self, config: AuthorizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Role graph this authorizer decides against
    pub fn graph(&self) -> &RoleGraph {
        &self.graph
    }

    /// Active configuration
    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    /// Whether an assertion is consulted on grants
    pub fn has_assertion(&self) -> bool {
        self.assertion.is_some()
    }

    /// Counters accumulated by this authorizer and its clones
    pub fn stats(&self) -> DecisionStats {
        self.counters.snapshot()
    }

    /// Decide whether `role` may access `resource`
    ///
    /// The configured assertion, if any, is consulted only when the role holds
    /// the permission, and receives `context` unchanged.
    ///
    /// # Errors
    ///
    /// `AuthorizationCheck` if the role is unknown or the assertion fails.
    pub fn is_granted(
        &self,
        role: &str,
        resource: &str,
        context: Option<&AccessContext>,
    ) -> Result<bool> {
        self.check(role, resource, context, self.assertion.as_deref())
    }

    /// Same as [`is_granted`](Self::is_granted), with `assertion` replacing the
    /// configured one for this call
    pub fn is_granted_with(
        &self,
        role: &str,
        resource: &str,
        context: Option<&AccessContext>,
        assertion: &dyn Assertion,
    ) -> Result<bool> {
        self.check(role, resource, context, Some(assertion))
    }

    fn check(
        &self,
        role: &str,
        resource: &str,
        context: Option<&AccessContext>,
        assertion: Option<&dyn Assertion>,
    ) -> Result<bool> {
        if role.is_empty() || resource.is_empty() {
            let decision = self.config.default_decision.is_allow();
            debug!(role, resource, decision, "Empty role or resource, check skipped");
            self.counters.record(Outcome::Skipped);
            return Ok(decision);
        }

        match self.evaluate(role, resource, context, assertion) {
            Ok(granted) => {
                debug!(role, resource, granted, "Authorization decision");
                self.counters.record(if granted {
                    Outcome::Granted
                } else {
                    Outcome::Denied
                });
                Ok(granted)
            }
            Err(err) => {
                warn!(role, resource, error = %err, "Authorization check failed");
                self.counters.record(Outcome::Failed);
                Err(err)
            }
        }
    }

    fn evaluate(
        &self,
        role: &str,
        resource: &str,
        context: Option<&AccessContext>,
        assertion: Option<&dyn Assertion>,
    ) -> Result<bool> {
        let has_permission = self
            .graph
            .has_permission(role, resource)
            .map_err(RbacError::check_failed)?;

        if !has_permission {
            return Ok(false);
        }

        let Some(assertion) = assertion else {
            return Ok(true);
        };

        let role = self.graph.get_role(role).map_err(RbacError::check_failed)?;
        assertion
            .assert(&self.graph, role, resource, context)
            .map_err(RbacError::check_failed)
    }
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("roles", &self.graph.len())
            .field("has_assertion", &self.has_assertion())
            .field("config", &self.config)
            .finish()
    }
}
