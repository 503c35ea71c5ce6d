//! Role hierarchy with permission inheritance
//!
//! Roles are registered on a [`RoleGraphBuilder`]. [`RoleGraphBuilder::build`]
//! rejects inheritance cycles and returns an immutable [`RoleGraph`] that only
//! answers queries, so a built graph can be shared freely across threads.
//!
//! A role inherits every permission attached to any role reachable through
//! its parent links. Lookups walk the parents breadth-first and visit each
//! role once, so diamond-shaped hierarchies are resolved without re-visits.

use crate::role::{is_valid_role_name, Role};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use thiserror::Error;
use tracing::{debug, info};

/// Graph-related errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Role name is empty or not a valid identifier
    #[error("Invalid role name: {0:?}")]
    InvalidRoleName(String),

    /// Role is not registered
    #[error("No role with name \"{0}\" could be found")]
    UnknownRole(String),

    /// Parent role is not registered and missing roles are not created
    #[error("Role \"{role}\" references unknown parent role \"{parent}\"")]
    UnknownParent {
        /// Role being registered
        role: String,
        /// Parent that could not be found
        parent: String,
    },

    /// Permission identifier is empty
    #[error("Invalid permission for role \"{0}\": permission cannot be empty")]
    InvalidPermission(String),

    /// Parent links form a cycle
    #[error("Circular inheritance detected: {0}")]
    CircularInheritance(String),
}

/// Mutable registry used to assemble a [`RoleGraph`]
///
/// # Example
///
/// ```
/// use cretoai_rbac::graph::RoleGraphBuilder;
///
/// let mut builder = RoleGraphBuilder::new();
/// builder.add_role("administrator", Vec::<String>::new())?;
/// builder.add_role("editor", ["administrator"])?;
/// builder.add_permission("administrator", "admin.settings")?;
///
/// let graph = builder.build()?;
/// assert!(graph.has_permission("editor", "admin.settings")?);
/// # Ok::<(), cretoai_rbac::graph::GraphError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoleGraphBuilder {
    roles: BTreeMap<String, Role>,

    /// Materialize unknown parents as empty roles instead of failing
    create_missing_roles: bool,
}

impl RoleGraphBuilder {
    /// Create an empty builder; unknown parents are rejected
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style toggle for creating unknown parent roles on demand
    pub fn with_create_missing_roles(mut self, enabled: bool) -> Self {
        self.create_missing_roles = enabled;
        self
    }

    /// Toggle creating unknown parent roles on demand
    pub fn set_create_missing_roles(&mut self, enabled: bool) {
        self.create_missing_roles = enabled;
    }

    /// Whether unknown parents are created as empty roles
    pub fn creates_missing_roles(&self) -> bool {
        self.create_missing_roles
    }

    /// Register a role with its parents
    ///
    /// Re-adding an existing role replaces its parent set and keeps the
    /// permissions already attached to it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `name` or a parent name is not a valid role name
    /// - the role lists itself as a parent
    /// - a parent is unknown and missing roles are not created
    ///
    /// The builder is left unchanged on error.
    pub fn add_role<I, S>(&mut self, name: impl Into<String>, parents: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if !is_valid_role_name(&name) {
            return Err(GraphError::InvalidRoleName(name));
        }

        let mut parent_names: Vec<String> = Vec::new();
        for parent in parents {
            let parent = parent.into();
            if !is_valid_role_name(&parent) {
                return Err(GraphError::InvalidRoleName(parent));
            }
            if parent == name {
                return Err(GraphError::CircularInheritance(format!("{name} -> {name}")));
            }
            if !self.create_missing_roles && !self.roles.contains_key(&parent) {
                return Err(GraphError::UnknownParent { role: name, parent });
            }
            if !parent_names.contains(&parent) {
                parent_names.push(parent);
            }
        }

        for parent in &parent_names {
            if !self.roles.contains_key(parent) {
                debug!(role = %name, parent = %parent, "Creating missing parent role");
                self.roles.insert(parent.clone(), Role::new(parent.clone()));
            }
        }

        self.roles
            .entry(name)
            .or_insert_with_key(|key| Role::new(key.clone()))
            .set_parents(parent_names);

        Ok(())
    }

    /// Attach a permission to a registered role
    ///
    /// # Errors
    ///
    /// `UnknownRole` if the role has not been registered, `InvalidPermission`
    /// for an empty permission. The builder is left unchanged on error.
    pub fn add_permission(
        &mut self,
        role: &str,
        permission: impl Into<String>,
    ) -> Result<(), GraphError> {
        let permission = permission.into();
        let target = self
            .roles
            .get_mut(role)
            .ok_or_else(|| GraphError::UnknownRole(role.to_string()))?;

        if permission.is_empty() {
            return Err(GraphError::InvalidPermission(role.to_string()));
        }

        target.add_permission(permission);
        Ok(())
    }

    /// Look up a registered role
    pub fn get_role(&self, name: &str) -> Result<&Role, GraphError> {
        self.roles
            .get(name)
            .ok_or_else(|| GraphError::UnknownRole(name.to_string()))
    }

    /// Whether a role with this name is registered
    pub fn contains_role(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    /// Number of registered roles
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Whether no role is registered
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Validate the hierarchy and freeze it
    ///
    /// # Errors
    ///
    /// Returns `CircularInheritance` with the offending path if parent links
    /// form a cycle.
    pub fn build(self) -> Result<RoleGraph, GraphError> {
        detect_cycles(&self.roles)?;

        info!(
            roles = self.roles.len(),
            permissions = self.roles.values().map(|r| r.permissions().count()).sum::<usize>(),
            "Role graph built"
        );

        Ok(RoleGraph { roles: self.roles })
    }
}

/// Immutable role hierarchy
///
/// Only constructed through [`RoleGraphBuilder::build`], which guarantees that
/// every parent is registered and the parent links are acyclic.
#[derive(Debug, Clone, Default)]
pub struct RoleGraph {
    roles: BTreeMap<String, Role>,
}

impl RoleGraph {
    /// Look up a role
    pub fn get_role(&self, name: &str) -> Result<&Role, GraphError> {
        self.roles
            .get(name)
            .ok_or_else(|| GraphError::UnknownRole(name.to_string()))
    }

    /// Whether a role with this name is registered
    pub fn contains_role(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    /// All roles, ordered by name
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    /// Number of roles
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Whether the graph holds no roles
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Check whether `role` holds `permission` directly or through any ancestor
    ///
    /// Stops at the first role carrying the permission.
    pub fn has_permission(&self, role: &str, permission: &str) -> Result<bool, GraphError> {
        let found = self
            .lineage(role)?
            .any(|r| r.has_direct_permission(permission));
        Ok(found)
    }

    /// Names of every role `role` inherits from, nearest first
    pub fn ancestors(&self, role: &str) -> Result<Vec<&str>, GraphError> {
        Ok(self.lineage(role)?.skip(1).map(Role::name).collect())
    }

    /// Whether `ancestor` is reachable from `role` through parent links
    pub fn inherits_from(&self, role: &str, ancestor: &str) -> Result<bool, GraphError> {
        self.get_role(ancestor)?;
        Ok(self.lineage(role)?.skip(1).any(|r| r.name() == ancestor))
    }

    /// Direct and inherited permissions of `role`
    pub fn effective_permissions(&self, role: &str) -> Result<BTreeSet<&str>, GraphError> {
        Ok(self.lineage(role)?.flat_map(Role::permissions).collect())
    }

    /// Breadth-first walk from `role` over its ancestors, starting with `role`
    fn lineage(&self, role: &str) -> Result<Lineage<'_>, GraphError> {
        let start = self.get_role(role)?;
        Ok(Lineage {
            graph: self,
            queue: VecDeque::from([start]),
            visited: HashSet::from([start.name()]),
        })
    }
}

/// Breadth-first iterator over a role and its ancestors, each yielded once
struct Lineage<'a> {
    graph: &'a RoleGraph,
    queue: VecDeque<&'a Role>,
    visited: HashSet<&'a str>,
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a Role;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.queue.pop_front()?;

        for parent in current.parents() {
            if self.visited.insert(parent.as_str()) {
                if let Some(role) = self.graph.roles.get(parent) {
                    self.queue.push_back(role);
                }
            }
        }

        Some(current)
    }
}

/// DFS state for cycle detection
enum VisitState {
    /// On the current DFS path
    Visiting,
    /// Fully explored
    Done,
}

/// Fail with the first cycle found in the parent links
///
/// Depth-first with an explicit stack, so arbitrarily deep hierarchies do not
/// grow the thread stack.
fn detect_cycles<'a>(roles: &'a BTreeMap<String, Role>) -> Result<(), GraphError> {
    let mut state: HashMap<&'a str, VisitState> = HashMap::with_capacity(roles.len());
    // (role, index of the next parent to explore); doubles as the current path
    let mut stack: Vec<(&'a Role, usize)> = Vec::new();

    for root in roles.values() {
        if state.contains_key(root.name()) {
            continue;
        }
        state.insert(root.name(), VisitState::Visiting);
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let role = frame.0;
            let index = frame.1;
            frame.1 += 1;

            let Some(parent) = role.parents().get(index) else {
                state.insert(role.name(), VisitState::Done);
                stack.pop();
                continue;
            };

            match state.get(parent.as_str()) {
                Some(VisitState::Visiting) => {
                    let start = stack
                        .iter()
                        .position(|(r, _)| r.name() == parent.as_str())
                        .unwrap_or(0);
                    let cycle: Vec<&str> = stack[start..]
                        .iter()
                        .map(|(r, _)| r.name())
                        .chain(std::iter::once(parent.as_str()))
                        .collect();
                    return Err(GraphError::CircularInheritance(cycle.join(" -> ")));
                }
                Some(VisitState::Done) => {}
                None => {
                    if let Some(parent_role) = roles.get(parent) {
                        state.insert(parent_role.name(), VisitState::Visiting);
                        stack.push((parent_role, 0));
                    }
                }
            }
        }
    }

    Ok(())
}
