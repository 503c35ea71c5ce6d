//! RBAC configuration loading and validation
//!
//! The configuration lives under the [`CONFIG_SECTION`] key of an application
//! config tree:
//!
//! ```toml
//! [authorization-rbac.roles]
//! administrator = []
//! editor = ["administrator"]
//!
//! [authorization-rbac.permissions]
//! administrator = ["admin.settings"]
//! editor = ["admin.publish"]
//! ```
//!
//! `roles` and `permissions` are required. `create_missing_roles` (default
//! `true`) and `default_decision` (`"deny"` or `"allow"`, default `"deny"`) are
//! optional.

use crate::authorizer::DefaultDecision;
use crate::error::{RbacError, Result};
use crate::graph::{GraphError, RoleGraph, RoleGraphBuilder};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Key of the RBAC section in the application config tree
pub const CONFIG_SECTION: &str = "authorization-rbac";

/// Declarative role hierarchy and permission assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RbacConfig {
    /// Role name -> parent role names
    pub roles: BTreeMap<String, Vec<String>>,

    /// Role name -> permissions attached directly to the role
    pub permissions: BTreeMap<String, Vec<String>>,

    /// Create parents that are not declared under `roles` as empty roles
    pub create_missing_roles: bool,

    /// Decision for checks with an empty role or resource
    pub default_decision: DefaultDecision,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            roles: BTreeMap::new(),
            permissions: BTreeMap::new(),
            create_missing_roles: true,
            default_decision: DefaultDecision::Deny,
        }
    }
}

impl RbacConfig {
    /// Load configuration from a TOML or JSON file (chosen by extension)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let root: Value = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents).map_err(|e| {
                RbacError::InvalidConfig(format!("failed to parse {}: {e}", path.display()))
            })?,
            _ => {
                let table: toml::Value = toml::from_str(&contents).map_err(|e| {
                    RbacError::InvalidConfig(format!("failed to parse {}: {e}", path.display()))
                })?;
                serde_json::to_value(table).map_err(|e| {
                    RbacError::InvalidConfig(format!("failed to convert {}: {e}", path.display()))
                })?
            }
        };

        debug!(path = %path.display(), "Loaded RBAC configuration file");
        Self::from_value(&root)
    }

    /// Extract the RBAC section from an application config tree
    pub fn from_value(root: &Value) -> Result<Self> {
        match root.get(CONFIG_SECTION) {
            None | Some(Value::Null) => Err(RbacError::InvalidConfig(format!(
                "no \"{CONFIG_SECTION}\" config key present"
            ))),
            Some(section) => Self::from_section(section),
        }
    }

    /// Parse the contents of the RBAC section itself
    pub fn from_section(section: &Value) -> Result<Self> {
        let table = section.as_object().ok_or_else(|| {
            RbacError::InvalidConfig(format!("{CONFIG_SECTION} must be a table"))
        })?;

        let roles = string_lists(table, "roles")?;
        let permissions = string_lists(table, "permissions")?;

        let create_missing_roles = match table.get("create_missing_roles") {
            None | Some(Value::Null) => true,
            Some(Value::Bool(enabled)) => *enabled,
            Some(_) => {
                return Err(RbacError::InvalidConfig(format!(
                    "{CONFIG_SECTION}.create_missing_roles must be a boolean"
                )))
            }
        };

        let default_decision = match table.get("default_decision") {
            None | Some(Value::Null) => DefaultDecision::default(),
            Some(value) => serde_json::from_value(value.clone()).map_err(|_| {
                RbacError::InvalidConfig(format!(
                    "{CONFIG_SECTION}.default_decision must be \"allow\" or \"deny\""
                ))
            })?,
        };

        Ok(Self {
            roles,
            permissions,
            create_missing_roles,
            default_decision,
        })
    }

    /// Build the role graph described by this configuration
    ///
    /// Declaration order does not matter. Without `create_missing_roles`,
    /// every parent must itself be declared under `roles`.
    pub fn build_graph(&self) -> Result<RoleGraph> {
        if !self.create_missing_roles {
            for (role, parents) in &self.roles {
                if let Some(parent) = parents.iter().find(|p| !self.roles.contains_key(*p)) {
                    return Err(GraphError::UnknownParent {
                        role: role.clone(),
                        parent: parent.clone(),
                    }
                    .into());
                }
            }
        }

        // every parent is declared or may be created, so insertion order is free
        let mut builder = RoleGraphBuilder::new().with_create_missing_roles(true);

        for (role, parents) in &self.roles {
            builder
                .add_role(role.as_str(), parents.iter().map(String::as_str))
                .map_err(malformed_entry)?;
        }

        for (role, permissions) in &self.permissions {
            for permission in permissions {
                builder
                    .add_permission(role, permission.as_str())
                    .map_err(malformed_entry)?;
            }
        }

        Ok(builder.build()?)
    }
}

/// Malformed names in the config tree are config errors, structural ones stay graph errors
fn malformed_entry(err: GraphError) -> RbacError {
    match err {
        GraphError::InvalidRoleName(name) => {
            RbacError::InvalidConfig(format!("{CONFIG_SECTION}: invalid role name {name:?}"))
        }
        GraphError::InvalidPermission(role) => RbacError::InvalidConfig(format!(
            "{CONFIG_SECTION}.permissions.{role}: permission cannot be empty"
        )),
        other => other.into(),
    }
}

/// Read a required `role -> [string]` table
///
/// A `null` entry is an empty list and a bare string a one-element list.
fn string_lists(table: &Map<String, Value>, key: &str) -> Result<BTreeMap<String, Vec<String>>> {
    let entries = match table.get(key) {
        None | Some(Value::Null) => {
            return Err(RbacError::InvalidConfig(format!(
                "no {CONFIG_SECTION}.{key} configured"
            )))
        }
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            return Err(RbacError::InvalidConfig(format!(
                "{CONFIG_SECTION}.{key} must be a table"
            )))
        }
    };

    let mut lists = BTreeMap::new();
    for (role, entry) in entries {
        let values = match entry {
            Value::Null => Vec::new(),
            Value::String(single) => vec![single.clone()],
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    RbacError::InvalidConfig(format!(
                        "{CONFIG_SECTION}.{key}.{role} must contain only strings"
                    ))
                })?,
            _ => {
                return Err(RbacError::InvalidConfig(format!(
                    "{CONFIG_SECTION}.{key}.{role} must be a list of strings"
                )))
            }
        };
        lists.insert(role.clone(), values);
    }

    Ok(lists)
}
