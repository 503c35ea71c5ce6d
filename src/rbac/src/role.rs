//! Role definition and role name validation

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Longest accepted role name, in bytes
pub const MAX_ROLE_NAME_LENGTH: usize = 256;

/// A named role with its direct parents and directly attached permissions
///
/// Inherited permissions are not stored here; they are resolved through the
/// parent links by [`RoleGraph`](crate::graph::RoleGraph).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    name: String,

    /// Parent role names, in declaration order
    #[serde(default)]
    parents: Vec<String>,

    /// Permissions attached directly to this role
    #[serde(default)]
    permissions: BTreeSet<String>,
}

impl Role {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            permissions: BTreeSet::new(),
        }
    }

    /// Role name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct parent role names
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    /// Permissions attached directly to this role
    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    /// Whether `permission` is attached directly (ignores inheritance)
    pub fn has_direct_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub(crate) fn set_parents(&mut self, parents: Vec<String>) {
        self.parents = parents;
    }

    pub(crate) fn add_permission(&mut self, permission: String) {
        self.permissions.insert(permission);
    }
}

/// Check that `name` can be used as a role identity
///
/// Names must be non-empty, at most [`MAX_ROLE_NAME_LENGTH`] bytes, and free of
/// whitespace and control characters.
pub fn is_valid_role_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_ROLE_NAME_LENGTH
        && !name.chars().any(|c| c.is_whitespace() || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_name_validation() {
        assert!(is_valid_role_name("administrator"));
        assert!(is_valid_role_name("team:editor"));
        assert!(is_valid_role_name("admin.settings-v2"));

        assert!(!is_valid_role_name(""));
        assert!(!is_valid_role_name("content editor"));
        assert!(!is_valid_role_name("editor\n"));
        assert!(!is_valid_role_name(&"r".repeat(MAX_ROLE_NAME_LENGTH + 1)));
        assert!(is_valid_role_name(&"r".repeat(MAX_ROLE_NAME_LENGTH)));
    }

    #[test]
    fn test_direct_permissions() {
        let mut role = Role::new("editor");
        role.add_permission("admin.publish".to_string());
        role.add_permission("admin.publish".to_string());

        assert!(role.has_direct_permission("admin.publish"));
        assert!(!role.has_direct_permission("admin.settings"));
        assert_eq!(role.permissions().count(), 1);
        assert!(role.parents().is_empty());
    }
}
