//! # CretoAI RBAC Engine
//!
//! Hierarchical role-based access control: answers whether an already
//! authenticated principal's role may act on a resource.
//!
//! ## Features
//!
//! - **Multiple inheritance**: roles inherit every permission reachable through
//!   their parents, diamonds included
//! - **Cycle detection** when the role graph is built
//! - **Immutable graphs**: a built [`RoleGraph`] is query-only and `Send + Sync`
//! - **Assertions**: optional contextual predicates that can veto a grant
//! - **Deny by default** for checks with an empty role or resource
//! - **Declarative configuration** from TOML/JSON config trees
//!
//! ## Example
//!
//! ```rust
//! use cretoai_rbac::{Authorizer, RbacConfig};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RbacConfig::from_value(&json!({
//!     "authorization-rbac": {
//!         "roles": {
//!             "administrator": [],
//!             "editor": ["administrator"],
//!             "contributor": ["editor"],
//!         },
//!         "permissions": {
//!             "administrator": ["admin.settings"],
//!             "editor": ["admin.publish"],
//!             "contributor": ["admin.dashboard", "admin.posts"],
//!         },
//!     }
//! }))?;
//!
//! let authorizer = Authorizer::from_config(&config)?;
//!
//! assert!(authorizer.is_granted("contributor", "admin.settings", None)?);
//! assert!(!authorizer.is_granted("administrator", "admin.dashboard", None)?);
//! # Ok(())
//! # }
//! ```

pub mod assertion;
pub mod authorizer;
pub mod config;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod role;
pub mod types;

// Re-export commonly used types
pub use assertion::{Assertion, AssertionError, AttributeEquals};
pub use authorizer::{Authorizer, AuthorizerConfig, DefaultDecision};
pub use config::{RbacConfig, CONFIG_SECTION};
pub use error::{RbacError, Result};
pub use graph::{GraphError, RoleGraph, RoleGraphBuilder};
pub use metrics::DecisionStats;
pub use role::Role;
pub use types::AccessContext;
