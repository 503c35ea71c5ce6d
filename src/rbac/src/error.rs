//! Error types for the RBAC engine

use crate::graph::GraphError;
use thiserror::Error;

/// RBAC engine errors
#[derive(Debug, Error)]
pub enum RbacError {
    /// Missing or malformed construction configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Role graph construction or lookup error
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Unexpected failure while answering a grant check
    #[error("Could not check authorization: {source}")]
    AuthorizationCheck {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RbacError {
    /// Wrap a failure raised during `is_granted`
    pub(crate) fn check_failed<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::AuthorizationCheck {
            source: Box::new(source),
        }
    }

    /// True for errors that abort graph construction from configuration
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::Graph(_))
    }
}

/// Result type for RBAC operations
pub type Result<T> = std::result::Result<T, RbacError>;
