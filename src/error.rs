use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AclError {
    #[error("{0}")]
    PathError(String),

    #[error("invalid permission: {0}")]
    InvalidPermission(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict writing {0}")]
    Conflict(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("{} target(s) failed: {}", .0.len(), .0.iter().join("; "))]
    Aggregate(Vec<TargetFailure>),
}

impl AclError {
    /// The error raised when a path descends below an object that does not carry ACLs
    /// on its children, e.g. a cookbook version or a data bag item.
    pub(crate) fn children_of(parent: &str) -> Self {
        AclError::PathError(format!("ACLs cannot be set on children of {parent}"))
    }
}

/// A single target that failed during a convergence run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFailure {
    pub path: String,
    pub error: AclError,
}

impl std::fmt::Display for TargetFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

impl From<serde_json::Error> for AclError {
    fn from(err: serde_json::Error) -> Self {
        AclError::InvalidFormat(err.to_string())
    }
}

impl From<regex::Error> for AclError {
    fn from(err: regex::Error) -> Self {
        AclError::PathError(err.to_string())
    }
}
