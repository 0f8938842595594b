//! Desired-state instructions handed to the merge engine.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::AclError;

use super::permission::Permission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Grant,
    Revoke,
}

/// One `rights` / `remove_rights` statement.
///
/// Permissions are kept as raw tokens and validated when the directive is
/// applied, so the front-end can hand over whatever the user wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightsDirective {
    pub permissions: Vec<String>,
    pub operation: Operation,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub clients: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl RightsDirective {
    pub fn new<I, S>(operation: Operation, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RightsDirective {
            permissions: permissions.into_iter().map(Into::into).collect(),
            operation,
            users: Vec::new(),
            clients: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn grant<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Operation::Grant, permissions)
    }

    pub fn revoke<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Operation::Revoke, permissions)
    }

    pub fn users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users.extend(users.into_iter().map(Into::into));
        self
    }

    pub fn clients<I, S>(mut self, clients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clients.extend(clients.into_iter().map(Into::into));
        self
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Users followed by clients; both live in the server's `actors` list.
    pub fn actors(&self) -> impl Iterator<Item = &str> {
        self.users.iter().chain(self.clients.iter()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.clients.is_empty() && self.groups.is_empty()
    }

    /// Resolve the permission tokens, de-duplicated in first-seen order.
    pub fn resolved_permissions(&self) -> Result<Vec<Permission>, AclError> {
        let mut out: Vec<Permission> = Vec::new();
        for token in &self.permissions {
            for permission in Permission::parse_token(token)? {
                if !out.contains(&permission) {
                    out.push(permission);
                }
            }
        }
        Ok(out)
    }
}
