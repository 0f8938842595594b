//! Concrete ACL addresses produced by path resolution.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::namespace::ObjectType;

/// One ACL document on the server.
///
/// | organization | object_type | name | ACL |
/// |---|---|---|---|
/// | `Some(o)`/`None` | `None` | `None` | organization |
/// | `Some(o)`/`None` | `Some(t)` | `None` | container of `t` |
/// | `Some(o)`/`None` | `Some(t)` | `Some(n)` | object |
/// | `None` | `Some(Users)` | `Some(n)` | global user |
///
/// `None` organizations on org-scoped targets mean single-organization mode.
/// Field order defines the emission order of the resolver.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResolvedTarget {
    object_type: Option<ObjectType>,
    organization: Option<String>,
    name: Option<String>,
}

impl ResolvedTarget {
    pub fn organization_root(organization: Option<&str>) -> Self {
        ResolvedTarget {
            object_type: None,
            organization: organization.map(str::to_string),
            name: None,
        }
    }

    pub fn container(organization: Option<&str>, object_type: ObjectType) -> Self {
        ResolvedTarget {
            object_type: Some(object_type),
            organization: organization.map(str::to_string),
            name: None,
        }
    }

    pub fn object(
        organization: Option<&str>,
        object_type: ObjectType,
        name: impl Into<String>,
    ) -> Self {
        ResolvedTarget {
            object_type: Some(object_type),
            organization: organization.map(str::to_string),
            name: Some(name.into()),
        }
    }

    pub fn user(name: impl Into<String>) -> Self {
        ResolvedTarget::object(None, ObjectType::Users, name)
    }

    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    pub fn object_type(&self) -> Option<ObjectType> {
        self.object_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_container(&self) -> bool {
        self.object_type.is_some() && self.name.is_none()
    }

    pub fn is_organization(&self) -> bool {
        self.object_type.is_none()
    }

    /// Path prefix the type segment is appended to.
    fn prefix(&self) -> String {
        match (&self.organization, self.object_type) {
            (Some(org), _) => format!("/organizations/{org}/"),
            (None, Some(ObjectType::Users)) => "/".to_string(),
            (None, _) => String::new(),
        }
    }

    /// Logical path of the object, e.g. `/organizations/foo/nodes/x` or `nodes/x`.
    pub fn path(&self) -> String {
        let prefix = self.prefix();
        match (&self.object_type, &self.name) {
            (None, _) => prefix.trim_end_matches('/').to_string(),
            (Some(ty), None) => format!("{prefix}{ty}"),
            (Some(ty), Some(name)) => format!("{prefix}{ty}/{name}"),
        }
    }

    /// Server path of the ACL document, e.g. `/organizations/foo/containers/nodes/_acl`.
    pub fn acl_path(&self) -> String {
        let prefix = self.prefix();
        match (&self.object_type, &self.name) {
            (None, _) => format!("{prefix}organizations/_acl"),
            (Some(ty), None) => format!("{prefix}containers/{ty}/_acl"),
            (Some(ty), Some(name)) => format!("{prefix}{ty}/{name}/_acl"),
        }
    }
}

impl Display for ResolvedTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.path())
    }
}
