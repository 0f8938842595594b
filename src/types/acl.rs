//! ACL documents as stored by the server.
//!
//! The external shape is
//! `{"read": {"actors": ["alice"], "groups": ["admins"]}, ...}`. Actors hold
//! both users and clients; the server does not tag them.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::permission::Permission;

/// Members holding one permission.
///
/// Sets keep insertion order for stable serialization; equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightsEntry {
    #[serde(default)]
    pub actors: IndexSet<String>,
    #[serde(default)]
    pub groups: IndexSet<String>,
}

impl RightsEntry {
    pub fn new<A, G, S>(actors: A, groups: G) -> Self
    where
        A: IntoIterator<Item = S>,
        G: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RightsEntry {
            actors: actors.into_iter().map(Into::into).collect(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty() && self.groups.is_empty()
    }
}

/// The ACL of one target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AclDocument {
    rights: IndexMap<Permission, RightsEntry>,
}

impl AclDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rights for `permission`; an absent permission reads as an empty entry.
    pub fn get(&self, permission: Permission) -> RightsEntry {
        self.rights.get(&permission).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, permission: Permission, entry: RightsEntry) {
        self.rights.insert(permission, entry);
    }

    /// Builder-style [`AclDocument::set`].
    pub fn with(mut self, permission: Permission, entry: RightsEntry) -> Self {
        self.set(permission, entry);
        self
    }

    pub(crate) fn entry_mut(&mut self, permission: Permission) -> &mut RightsEntry {
        self.rights.entry(permission).or_default()
    }

    /// Permissions present in the document, in insertion order.
    pub fn permissions(&self) -> impl Iterator<Item = Permission> + '_ {
        self.rights.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rights.values().all(RightsEntry::is_empty)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, crate::AclError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<serde_json::Value, crate::AclError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Structural equality: order is ignored and a missing permission equals an
/// empty one.
impl PartialEq for AclDocument {
    fn eq(&self, other: &Self) -> bool {
        Permission::iter().all(|p| self.get(p) == other.get(p))
    }
}

impl Eq for AclDocument {}
