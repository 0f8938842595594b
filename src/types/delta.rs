//! Audit view of the changes made to an ACL document.
//!
//! Additions are listed as plain identifiers, removals carry a leading
//! [`REMOVAL_MARKER`], matching the shape `{"read": {"actors": ["-u"]}}`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::acl::{AclDocument, RightsEntry};
use super::permission::Permission;

pub const REMOVAL_MARKER: char = '-';

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDelta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

impl EntryDelta {
    fn between(before: &RightsEntry, after: &RightsEntry) -> Self {
        EntryDelta {
            actors: diff_members(&before.actors, &after.actors),
            groups: diff_members(&before.groups, &after.groups),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty() && self.groups.is_empty()
    }

    pub fn added_actors(&self) -> impl Iterator<Item = &str> {
        added(&self.actors)
    }

    pub fn removed_actors(&self) -> impl Iterator<Item = &str> {
        removed(&self.actors)
    }

    pub fn added_groups(&self) -> impl Iterator<Item = &str> {
        added(&self.groups)
    }

    pub fn removed_groups(&self) -> impl Iterator<Item = &str> {
        removed(&self.groups)
    }
}

fn diff_members(
    before: &indexmap::IndexSet<String>,
    after: &indexmap::IndexSet<String>,
) -> Vec<String> {
    let additions = after.difference(before).cloned();
    let removals = before
        .difference(after)
        .map(|name| format!("{REMOVAL_MARKER}{name}"));
    additions.chain(removals).collect()
}

fn added(entries: &[String]) -> impl Iterator<Item = &str> {
    entries
        .iter()
        .filter(|e| !e.starts_with(REMOVAL_MARKER))
        .map(String::as_str)
}

fn removed(entries: &[String]) -> impl Iterator<Item = &str> {
    entries.iter().filter_map(|e| e.strip_prefix(REMOVAL_MARKER))
}

/// Per-permission changes between two documents; unchanged permissions are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AclDelta(IndexMap<Permission, EntryDelta>);

impl AclDelta {
    pub fn between(before: &AclDocument, after: &AclDocument) -> Self {
        let changes = Permission::iter()
            .map(|p| (p, EntryDelta::between(&before.get(p), &after.get(p))))
            .filter(|(_, delta)| !delta.is_empty())
            .collect();
        AclDelta(changes)
    }

    pub fn get(&self, permission: Permission) -> Option<&EntryDelta> {
        self.0.get(&permission)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Permission, &EntryDelta)> {
        self.0.iter().map(|(p, d)| (*p, d))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
