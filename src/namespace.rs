//! Static description of the Chef server object hierarchy.
//!
//! Multi-organization servers lay objects out as
//! `/organizations/<org>/<type>/<name>` with a global `/users/<name>`
//! collection next to `/organizations`. Single-organization servers drop the
//! organization prefix and expose `<type>/<name>` directly.
//!
//! Every organization-scoped type is also a container: the ACL that governs
//! the type as a whole lives at `containers/<type>`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Deployment mode of the server the ACLs live on.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Topology {
    #[default]
    MultiOrg,
    SingleOrg,
}

/// Canonical object types.
///
/// Declaration order is the emission order of resolved targets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ObjectType {
    Clients,
    Containers,
    Cookbooks,
    Data,
    Environments,
    Groups,
    Nodes,
    Roles,
    Sandboxes,
    /// Global user collection, only present on multi-organization servers.
    Users,
}

/// Top-level collections of a multi-organization server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum TopLevel {
    Organizations,
    Users,
}

/// What a path segment denotes at a given depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    TopLevel,
    Organization,
    Type,
    Name,
}

#[derive(Debug, Clone, Copy)]
struct TypeSpec {
    object_type: ObjectType,
    org_scoped: bool,
    listable: bool,
}

const TYPE_TABLE: &[TypeSpec] = &[
    TypeSpec {
        object_type: ObjectType::Clients,
        org_scoped: true,
        listable: true,
    },
    TypeSpec {
        object_type: ObjectType::Containers,
        org_scoped: true,
        listable: true,
    },
    TypeSpec {
        object_type: ObjectType::Cookbooks,
        org_scoped: true,
        listable: true,
    },
    TypeSpec {
        object_type: ObjectType::Data,
        org_scoped: true,
        listable: true,
    },
    TypeSpec {
        object_type: ObjectType::Environments,
        org_scoped: true,
        listable: true,
    },
    TypeSpec {
        object_type: ObjectType::Groups,
        org_scoped: true,
        listable: true,
    },
    TypeSpec {
        object_type: ObjectType::Nodes,
        org_scoped: true,
        listable: true,
    },
    TypeSpec {
        object_type: ObjectType::Roles,
        org_scoped: true,
        listable: true,
    },
    // The server has no listing endpoint for sandboxes.
    TypeSpec {
        object_type: ObjectType::Sandboxes,
        org_scoped: true,
        listable: false,
    },
    TypeSpec {
        object_type: ObjectType::Users,
        org_scoped: false,
        listable: true,
    },
];

const TOP_LEVEL_KINDS: &[TopLevel] = &[TopLevel::Organizations, TopLevel::Users];

const ALIASES: &[(&str, ObjectType)] = &[("data_bags", ObjectType::Data)];

const MULTI_ORG_SEGMENTS: &[SegmentKind] = &[
    SegmentKind::TopLevel,
    SegmentKind::Organization,
    SegmentKind::Type,
    SegmentKind::Name,
];

const SINGLE_ORG_SEGMENTS: &[SegmentKind] = &[SegmentKind::Type, SegmentKind::Name];

const ORG_SCOPED_TYPES: &[ObjectType] = &[
    ObjectType::Clients,
    ObjectType::Containers,
    ObjectType::Cookbooks,
    ObjectType::Data,
    ObjectType::Environments,
    ObjectType::Groups,
    ObjectType::Nodes,
    ObjectType::Roles,
    ObjectType::Sandboxes,
];

const ALL_TYPES: &[ObjectType] = &[
    ObjectType::Clients,
    ObjectType::Containers,
    ObjectType::Cookbooks,
    ObjectType::Data,
    ObjectType::Environments,
    ObjectType::Groups,
    ObjectType::Nodes,
    ObjectType::Roles,
    ObjectType::Sandboxes,
    ObjectType::Users,
];

/// Names accepted by the server for organizations, users, clients and objects.
pub(crate) static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[.\-[:alnum:]_]+$").expect("name pattern is a valid regex"));

fn spec(object_type: ObjectType) -> &'static TypeSpec {
    // TYPE_TABLE is indexed in ObjectType declaration order.
    &TYPE_TABLE[object_type as usize]
}

/// Map a type name or alias (`data_bags`) to its canonical type.
pub fn resolve_alias(type_name: &str) -> Option<ObjectType> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == type_name)
        .map(|(_, ty)| *ty)
        .or_else(|| type_name.parse().ok())
}

/// Aliases that resolve to `object_type`.
pub fn aliases_of(object_type: ObjectType) -> impl Iterator<Item = &'static str> {
    ALIASES
        .iter()
        .filter(move |(_, ty)| *ty == object_type)
        .map(|(alias, _)| *alias)
}

/// Segment kinds from root to leaf for absolute paths in `topology`.
pub fn segments_for(topology: Topology) -> &'static [SegmentKind] {
    match topology {
        Topology::MultiOrg => MULTI_ORG_SEGMENTS,
        Topology::SingleOrg => SINGLE_ORG_SEGMENTS,
    }
}

/// Whether the type has its own ACL under `containers/<type>`.
pub fn is_container(object_type: ObjectType) -> bool {
    spec(object_type).org_scoped
}

/// Whether existing names of the type can be enumerated for wildcard expansion.
pub fn is_listable(object_type: ObjectType) -> bool {
    spec(object_type).listable
}

/// Collections directly below `/` on a multi-organization server.
pub fn top_level_kinds() -> &'static [TopLevel] {
    TOP_LEVEL_KINDS
}

/// Types that may appear in the `<type>` position under an organization.
pub fn org_scoped_types() -> &'static [ObjectType] {
    ORG_SCOPED_TYPES
}

/// Every type addressable in `topology`.
pub fn valid_types(topology: Topology) -> &'static [ObjectType] {
    match topology {
        Topology::MultiOrg => ALL_TYPES,
        Topology::SingleOrg => ORG_SCOPED_TYPES,
    }
}

pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}
