//! Data model for ACL resolution and merging.
//!
//! Canonical string forms:
//! - Path pattern: `/organizations/<org>/<type>/<name>` (multi-org) or
//!   `<type>/<name>` (single-org, or relative to the current organization),
//!   any segment may be `*` or a `*` glob
//! - ACL document: `{"read": {"actors": [...], "groups": [...]}, ...}`
//! - Delta: as the ACL document, with removed members prefixed by `-`

mod acl;
mod delta;
mod directive;
mod path;
mod permission;
mod target;

pub use acl::{AclDocument, RightsEntry};
pub use delta::{AclDelta, EntryDelta, REMOVAL_MARKER};
pub use directive::{Operation, RightsDirective};
pub use path::{GlobPattern, PathPattern, Segment};
pub use permission::{ALL_PERMISSIONS, Permission};
pub use target::ResolvedTarget;
