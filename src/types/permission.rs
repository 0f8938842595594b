//! The closed set of ACL permissions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::AclError;

/// A right that can be granted on an ACL-bearing object.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Permission {
    Create,
    Read,
    Update,
    Delete,
    Grant,
}

/// Token expanding to every permission.
pub const ALL_PERMISSIONS: &str = "all";

impl Permission {
    /// Parse a permission token, expanding `all` to every permission.
    pub fn parse_token(token: &str) -> Result<Vec<Permission>, AclError> {
        if token == ALL_PERMISSIONS {
            return Ok(Permission::iter().collect());
        }
        Permission::from_str(token)
            .map(|p| vec![p])
            .map_err(|_| AclError::InvalidPermission(token.to_string()))
    }
}
