//! Interfaces to the server holding the ACLs.
//!
//! Transport, request signing and retries live behind these traits.

use crate::error::AclError;
use crate::namespace::ObjectType;
use crate::types::{AclDocument, ResolvedTarget};

/// Listings used to expand wildcards.
pub trait NameLookup: Send + Sync {
    /// Names of existing objects of `object_type`. `organization` is `None`
    /// in single-organization mode and for global users.
    fn list_names(
        &self,
        organization: Option<&str>,
        object_type: ObjectType,
    ) -> Result<Vec<String>, AclError>;

    fn list_organizations(&self) -> Result<Vec<String>, AclError>;
}

/// Read and write access to ACL documents.
///
/// `persist_acl` receives the document fetched at the start of the cycle so
/// implementations can issue a conditional write and report
/// [`AclError::Conflict`] when the server copy moved underneath.
pub trait DirectoryClient: NameLookup {
    /// Fails with [`AclError::NotFound`] when the object does not exist.
    fn fetch_acl(&self, target: &ResolvedTarget) -> Result<AclDocument, AclError>;

    fn persist_acl(
        &self,
        target: &ResolvedTarget,
        previous: &AclDocument,
        document: &AclDocument,
    ) -> Result<(), AclError>;
}

impl<T: NameLookup + ?Sized> NameLookup for &T {
    fn list_names(
        &self,
        organization: Option<&str>,
        object_type: ObjectType,
    ) -> Result<Vec<String>, AclError> {
        (**self).list_names(organization, object_type)
    }

    fn list_organizations(&self) -> Result<Vec<String>, AclError> {
        (**self).list_organizations()
    }
}

impl<T: NameLookup + ?Sized> NameLookup for std::sync::Arc<T> {
    fn list_names(
        &self,
        organization: Option<&str>,
        object_type: ObjectType,
    ) -> Result<Vec<String>, AclError> {
        (**self).list_names(organization, object_type)
    }

    fn list_organizations(&self) -> Result<Vec<String>, AclError> {
        (**self).list_organizations()
    }
}

impl<T: DirectoryClient + ?Sized> DirectoryClient for std::sync::Arc<T> {
    fn fetch_acl(&self, target: &ResolvedTarget) -> Result<AclDocument, AclError> {
        (**self).fetch_acl(target)
    }

    fn persist_acl(
        &self,
        target: &ResolvedTarget,
        previous: &AclDocument,
        document: &AclDocument,
    ) -> Result<(), AclError> {
        (**self).persist_acl(target, previous, document)
    }
}
