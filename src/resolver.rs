//! Expansion of logical path patterns into concrete ACL targets.
//!
//! Resolution is a fixed set of depth-indexed rules over the tables in
//! [`crate::namespace`]:
//!
//! | form | depth 0 | depth 1 | depth 2 | depth 3 |
//! |---|---|---|---|---|
//! | multi-org absolute | - | - | `/organizations/o`, `/users/u` | `/organizations/o/t` |
//! | relative / single-org | organization | container `t` | object `t/n` | - |
//!
//! and `/organizations/o/t/n` at depth 4. Anything deeper names a child of an
//! object that does not carry its own ACL, and fails naming the first such
//! object even when it was reached through wildcards.
//!
//! A branch whose kind and type segments were all written literally is
//! *strict*: structural problems in it are errors. Branches reached through a
//! kind or type wildcard simply drop combinations that do not fit. Once any
//! segment was a pattern, literal names must exist to match; on types that
//! cannot be listed they are kept but reported as unverified.

use std::collections::BTreeSet;

use tracing::debug;

use crate::directory::NameLookup;
use crate::error::AclError;
use crate::namespace::{
    self, ObjectType, TopLevel, Topology, aliases_of, is_container, is_listable, org_scoped_types,
    top_level_kinds,
};
use crate::types::{PathPattern, ResolvedTarget, Segment};

/// Resolves path patterns for one topology. Holds no mutable state and can be
/// shared freely between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    topology: Topology,
    current_organization: Option<String>,
}

impl PathResolver {
    pub fn new(topology: Topology) -> Self {
        PathResolver {
            topology,
            current_organization: None,
        }
    }

    /// Organization that relative paths refer to on a multi-organization server.
    pub fn with_current_organization(mut self, organization: impl Into<String>) -> Self {
        self.current_organization = Some(organization.into());
        self
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn current_organization(&self) -> Option<&str> {
        self.current_organization.as_deref()
    }

    /// Resolve `path` into de-duplicated targets in emission order.
    ///
    /// An empty result is valid: a wildcard over an empty collection matches nothing.
    pub fn resolve<L: NameLookup + ?Sized>(
        &self,
        path: &str,
        lookup: &L,
    ) -> Result<Vec<ResolvedTarget>, AclError> {
        self.expand(path, lookup).map(Resolution::into_targets)
    }

    pub fn resolve_pattern<L: NameLookup + ?Sized>(
        &self,
        pattern: &PathPattern,
        lookup: &L,
    ) -> Result<Vec<ResolvedTarget>, AclError> {
        self.expand_pattern(pattern, lookup).map(Resolution::into_targets)
    }

    /// Like [`PathResolver::resolve`], but keeps track of targets whose
    /// existence no listing confirmed.
    pub fn expand<L: NameLookup + ?Sized>(
        &self,
        path: &str,
        lookup: &L,
    ) -> Result<Resolution, AclError> {
        let pattern = PathPattern::parse(path)?;
        self.expand_pattern(&pattern, lookup)
    }

    pub fn expand_pattern<L: NameLookup + ?Sized>(
        &self,
        pattern: &PathPattern,
        lookup: &L,
    ) -> Result<Resolution, AclError> {
        let mut expansion = Expansion {
            lookup,
            targets: BTreeSet::new(),
            unverified: BTreeSet::new(),
        };
        let segments = pattern.segments();

        match (self.topology, pattern.is_absolute()) {
            (Topology::SingleOrg, _) => expansion.org_scoped(None, segments, Reach::LITERAL)?,
            (Topology::MultiOrg, true) => expansion.server_root(segments, Reach::LITERAL)?,
            (Topology::MultiOrg, false) => {
                let org = self.current_organization.as_deref().ok_or_else(|| {
                    AclError::PathError(format!(
                        "relative path '{pattern}' needs a current organization on a multi-org server"
                    ))
                })?;
                expansion.org_scoped(Some(org), segments, Reach::LITERAL)?
            }
        }

        debug!(
            event = "Resolve",
            phase = "Expanded",
            topology = %self.topology,
            path = %pattern,
            patterns = pattern.has_patterns(),
            targets = expansion.targets.len(),
            unverified = expansion.unverified.len()
        );

        Ok(Resolution {
            targets: expansion.targets.into_iter().collect(),
            unverified: expansion.unverified,
        })
    }
}

/// Targets produced by [`PathResolver::expand`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    targets: Vec<ResolvedTarget>,
    unverified: BTreeSet<ResolvedTarget>,
}

impl Resolution {
    pub fn targets(&self) -> &[ResolvedTarget] {
        &self.targets
    }

    /// False for a literal name matched under a pattern on a type the server
    /// cannot list; such a target may not exist.
    pub fn is_verified(&self, target: &ResolvedTarget) -> bool {
        !self.unverified.contains(target)
    }

    pub fn into_targets(self) -> Vec<ResolvedTarget> {
        self.targets
    }
}

/// How the current branch of an expansion was reached.
#[derive(Debug, Clone, Copy)]
struct Reach {
    /// Every kind and type segment so far was literal.
    strict: bool,
    /// Some segment so far was a pattern.
    expanded: bool,
}

impl Reach {
    const LITERAL: Reach = Reach {
        strict: true,
        expanded: false,
    };

    /// After a kind or type segment.
    fn through_shape(self, segment: &Segment) -> Reach {
        Reach {
            strict: self.strict && segment.is_literal(),
            expanded: self.expanded || !segment.is_literal(),
        }
    }

    /// After an organization or object name segment.
    fn through_name(self, segment: &Segment) -> Reach {
        Reach {
            strict: self.strict,
            expanded: self.expanded || !segment.is_literal(),
        }
    }
}

/// Depth of the deepest ACL target below an organization.
fn org_scoped_depth() -> usize {
    namespace::segments_for(Topology::SingleOrg).len()
}

struct Expansion<'a, L: ?Sized> {
    lookup: &'a L,
    targets: BTreeSet<ResolvedTarget>,
    unverified: BTreeSet<ResolvedTarget>,
}

impl<L: NameLookup + ?Sized> Expansion<'_, L> {
    /// `/<kind>/...` on a multi-organization server.
    fn server_root(&mut self, segments: &[Segment], reach: Reach) -> Result<(), AclError> {
        let Some((kind_segment, rest)) = segments.split_first() else {
            return Err(AclError::PathError(
                "ACLs cannot be set on /; name an organization or a user".to_string(),
            ));
        };

        let kinds: Vec<TopLevel> = match kind_segment {
            Segment::Literal(lit) => vec![lit.parse().map_err(|_| {
                AclError::PathError(format!("unknown top-level collection '/{lit}'"))
            })?],
            Segment::Pattern(glob) => top_level_kinds()
                .iter()
                .copied()
                .filter(|k| glob.is_match(k.as_ref()))
                .collect(),
        };
        let reach = reach.through_shape(kind_segment);

        for kind in kinds {
            let Some((name_segment, rest)) = rest.split_first() else {
                if reach.strict {
                    return Err(AclError::PathError(format!(
                        "ACLs cannot be set on /{kind}; name an object inside it"
                    )));
                }
                continue;
            };

            match kind {
                TopLevel::Organizations => {
                    let organizations = self.organizations(name_segment, reach)?;
                    let reach = reach.through_name(name_segment);
                    for org in organizations {
                        self.org_scoped(Some(&org), rest, reach)?;
                    }
                }
                TopLevel::Users => {
                    if !rest.is_empty() && !reach.strict {
                        continue;
                    }
                    for user in self.names(None, ObjectType::Users, name_segment, reach)? {
                        let target = ResolvedTarget::user(user);
                        if !rest.is_empty() {
                            return Err(AclError::children_of(&target.path()));
                        }
                        self.targets.insert(target);
                    }
                }
            }
        }
        Ok(())
    }

    /// `<type>/<name>` below an organization; `None` in single-org mode.
    fn org_scoped(
        &mut self,
        organization: Option<&str>,
        segments: &[Segment],
        reach: Reach,
    ) -> Result<(), AclError> {
        let Some((type_segment, rest)) = segments.split_first() else {
            self.targets
                .insert(ResolvedTarget::organization_root(organization));
            return Ok(());
        };

        let types = self.types(type_segment, reach)?;
        let reach = reach.through_shape(type_segment);
        let too_deep = segments.len() > org_scoped_depth();

        for object_type in types {
            let Some((name_segment, _)) = rest.split_first() else {
                self.targets
                    .insert(ResolvedTarget::container(organization, object_type));
                continue;
            };
            let verified =
                !reach.expanded || !name_segment.is_literal() || is_listable(object_type);
            for name in self.names(organization, object_type, name_segment, reach)? {
                let target = ResolvedTarget::object(organization, object_type, name);
                if too_deep {
                    return Err(AclError::children_of(&target.path()));
                }
                if !verified {
                    self.unverified.insert(target.clone());
                }
                self.targets.insert(target);
            }
        }
        Ok(())
    }

    fn types(&self, segment: &Segment, reach: Reach) -> Result<Vec<ObjectType>, AclError> {
        match segment {
            Segment::Literal(lit) => {
                match namespace::resolve_alias(lit).filter(|ty| is_container(*ty)) {
                    Some(object_type) => Ok(vec![object_type]),
                    None if reach.strict => {
                        Err(AclError::PathError(format!("unknown object type '{lit}'")))
                    }
                    None => Ok(Vec::new()),
                }
            }
            Segment::Pattern(glob) => Ok(org_scoped_types()
                .iter()
                .copied()
                .filter(|ty| {
                    glob.is_match(ty.as_ref()) || aliases_of(*ty).any(|a| glob.is_match(a))
                })
                .collect()),
        }
    }

    fn organizations(&self, segment: &Segment, reach: Reach) -> Result<Vec<String>, AclError> {
        match segment {
            Segment::Literal(lit) if !reach.expanded => Ok(vec![lit.clone()]),
            _ => {
                let existing = self.lookup.list_organizations()?;
                Ok(matching(existing, segment))
            }
        }
    }

    fn names(
        &self,
        organization: Option<&str>,
        object_type: ObjectType,
        segment: &Segment,
        reach: Reach,
    ) -> Result<Vec<String>, AclError> {
        match segment {
            Segment::Literal(lit) if !reach.expanded || !is_listable(object_type) => {
                Ok(vec![lit.clone()])
            }
            Segment::Pattern(_) if !is_listable(object_type) => {
                debug!(
                    event = "Resolve",
                    phase = "Skipped",
                    object_type = %object_type,
                    reason = "not listable"
                );
                Ok(Vec::new())
            }
            _ => {
                let existing = self.lookup.list_names(organization, object_type)?;
                Ok(matching(existing, segment))
            }
        }
    }
}

/// Names from a listing that `segment` matches, sorted and de-duplicated.
fn matching(existing: Vec<String>, segment: &Segment) -> Vec<String> {
    let everything = matches!(segment, Segment::Pattern(glob) if glob.matches_everything());
    existing
        .into_iter()
        .filter(|name| everything || segment.matches(name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
