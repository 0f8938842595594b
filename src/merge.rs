//! Folding rights directives into an ACL document.

use serde::Serialize;
use tracing::debug;

use crate::error::AclError;
use crate::types::{AclDelta, AclDocument, Operation, RightsDirective};

/// Result of [`apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub document: AclDocument,
    pub changed: bool,
    /// Empty unless `changed`.
    pub delta: AclDelta,
}

/// Check every permission token without touching any document.
pub fn validate(directives: &[RightsDirective]) -> Result<(), AclError> {
    for directive in directives {
        directive.resolved_permissions()?;
    }
    Ok(())
}

/// Apply `directives` to a copy of `current`.
///
/// Grants are set unions and revokes set differences. Revokes run after every
/// grant, so an identifier both granted and revoked for a permission ends up
/// revoked whatever the order of the directives, and re-applying the same
/// directives is a no-op.
pub fn apply(
    directives: &[RightsDirective],
    current: &AclDocument,
) -> Result<MergeOutcome, AclError> {
    let mut resolved = Vec::with_capacity(directives.len());
    for directive in directives {
        let permissions = directive.resolved_permissions()?;
        if !directive.is_empty() {
            resolved.push((directive, permissions));
        }
    }

    let mut document = current.clone();
    for operation in [Operation::Grant, Operation::Revoke] {
        for (directive, permissions) in resolved.iter().filter(|(d, _)| d.operation == operation) {
            for permission in permissions {
                let entry = document.entry_mut(*permission);
                match operation {
                    Operation::Grant => {
                        entry.actors.extend(directive.actors().map(str::to_string));
                        entry.groups.extend(directive.groups.iter().cloned());
                    }
                    Operation::Revoke => {
                        for actor in directive.actors() {
                            entry.actors.shift_remove(actor);
                        }
                        for group in &directive.groups {
                            entry.groups.shift_remove(group);
                        }
                    }
                }
            }
        }
    }

    let changed = document != *current;
    let delta = if changed {
        AclDelta::between(current, &document)
    } else {
        AclDelta::default()
    };

    debug!(
        event = "Merge",
        phase = "Applied",
        directives = directives.len(),
        changed = changed
    );

    Ok(MergeOutcome {
        document,
        changed,
        delta,
    })
}
