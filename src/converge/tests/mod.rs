use std::sync::Arc;

use super::*;
use crate::audit::testing::RecordingSink;
use crate::directory::NameLookup;
use crate::error::TargetFailure;
use crate::namespace::{ObjectType, Topology};
use crate::tests::directory::MemoryDirectory;
use crate::types::{AclDocument, Permission, RightsEntry};
use insta::assert_json_snapshot;
use yare::parameterized;


fn options(topology: Topology) -> ConvergeOptions {
    match topology {
        Topology::MultiOrg => ConvergeOptions::new(topology).with_organization("foo"),
        Topology::SingleOrg => ConvergeOptions::new(topology),
    }
}

fn converger(topology: Topology) -> AclConverger<MemoryDirectory> {
    AclConverger::new(MemoryDirectory::chef_server(topology), options(topology)).unwrap()
}

fn node(name: &str) -> ResolvedTarget {
    ResolvedTarget::object(None, ObjectType::Nodes, name)
}

#[test]
fn test_grant_updates_acl_and_reports_delta() {
    let converger = converger(Topology::SingleOrg);
    let report = converger
        .converge("nodes/x", &[RightsDirective::grant(["read"]).users(["u"])])
        .unwrap();

    assert!(report.is_changed());
    assert!(report.is_success());
    assert_json_snapshot!(report, @r#"
    {
      "path": "nodes/x",
      "outcomes": [
        {
          "target": {
            "object_type": "nodes",
            "organization": null,
            "name": "x"
          },
          "status": {
            "updated": {
              "read": {
                "actors": [
                  "u"
                ]
              }
            }
          }
        }
      ]
    }
    "#);
    assert_eq!(
        converger.directory().acl(&node("x")).unwrap().get(Permission::Read),
        RightsEntry::new(["u"], [])
    );
    assert_eq!(converger.directory().persisted(), vec![node("x")]);
}

#[test]
fn test_rerun_is_unchanged_and_writes_nothing() {
    let converger = converger(Topology::SingleOrg);
    let directives = [RightsDirective::grant(["read", "update"]).users(["u"]).groups(["g"])];

    assert!(converger.converge("nodes/x", &directives).unwrap().is_changed());
    let again = converger.converge("nodes/x", &directives).unwrap();

    assert!(!again.is_changed());
    assert_eq!(again.outcomes()[0].status, TargetStatus::Unchanged);
    assert_eq!(converger.directory().persisted().len(), 1);
}

#[test]
fn test_empty_directive_list_fetches_but_never_writes() {
    let converger = converger(Topology::SingleOrg);
    let report = converger.converge("nodes/x", &[]).unwrap();
    assert_eq!(report.outcomes().len(), 1);
    assert!(!report.is_changed());
    assert!(converger.directory().persisted().is_empty());
}

#[test]
fn test_missing_object_is_reported_per_target() {
    let converger = converger(Topology::SingleOrg);
    let report = converger
        .converge("nodes/y", &[RightsDirective::grant(["read"]).users(["u"])])
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(
        report.clone().into_result(),
        Err(AclError::Aggregate(vec![TargetFailure {
            path: "nodes/y".to_string(),
            error: AclError::NotFound("nodes/y/_acl".to_string()),
        }]))
    );
    insta::assert_snapshot!(
        report.into_result().unwrap_err().to_string(),
        @"1 target(s) failed: nodes/y: not found: nodes/y/_acl"
    );
}

#[test]
fn test_fail_fast_returns_first_error() {
    let directory = MemoryDirectory::chef_server(Topology::SingleOrg);
    let converger = AclConverger::new(
        directory,
        options(Topology::SingleOrg).with_fail_fast(true),
    )
    .unwrap();
    let result = converger.converge("nodes/y", &[RightsDirective::grant(["read"]).users(["u"])]);
    assert_eq!(result, Err(AclError::NotFound("nodes/y/_acl".to_string())));
}

#[test]
fn test_invalid_permission_fails_before_any_fetch() {
    let converger = converger(Topology::SingleOrg);
    let sink = Arc::new(RecordingSink::default());
    let converger = converger.with_audit_sink(sink.clone());

    let result = converger.converge(
        "nodes/*",
        &[
            RightsDirective::grant(["read"]).users(["u"]),
            RightsDirective::grant(["sudo"]).users(["u"]),
        ],
    );

    assert_eq!(result, Err(AclError::InvalidPermission("sudo".to_string())));
    assert!(converger.directory().persisted().is_empty());
    assert!(sink.stats.lock().unwrap().is_empty());
}

#[parameterized(
    trailing_child = { "nodes/x/y" },
    unknown_type = { "widgets/x" },
)]
fn test_unresolvable_path_fails_whole_call(path: &str) {
    let converger = converger(Topology::SingleOrg);
    let result = converger.converge(path, &[RightsDirective::grant(["read"]).users(["u"])]);
    assert!(matches!(result, Err(AclError::PathError(_))));
    assert!(converger.directory().persisted().is_empty());
}

#[test]
fn test_relative_path_without_current_organization() {
    let converger = AclConverger::new(
        MemoryDirectory::chef_server(Topology::MultiOrg),
        ConvergeOptions::new(Topology::MultiOrg),
    )
    .unwrap();
    let result = converger.converge("nodes/x", &[]);
    assert!(matches!(result, Err(AclError::PathError(_))));
}

#[test]
fn test_listing_failure_fails_whole_call() {
    let converger = converger(Topology::SingleOrg);
    converger
        .directory()
        .fail_listings_with(AclError::Transport("connection reset".to_string()));
    let result = converger.converge("nodes/*", &[RightsDirective::grant(["read"]).users(["u"])]);
    assert_eq!(
        result,
        Err(AclError::Transport("connection reset".to_string()))
    );
}

#[test]
fn test_invalid_options_are_rejected() {
    let result = AclConverger::new(
        MemoryDirectory::chef_server(Topology::SingleOrg),
        ConvergeOptions::new(Topology::SingleOrg).with_organization("foo"),
    );
    assert!(matches!(result, Err(AclError::InvalidConfig(_))));
}

#[parameterized(
    transport = { AclError::Transport("HTTP 500".to_string()) },
    conflict = { AclError::Conflict("nodes/b/_acl".to_string()) },
)]
fn test_failed_target_does_not_stop_the_others(error: AclError) {
    let converger = converger(Topology::SingleOrg);
    for name in ["a", "b", "c"] {
        converger.directory().add_object(None, ObjectType::Nodes, name);
    }
    converger.directory().fail_persist_with(node("b"), error.clone());

    let report = converger
        .converge("nodes/*", &[RightsDirective::grant(["read"]).users(["u"])])
        .unwrap();

    assert_eq!(converger.directory().persisted(), vec![node("a"), node("c"), node("x")]);
    assert_eq!(report.updated().count(), 3);
    assert_eq!(
        report.failures(),
        vec![TargetFailure {
            path: "nodes/b".to_string(),
            error,
        }]
    );
    assert!(matches!(report.into_result(), Err(AclError::Aggregate(f)) if f.len() == 1));
}

#[test]
fn test_dry_run_reports_without_writing() {
    let sink = Arc::new(RecordingSink::default());
    let converger = AclConverger::new(
        MemoryDirectory::chef_server(Topology::SingleOrg),
        options(Topology::SingleOrg).with_dry_run(true),
    )
    .unwrap()
    .with_audit_sink(sink.clone());

    let report = converger
        .converge("nodes/x", &[RightsDirective::grant(["read"]).groups(["admins"])])
        .unwrap();

    assert!(matches!(
        &report.outcomes()[0].status,
        TargetStatus::WouldUpdate(delta) if delta.get(Permission::Read).is_some()
    ));
    assert!(report.is_changed());
    assert!(converger.directory().persisted().is_empty());
    assert_eq!(converger.directory().acl(&node("x")), Some(AclDocument::new()));

    let records = sink.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].dry_run);
    assert_eq!(records[0].acl_path, "nodes/x/_acl");
}

#[test]
fn test_audit_sink_receives_records_and_stats() {
    let sink = Arc::new(RecordingSink::default());
    let converger = converger(Topology::MultiOrg).with_audit_sink(sink.clone());
    converger.directory().add_object(Some("foo"), ObjectType::Roles, "y");
    converger
        .directory()
        .fail_persist_with(
            ResolvedTarget::object(Some("foo"), ObjectType::Roles, "y"),
            AclError::Transport("HTTP 503".to_string()),
        );

    converger
        .converge("roles/*", &[RightsDirective::revoke(["read"]).users(["u"])])
        .unwrap();
    converger
        .converge("roles/*", &[RightsDirective::grant(["read"]).users(["u"])])
        .unwrap();

    let records = sink.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, "/organizations/foo/roles/x");
    assert_eq!(records[0].acl_path, "/organizations/foo/roles/x/_acl");
    assert!(!records[0].dry_run);

    let stats = sink.stats.lock().unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(
        (stats[0].targets, stats[0].updated, stats[0].failed),
        (2, 0, 0)
    );
    assert_eq!(
        (stats[1].targets, stats[1].updated, stats[1].failed),
        (2, 1, 1)
    );
    assert!(stats[1].duration >= stats[1].phases.resolve);
}

#[test]
fn test_works_through_shared_directory() {
    let directory = Arc::new(MemoryDirectory::chef_server(Topology::SingleOrg));
    let converger =
        AclConverger::new(Arc::clone(&directory), options(Topology::SingleOrg)).unwrap();
    converger
        .converge("", &[RightsDirective::grant(["grant"]).groups(["admins"])])
        .unwrap();
    assert_eq!(
        directory
            .acl(&ResolvedTarget::organization_root(None))
            .unwrap()
            .get(Permission::Grant),
        RightsEntry::new([], ["admins"])
    );
}

#[test]
fn test_wildcard_type_skips_missing_unlistable_objects() {
    let converger = converger(Topology::SingleOrg);
    converger
        .directory()
        .add_object(None, ObjectType::Nodes, "only-a-node");

    let report = converger
        .converge("*/only-a-node", &[RightsDirective::grant(["read"]).users(["u"])])
        .unwrap();

    assert_eq!(report.targets().collect::<Vec<_>>(), vec![&node("only-a-node")]);
    assert!(report.is_success());
    assert_eq!(converger.directory().persisted(), vec![node("only-a-node")]);
}

#[test]
fn test_wildcard_type_keeps_existing_unlistable_objects() {
    let converger = converger(Topology::SingleOrg);
    let report = converger
        .converge("*/x", &[RightsDirective::grant(["read"]).users(["u"])])
        .unwrap();
    let sandbox = ResolvedTarget::object(None, ObjectType::Sandboxes, "x");
    assert!(report.targets().any(|t| *t == sandbox));
    assert!(report.is_success());
}

#[test]
fn test_literal_missing_sandbox_is_still_a_failure() {
    let converger = converger(Topology::SingleOrg);
    let report = converger
        .converge("sandboxes/y", &[RightsDirective::grant(["read"]).users(["u"])])
        .unwrap();
    assert_eq!(
        report.failures(),
        vec![TargetFailure {
            path: "sandboxes/y".to_string(),
            error: AclError::NotFound("sandboxes/y/_acl".to_string()),
        }]
    );
}

/// Rewrites the stored ACL of one target right after it is read, as a
/// concurrent writer would.
struct RacingDirectory {
    inner: MemoryDirectory,
    target: ResolvedTarget,
    concurrent: AclDocument,
}

impl NameLookup for RacingDirectory {
    fn list_names(
        &self,
        organization: Option<&str>,
        object_type: ObjectType,
    ) -> Result<Vec<String>, AclError> {
        self.inner.list_names(organization, object_type)
    }

    fn list_organizations(&self) -> Result<Vec<String>, AclError> {
        self.inner.list_organizations()
    }
}

impl DirectoryClient for RacingDirectory {
    fn fetch_acl(&self, target: &ResolvedTarget) -> Result<AclDocument, AclError> {
        let document = self.inner.fetch_acl(target)?;
        if *target == self.target {
            self.inner.set_acl(target.clone(), self.concurrent.clone());
        }
        Ok(document)
    }

    fn persist_acl(
        &self,
        target: &ResolvedTarget,
        previous: &AclDocument,
        document: &AclDocument,
    ) -> Result<(), AclError> {
        self.inner.persist_acl(target, previous, document)
    }
}

#[test]
fn test_concurrent_change_is_reported_as_conflict() {
    let inner = MemoryDirectory::chef_server(Topology::SingleOrg);
    inner.add_object(None, ObjectType::Nodes, "a");
    let concurrent =
        AclDocument::new().with(Permission::Grant, RightsEntry::new(["someone-else"], []));
    let directory = RacingDirectory {
        inner,
        target: node("x"),
        concurrent: concurrent.clone(),
    };
    let converger = AclConverger::new(directory, options(Topology::SingleOrg)).unwrap();

    let report = converger
        .converge("nodes/*", &[RightsDirective::grant(["read"]).users(["u"])])
        .unwrap();

    assert!(matches!(report.outcomes()[0].status, TargetStatus::Updated(_)));
    assert_eq!(report.outcomes()[1].target, node("x"));
    assert_eq!(
        report.outcomes()[1].status,
        TargetStatus::Failed(AclError::Conflict("nodes/x/_acl".to_string()))
    );
    assert_eq!(converger.directory().inner.acl(&node("x")), Some(concurrent));
    assert_eq!(converger.directory().inner.persisted(), vec![node("a")]);
}
