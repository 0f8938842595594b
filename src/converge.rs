use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audit::{AuditRecord, AuditSink, ConvergePhases, ConvergeStats, NoOpSink};
use crate::config::ConvergeOptions;
use crate::directory::DirectoryClient;
use crate::error::{AclError, TargetFailure};
use crate::merge;
use crate::resolver::PathResolver;
use crate::timers::PhaseTimer;
use crate::types::{AclDelta, ResolvedTarget, RightsDirective};

/// What happened to one target during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    Unchanged,
    Updated(AclDelta),
    /// Dry run: the delta that would have been written.
    WouldUpdate(AclDelta),
    Failed(AclError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOutcome {
    pub target: ResolvedTarget,
    pub status: TargetStatus,
}

/// Per-target results of [`AclConverger::converge`], in resolution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvergeReport {
    path: String,
    outcomes: Vec<TargetOutcome>,
}

impl ConvergeReport {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn outcomes(&self) -> &[TargetOutcome] {
        &self.outcomes
    }

    pub fn targets(&self) -> impl Iterator<Item = &ResolvedTarget> {
        self.outcomes.iter().map(|o| &o.target)
    }

    /// Targets whose ACL was written (or would be, in dry-run mode).
    pub fn updated(&self) -> impl Iterator<Item = (&ResolvedTarget, &AclDelta)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            TargetStatus::Updated(delta) | TargetStatus::WouldUpdate(delta) => {
                Some((&o.target, delta))
            }
            _ => None,
        })
    }

    pub fn failures(&self) -> Vec<TargetFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.status {
                TargetStatus::Failed(error) => Some(TargetFailure {
                    path: o.target.path(),
                    error: error.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn is_changed(&self) -> bool {
        self.updated().next().is_some()
    }

    pub fn is_success(&self) -> bool {
        !self
            .outcomes
            .iter()
            .any(|o| matches!(o.status, TargetStatus::Failed(_)))
    }

    /// Fail with [`AclError::Aggregate`] if any target failed.
    pub fn into_result(self) -> Result<Self, AclError> {
        let failures = self.failures();
        if failures.is_empty() {
            Ok(self)
        } else {
            Err(AclError::Aggregate(failures))
        }
    }
}

/// Converges ACLs on a directory to the state described by rights directives.
///
/// Thread-safe when the directory is; each target is fetched, merged and
/// written independently, so concurrent runs over distinct targets need no
/// coordination.
pub struct AclConverger<D> {
    directory: D,
    options: ConvergeOptions,
    resolver: PathResolver,
    audit: Arc<dyn AuditSink>,
}

impl<D: DirectoryClient> AclConverger<D> {
    pub fn new(directory: D, options: ConvergeOptions) -> Result<Self, AclError> {
        options.validate()?;
        Ok(AclConverger {
            resolver: options.resolver(),
            directory,
            options,
            audit: Arc::new(NoOpSink),
        })
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    pub fn options(&self) -> &ConvergeOptions {
        &self.options
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn resolve(&self, path: &str) -> Result<Vec<ResolvedTarget>, AclError> {
        self.resolver.resolve(path, &self.directory)
    }

    /// Resolve `path` and bring every matching ACL in line with `directives`.
    ///
    /// Invalid directives and unresolvable paths fail the whole call. Target
    /// failures are recorded in the report unless `fail_fast` is set, in which
    /// case the first one is returned. Unverified targets that turn out not to
    /// exist are left out of the report.
    pub fn converge(
        &self,
        path: &str,
        directives: &[RightsDirective],
    ) -> Result<ConvergeReport, AclError> {
        let started = Instant::now();
        let mut phases = ConvergePhases::default();

        merge::validate(directives)?;

        debug!(
            event = "Converge",
            phase = "Start",
            path = path,
            directives = directives.len(),
            dry_run = self.options.dry_run
        );

        let resolution = {
            let _timer = PhaseTimer::new("resolve", &mut phases.resolve);
            self.resolver.expand(path, &self.directory)?
        };

        let mut outcomes = Vec::with_capacity(resolution.targets().len());
        for target in resolution.targets() {
            let status = match self.converge_target(target, directives, &mut phases) {
                Ok(status) => status,
                Err(AclError::NotFound(_)) if !resolution.is_verified(target) => {
                    debug!(event = "Converge", phase = "Absent", target = %target);
                    continue;
                }
                Err(err) => {
                    warn!(
                        event = "Converge",
                        phase = "Failed",
                        target = %target,
                        error = %err
                    );
                    if self.options.fail_fast {
                        return Err(err);
                    }
                    TargetStatus::Failed(err)
                }
            };
            outcomes.push(TargetOutcome {
                target: target.clone(),
                status,
            });
        }

        let report = ConvergeReport {
            path: path.to_string(),
            outcomes,
        };

        let stats = ConvergeStats {
            path: report.path.clone(),
            targets: report.outcomes.len(),
            updated: report.updated().count(),
            failed: report
                .outcomes
                .iter()
                .filter(|o| matches!(o.status, TargetStatus::Failed(_)))
                .count(),
            duration: started.elapsed(),
            phases,
        };
        debug!(
            event = "Converge",
            phase = "Done",
            path = path,
            targets = stats.targets,
            updated = stats.updated,
            failed = stats.failed
        );
        self.audit.on_converge(&stats);

        Ok(report)
    }

    /// Fetch, merge and, when changed, persist one ACL.
    fn converge_target(
        &self,
        target: &ResolvedTarget,
        directives: &[RightsDirective],
        phases: &mut ConvergePhases,
    ) -> Result<TargetStatus, AclError> {
        let current = {
            let _timer = PhaseTimer::new("fetch", &mut phases.fetch);
            self.directory.fetch_acl(target)?
        };

        let outcome = {
            let _timer = PhaseTimer::new("merge", &mut phases.merge);
            merge::apply(directives, &current)?
        };

        if !outcome.changed {
            debug!(event = "Converge", phase = "Unchanged", target = %target);
            return Ok(TargetStatus::Unchanged);
        }

        if !self.options.dry_run {
            let _timer = PhaseTimer::new("persist", &mut phases.persist);
            self.directory
                .persist_acl(target, &current, &outcome.document)?;
        }

        let phase = if self.options.dry_run { "WouldUpdate" } else { "Updated" };
        info!(
            event = "Converge",
            phase = phase,
            target = %target,
            acl_path = %target.acl_path(),
            delta = %serde_json::to_string(&outcome.delta).unwrap_or_default()
        );

        self.audit.on_target_updated(&AuditRecord {
            path: target.path(),
            acl_path: target.acl_path(),
            delta: outcome.delta.clone(),
            dry_run: self.options.dry_run,
        });

        Ok(if self.options.dry_run {
            TargetStatus::WouldUpdate(outcome.delta)
        } else {
            TargetStatus::Updated(outcome.delta)
        })
    }
}

#[cfg(test)]
mod tests;
