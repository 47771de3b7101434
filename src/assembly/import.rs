//! Bulk import of resources into a project.
//!
//! An import moves through `Requested → Previewed → (Approved | Rejected) →
//! Applied | RolledBack`. Preview is read-only and repeatable. Apply re-checks
//! the live assignment set against the snapshot taken at preview and fails
//! with `PlanStale` instead of silently re-resolving.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assigner::{insert_in, require_project, require_resource, validate_candidates};
use super::conflicts::{Candidate, ConflictDetector, ConflictFinding};
use super::resolver::{DependencyGraphResolver, ExpansionPlan, ResolveOptions};
use crate::db::{RepositoryTx, ResourceRepository};
use crate::error::AssemblyError;
use crate::models::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    Requested,
    Previewed,
    Approved,
    Rejected,
    Applied,
    RolledBack,
}

impl ImportState {
    pub fn can_transition_to(self, next: ImportState) -> bool {
        use ImportState::*;
        matches!(
            (self, next),
            (Requested, Previewed)
                | (Previewed, Approved)
                | (Previewed, Rejected)
                | (Previewed, Applied)
                | (Previewed, RolledBack)
                | (Approved, Applied)
                | (Approved, RolledBack)
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImportPolicy {
    /// Pull in `enhances` targets as well as critical requirements.
    #[serde(default)]
    pub include_advisory_enhancements: bool,
    /// Conflicting pairs the caller accepts up front.
    #[serde(default)]
    pub override_conflicts: Vec<ResourcePair>,
    /// Critical `(source, target)` requirements the caller accepts leaving unmet.
    #[serde(default)]
    pub waive_dependencies: Vec<DependencyWaiver>,
}

impl ImportPolicy {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            conflicts: self.override_conflicts.clone(),
            dependencies: self.waive_dependencies.clone(),
        }
    }
}

/// One assignment the plan will create.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedAssignment {
    pub resource: ResourceRef,
    pub name: String,
    /// Set when the resource was pulled in by a dependency edge.
    pub required_by: Option<ResourceRef>,
}

/// Primary-relevant snapshot of one live assignment, taken at preview.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct BaselineEntry {
    pub resource: ResourceRef,
    pub is_primary: bool,
}

/// A reviewable import plan. Round-trips through JSON so callers can hold it
/// between preview and apply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportPlan {
    pub id: Uuid,
    pub project_id: i64,
    pub state: ImportState,
    pub seeds: Vec<ResourceRef>,
    pub policy: ImportPolicy,
    pub to_add: Vec<PlannedAssignment>,
    /// Resolved resources the project already has.
    pub already_assigned: Vec<ResourceRef>,
    pub expansion: ExpansionPlan,
    pub findings: Vec<ConflictFinding>,
    pub applicable: bool,
    pub baseline: Vec<BaselineEntry>,
    pub previewed_at: DateTime<Utc>,
}

impl ImportPlan {
    fn transition(&mut self, next: ImportState) -> Result<(), AssemblyError> {
        if !self.state.can_transition_to(next) {
            return Err(AssemblyError::Validation(format!(
                "import plan {} cannot move from {:?} to {:?}",
                self.id, self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }

    /// Mark the plan reviewed and accepted. Only applicable plans can be approved.
    pub fn approve(&mut self) -> Result<(), AssemblyError> {
        if !self.applicable {
            return Err(AssemblyError::Validation(format!(
                "import plan {} has blocking findings",
                self.id
            )));
        }
        self.transition(ImportState::Approved)
    }

    pub fn reject(&mut self) -> Result<(), AssemblyError> {
        self.transition(ImportState::Rejected)
    }

    pub fn dependency_additions(&self) -> impl Iterator<Item = &PlannedAssignment> {
        self.to_add.iter().filter(|p| p.required_by.is_some())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportOutcome {
    pub plan_id: Uuid,
    pub assigned: Vec<Assignment>,
    /// Advisory findings that did not block the apply.
    pub advisories: Vec<ConflictFinding>,
}

pub struct ImportOrchestrator<'r, R: ResourceRepository> {
    repo: &'r R,
}

impl<'r, R: ResourceRepository> ImportOrchestrator<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// Resolve `seeds` against the edge corpus and report what applying would do.
    pub fn preview(
        &self,
        project_id: i64,
        seeds: &[ResourceRef],
        policy: ImportPolicy,
    ) -> Result<ImportPlan, AssemblyError> {
        if seeds.is_empty() {
            return Err(AssemblyError::Validation(
                "an import needs at least one seed resource".to_string(),
            ));
        }

        let plan = self.repo.run_in_transaction(|tx| {
            require_project(tx, project_id)?;
            for seed in seeds {
                require_resource(tx, *seed)?;
            }

            let (edges, known) = load_edge_closure(tx, seeds)?;
            let resolver = DependencyGraphResolver::new(edges);
            let expansion = resolver.resolve(
                seeds,
                ResolveOptions {
                    include_enhancements: policy.include_advisory_enhancements,
                },
                |r| known.contains(r),
            );

            let current = tx.list_assignments(project_id)?;
            let assigned: BTreeSet<ResourceRef> = current.iter().map(|a| a.resource).collect();

            let mut to_add = Vec::new();
            let mut already_assigned = Vec::new();
            for resource in &expansion.resolved {
                if assigned.contains(resource) {
                    already_assigned.push(*resource);
                    continue;
                }
                let name = require_resource(tx, *resource)?.name;
                let required_by = expansion
                    .added_by_dependency
                    .iter()
                    .find(|a| a.resource == *resource)
                    .map(|a| a.required_by);
                to_add.push(PlannedAssignment {
                    resource: *resource,
                    name,
                    required_by,
                });
            }

            let candidates = candidate_set(&current, &to_add);
            let refs: Vec<ResourceRef> = candidates.iter().map(|c| c.resource).collect();
            let candidate_edges = tx.list_dependency_edges(&refs)?;
            let overrides = tx.list_overrides(project_id)?.merged(&policy.overrides());
            let report = ConflictDetector::new(&candidate_edges, &overrides).detect(&candidates);

            let mut baseline: Vec<BaselineEntry> = current
                .iter()
                .map(|a| BaselineEntry {
                    resource: a.resource,
                    is_primary: a.is_primary,
                })
                .collect();
            baseline.sort();

            let mut sorted_seeds = seeds.to_vec();
            sorted_seeds.sort();
            sorted_seeds.dedup();

            Ok(ImportPlan {
                id: Uuid::new_v4(),
                project_id,
                state: ImportState::Previewed,
                seeds: sorted_seeds,
                policy: policy.clone(),
                to_add,
                already_assigned,
                applicable: report.is_applicable(),
                findings: report.findings,
                expansion,
                baseline,
                previewed_at: Utc::now(),
            })
        })?;

        tracing::info!(
            project_id,
            plan_id = %plan.id,
            to_add = plan.to_add.len(),
            applicable = plan.applicable,
            "Previewed import"
        );
        Ok(plan)
    }

    /// Apply a previewed or approved plan in one transaction.
    ///
    /// `confirmed` overrides are added to the plan's policy and persisted on
    /// success. On any failure nothing is committed and the plan ends
    /// `RolledBack`.
    pub fn apply(
        &self,
        plan: &mut ImportPlan,
        confirmed: Overrides,
    ) -> Result<ImportOutcome, AssemblyError> {
        if !matches!(plan.state, ImportState::Previewed | ImportState::Approved) {
            return Err(AssemblyError::Validation(format!(
                "import plan {} is {:?} and cannot be applied",
                plan.id, plan.state
            )));
        }

        let overrides = plan.policy.overrides().merged(&confirmed);
        let snapshot: &ImportPlan = plan;
        let result = self
            .repo
            .run_in_transaction(|tx| apply_in(tx, snapshot, &overrides));

        match result {
            Ok(outcome) => {
                plan.transition(ImportState::Applied)?;
                tracing::info!(
                    project_id = plan.project_id,
                    plan_id = %plan.id,
                    assigned = outcome.assigned.len(),
                    "Applied import"
                );
                Ok(outcome)
            }
            Err(e) => {
                plan.transition(ImportState::RolledBack)?;
                tracing::warn!(
                    project_id = plan.project_id,
                    plan_id = %plan.id,
                    "Import rolled back: {}",
                    e
                );
                Err(e)
            }
        }
    }
}

fn apply_in(
    tx: &dyn RepositoryTx,
    plan: &ImportPlan,
    overrides: &Overrides,
) -> Result<ImportOutcome, AssemblyError> {
    require_project(tx, plan.project_id)?;
    let current = tx.list_assignments(plan.project_id)?;

    let mut live: Vec<BaselineEntry> = current
        .iter()
        .map(|a| BaselineEntry {
            resource: a.resource,
            is_primary: a.is_primary,
        })
        .collect();
    live.sort();
    if live != plan.baseline {
        return Err(AssemblyError::PlanStale {
            plan_id: plan.id,
            reason: format!(
                "assignment set changed since preview ({} assignments then, {} now)",
                plan.baseline.len(),
                live.len()
            ),
        });
    }

    for planned in &plan.to_add {
        if tx.get_resource(planned.resource.id)?.is_none() {
            return Err(AssemblyError::PlanStale {
                plan_id: plan.id,
                reason: format!("resource {} no longer exists", planned.resource),
            });
        }
    }

    let candidates = candidate_set(&current, &plan.to_add);
    let advisories = validate_candidates(tx, plan.project_id, &candidates, overrides)?;

    let now = Utc::now();
    let mut inserted_so_far = current;
    let mut assigned = Vec::with_capacity(plan.to_add.len());
    for planned in &plan.to_add {
        let options = AssignOptions {
            reason: Some(match planned.required_by {
                Some(source) => format!("required by {}", source),
                None => "imported".to_string(),
            }),
            ..Default::default()
        };
        let assignment = insert_in(
            tx,
            plan.project_id,
            &inserted_so_far,
            planned.resource,
            &options,
            now,
        )?;
        inserted_so_far.push(assignment.clone());
        assigned.push(assignment);
    }

    if !overrides.is_empty() {
        tx.add_overrides(plan.project_id, overrides)?;
    }
    tx.touch_project(plan.project_id, now)?;

    Ok(ImportOutcome {
        plan_id: plan.id,
        assigned,
        advisories,
    })
}

fn candidate_set(current: &[Assignment], to_add: &[PlannedAssignment]) -> Vec<Candidate> {
    current
        .iter()
        .map(Candidate::from)
        .chain(to_add.iter().map(|p| Candidate::new(p.resource, false)))
        .collect()
}

/// Fetch every edge reachable from `seeds` through `requires`/`enhances`
/// edges, plus the set of referenced resources that actually exist.
fn load_edge_closure(
    tx: &dyn RepositoryTx,
    seeds: &[ResourceRef],
) -> Result<(Vec<DependencyEdge>, BTreeSet<ResourceRef>), AssemblyError> {
    let mut known: BTreeSet<ResourceRef> = seeds.iter().copied().collect();
    let mut visited = known.clone();
    let mut frontier: Vec<ResourceRef> = known.iter().copied().collect();
    let mut edges = Vec::new();

    while !frontier.is_empty() {
        let batch = tx.list_dependency_edges(&frontier)?;
        frontier.clear();
        for edge in batch {
            match edge.kind {
                EdgeKind::Requires | EdgeKind::Enhances => {
                    if visited.insert(edge.target) {
                        let exists = tx
                            .get_resource(edge.target.id)?
                            .is_some_and(|r| r.resource_type() == edge.target.resource_type);
                        if exists {
                            known.insert(edge.target);
                            frontier.push(edge.target);
                        }
                    }
                }
                EdgeKind::Conflicts => {}
            }
            edges.push(edge);
        }
    }

    Ok((edges, known))
}
