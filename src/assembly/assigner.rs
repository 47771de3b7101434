//! Single-project assignment mutations.
//!
//! Every operation that adds to or reshapes the set re-validates the full
//! candidate set through the [`ConflictDetector`]. Removal only checks what
//! the removal itself breaks. Each operation commits inside one storage
//! transaction, so the persisted set is never observed half-updated.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::conflicts::{Candidate, ConflictDetector, ConflictFinding, ConflictReport, ConflictRule};
use crate::db::{RepositoryTx, ResourceRepository};
use crate::error::AssemblyError;
use crate::models::*;

pub struct ResourceAssigner<'r, R: ResourceRepository> {
    repo: &'r R,
}

impl<'r, R: ResourceRepository> ResourceAssigner<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// Assign `resource` to the project. A primary assignment demotes the
    /// current primary of the same type in the same transaction.
    pub fn assign(
        &self,
        project_id: i64,
        resource: ResourceRef,
        options: AssignOptions,
    ) -> Result<Assignment, AssemblyError> {
        validate_options(&options)?;

        let result = self
            .repo
            .run_in_transaction(|tx| assign_in(tx, project_id, resource, &options, Utc::now()));

        match &result {
            Ok(assignment) => tracing::info!(
                project_id,
                resource = %resource,
                primary = assignment.is_primary,
                "Assigned resource"
            ),
            Err(e) => tracing::warn!(project_id, resource = %resource, "Assign rejected: {}", e),
        }
        result
    }

    /// Remove an assignment. The shared resource itself is left untouched.
    ///
    /// Refused when a remaining assignment critically requires the resource,
    /// unless that dependency has been waived for the project. Findings that
    /// already held before the removal do not block it.
    pub fn unassign(&self, project_id: i64, resource: ResourceRef) -> Result<Assignment, AssemblyError> {
        let result = self.repo.run_in_transaction(|tx| {
            require_project(tx, project_id)?;
            let current = tx.list_assignments(project_id)?;
            let removed = current
                .iter()
                .find(|a| a.resource == resource)
                .cloned()
                .ok_or(AssemblyError::NotAssigned {
                    project_id,
                    resource,
                })?;

            let remaining: Vec<Candidate> = current
                .iter()
                .filter(|a| a.resource != resource)
                .map(Candidate::from)
                .collect();
            check_removal(tx, project_id, &remaining, resource)?;

            tx.delete_assignment(project_id, resource)?;
            tx.touch_project(project_id, Utc::now())?;
            Ok(removed)
        });

        match &result {
            Ok(_) => tracing::info!(project_id, resource = %resource, "Unassigned resource"),
            Err(e) => tracing::warn!(project_id, resource = %resource, "Unassign rejected: {}", e),
        }
        result
    }

    /// Rewrite the order of every assignment of `resource_type` to match `ordered_ids`.
    pub fn reorder(
        &self,
        project_id: i64,
        resource_type: ResourceType,
        ordered_ids: &[i64],
    ) -> Result<Vec<Assignment>, AssemblyError> {
        let unique: BTreeSet<i64> = ordered_ids.iter().copied().collect();
        if unique.len() != ordered_ids.len() {
            return Err(AssemblyError::Validation(
                "reorder list contains duplicate ids".to_string(),
            ));
        }

        let reordered = self.repo.run_in_transaction(|tx| {
            require_project(tx, project_id)?;
            let now = Utc::now();
            let mut of_type: Vec<Assignment> = tx
                .list_assignments(project_id)?
                .into_iter()
                .filter(|a| a.resource_type() == resource_type)
                .collect();

            let assigned: BTreeSet<i64> = of_type.iter().map(|a| a.resource.id).collect();
            if assigned != unique {
                return Err(AssemblyError::Validation(format!(
                    "reorder ids {:?} do not match assigned {} ids {:?}",
                    ordered_ids,
                    resource_type.as_str(),
                    assigned
                )));
            }

            for assignment in of_type.iter_mut() {
                let position = ordered_ids
                    .iter()
                    .position(|id| *id == assignment.resource.id)
                    .unwrap_or_default();
                assignment.order = position as i32;
                assignment.updated_at = now;
                tx.update_assignment(assignment)?;
            }
            tx.touch_project(project_id, now)?;

            of_type.sort_by_key(|a| a.order);
            Ok(of_type)
        })?;

        tracing::info!(
            project_id,
            resource_type = resource_type.as_str(),
            count = reordered.len(),
            "Reordered assignments"
        );
        Ok(reordered)
    }

    /// Edit project-local configuration of an existing assignment.
    pub fn update(
        &self,
        project_id: i64,
        resource: ResourceRef,
        input: UpdateAssignmentInput,
    ) -> Result<Assignment, AssemblyError> {
        if let Some(overrides) = &input.config_overrides {
            validate_config_keys(overrides)?;
        }

        self.repo.run_in_transaction(|tx| {
            let mut assignment = tx
                .list_assignments(project_id)?
                .into_iter()
                .find(|a| a.resource == resource)
                .ok_or(AssemblyError::NotAssigned {
                    project_id,
                    resource,
                })?;

            let now = Utc::now();
            if let Some(config) = input.config_overrides {
                assignment.config_overrides = config;
            }
            if input.reason.is_some() {
                assignment.reason = input.reason;
            }
            assignment.updated_at = now;
            tx.update_assignment(&assignment)?;
            tx.touch_project(project_id, now)?;
            Ok(assignment)
        })
    }
}

/// Assign one resource inside an open transaction.
pub(crate) fn assign_in(
    tx: &dyn RepositoryTx,
    project_id: i64,
    resource: ResourceRef,
    options: &AssignOptions,
    now: DateTime<Utc>,
) -> Result<Assignment, AssemblyError> {
    require_project(tx, project_id)?;
    require_resource(tx, resource)?;

    let current = tx.list_assignments(project_id)?;
    let demoted: Vec<Assignment> = if options.is_primary {
        current
            .iter()
            .filter(|a| a.is_primary && a.resource_type() == resource.resource_type)
            .cloned()
            .collect()
    } else {
        Vec::new()
    };

    let mut candidates: Vec<Candidate> = current
        .iter()
        .map(|a| {
            let primary = a.is_primary && !demoted.iter().any(|d| d.resource == a.resource);
            Candidate::new(a.resource, primary)
        })
        .collect();
    candidates.push(Candidate::new(resource, options.is_primary));
    validate_candidates(tx, project_id, &candidates, &options.overrides)?;

    for mut previous in demoted {
        previous.is_primary = false;
        previous.updated_at = now;
        tx.update_assignment(&previous)?;
    }

    let assignment = insert_in(tx, project_id, &current, resource, options, now)?;
    if !options.overrides.is_empty() {
        tx.add_overrides(project_id, &options.overrides)?;
    }
    tx.touch_project(project_id, now)?;

    Ok(assignment)
}

/// Insert an already-validated assignment, appending it after `current`
/// assignments of the same type when no explicit order is given.
pub(crate) fn insert_in(
    tx: &dyn RepositoryTx,
    project_id: i64,
    current: &[Assignment],
    resource: ResourceRef,
    options: &AssignOptions,
    now: DateTime<Utc>,
) -> Result<Assignment, AssemblyError> {
    let order = options.order.unwrap_or_else(|| {
        current
            .iter()
            .filter(|a| a.resource_type() == resource.resource_type)
            .map(|a| a.order + 1)
            .max()
            .unwrap_or(0)
    });

    let assignment = Assignment {
        project_id,
        resource,
        is_primary: options.is_primary,
        order,
        config_overrides: options.config_overrides.clone(),
        reason: options.reason.clone(),
        created_at: now,
        updated_at: now,
    };
    tx.insert_assignment(&assignment)?;
    Ok(assignment)
}

/// Run the detector over `candidates` with persisted plus `extra` overrides.
/// Returns the advisory findings when nothing blocks.
pub(crate) fn validate_candidates(
    tx: &dyn RepositoryTx,
    project_id: i64,
    candidates: &[Candidate],
    extra: &Overrides,
) -> Result<Vec<ConflictFinding>, AssemblyError> {
    let refs: Vec<ResourceRef> = candidates.iter().map(|c| c.resource).collect();
    let edges = tx.list_dependency_edges(&refs)?;
    let overrides = tx.list_overrides(project_id)?.merged(extra);
    ConflictDetector::new(&edges, &overrides)
        .detect(candidates)
        .into_result()
}

/// Fail only if removing `resource` leaves a remaining assignment with an
/// unwaived critical requirement on it.
fn check_removal(
    tx: &dyn RepositoryTx,
    project_id: i64,
    remaining: &[Candidate],
    resource: ResourceRef,
) -> Result<(), AssemblyError> {
    let refs: Vec<ResourceRef> = remaining.iter().map(|c| c.resource).collect();
    let edges = tx.list_dependency_edges(&refs)?;
    let overrides = tx.list_overrides(project_id)?;
    let stranded: Vec<ConflictFinding> = ConflictDetector::new(&edges, &overrides)
        .detect(remaining)
        .findings
        .into_iter()
        .filter(|f| {
            f.is_blocking()
                && f.rule == ConflictRule::MissingRequirement
                && f.resources.get(1) == Some(&resource)
        })
        .collect();
    ConflictReport { findings: stranded }.into_result().map(|_| ())
}

pub(crate) fn require_project(tx: &dyn RepositoryTx, project_id: i64) -> Result<Project, AssemblyError> {
    tx.get_project(project_id)?
        .ok_or_else(|| AssemblyError::not_found("project", project_id))
}

pub(crate) fn require_resource(tx: &dyn RepositoryTx, resource: ResourceRef) -> Result<Resource, AssemblyError> {
    let found = tx
        .get_resource(resource.id)?
        .ok_or_else(|| AssemblyError::not_found("resource", resource))?;
    if found.resource_type() != resource.resource_type {
        return Err(AssemblyError::Validation(format!(
            "resource {} is a {}, not a {}",
            resource.id,
            found.resource_type().as_str(),
            resource.resource_type.as_str()
        )));
    }
    Ok(found)
}

fn validate_options(options: &AssignOptions) -> Result<(), AssemblyError> {
    if let Some(order) = options.order {
        if order < 0 {
            return Err(AssemblyError::Validation(format!(
                "order must be non-negative, got {}",
                order
            )));
        }
    }
    validate_config_keys(&options.config_overrides)
}

fn validate_config_keys(config: &ConfigOverrides) -> Result<(), AssemblyError> {
    if config.keys().any(|k| k.trim().is_empty()) {
        return Err(AssemblyError::Validation(
            "config override keys must not be empty".to_string(),
        ));
    }
    Ok(())
}
