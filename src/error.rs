//! Error taxonomy for the assembly engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::assembly::ConflictFinding;
use crate::models::ResourceRef;

/// Lower-layer failure. Always rolls back the surrounding transaction.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// The invariants guarded by the assignment layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Invariant {
    /// At most one primary assignment per resource type.
    DuplicatePrimary,
    /// A resource is assigned to a project at most once.
    DuplicateIdentity,
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePrimary => f.write_str("duplicate_primary"),
            Self::DuplicateIdentity => f.write_str("duplicate_identity"),
        }
    }
}

/// Itemised reasons an export was refused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    pub project_id: i64,
    pub items: Vec<ValidationItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationItem {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub resources: Vec<ResourceRef>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project {}:", self.project_id)?;
        for item in &self.items {
            write!(f, " [{}] {};", item.code, item.message)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Malformed input, caught before any storage call.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{resource} is not assigned to project {project_id}")]
    NotAssigned {
        project_id: i64,
        resource: ResourceRef,
    },

    #[error("invariant {invariant} violated by {}", join_refs(.resources))]
    InvariantViolation {
        invariant: Invariant,
        resources: Vec<ResourceRef>,
        findings: Vec<ConflictFinding>,
    },

    #[error("{first} conflicts with {second}")]
    ConflictDetected {
        first: ResourceRef,
        second: ResourceRef,
        findings: Vec<ConflictFinding>,
    },

    #[error("{dependent} critically requires {required}, which is not assigned")]
    UnresolvedCriticalDependency {
        dependent: ResourceRef,
        required: ResourceRef,
        findings: Vec<ConflictFinding>,
    },

    /// The live assignment set moved since preview; the caller must re-preview.
    #[error("import plan {plan_id} is stale: {reason}")]
    PlanStale { plan_id: Uuid, reason: String },

    #[error("export validation failed: {0}")]
    ExportValidationFailed(ValidationReport),

    #[error("storage transaction failed: {0}")]
    StorageTransactionFailed(#[from] StorageError),
}

impl AssemblyError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Findings attached to a blocking rejection, empty for other variants.
    pub fn findings(&self) -> &[ConflictFinding] {
        match self {
            Self::InvariantViolation { findings, .. }
            | Self::ConflictDetected { findings, .. }
            | Self::UnresolvedCriticalDependency { findings, .. } => findings,
            _ => &[],
        }
    }
}

impl From<rusqlite::Error> for AssemblyError {
    fn from(e: rusqlite::Error) -> Self {
        Self::StorageTransactionFailed(StorageError::Sqlite(e))
    }
}

impl From<serde_json::Error> for AssemblyError {
    fn from(e: serde_json::Error) -> Self {
        Self::StorageTransactionFailed(StorageError::Json(e))
    }
}

fn join_refs(refs: &[ResourceRef]) -> String {
    refs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
