//! The storage boundary consumed by the assembly engine.
//!
//! The engine never talks to SQLite directly. Every state-mutating sequence
//! runs inside [`ResourceRepository::run_in_transaction`], and everything it
//! reads or writes goes through the [`RepositoryTx`] handle it receives, so
//! a failure at any step rolls the whole sequence back.

use chrono::{DateTime, Utc};

use crate::error::{AssemblyError, StorageResult};
use crate::models::*;

/// Operations available inside one storage transaction.
pub trait RepositoryTx {
    fn get_project(&self, id: i64) -> StorageResult<Option<Project>>;

    fn get_resource(&self, id: i64) -> StorageResult<Option<Resource>>;

    fn list_assignments(&self, project_id: i64) -> StorageResult<Vec<Assignment>>;

    /// Edges whose source is one of `sources`, ordered by edge id.
    fn list_dependency_edges(&self, sources: &[ResourceRef]) -> StorageResult<Vec<DependencyEdge>>;

    fn list_overrides(&self, project_id: i64) -> StorageResult<Overrides>;

    fn insert_assignment(&self, assignment: &Assignment) -> StorageResult<()>;

    /// Rewrites primary flag, order, overrides and reason of an existing row.
    fn update_assignment(&self, assignment: &Assignment) -> StorageResult<()>;

    fn delete_assignment(&self, project_id: i64, resource: ResourceRef) -> StorageResult<bool>;

    /// Persists overrides; pairs already stored are ignored.
    fn add_overrides(&self, project_id: i64, overrides: &Overrides) -> StorageResult<()>;

    fn touch_project(&self, project_id: i64, at: DateTime<Utc>) -> StorageResult<()>;

    fn append_export_record(&self, record: &ExportRecord) -> StorageResult<()>;
}

/// Persistence for projects, resources, assignments and dependency edges.
///
/// Implementors only need to provide transactions; the read helpers default
/// to running a short transaction of their own.
pub trait ResourceRepository {
    /// Run `f` atomically: commit when it returns `Ok`, roll back otherwise.
    fn run_in_transaction<T, F>(&self, f: F) -> Result<T, AssemblyError>
    where
        F: FnOnce(&dyn RepositoryTx) -> Result<T, AssemblyError>;

    fn get_project(&self, id: i64) -> Result<Option<Project>, AssemblyError> {
        self.run_in_transaction(|tx| Ok(tx.get_project(id)?))
    }

    fn get_resource(&self, id: i64) -> Result<Option<Resource>, AssemblyError> {
        self.run_in_transaction(|tx| Ok(tx.get_resource(id)?))
    }

    fn list_assignments(&self, project_id: i64) -> Result<Vec<Assignment>, AssemblyError> {
        self.run_in_transaction(|tx| Ok(tx.list_assignments(project_id)?))
    }

    fn list_dependency_edges(
        &self,
        sources: &[ResourceRef],
    ) -> Result<Vec<DependencyEdge>, AssemblyError> {
        self.run_in_transaction(|tx| Ok(tx.list_dependency_edges(sources)?))
    }
}
