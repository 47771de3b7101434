mod repository;
mod schema;

pub use repository::{RepositoryTx, ResourceRepository};

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;

use crate::error::{AssemblyError, StorageResult};
use crate::models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "stackforge")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("stackforge.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }

    // ============================================================
    // Project operations
    // ============================================================

    pub fn get_all_projects(&self) -> Result<Vec<Project>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY name"
        ))?;

        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let conn = self.lock();
        Ok(query_project(&conn, id)?)
    }

    pub fn get_project_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        let conn = self.lock();
        let project = conn
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE slug = ?"),
                [slug],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    /// Resolve a CLI/API project handle: numeric id first, then slug.
    pub fn find_project(&self, handle: &str) -> Result<Option<Project>> {
        if let Ok(id) = handle.parse::<i64>() {
            if let Some(project) = self.get_project(id)? {
                return Ok(Some(project));
            }
        }
        self.get_project_by_slug(handle)
    }

    pub fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        if input.name.trim().is_empty() {
            anyhow::bail!("Project name must not be empty");
        }
        let slug = slugify(input.slug.as_deref().unwrap_or(&input.name));
        if slug.is_empty() {
            anyhow::bail!("Project slug must contain at least one alphanumeric character");
        }
        if self.get_project_by_slug(&slug)?.is_some() {
            anyhow::bail!("Project slug '{}' already exists", slug);
        }

        let conn = self.lock();
        let now = Utc::now();
        let status = input.status.unwrap_or(ProjectStatus::Draft);
        let priority = input.priority.unwrap_or(0);

        conn.execute(
            "INSERT INTO projects (slug, name, description, status, priority, tags, ai_context, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &slug,
                &input.name,
                &input.description,
                status.as_str(),
                priority,
                serde_json::to_string(&input.tags)?,
                &input.ai_context,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Project {
            id: conn.last_insert_rowid(),
            slug,
            name: input.name,
            description: input.description,
            status,
            priority,
            tags: input.tags,
            ai_context: input.ai_context,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_project(&self, id: i64, input: UpdateProjectInput) -> Result<Option<Project>> {
        let Some(existing) = self.get_project(id)? else {
            return Ok(None);
        };

        let conn = self.lock();
        let now = Utc::now();
        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);
        let status = input.status.unwrap_or(existing.status);
        let priority = input.priority.unwrap_or(existing.priority);
        let tags = input.tags.unwrap_or(existing.tags);
        let ai_context = input.ai_context.or(existing.ai_context);

        conn.execute(
            "UPDATE projects SET name = ?, description = ?, status = ?, priority = ?, tags = ?, ai_context = ?, updated_at = ?
             WHERE id = ?",
            (
                &name,
                &description,
                status.as_str(),
                priority,
                serde_json::to_string(&tags)?,
                &ai_context,
                now.to_rfc3339(),
                id,
            ),
        )?;

        Ok(Some(Project {
            id,
            slug: existing.slug,
            name,
            description,
            status,
            priority,
            tags,
            ai_context,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Delete a project with its assignments and overrides. Export history is kept.
    pub fn delete_project(&self, id: i64) -> Result<bool> {
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM assignments WHERE project_id = ?", [id])?;
        tx.execute("DELETE FROM project_overrides WHERE project_id = ?", [id])?;
        let rows = tx.execute("DELETE FROM projects WHERE id = ?", [id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // ============================================================
    // Resource operations
    // ============================================================

    pub fn get_all_resources(&self, resource_type: Option<ResourceType>) -> Result<Vec<Resource>> {
        let conn = self.lock();
        let resources = match resource_type {
            Some(kind) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {RESOURCE_COLUMNS} FROM resources WHERE resource_type = ? ORDER BY id"
                ))?;
                let rows = stmt.query_map([kind.as_str()], resource_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {RESOURCE_COLUMNS} FROM resources ORDER BY id"
                ))?;
                let rows = stmt.query_map([], resource_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(resources)
    }

    pub fn get_resource(&self, id: i64) -> Result<Option<Resource>> {
        let conn = self.lock();
        Ok(query_resource(&conn, id)?)
    }

    pub fn create_resource(&self, input: CreateResourceInput) -> Result<Resource> {
        input
            .validate()
            .map_err(|msg| anyhow::anyhow!("Invalid resource: {}", msg))?;

        let conn = self.lock();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO resources (resource_type, name, description, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                input.content.resource_type().as_str(),
                &input.name,
                &input.description,
                serde_json::to_string(&input.content)?,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Resource {
            id: conn.last_insert_rowid(),
            name: input.name,
            description: input.description,
            content: input.content,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_resource(&self, id: i64, input: UpdateResourceInput) -> Result<Option<Resource>> {
        let Some(existing) = self.get_resource(id)? else {
            return Ok(None);
        };

        if let Some(content) = &input.content {
            if content.resource_type() != existing.resource_type() {
                anyhow::bail!(
                    "Resource {} is a {} and cannot become a {}",
                    id,
                    existing.resource_type().as_str(),
                    content.resource_type().as_str()
                );
            }
            content
                .validate()
                .map_err(|msg| anyhow::anyhow!("Invalid resource: {}", msg))?;
        }

        let conn = self.lock();
        let now = Utc::now();
        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);
        let content = input.content.unwrap_or(existing.content);

        conn.execute(
            "UPDATE resources SET name = ?, description = ?, content = ?, updated_at = ? WHERE id = ?",
            (
                &name,
                &description,
                serde_json::to_string(&content)?,
                now.to_rfc3339(),
                id,
            ),
        )?;

        Ok(Some(Resource {
            id,
            name,
            description,
            content,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Delete a resource and its edges. Refused while any project assigns it.
    pub fn delete_resource(&self, id: i64) -> Result<bool> {
        let conn = self.lock();
        let in_use: i64 = conn.query_row(
            "SELECT COUNT(*) FROM assignments WHERE resource_id = ?",
            [id],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            anyhow::bail!("Resource {} is assigned to {} project(s)", id, in_use);
        }

        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM dependency_edges WHERE source_id = ? OR target_id = ?",
            [id, id],
        )?;
        let rows = tx.execute("DELETE FROM resources WHERE id = ?", [id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // ============================================================
    // Dependency edge operations
    // ============================================================

    pub fn get_all_edges(&self) -> Result<Vec<DependencyEdge>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EDGE_COLUMNS} FROM dependency_edges ORDER BY id"
        ))?;
        let edges = stmt
            .query_map([], edge_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    pub fn create_edge(&self, input: CreateEdgeInput) -> Result<DependencyEdge> {
        if input.source == input.target {
            anyhow::bail!("A resource cannot depend on itself");
        }
        for endpoint in [input.source, input.target] {
            let resource = self
                .get_resource(endpoint.id)?
                .ok_or_else(|| anyhow::anyhow!("Resource {} not found", endpoint))?;
            if resource.resource_type() != endpoint.resource_type {
                anyhow::bail!(
                    "Resource {} is a {}, not a {}",
                    endpoint.id,
                    resource.resource_type().as_str(),
                    endpoint.resource_type.as_str()
                );
            }
        }

        let conn = self.lock();
        let now = Utc::now();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO dependency_edges (source_type, source_id, target_type, target_id, kind, critical, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                input.source.resource_type.as_str(),
                input.source.id,
                input.target.resource_type.as_str(),
                input.target.id,
                input.kind.as_str(),
                input.critical,
                now.to_rfc3339(),
            ),
        )?;
        if inserted == 0 {
            anyhow::bail!(
                "Edge {} {} {} already exists",
                input.source,
                input.kind.as_str(),
                input.target
            );
        }

        Ok(DependencyEdge {
            id: conn.last_insert_rowid(),
            source: input.source,
            target: input.target,
            kind: input.kind,
            critical: input.critical,
            created_at: now,
        })
    }

    pub fn delete_edge(&self, id: i64) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM dependency_edges WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Assignment and export history reads
    // ============================================================

    pub fn get_assignments(&self, project_id: i64) -> Result<Vec<Assignment>> {
        let conn = self.lock();
        Ok(query_assignments(&conn, project_id)?)
    }

    pub fn get_overrides(&self, project_id: i64) -> Result<Overrides> {
        let conn = self.lock();
        Ok(query_overrides(&conn, project_id)?)
    }

    /// Export attempts for a project, newest first.
    pub fn get_export_records(&self, project_id: i64) -> Result<Vec<ExportRecord>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, resources, files, total_bytes, status, error, started_at, completed_at
             FROM export_records WHERE project_id = ? ORDER BY rowid DESC",
        )?;
        let records = stmt
            .query_map([project_id], export_record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

impl ResourceRepository for Database {
    fn run_in_transaction<T, F>(&self, f: F) -> Result<T, AssemblyError>
    where
        F: FnOnce(&dyn RepositoryTx) -> Result<T, AssemblyError>,
    {
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        let result = f(&SqliteTx { conn: &*tx });
        match result {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::error!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

/// [`RepositoryTx`] over an open SQLite transaction.
struct SqliteTx<'a> {
    conn: &'a Connection,
}

impl RepositoryTx for SqliteTx<'_> {
    fn get_project(&self, id: i64) -> StorageResult<Option<Project>> {
        Ok(query_project(self.conn, id)?)
    }

    fn get_resource(&self, id: i64) -> StorageResult<Option<Resource>> {
        Ok(query_resource(self.conn, id)?)
    }

    fn list_assignments(&self, project_id: i64) -> StorageResult<Vec<Assignment>> {
        Ok(query_assignments(self.conn, project_id)?)
    }

    fn list_dependency_edges(&self, sources: &[ResourceRef]) -> StorageResult<Vec<DependencyEdge>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EDGE_COLUMNS} FROM dependency_edges WHERE source_type = ? AND source_id = ?"
        ))?;
        let mut edges = Vec::new();
        for source in sources {
            let rows = stmt.query_map((source.resource_type.as_str(), source.id), edge_from_row)?;
            for edge in rows {
                edges.push(edge?);
            }
        }
        edges.sort_by_key(|e| e.id);
        edges.dedup_by_key(|e| e.id);
        Ok(edges)
    }

    fn list_overrides(&self, project_id: i64) -> StorageResult<Overrides> {
        Ok(query_overrides(self.conn, project_id)?)
    }

    fn insert_assignment(&self, assignment: &Assignment) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO assignments (project_id, resource_type, resource_id, is_primary, sort_order, config_overrides, reason, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                assignment.project_id,
                assignment.resource.resource_type.as_str(),
                assignment.resource.id,
                assignment.is_primary,
                assignment.order,
                serde_json::to_string(&assignment.config_overrides)?,
                &assignment.reason,
                assignment.created_at.to_rfc3339(),
                assignment.updated_at.to_rfc3339(),
            ),
        )?;
        Ok(())
    }

    fn update_assignment(&self, assignment: &Assignment) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE assignments SET is_primary = ?, sort_order = ?, config_overrides = ?, reason = ?, updated_at = ?
             WHERE project_id = ? AND resource_type = ? AND resource_id = ?",
            (
                assignment.is_primary,
                assignment.order,
                serde_json::to_string(&assignment.config_overrides)?,
                &assignment.reason,
                assignment.updated_at.to_rfc3339(),
                assignment.project_id,
                assignment.resource.resource_type.as_str(),
                assignment.resource.id,
            ),
        )?;
        Ok(())
    }

    fn delete_assignment(&self, project_id: i64, resource: ResourceRef) -> StorageResult<bool> {
        let rows = self.conn.execute(
            "DELETE FROM assignments WHERE project_id = ? AND resource_type = ? AND resource_id = ?",
            (project_id, resource.resource_type.as_str(), resource.id),
        )?;
        Ok(rows > 0)
    }

    fn add_overrides(&self, project_id: i64, overrides: &Overrides) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        // Waivers are stored as first = source, second = target.
        let tagged = overrides
            .conflicts
            .iter()
            .map(|p| ("conflict", ResourcePair::new(p.first, p.second)))
            .chain(
                overrides
                    .dependencies
                    .iter()
                    .map(|w| ("dependency", ResourcePair { first: w.source, second: w.target })),
            );
        for (kind, pair) in tagged {
            self.conn.execute(
                "INSERT OR IGNORE INTO project_overrides (project_id, kind, first_type, first_id, second_type, second_id, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                (
                    project_id,
                    kind,
                    pair.first.resource_type.as_str(),
                    pair.first.id,
                    pair.second.resource_type.as_str(),
                    pair.second.id,
                    &now,
                ),
            )?;
        }
        Ok(())
    }

    fn touch_project(&self, project_id: i64, at: DateTime<Utc>) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE projects SET updated_at = ? WHERE id = ?",
            (at.to_rfc3339(), project_id),
        )?;
        Ok(())
    }

    fn append_export_record(&self, record: &ExportRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO export_records (id, project_id, resources, files, total_bytes, status, error, started_at, completed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                record.id.to_string(),
                record.project_id,
                serde_json::to_string(&record.resources)?,
                serde_json::to_string(&record.files)?,
                record.total_bytes as i64,
                record.status.as_str(),
                &record.error,
                record.started_at.to_rfc3339(),
                record.completed_at.to_rfc3339(),
            ),
        )?;
        Ok(())
    }
}

// ============================================================
// Row mapping
// ============================================================

const PROJECT_COLUMNS: &str =
    "id, slug, name, description, status, priority, tags, ai_context, created_at, updated_at";
const RESOURCE_COLUMNS: &str = "id, name, description, content, created_at, updated_at";
const ASSIGNMENT_COLUMNS: &str = "project_id, resource_type, resource_id, is_primary, sort_order, config_overrides, reason, created_at, updated_at";
const EDGE_COLUMNS: &str =
    "id, source_type, source_id, target_type, target_id, kind, critical, created_at";

fn query_project(conn: &Connection, id: i64) -> rusqlite::Result<Option<Project>> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"),
        [id],
        project_from_row,
    )
    .optional()
}

fn query_resource(conn: &Connection, id: i64) -> rusqlite::Result<Option<Resource>> {
    conn.query_row(
        &format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = ?"),
        [id],
        resource_from_row,
    )
    .optional()
}

fn query_assignments(conn: &Connection, project_id: i64) -> rusqlite::Result<Vec<Assignment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE project_id = ?
         ORDER BY resource_type, is_primary DESC, sort_order, resource_id"
    ))?;
    let assignments = stmt
        .query_map([project_id], assignment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(assignments)
}

fn query_overrides(conn: &Connection, project_id: i64) -> rusqlite::Result<Overrides> {
    let mut stmt = conn.prepare(
        "SELECT kind, first_type, first_id, second_type, second_id
         FROM project_overrides WHERE project_id = ?
         ORDER BY kind, first_id, second_id",
    )?;
    let mut rows = stmt.query([project_id])?;
    let mut overrides = Overrides::default();
    while let Some(row) = rows.next()? {
        let kind: String = row.get(0)?;
        let first = ref_columns(row, 1, 2)?;
        let second = ref_columns(row, 3, 4)?;
        match kind.as_str() {
            "conflict" => overrides.conflicts.push(ResourcePair::new(first, second)),
            _ => overrides
                .dependencies
                .push(DependencyWaiver::new(first, second)),
        }
    }
    Ok(overrides)
}

fn project_from_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        status: ProjectStatus::from_str(&row.get::<_, String>(4)?).unwrap_or(ProjectStatus::Draft),
        priority: row.get(5)?,
        tags: json_column(row, 6)?,
        ai_context: row.get(7)?,
        created_at: parse_datetime(row.get::<_, String>(8)?),
        updated_at: parse_datetime(row.get::<_, String>(9)?),
    })
}

fn resource_from_row(row: &Row) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        content: json_column(row, 3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
        updated_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn assignment_from_row(row: &Row) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        project_id: row.get(0)?,
        resource: ref_columns(row, 1, 2)?,
        is_primary: row.get(3)?,
        order: row.get(4)?,
        config_overrides: json_column(row, 5)?,
        reason: row.get(6)?,
        created_at: parse_datetime(row.get::<_, String>(7)?),
        updated_at: parse_datetime(row.get::<_, String>(8)?),
    })
}

fn edge_from_row(row: &Row) -> rusqlite::Result<DependencyEdge> {
    let kind: String = row.get(5)?;
    Ok(DependencyEdge {
        id: row.get(0)?,
        source: ref_columns(row, 1, 2)?,
        target: ref_columns(row, 3, 4)?,
        kind: EdgeKind::from_str(&kind).ok_or_else(|| corrupt(5, format!("edge kind '{}'", kind)))?,
        critical: row.get(6)?,
        created_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn export_record_from_row(row: &Row) -> rusqlite::Result<ExportRecord> {
    let id: String = row.get(0)?;
    let status: String = row.get(5)?;
    Ok(ExportRecord {
        id: uuid::Uuid::parse_str(&id).map_err(|e| corrupt(0, e.to_string()))?,
        project_id: row.get(1)?,
        resources: json_column(row, 2)?,
        files: json_column(row, 3)?,
        total_bytes: row.get::<_, i64>(4)? as u64,
        status: ExportStatus::from_str(&status).unwrap_or(ExportStatus::Failed),
        error: row.get(6)?,
        started_at: parse_datetime(row.get::<_, String>(7)?),
        completed_at: parse_datetime(row.get::<_, String>(8)?),
    })
}

/// Read a `(type, id)` column pair as a resource reference.
fn ref_columns(row: &Row, type_idx: usize, id_idx: usize) -> rusqlite::Result<ResourceRef> {
    let kind: String = row.get(type_idx)?;
    let resource_type = ResourceType::from_str(&kind)
        .ok_or_else(|| corrupt(type_idx, format!("resource type '{}'", kind)))?;
    Ok(ResourceRef::new(resource_type, row.get(id_idx)?))
}

fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn corrupt(idx: usize, what: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        Box::new(crate::error::StorageError::Corrupt(what)),
    )
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
