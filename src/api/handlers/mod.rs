use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::assembly::{
    ExportAssembler, ExportBundle, ImportOrchestrator, ImportOutcome, ImportPlan, ImportPolicy,
    ResourceAssigner,
};
use crate::error::AssemblyError;
use crate::models::*;
use crate::suggest::{collect_suggestions, Suggestion, SuggestionCache};

// ============================================================
// Error Handling
// ============================================================

type EngineError = (StatusCode, Json<Value>);

/// Log an internal error and return a sanitized response to the client.
///
/// Storage-layer CRUD reports input problems through `anyhow` messages; the
/// known ones are passed through as BAD_REQUEST.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    let msg = e.to_string();

    if msg.contains("must")
        || msg.contains("already exists")
        || msg.contains("not found")
        || msg.contains("is assigned to")
        || msg.contains("Invalid")
        || msg.contains("cannot")
        || msg.contains(", not a ")
    {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Map an engine error to a status code and a JSON body carrying its findings.
fn engine_error(e: AssemblyError) -> EngineError {
    let (status, code) = match &e {
        AssemblyError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
        AssemblyError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        AssemblyError::NotAssigned { .. } => (StatusCode::NOT_FOUND, "not_assigned"),
        AssemblyError::InvariantViolation { .. } => (StatusCode::CONFLICT, "invariant_violation"),
        AssemblyError::ConflictDetected { .. } => (StatusCode::CONFLICT, "conflict_detected"),
        AssemblyError::UnresolvedCriticalDependency { .. } => {
            (StatusCode::CONFLICT, "unresolved_critical_dependency")
        }
        AssemblyError::PlanStale { .. } => (StatusCode::CONFLICT, "plan_stale"),
        AssemblyError::ExportValidationFailed(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "export_validation_failed")
        }
        AssemblyError::StorageTransactionFailed(inner) => {
            tracing::error!("Storage error: {}", inner);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "storage_transaction_failed",
                    "message": "Internal server error",
                })),
            );
        }
    };

    let mut body = json!({
        "error": code,
        "message": e.to_string(),
        "findings": e.findings(),
    });
    if let AssemblyError::ExportValidationFailed(report) = &e {
        body["report"] = json!(report);
    }
    (status, Json(body))
}

fn not_found(entity: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{} not found", entity))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// ============================================================
// Projects
// ============================================================

pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<Project>>, (StatusCode, String)> {
    state.db.get_all_projects().map(Json).map_err(internal_error)
}

/// Accepts a numeric id or a slug.
pub async fn get_project(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Project>, (StatusCode, String)> {
    state
        .db
        .find_project(&handle)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Project"))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<CreateProjectInput>,
) -> Result<(StatusCode, Json<Project>), (StatusCode, String)> {
    state
        .db
        .create_project(input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(internal_error)
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateProjectInput>,
) -> Result<Json<Project>, (StatusCode, String)> {
    state
        .db
        .update_project(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Project"))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_project(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Project"))
    }
}

// ============================================================
// Resources
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ListResourcesQuery {
    #[serde(rename = "type")]
    pub resource_type: Option<ResourceType>,
}

pub async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ListResourcesQuery>,
) -> Result<Json<Vec<Resource>>, (StatusCode, String)> {
    state
        .db
        .get_all_resources(query.resource_type)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Resource>, (StatusCode, String)> {
    state
        .db
        .get_resource(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Resource"))
}

pub async fn create_resource(
    State(state): State<AppState>,
    Json(input): Json<CreateResourceInput>,
) -> Result<(StatusCode, Json<Resource>), (StatusCode, String)> {
    state
        .db
        .create_resource(input)
        .map(|r| (StatusCode::CREATED, Json(r)))
        .map_err(internal_error)
}

pub async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateResourceInput>,
) -> Result<Json<Resource>, (StatusCode, String)> {
    state
        .db
        .update_resource(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Resource"))
}

pub async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_resource(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Resource"))
    }
}

// ============================================================
// Dependency edges
// ============================================================

pub async fn list_edges(
    State(state): State<AppState>,
) -> Result<Json<Vec<DependencyEdge>>, (StatusCode, String)> {
    state.db.get_all_edges().map(Json).map_err(internal_error)
}

pub async fn create_edge(
    State(state): State<AppState>,
    Json(input): Json<CreateEdgeInput>,
) -> Result<(StatusCode, Json<DependencyEdge>), (StatusCode, String)> {
    state
        .db
        .create_edge(input)
        .map(|e| (StatusCode::CREATED, Json(e)))
        .map_err(internal_error)
}

pub async fn delete_edge(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_edge(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Edge"))
    }
}

// ============================================================
// Assignments
// ============================================================

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub resource: ResourceRef,
    #[serde(flatten)]
    pub options: AssignOptions,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<i64>,
}

pub async fn list_assignments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Assignment>>, (StatusCode, String)> {
    state.db.get_assignments(id).map(Json).map_err(internal_error)
}

pub async fn assign_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<AssignRequest>,
) -> Result<(StatusCode, Json<Assignment>), EngineError> {
    ResourceAssigner::new(&state.db)
        .assign(id, request.resource, request.options)
        .map(|a| (StatusCode::CREATED, Json(a)))
        .map_err(engine_error)
}

pub async fn update_assignment(
    State(state): State<AppState>,
    Path((id, resource_type, resource_id)): Path<(i64, ResourceType, i64)>,
    Json(input): Json<UpdateAssignmentInput>,
) -> Result<Json<Assignment>, EngineError> {
    ResourceAssigner::new(&state.db)
        .update(id, ResourceRef::new(resource_type, resource_id), input)
        .map(Json)
        .map_err(engine_error)
}

pub async fn unassign_resource(
    State(state): State<AppState>,
    Path((id, resource_type, resource_id)): Path<(i64, ResourceType, i64)>,
) -> Result<Json<Assignment>, EngineError> {
    ResourceAssigner::new(&state.db)
        .unassign(id, ResourceRef::new(resource_type, resource_id))
        .map(Json)
        .map_err(engine_error)
}

pub async fn reorder_assignments(
    State(state): State<AppState>,
    Path((id, resource_type)): Path<(i64, ResourceType)>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Vec<Assignment>>, EngineError> {
    ResourceAssigner::new(&state.db)
        .reorder(id, resource_type, &request.ids)
        .map(Json)
        .map_err(engine_error)
}

pub async fn get_overrides(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Overrides>, (StatusCode, String)> {
    state.db.get_overrides(id).map(Json).map_err(internal_error)
}

// ============================================================
// Import
// ============================================================

#[derive(Debug, Deserialize)]
pub struct PreviewImportRequest {
    pub seeds: Vec<ResourceRef>,
    #[serde(default)]
    pub policy: ImportPolicy,
}

#[derive(Debug, Deserialize)]
pub struct ApplyImportRequest {
    pub plan: ImportPlan,
    #[serde(default)]
    pub confirmed: Overrides,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub plan: ImportPlan,
}

pub async fn preview_import(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<PreviewImportRequest>,
) -> Result<Json<ImportPlan>, EngineError> {
    ImportOrchestrator::new(&state.db)
        .preview(id, &request.seeds, request.policy)
        .map(Json)
        .map_err(engine_error)
}

pub async fn apply_import(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ApplyImportRequest>,
) -> Result<Json<ImportOutcome>, EngineError> {
    let mut plan = request.plan;
    if plan.project_id != id {
        return Err(engine_error(AssemblyError::Validation(format!(
            "import plan {} belongs to project {}",
            plan.id, plan.project_id
        ))));
    }
    ImportOrchestrator::new(&state.db)
        .apply(&mut plan, request.confirmed)
        .map(Json)
        .map_err(engine_error)
}

pub async fn approve_import(Json(request): Json<PlanRequest>) -> Result<Json<ImportPlan>, EngineError> {
    let mut plan = request.plan;
    plan.approve().map_err(engine_error)?;
    Ok(Json(plan))
}

pub async fn reject_import(Json(request): Json<PlanRequest>) -> Result<Json<ImportPlan>, EngineError> {
    let mut plan = request.plan;
    plan.reject().map_err(engine_error)?;
    Ok(Json(plan))
}

// ============================================================
// Export
// ============================================================

pub async fn export_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ExportBundle>, EngineError> {
    ExportAssembler::new(&state.db)
        .export(id)
        .map(Json)
        .map_err(engine_error)
}

pub async fn list_exports(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ExportRecord>>, (StatusCode, String)> {
    state
        .db
        .get_export_records(id)
        .map(Json)
        .map_err(internal_error)
}

// ============================================================
// Suggestions
// ============================================================

pub async fn get_suggestions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Suggestion>>, (StatusCode, String)> {
    let project = state
        .db
        .get_project(id)
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Project"))?;

    let mut cache = SuggestionCache::new();
    Ok(Json(collect_suggestions(
        state.suggestions.as_ref(),
        &mut cache,
        &project,
    )))
}
