mod handlers;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;
use crate::suggest::{NoopSuggestions, SuggestionProvider};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub suggestions: Arc<dyn SuggestionProvider>,
}

pub fn create_router(db: Database) -> Router {
    create_router_with(db, Arc::new(NoopSuggestions))
}

pub fn create_router_with(db: Database, suggestions: Arc<dyn SuggestionProvider>) -> Router {
    let api = Router::new()
        // Projects
        .route("/projects", get(handlers::list_projects))
        .route("/projects", post(handlers::create_project))
        .route("/projects/{id}", get(handlers::get_project))
        .route("/projects/{id}", put(handlers::update_project))
        .route("/projects/{id}", delete(handlers::delete_project))
        // Assignments
        .route("/projects/{id}/assignments", get(handlers::list_assignments))
        .route("/projects/{id}/assignments", post(handlers::assign_resource))
        .route(
            "/projects/{id}/assignments/{resource_type}/{resource_id}",
            put(handlers::update_assignment),
        )
        .route(
            "/projects/{id}/assignments/{resource_type}/{resource_id}",
            delete(handlers::unassign_resource),
        )
        .route("/projects/{id}/order/{resource_type}", put(handlers::reorder_assignments))
        .route("/projects/{id}/overrides", get(handlers::get_overrides))
        // Import
        .route("/projects/{id}/import/preview", post(handlers::preview_import))
        .route("/projects/{id}/import/apply", post(handlers::apply_import))
        .route("/imports/approve", post(handlers::approve_import))
        .route("/imports/reject", post(handlers::reject_import))
        // Export
        .route("/projects/{id}/export", post(handlers::export_project))
        .route("/projects/{id}/exports", get(handlers::list_exports))
        // Suggestions
        .route("/projects/{id}/suggestions", get(handlers::get_suggestions))
        // Resources
        .route("/resources", get(handlers::list_resources))
        .route("/resources", post(handlers::create_resource))
        .route("/resources/{id}", get(handlers::get_resource))
        .route("/resources/{id}", put(handlers::update_resource))
        .route("/resources/{id}", delete(handlers::delete_resource))
        // Dependency edges
        .route("/edges", get(handlers::list_edges))
        .route("/edges", post(handlers::create_edge))
        .route("/edges/{id}", delete(handlers::delete_edge))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { db, suggestions })
}
