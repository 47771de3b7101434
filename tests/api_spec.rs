use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use stackforge::api::{create_router, create_router_with};
use stackforge::assembly::{ExportBundle, ImportOutcome, ImportPlan, ImportState, MANIFEST_PATH};
use stackforge::db::Database;
use stackforge::models::*;
use stackforge::suggest::{Suggestion, SuggestionProvider};

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_test_project(server: &TestServer) -> Project {
    server
        .post("/api/v1/projects")
        .json(&json!({ "name": "Test Project" }))
        .await
        .json::<Project>()
}

async fn create_agent(server: &TestServer, name: &str) -> Resource {
    server
        .post("/api/v1/resources")
        .json(&json!({
            "name": name,
            "content": { "type": "agent", "role": "reviewer", "instructions": "Review." }
        }))
        .await
        .json::<Resource>()
}

async fn create_rule(server: &TestServer, name: &str) -> Resource {
    server
        .post("/api/v1/resources")
        .json(&json!({
            "name": name,
            "content": { "type": "rule", "text": "Be terse.", "category": "style" }
        }))
        .await
        .json::<Resource>()
}

async fn create_edge(server: &TestServer, source: &Resource, target: &Resource, kind: &str) {
    server
        .post("/api/v1/edges")
        .json(&json!({
            "source": source.reference(),
            "target": target.reference(),
            "kind": kind,
            "critical": true
        }))
        .await
        .assert_status(StatusCode::CREATED);
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "ok");
    }
}

mod projects {
    use super::*;

    #[tokio::test]
    async fn creates_and_fetches_by_slug() {
        let server = setup();
        let project = create_test_project(&server).await;

        let response = server.get("/api/v1/projects/test-project").await;

        response.assert_status_ok();
        assert_eq!(response.json::<Project>().id, project.id);
    }

    #[tokio::test]
    async fn rejects_an_empty_name() {
        let server = setup();

        let response = server
            .post("/api/v1/projects")
            .json(&json!({ "name": "" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn returns_404_for_missing_project() {
        let server = setup();
        server
            .get("/api/v1/projects/404")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod resources {
    use super::*;

    #[tokio::test]
    async fn filters_by_type() {
        let server = setup();
        create_agent(&server, "Agent").await;
        create_rule(&server, "Rule").await;

        let response = server.get("/api/v1/resources?type=rule").await;

        response.assert_status_ok();
        let resources: Vec<Resource> = response.json();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].resource_type(), ResourceType::Rule);
    }

    #[tokio::test]
    async fn refuses_to_delete_an_assigned_resource() {
        let server = setup();
        let project = create_test_project(&server).await;
        let agent = create_agent(&server, "Busy").await;
        server
            .post(&format!("/api/v1/projects/{}/assignments", project.id))
            .json(&json!({ "resource": agent.reference() }))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .delete(&format!("/api/v1/resources/{}", agent.id))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

mod assignments {
    use super::*;

    #[tokio::test]
    async fn assigns_and_lists() {
        let server = setup();
        let project = create_test_project(&server).await;
        let agent = create_agent(&server, "Lead").await;

        let response = server
            .post(&format!("/api/v1/projects/{}/assignments", project.id))
            .json(&json!({ "resource": agent.reference(), "is_primary": true }))
            .await;
        response.assert_status(StatusCode::CREATED);
        assert!(response.json::<Assignment>().is_primary);

        let list: Vec<Assignment> = server
            .get(&format!("/api/v1/projects/{}/assignments", project.id))
            .await
            .json();
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn returns_409_with_findings_on_unmet_requirement() {
        let server = setup();
        let project = create_test_project(&server).await;
        let a = create_rule(&server, "A").await;
        let b = create_rule(&server, "B").await;
        create_edge(&server, &a, &b, "requires").await;

        let response = server
            .post(&format!("/api/v1/projects/{}/assignments", project.id))
            .json(&json!({ "resource": a.reference() }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"], "unresolved_critical_dependency");
        assert_eq!(body["findings"][0]["rule"], "missing_requirement");
    }

    #[tokio::test]
    async fn unassigning_an_unknown_resource_is_404() {
        let server = setup();
        let project = create_test_project(&server).await;

        server
            .delete(&format!("/api/v1/projects/{}/assignments/rule/77", project.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reorders_by_type() {
        let server = setup();
        let project = create_test_project(&server).await;
        let a = create_rule(&server, "A").await;
        let b = create_rule(&server, "B").await;
        for r in [&a, &b] {
            server
                .post(&format!("/api/v1/projects/{}/assignments", project.id))
                .json(&json!({ "resource": r.reference() }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server
            .put(&format!("/api/v1/projects/{}/order/rule", project.id))
            .json(&json!({ "ids": [b.id, a.id] }))
            .await;

        response.assert_status_ok();
        let ids: Vec<i64> = response
            .json::<Vec<Assignment>>()
            .iter()
            .map(|a| a.resource.id)
            .collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }
}

mod import {
    use super::*;

    #[tokio::test]
    async fn previews_and_applies_a_plan() {
        let server = setup();
        let project = create_test_project(&server).await;
        let a = create_rule(&server, "A").await;
        let b = create_rule(&server, "B").await;
        create_edge(&server, &a, &b, "requires").await;

        let plan: ImportPlan = server
            .post(&format!("/api/v1/projects/{}/import/preview", project.id))
            .json(&json!({ "seeds": [a.reference()] }))
            .await
            .json();
        assert_eq!(plan.state, ImportState::Previewed);
        assert_eq!(plan.to_add.len(), 2);

        let approved: ImportPlan = server
            .post("/api/v1/imports/approve")
            .json(&json!({ "plan": plan }))
            .await
            .json();
        assert_eq!(approved.state, ImportState::Approved);

        let response = server
            .post(&format!("/api/v1/projects/{}/import/apply", project.id))
            .json(&json!({ "plan": approved }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<ImportOutcome>().assigned.len(), 2);
    }
}

mod export {
    use super::*;

    #[tokio::test]
    async fn refuses_a_project_without_agents() {
        let server = setup();
        let project = create_test_project(&server).await;

        let response = server
            .post(&format!("/api/v1/projects/{}/export", project.id))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["report"]["items"][0]["code"], "no_agent");

        let history: Vec<ExportRecord> = server
            .get(&format!("/api/v1/projects/{}/exports", project.id))
            .await
            .json();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, ExportStatus::Failed);
    }

    #[tokio::test]
    async fn exports_a_bundle() {
        let server = setup();
        let project = create_test_project(&server).await;
        let agent = create_agent(&server, "Lead").await;
        server
            .post(&format!("/api/v1/projects/{}/assignments", project.id))
            .json(&json!({ "resource": agent.reference(), "is_primary": true }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(&format!("/api/v1/projects/{}/export", project.id))
            .await;

        response.assert_status_ok();
        let bundle: ExportBundle = response.json();
        assert!(bundle.files.contains_key(MANIFEST_PATH));
        assert_eq!(bundle.record.status, ExportStatus::Succeeded);
    }
}

mod suggestions {
    use super::*;

    struct Unavailable;

    impl SuggestionProvider for Unavailable {
        fn name(&self) -> &str {
            "unavailable"
        }

        fn suggest(&self, _project: &Project) -> anyhow::Result<Vec<Suggestion>> {
            anyhow::bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn degrade_to_an_empty_list() {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        let server = TestServer::new(create_router_with(db, Arc::new(Unavailable)))
            .expect("Failed to create test server");
        let project = create_test_project(&server).await;

        let response = server
            .get(&format!("/api/v1/projects/{}/suggestions", project.id))
            .await;

        response.assert_status_ok();
        assert!(response.json::<Vec<Suggestion>>().is_empty());
    }
}
