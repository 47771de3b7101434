//! Deterministic rendering of a project's assignments into a file bundle.
//!
//! Rendering is a pure function of the persisted assignment set: the same
//! set always yields byte-identical files. Layout of a bundle:
//!
//! ```text
//! stackforge.toml        project manifest
//! settings.json          merged per-project configuration
//! agents/<slug>-<id>.md  one per agent assignment
//! RULES.md               all rule assignments, when any
//! hooks.json             hook declarations, when any
//! ```
//!
//! # Settings merge
//!
//! Each assignment's `config_overrides` is merged into one flat map in
//! ascending assignment `order` (ties broken by resource id). When two
//! assignments set the same key, the later one wins and the earlier value is
//! dropped from the bundle.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::conflicts::{Candidate, ConflictDetector};
use crate::db::{RepositoryTx, ResourceRepository};
use crate::error::{AssemblyError, ValidationItem, ValidationReport};
use crate::models::*;

pub const TEMPLATE_VERSION: u32 = 1;

pub const MANIFEST_PATH: &str = "stackforge.toml";
pub const SETTINGS_PATH: &str = "settings.json";
pub const RULES_PATH: &str = "RULES.md";
pub const HOOKS_PATH: &str = "hooks.json";

/// One assignment joined with the resource it points at.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub assignment: Assignment,
    pub resource: Resource,
}

/// Everything rendering reads, loaded in one transaction.
#[derive(Debug, Clone)]
pub struct ExportSnapshot {
    pub project: Project,
    /// Grouped by type; primaries first, then by order and id.
    pub entries: Vec<ResolvedEntry>,
    /// Edges leaving any assigned resource.
    pub edges: Vec<DependencyEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleManifest {
    pub files: Vec<ExportedFile>,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportBundle {
    /// Bundle-relative path to file content.
    pub files: BTreeMap<String, String>,
    pub manifest: BundleManifest,
    pub record: ExportRecord,
}

impl ExportBundle {
    /// Write every file under `dir`, creating parent directories as needed.
    pub fn write_to(&self, dir: &Path) -> anyhow::Result<()> {
        for (path, content) in &self.files {
            let target = dir.join(path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, content)?;
        }
        Ok(())
    }
}

pub struct ExportAssembler<'r, R: ResourceRepository> {
    repo: &'r R,
}

impl<'r, R: ResourceRepository> ExportAssembler<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// Validate and render the project's persisted assignment set.
    ///
    /// Every attempt that reaches validation appends an [`ExportRecord`],
    /// including refused ones.
    pub fn export(&self, project_id: i64) -> Result<ExportBundle, AssemblyError> {
        let started_at = Utc::now();

        let (snapshot, verdict) = self.repo.run_in_transaction(|tx| {
            let snapshot = load_snapshot(tx, project_id)?;
            let overrides = tx.list_overrides(project_id)?;
            let verdict = validate_snapshot(&snapshot, &overrides);
            Ok((snapshot, verdict))
        })?;

        let mut resources: Vec<ResourceRef> = snapshot
            .entries
            .iter()
            .map(|e| e.assignment.resource)
            .collect();
        resources.sort();

        match verdict {
            Ok(()) => {}
            Err(report) => {
                let record = ExportRecord {
                    id: Uuid::new_v4(),
                    project_id,
                    resources,
                    files: Vec::new(),
                    total_bytes: 0,
                    status: ExportStatus::Failed,
                    error: Some(report.to_string()),
                    started_at,
                    completed_at: Utc::now(),
                };
                self.repo
                    .run_in_transaction(|tx| Ok(tx.append_export_record(&record)?))?;
                tracing::warn!(project_id, "Export refused: {}", report);
                return Err(AssemblyError::ExportValidationFailed(report));
            }
        }

        let files = render(&snapshot)?;
        let manifest = BundleManifest {
            files: files
                .iter()
                .map(|(path, content)| ExportedFile {
                    path: path.clone(),
                    bytes: content.len() as u64,
                })
                .collect(),
            total_bytes: files.values().map(|c| c.len() as u64).sum(),
        };

        let record = ExportRecord {
            id: Uuid::new_v4(),
            project_id,
            resources,
            files: manifest.files.clone(),
            total_bytes: manifest.total_bytes,
            status: ExportStatus::Succeeded,
            error: None,
            started_at,
            completed_at: Utc::now(),
        };
        self.repo
            .run_in_transaction(|tx| Ok(tx.append_export_record(&record)?))?;

        tracing::info!(
            project_id,
            files = manifest.files.len(),
            bytes = manifest.total_bytes,
            "Exported project bundle"
        );

        Ok(ExportBundle {
            files,
            manifest,
            record,
        })
    }
}

fn load_snapshot(tx: &dyn RepositoryTx, project_id: i64) -> Result<ExportSnapshot, AssemblyError> {
    let project = tx
        .get_project(project_id)?
        .ok_or_else(|| AssemblyError::not_found("project", project_id))?;

    let mut entries = Vec::new();
    for assignment in tx.list_assignments(project_id)? {
        let resource = tx.get_resource(assignment.resource.id)?.ok_or_else(|| {
            AssemblyError::not_found("resource", assignment.resource)
        })?;
        entries.push(ResolvedEntry {
            assignment,
            resource,
        });
    }
    entries.sort_by(|a, b| {
        let (a, b) = (&a.assignment, &b.assignment);
        (a.resource_type(), !a.is_primary, a.order, a.resource.id)
            .cmp(&(b.resource_type(), !b.is_primary, b.order, b.resource.id))
    });

    let refs: Vec<ResourceRef> = entries.iter().map(|e| e.assignment.resource).collect();
    let edges = tx.list_dependency_edges(&refs)?;

    Ok(ExportSnapshot {
        project,
        entries,
        edges,
    })
}

/// The export gate: at least one agent, and no blocking findings against the
/// persisted set.
fn validate_snapshot(snapshot: &ExportSnapshot, overrides: &Overrides) -> Result<(), ValidationReport> {
    let mut items = Vec::new();

    if !snapshot
        .entries
        .iter()
        .any(|e| e.assignment.resource_type() == ResourceType::Agent)
    {
        items.push(ValidationItem {
            code: "no_agent".to_string(),
            message: "project has no agent assignment".to_string(),
            resources: Vec::new(),
        });
    }

    let candidates: Vec<Candidate> = snapshot
        .entries
        .iter()
        .map(|e| Candidate::from(&e.assignment))
        .collect();
    let report = ConflictDetector::new(&snapshot.edges, overrides).detect(&candidates);
    for finding in report.blocking() {
        items.push(ValidationItem {
            code: finding.rule.as_str().to_string(),
            message: finding.message.clone(),
            resources: finding.resources.clone(),
        });
    }

    if items.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport {
            project_id: snapshot.project.id,
            items,
        })
    }
}

/// Render the full file map for a snapshot. Pure.
pub fn render(snapshot: &ExportSnapshot) -> Result<BTreeMap<String, String>, AssemblyError> {
    let mut files = BTreeMap::new();

    files.insert(MANIFEST_PATH.to_string(), render_manifest(snapshot)?);
    files.insert(
        SETTINGS_PATH.to_string(),
        render_settings(&snapshot.entries)?,
    );

    for entry in entries_of(snapshot, ResourceType::Agent) {
        if let ResourceContent::Agent(agent) = &entry.resource.content {
            files.insert(agent_path(&entry.resource), render_agent(entry, agent)?);
        }
    }

    let rules = render_rules(snapshot);
    if let Some(rules) = rules {
        files.insert(RULES_PATH.to_string(), rules);
    }

    if let Some(hooks) = render_hooks(snapshot)? {
        files.insert(HOOKS_PATH.to_string(), hooks);
    }

    Ok(files)
}

fn entries_of(snapshot: &ExportSnapshot, kind: ResourceType) -> impl Iterator<Item = &ResolvedEntry> {
    snapshot
        .entries
        .iter()
        .filter(move |e| e.assignment.resource_type() == kind)
}

/// Stable bundle path for an agent: slug of its name, suffixed with its id.
pub fn agent_path(resource: &Resource) -> String {
    let slug = slugify(&resource.name);
    if slug.is_empty() {
        format!("agents/agent-{}.md", resource.id)
    } else {
        format!("agents/{}-{}.md", slug, resource.id)
    }
}

/// Timestamp of the newest persisted input, so re-exports stay identical.
fn generated_at(snapshot: &ExportSnapshot) -> DateTime<Utc> {
    snapshot
        .entries
        .iter()
        .map(|e| e.resource.updated_at.max(e.assignment.updated_at))
        .fold(snapshot.project.updated_at, |a, b| a.max(b))
}

#[derive(Serialize)]
struct ManifestDoc<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_agent: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_agent_file: Option<String>,
    tags: &'a [String],
    generated_at: String,
    slug: &'a str,
    template_version: u32,
}

/// The primary agent, or the first agent by order when none is flagged.
fn lead_agent(snapshot: &ExportSnapshot) -> Option<&ResolvedEntry> {
    entries_of(snapshot, ResourceType::Agent)
        .min_by_key(|e| (!e.assignment.is_primary, e.assignment.order, e.resource.id))
}

fn render_manifest(snapshot: &ExportSnapshot) -> Result<String, AssemblyError> {
    let primary = lead_agent(snapshot);
    let doc = ManifestDoc {
        name: &snapshot.project.name,
        description: snapshot.project.description.as_deref(),
        primary_agent: primary.map(|e| e.resource.name.as_str()),
        primary_agent_file: primary.map(|e| agent_path(&e.resource)),
        tags: &snapshot.project.tags,
        generated_at: generated_at(snapshot).to_rfc3339_opts(SecondsFormat::Secs, true),
        slug: &snapshot.project.slug,
        template_version: TEMPLATE_VERSION,
    };
    toml::to_string(&doc).map_err(|e| AssemblyError::Validation(format!("manifest: {}", e)))
}

/// Merge every assignment's overrides, last writer by ascending order wins.
pub fn merge_config_overrides(entries: &[ResolvedEntry]) -> ConfigOverrides {
    let mut ordered: Vec<&ResolvedEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| (e.assignment.order, e.assignment.resource));

    let mut merged = ConfigOverrides::new();
    for entry in ordered {
        for (key, value) in &entry.assignment.config_overrides {
            if let Some(previous) = merged.insert(key.clone(), value.clone()) {
                if previous != *value {
                    tracing::debug!(
                        "Setting '{}' from {} replaces earlier value {}",
                        key,
                        entry.assignment.resource,
                        previous
                    );
                }
            }
        }
    }
    merged
}

fn render_settings(entries: &[ResolvedEntry]) -> Result<String, AssemblyError> {
    let merged = merge_config_overrides(entries);
    let mut out = serde_json::to_string_pretty(&merged)?;
    out.push('\n');
    Ok(out)
}

#[derive(Serialize)]
struct AgentFrontMatter<'a> {
    id: i64,
    name: &'a str,
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    tools: &'a [String],
    primary: bool,
    order: i32,
}

fn render_agent(entry: &ResolvedEntry, agent: &AgentSpec) -> Result<String, AssemblyError> {
    let front_matter = AgentFrontMatter {
        id: entry.resource.id,
        name: &entry.resource.name,
        role: &agent.role,
        style: agent.style.as_deref(),
        model: agent.model.as_deref(),
        tools: &agent.tools,
        primary: entry.assignment.is_primary,
        order: entry.assignment.order,
    };
    let yaml = serde_yaml_bw::to_string(&front_matter)
        .map_err(|e| AssemblyError::Validation(format!("agent front matter: {}", e)))?;

    let mut out = String::from("---\n");
    out.push_str(yaml.strip_prefix("---\n").unwrap_or(&yaml));
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("---\n");

    if let Some(description) = &entry.resource.description {
        out.push('\n');
        out.push_str(description.trim());
        out.push('\n');
    }
    if !agent.instructions.trim().is_empty() {
        out.push('\n');
        out.push_str(agent.instructions.trim());
        out.push('\n');
    }
    Ok(out)
}

fn render_rules(snapshot: &ExportSnapshot) -> Option<String> {
    let mut rules: Vec<(&ResolvedEntry, &RuleSpec)> = entries_of(snapshot, ResourceType::Rule)
        .filter_map(|e| match &e.resource.content {
            ResourceContent::Rule(rule) => Some((e, rule)),
            ResourceContent::Agent(_) | ResourceContent::Hook(_) => None,
        })
        .collect();
    if rules.is_empty() {
        return None;
    }
    rules.sort_by(|(a, ra), (b, rb)| {
        (a.assignment.order, &ra.category, a.resource.id)
            .cmp(&(b.assignment.order, &rb.category, b.resource.id))
    });

    let mut out = format!("# Rules\n\n<!-- template v{} -->\n", TEMPLATE_VERSION);
    for (entry, rule) in rules {
        let source = entry.assignment.resource;
        out.push_str(&format!("\n## {}: {}\n", rule.category, entry.resource.name));
        for edge in snapshot.edges.iter().filter(|e| e.source == source) {
            out.push_str(&edge_annotation(edge));
        }
        out.push('\n');
        out.push_str(rule.text.trim());
        out.push('\n');
    }
    Some(out)
}

fn edge_annotation(edge: &DependencyEdge) -> String {
    let marker = match edge.kind {
        EdgeKind::Requires if edge.critical => " (critical)",
        EdgeKind::Requires | EdgeKind::Enhances | EdgeKind::Conflicts => "",
    };
    format!(
        "<!-- {} {} {}{} -->\n",
        edge.source,
        edge.kind.as_str(),
        edge.target,
        marker
    )
}

#[derive(Serialize)]
struct HookDeclaration<'a> {
    id: i64,
    name: &'a str,
    trigger: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    matcher: Option<&'a str>,
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u32>,
}

#[derive(Serialize)]
struct HooksDoc<'a> {
    template_version: u32,
    hooks: Vec<HookDeclaration<'a>>,
}

fn render_hooks(snapshot: &ExportSnapshot) -> Result<Option<String>, AssemblyError> {
    let hooks: Vec<HookDeclaration> = entries_of(snapshot, ResourceType::Hook)
        .filter_map(|e| match &e.resource.content {
            ResourceContent::Hook(hook) => Some(HookDeclaration {
                id: e.resource.id,
                name: &e.resource.name,
                trigger: hook.trigger.as_str(),
                matcher: hook.matcher.as_deref(),
                action: &hook.action,
                timeout_secs: hook.timeout_secs,
            }),
            ResourceContent::Agent(_) | ResourceContent::Rule(_) => None,
        })
        .collect();
    if hooks.is_empty() {
        return Ok(None);
    }

    let doc = HooksDoc {
        template_version: TEMPLATE_VERSION,
        hooks,
    };
    let mut out = serde_json::to_string_pretty(&doc)?;
    out.push('\n');
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn project() -> Project {
        Project {
            id: 1,
            slug: "demo".to_string(),
            name: "Demo".to_string(),
            description: Some("A demo project".to_string()),
            status: ProjectStatus::Active,
            priority: 0,
            tags: vec!["rust".to_string(), "cli".to_string()],
            ai_context: None,
            created_at: at(0),
            updated_at: at(10),
        }
    }

    fn entry(id: i64, name: &str, content: ResourceContent, primary: bool, order: i32) -> ResolvedEntry {
        let resource = Resource {
            id,
            name: name.to_string(),
            description: None,
            content,
            created_at: at(0),
            updated_at: at(5),
        };
        ResolvedEntry {
            assignment: Assignment {
                project_id: 1,
                resource: resource.reference(),
                is_primary: primary,
                order,
                config_overrides: ConfigOverrides::new(),
                reason: None,
                created_at: at(0),
                updated_at: at(0),
            },
            resource,
        }
    }

    fn agent(id: i64, name: &str, primary: bool, order: i32) -> ResolvedEntry {
        entry(
            id,
            name,
            ResourceContent::Agent(AgentSpec {
                role: "reviewer".to_string(),
                instructions: "Review carefully.".to_string(),
                ..Default::default()
            }),
            primary,
            order,
        )
    }

    fn rule(id: i64, name: &str, category: &str, order: i32) -> ResolvedEntry {
        entry(
            id,
            name,
            ResourceContent::Rule(RuleSpec {
                text: format!("{} text", name),
                category: category.to_string(),
            }),
            false,
            order,
        )
    }

    fn snapshot(entries: Vec<ResolvedEntry>, edges: Vec<DependencyEdge>) -> ExportSnapshot {
        ExportSnapshot {
            project: project(),
            entries,
            edges,
        }
    }

    #[test]
    fn test_later_order_wins_on_key_collision() {
        let mut first = agent(1, "Alpha", true, 0);
        first
            .assignment
            .config_overrides
            .insert("model".to_string(), json!("small"));
        first
            .assignment
            .config_overrides
            .insert("temperature".to_string(), json!(0.2));
        let mut second = rule(2, "Style", "style", 1);
        second
            .assignment
            .config_overrides
            .insert("model".to_string(), json!("large"));

        // Input order must not matter, only assignment order.
        let merged = merge_config_overrides(&[second, first]);

        assert_eq!(merged["model"], json!("large"));
        assert_eq!(merged["temperature"], json!(0.2));
    }

    #[test]
    fn test_order_tie_breaks_by_resource_id() {
        let mut low = rule(3, "Low", "a", 0);
        low.assignment
            .config_overrides
            .insert("k".to_string(), json!("from-3"));
        let mut high = rule(8, "High", "a", 0);
        high.assignment
            .config_overrides
            .insert("k".to_string(), json!("from-8"));

        let merged = merge_config_overrides(&[high, low]);

        assert_eq!(merged["k"], json!("from-8"));
    }

    #[test]
    fn test_settings_keys_are_sorted() {
        let mut a = agent(1, "Alpha", true, 0);
        a.assignment
            .config_overrides
            .insert("zeta".to_string(), json!(1));
        a.assignment
            .config_overrides
            .insert("alpha".to_string(), json!(2));

        let settings = render_settings(&[a]).unwrap();

        assert!(settings.find("alpha").unwrap() < settings.find("zeta").unwrap());
        assert!(settings.ends_with("}\n"));
    }

    #[test]
    fn test_manifest_section_order() {
        let snap = snapshot(vec![agent(4, "Lead Reviewer", true, 0)], vec![]);

        let manifest = render_manifest(&snap).unwrap();

        let positions: Vec<usize> = ["name =", "description =", "primary_agent =", "tags =", "generated_at ="]
            .iter()
            .map(|key| manifest.find(key).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
        assert!(manifest.contains("primary_agent = \"Lead Reviewer\""));
        assert!(manifest.contains("generated_at = \"2023-11-14T22:13:30Z\""));
    }

    #[test]
    fn test_agent_files_are_named_from_slug_and_id() {
        let snap = snapshot(vec![agent(4, "Lead Reviewer", true, 0), agent(9, "???", false, 1)], vec![]);

        let files = render(&snap).unwrap();

        assert!(files.contains_key("agents/lead-reviewer-4.md"));
        assert!(files.contains_key("agents/agent-9.md"));
        assert!(files["agents/lead-reviewer-4.md"].contains("primary: true"));
    }

    #[test]
    fn test_manifest_falls_back_to_the_lowest_ordered_agent() {
        let snap = snapshot(
            vec![agent(3, "Late", false, 5), agent(8, "Early", false, 1)],
            vec![],
        );

        let manifest = render_manifest(&snap).unwrap();

        assert!(manifest.contains("primary_agent = \"Early\""));
        assert!(manifest.contains("primary_agent_file = \"agents/early-8.md\""));
    }

    #[test]
    fn test_agent_front_matter_parses_as_yaml() {
        #[derive(Deserialize)]
        struct FrontMatter {
            id: i64,
            name: String,
            role: String,
            tools: Vec<String>,
            primary: bool,
            order: i32,
        }

        let tricky = entry(
            6,
            "Reviewer: strict #1",
            ResourceContent::Agent(AgentSpec {
                role: "- lint".to_string(),
                tools: vec!["grep: fast".to_string(), "edit".to_string()],
                instructions: "Check everything.".to_string(),
                ..Default::default()
            }),
            true,
            2,
        );
        let agent = match &tricky.resource.content {
            ResourceContent::Agent(agent) => agent.clone(),
            ResourceContent::Rule(_) | ResourceContent::Hook(_) => unreachable!(),
        };

        let text = render_agent(&tricky, &agent).unwrap();

        let body = text.strip_prefix("---\n").unwrap();
        let end = body.find("\n---\n").unwrap();
        let parsed: FrontMatter = serde_yaml_bw::from_str(&body[..end]).unwrap();
        assert_eq!(parsed.id, 6);
        assert_eq!(parsed.name, "Reviewer: strict #1");
        assert_eq!(parsed.role, "- lint");
        assert_eq!(parsed.tools, vec!["grep: fast".to_string(), "edit".to_string()]);
        assert!(parsed.primary);
        assert_eq!(parsed.order, 2);
        assert!(body[end..].contains("Check everything."));
    }

    #[test]
    fn test_rules_ordered_by_order_then_category_with_annotations() {
        let edges = vec![DependencyEdge {
            id: 1,
            source: ResourceRef::rule(2),
            target: ResourceRef::rule(3),
            kind: EdgeKind::Requires,
            critical: true,
            created_at: at(0),
        }];
        let snap = snapshot(
            vec![
                agent(1, "Alpha", true, 0),
                rule(2, "Zed", "testing", 0),
                rule(3, "Amp", "style", 1),
                rule(5, "Bee", "docs", 0),
            ],
            edges,
        );

        let rules = render(&snap).unwrap().remove(RULES_PATH).unwrap();

        let bee = rules.find("## docs: Bee").unwrap();
        let zed = rules.find("## testing: Zed").unwrap();
        let amp = rules.find("## style: Amp").unwrap();
        assert!(bee < zed && zed < amp);
        assert!(rules.contains("<!-- rule:2 requires rule:3 (critical) -->"));
    }

    #[test]
    fn test_hooks_rendered_only_when_assigned() {
        let without = render(&snapshot(vec![agent(1, "Alpha", true, 0)], vec![])).unwrap();
        assert!(!without.contains_key(HOOKS_PATH));
        assert!(!without.contains_key(RULES_PATH));

        let hook = entry(
            7,
            "Format on save",
            ResourceContent::Hook(HookSpec {
                trigger: HookTrigger::PostToolUse,
                matcher: Some("Edit".to_string()),
                action: "cargo fmt".to_string(),
                timeout_secs: None,
            }),
            false,
            0,
        );
        let with = render(&snapshot(vec![agent(1, "Alpha", true, 0), hook], vec![])).unwrap();
        let hooks: serde_json::Value = serde_json::from_str(&with[HOOKS_PATH]).unwrap();
        assert_eq!(hooks["hooks"][0]["trigger"], "post_tool_use");
        assert_eq!(hooks["hooks"][0]["action"], "cargo fmt");
        assert!(hooks["hooks"][0].get("timeout_secs").is_none());
    }

    #[test]
    fn test_render_is_pure() {
        let snap = snapshot(
            vec![agent(1, "Alpha", true, 0), rule(2, "Zed", "testing", 0)],
            vec![],
        );
        assert_eq!(render(&snap).unwrap(), render(&snap).unwrap());
    }
}
