//! Seam for an external resource suggestion service.
//!
//! Providers are untrusted: whatever they return goes through the same
//! validation as a manually created resource, and a failing provider only
//! ever yields an empty list.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CreateResourceInput, Project, ResourceContent, ResourceType};

/// A candidate resource proposed for a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content: ResourceContent,
    /// Free-form explanation from the provider.
    #[serde(default)]
    pub rationale: Option<String>,
}

impl Suggestion {
    pub fn resource_type(&self) -> ResourceType {
        self.content.resource_type()
    }

    /// Turn the suggestion into a creation request for the resource store.
    pub fn into_input(self) -> CreateResourceInput {
        CreateResourceInput {
            name: self.name,
            description: self.description,
            content: self.content,
        }
    }

    fn validate(&self) -> Result<(), String> {
        CreateResourceInput {
            name: self.name.clone(),
            description: self.description.clone(),
            content: self.content.clone(),
        }
        .validate()
    }
}

pub trait SuggestionProvider: Send + Sync {
    fn name(&self) -> &str;

    fn suggest(&self, project: &Project) -> anyhow::Result<Vec<Suggestion>>;
}

/// Provider used when no suggestion service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSuggestions;

impl SuggestionProvider for NoopSuggestions {
    fn name(&self) -> &str {
        "noop"
    }

    fn suggest(&self, _project: &Project) -> anyhow::Result<Vec<Suggestion>> {
        Ok(Vec::new())
    }
}

/// Per-request memo of provider results, keyed by project and its last update.
///
/// Created by the caller and dropped with the request; nothing is shared
/// between requests.
#[derive(Debug, Default)]
pub struct SuggestionCache {
    entries: HashMap<(i64, DateTime<Utc>), Vec<Suggestion>>,
}

impl SuggestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ask `provider` for suggestions, keeping only the valid ones. Never fails.
pub fn collect_suggestions(
    provider: &dyn SuggestionProvider,
    cache: &mut SuggestionCache,
    project: &Project,
) -> Vec<Suggestion> {
    let key = (project.id, project.updated_at);
    if let Some(cached) = cache.entries.get(&key) {
        return cached.clone();
    }

    let suggestions = match provider.suggest(project) {
        Ok(raw) => raw
            .into_iter()
            .filter(|s| match s.validate() {
                Ok(()) => true,
                Err(reason) => {
                    tracing::warn!(
                        provider = provider.name(),
                        project_id = project.id,
                        "Dropping invalid suggestion '{}': {}",
                        s.name,
                        reason
                    );
                    false
                }
            })
            .collect(),
        Err(e) => {
            tracing::warn!(
                provider = provider.name(),
                project_id = project.id,
                "Suggestion provider failed: {:#}",
                e
            );
            Vec::new()
        }
    };

    tracing::debug!(
        provider = provider.name(),
        project_id = project.id,
        count = suggestions.len(),
        "Collected suggestions"
    );
    cache.entries.insert(key, suggestions.clone());
    suggestions
}
