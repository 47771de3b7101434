use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ResourcePair, ResourceRef, ResourceType};

/// Project-scoped configuration values, keyed by setting name.
pub type ConfigOverrides = BTreeMap<String, serde_json::Value>;

/// The link between one project and one shared resource.
///
/// At most one assignment per `(project, resource type)` is primary, and a
/// resource appears at most once per project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub project_id: i64,
    pub resource: ResourceRef,
    pub is_primary: bool,
    /// Rendering position within the resource type.
    pub order: i32,
    #[serde(default)]
    pub config_overrides: ConfigOverrides,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn resource_type(&self) -> ResourceType {
        self.resource.resource_type
    }
}

/// Options for assigning a resource to a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignOptions {
    /// Demotes the current primary of the same type.
    #[serde(default)]
    pub is_primary: bool,
    /// Appended after existing assignments of the same type when omitted.
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub config_overrides: ConfigOverrides,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub overrides: Overrides,
}

/// Input for editing project-local configuration of an assignment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAssignmentInput {
    pub config_overrides: Option<ConfigOverrides>,
    pub reason: Option<String>,
}

/// Caller-confirmed exceptions to the conflict-free and dependency-complete
/// invariants. Once accepted by an operation they are persisted per project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Overrides {
    /// Pairs allowed to be co-assigned despite a `conflicts` edge.
    #[serde(default)]
    pub conflicts: Vec<ResourcePair>,
    /// Critical dependencies allowed to stay unmet, one direction each.
    #[serde(default)]
    pub dependencies: Vec<DependencyWaiver>,
}

/// Permission for `source` to be assigned without its critical `target`.
///
/// Unlike a conflict override this is directional: waiving `a -> b` says
/// nothing about an edge `b -> a`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DependencyWaiver {
    pub source: ResourceRef,
    pub target: ResourceRef,
}

impl DependencyWaiver {
    pub fn new(source: ResourceRef, target: ResourceRef) -> Self {
        Self { source, target }
    }
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty() && self.dependencies.is_empty()
    }

    pub fn allows_conflict(&self, a: ResourceRef, b: ResourceRef) -> bool {
        let wanted = ResourcePair::new(a, b);
        self.conflicts
            .iter()
            .any(|p| ResourcePair::new(p.first, p.second) == wanted)
    }

    pub fn allows_missing(&self, source: ResourceRef, target: ResourceRef) -> bool {
        self.dependencies
            .iter()
            .any(|w| w.source == source && w.target == target)
    }

    /// Union of both override sets, deduplicated. Conflict pairs are
    /// canonicalised, waivers keep their direction.
    pub fn merged(&self, other: &Overrides) -> Overrides {
        let mut conflicts: Vec<ResourcePair> = self
            .conflicts
            .iter()
            .chain(&other.conflicts)
            .map(|p| ResourcePair::new(p.first, p.second))
            .collect();
        conflicts.sort();
        conflicts.dedup();

        let mut dependencies: Vec<DependencyWaiver> = self
            .dependencies
            .iter()
            .chain(&other.dependencies)
            .copied()
            .collect();
        dependencies.sort();
        dependencies.dedup();

        Overrides {
            conflicts,
            dependencies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_waiver_is_directional() {
        let a = ResourceRef::rule(1);
        let b = ResourceRef::rule(2);
        let overrides = Overrides {
            conflicts: vec![],
            dependencies: vec![DependencyWaiver::new(a, b)],
        };

        assert!(overrides.allows_missing(a, b));
        assert!(!overrides.allows_missing(b, a));
    }

    #[test]
    fn test_conflict_override_is_unordered() {
        let a = ResourceRef::rule(1);
        let b = ResourceRef::agent(2);
        let overrides = Overrides {
            conflicts: vec![ResourcePair::new(b, a)],
            dependencies: vec![],
        };

        assert!(overrides.allows_conflict(a, b));
        assert!(overrides.allows_conflict(b, a));
    }

    #[test]
    fn test_merge_keeps_both_waiver_directions() {
        let a = ResourceRef::rule(1);
        let b = ResourceRef::rule(2);
        let left = Overrides {
            conflicts: vec![],
            dependencies: vec![DependencyWaiver::new(b, a), DependencyWaiver::new(a, b)],
        };
        let right = Overrides {
            conflicts: vec![],
            dependencies: vec![DependencyWaiver::new(a, b)],
        };

        let merged = left.merged(&right);

        assert_eq!(
            merged.dependencies,
            vec![DependencyWaiver::new(a, b), DependencyWaiver::new(b, a)]
        );
    }
}
