use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ResourceRef;

/// How one resource relates to another.
///
/// Every consumer matches on this exhaustively; there is no "unknown" kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// The source needs the target. Critical edges force the target in.
    Requires,
    /// The target improves the source but is never forced in.
    Enhances,
    /// The two resources must not be assigned together.
    Conflicts,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requires => "requires",
            Self::Enhances => "enhances",
            Self::Conflicts => "conflicts",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "requires" => Some(Self::Requires),
            "enhances" => Some(Self::Enhances),
            "conflicts" => Some(Self::Conflicts),
            _ => None,
        }
    }
}

/// A directed relation between two resources, declared independently of any project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyEdge {
    pub id: i64,
    pub source: ResourceRef,
    pub target: ResourceRef,
    pub kind: EdgeKind,
    pub critical: bool,
    pub created_at: DateTime<Utc>,
}

impl DependencyEdge {
    /// A `requires` edge that must be satisfied for the source to be assignable.
    pub fn is_critical_requirement(&self) -> bool {
        self.kind == EdgeKind::Requires && self.critical
    }
}

/// Input for declaring a dependency edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEdgeInput {
    pub source: ResourceRef,
    pub target: ResourceRef,
    pub kind: EdgeKind,
    #[serde(default)]
    pub critical: bool,
}
