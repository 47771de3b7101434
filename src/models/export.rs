use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ResourceRef;

/// An append-only record of one export attempt.
///
/// Records are written for failed attempts too, so the history answers
/// "what was exported, and when did it fail?" for a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportRecord {
    pub id: Uuid,
    pub project_id: i64,
    /// The resolved resources the bundle was built from.
    pub resources: Vec<ResourceRef>,
    pub files: Vec<ExportedFile>,
    pub total_bytes: u64,
    pub status: ExportStatus,
    /// Validation report or storage error for failed attempts.
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Succeeded,
    Failed,
}

impl ExportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One generated file: its bundle-relative path and size in bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: String,
    pub bytes: u64,
}
