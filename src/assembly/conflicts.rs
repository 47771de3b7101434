//! Semantic validation of a candidate assignment set.
//!
//! Rules run in a fixed order and findings are emitted in rule order, then
//! by resource, so two runs over the same input produce the same report.
//! Any blocking finding rejects the whole operation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{AssemblyError, Invariant};
use crate::models::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Blocking,
    Advisory,
}

/// The rule that produced a finding, in evaluation order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ConflictRule {
    DuplicatePrimary,
    DuplicateIdentity,
    DeclaredConflict,
    MissingRequirement,
    MissingEnhancement,
}

impl ConflictRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictRule::DuplicatePrimary => "duplicate_primary",
            ConflictRule::DuplicateIdentity => "duplicate_identity",
            ConflictRule::DeclaredConflict => "declared_conflict",
            ConflictRule::MissingRequirement => "missing_requirement",
            ConflictRule::MissingEnhancement => "missing_enhancement",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictFinding {
    pub rule: ConflictRule,
    pub severity: Severity,
    pub resources: Vec<ResourceRef>,
    pub edge_kind: Option<EdgeKind>,
    pub message: String,
}

impl ConflictFinding {
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }
}

/// The part of an assignment the detector looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub resource: ResourceRef,
    pub is_primary: bool,
}

impl Candidate {
    pub fn new(resource: ResourceRef, is_primary: bool) -> Self {
        Self {
            resource,
            is_primary,
        }
    }
}

impl From<&Assignment> for Candidate {
    fn from(assignment: &Assignment) -> Self {
        Self::new(assignment.resource, assignment.is_primary)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConflictReport {
    pub findings: Vec<ConflictFinding>,
}

impl ConflictReport {
    /// True when nothing blocks; advisory findings never do.
    pub fn is_applicable(&self) -> bool {
        !self.findings.iter().any(ConflictFinding::is_blocking)
    }

    pub fn blocking(&self) -> impl Iterator<Item = &ConflictFinding> {
        self.findings.iter().filter(|f| f.is_blocking())
    }

    /// Turn the first blocking finding into the matching error, carrying the full report.
    pub fn into_result(self) -> Result<Vec<ConflictFinding>, AssemblyError> {
        let Some(first) = self.findings.iter().find(|f| f.is_blocking()).cloned() else {
            return Ok(self.findings);
        };
        let findings = self.findings;

        Err(match first.rule {
            ConflictRule::DuplicatePrimary => AssemblyError::InvariantViolation {
                invariant: Invariant::DuplicatePrimary,
                resources: first.resources,
                findings,
            },
            ConflictRule::DuplicateIdentity => AssemblyError::InvariantViolation {
                invariant: Invariant::DuplicateIdentity,
                resources: first.resources,
                findings,
            },
            ConflictRule::DeclaredConflict => AssemblyError::ConflictDetected {
                first: first.resources[0],
                second: first.resources[1],
                findings,
            },
            ConflictRule::MissingRequirement => AssemblyError::UnresolvedCriticalDependency {
                dependent: first.resources[0],
                required: first.resources[1],
                findings,
            },
            // Advisory-only rule; never reaches here as blocking.
            ConflictRule::MissingEnhancement => AssemblyError::Validation(first.message),
        })
    }
}

/// Evaluates candidate sets against the edge corpus and confirmed overrides.
pub struct ConflictDetector<'a> {
    edges: &'a [DependencyEdge],
    overrides: &'a Overrides,
}

impl<'a> ConflictDetector<'a> {
    /// `edges` must contain every edge whose source is in the candidate set.
    pub fn new(edges: &'a [DependencyEdge], overrides: &'a Overrides) -> Self {
        Self { edges, overrides }
    }

    pub fn detect(&self, candidates: &[Candidate]) -> ConflictReport {
        let mut findings = Vec::new();
        let present: BTreeSet<ResourceRef> = candidates.iter().map(|c| c.resource).collect();

        self.check_primaries(candidates, &mut findings);
        self.check_identities(candidates, &mut findings);
        self.check_declared_conflicts(&present, &mut findings);
        self.check_requirements(&present, &mut findings);
        self.check_enhancements(&present, &mut findings);

        ConflictReport { findings }
    }

    fn check_primaries(&self, candidates: &[Candidate], findings: &mut Vec<ConflictFinding>) {
        for resource_type in ResourceType::ALL {
            let mut primaries: Vec<ResourceRef> = candidates
                .iter()
                .filter(|c| c.is_primary && c.resource.resource_type == resource_type)
                .map(|c| c.resource)
                .collect();
            if primaries.len() > 1 {
                primaries.sort();
                findings.push(ConflictFinding {
                    rule: ConflictRule::DuplicatePrimary,
                    severity: Severity::Blocking,
                    message: format!(
                        "{} {} resources are marked primary",
                        primaries.len(),
                        resource_type.as_str()
                    ),
                    resources: primaries,
                    edge_kind: None,
                });
            }
        }
    }

    fn check_identities(&self, candidates: &[Candidate], findings: &mut Vec<ConflictFinding>) {
        let mut counts: BTreeMap<ResourceRef, usize> = BTreeMap::new();
        for candidate in candidates {
            *counts.entry(candidate.resource).or_default() += 1;
        }
        for (resource, count) in counts {
            if count > 1 {
                findings.push(ConflictFinding {
                    rule: ConflictRule::DuplicateIdentity,
                    severity: Severity::Blocking,
                    resources: vec![resource],
                    edge_kind: None,
                    message: format!("{} is assigned {} times", resource, count),
                });
            }
        }
    }

    fn check_declared_conflicts(
        &self,
        present: &BTreeSet<ResourceRef>,
        findings: &mut Vec<ConflictFinding>,
    ) {
        let pairs: BTreeSet<ResourcePair> = self
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Conflicts && e.source != e.target)
            .filter(|e| present.contains(&e.source) && present.contains(&e.target))
            .map(|e| ResourcePair::new(e.source, e.target))
            .collect();

        for pair in pairs {
            let overridden = self.overrides.allows_conflict(pair.first, pair.second);
            findings.push(ConflictFinding {
                rule: ConflictRule::DeclaredConflict,
                severity: if overridden {
                    Severity::Advisory
                } else {
                    Severity::Blocking
                },
                resources: vec![pair.first, pair.second],
                edge_kind: Some(EdgeKind::Conflicts),
                message: if overridden {
                    format!("{} conflicts with {} (overridden)", pair.first, pair.second)
                } else {
                    format!("{} conflicts with {}", pair.first, pair.second)
                },
            });
        }
    }

    fn check_requirements(
        &self,
        present: &BTreeSet<ResourceRef>,
        findings: &mut Vec<ConflictFinding>,
    ) {
        let missing: BTreeSet<(ResourceRef, ResourceRef, bool)> = self
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Requires)
            .filter(|e| present.contains(&e.source) && !present.contains(&e.target))
            .map(|e| (e.source, e.target, e.critical))
            .collect();

        for (source, target, critical) in missing {
            let waived = critical && self.overrides.allows_missing(source, target);
            let severity = if critical && !waived {
                Severity::Blocking
            } else {
                Severity::Advisory
            };
            let message = match (critical, waived) {
                (true, false) => format!("{} critically requires {}", source, target),
                (true, true) => format!("{} critically requires {} (waived)", source, target),
                (false, _) => format!("{} optionally requires {}", source, target),
            };
            findings.push(ConflictFinding {
                rule: ConflictRule::MissingRequirement,
                severity,
                resources: vec![source, target],
                edge_kind: Some(EdgeKind::Requires),
                message,
            });
        }
    }

    fn check_enhancements(
        &self,
        present: &BTreeSet<ResourceRef>,
        findings: &mut Vec<ConflictFinding>,
    ) {
        let missing: BTreeSet<(ResourceRef, ResourceRef)> = self
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Enhances)
            .filter(|e| present.contains(&e.source) && !present.contains(&e.target))
            .map(|e| (e.source, e.target))
            .collect();

        for (source, target) in missing {
            findings.push(ConflictFinding {
                rule: ConflictRule::MissingEnhancement,
                severity: Severity::Advisory,
                resources: vec![source, target],
                edge_kind: Some(EdgeKind::Enhances),
                message: format!("{} would be enhanced by {}", source, target),
            });
        }
    }
}
