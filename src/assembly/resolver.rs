//! Dependency expansion over the resource graph.
//!
//! Starting from a seed set, critical `requires` edges are followed to a
//! fixed point. `enhances` and optional `requires` edges only produce
//! suggestions unless the caller opts in, and `conflicts` edges are passed
//! through untouched for the conflict detector. Output is ordered by
//! resource id so the same seeds and corpus always give the same plan.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::{DependencyEdge, EdgeKind, ResourceRef};

/// How an edge participates in resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeClass {
    /// Forces its target into the working set.
    Critical,
    /// Recorded as a suggestion only.
    Optional,
    /// Never resolved here; validated by the conflict detector.
    Exclusion,
}

pub fn classify(edge: &DependencyEdge) -> EdgeClass {
    match edge.kind {
        EdgeKind::Requires if edge.critical => EdgeClass::Critical,
        EdgeKind::Requires | EdgeKind::Enhances => EdgeClass::Optional,
        EdgeKind::Conflicts => EdgeClass::Exclusion,
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Follow `enhances` edges as if they were critical requirements.
    #[serde(default)]
    pub include_enhancements: bool,
}

/// A resource pulled in by an edge rather than named in the seed set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyAddition {
    pub resource: ResourceRef,
    pub required_by: ResourceRef,
    pub via: EdgeKind,
}

/// An optional edge whose target was not brought in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct EdgeSuggestion {
    pub source: ResourceRef,
    pub target: ResourceRef,
    pub kind: EdgeKind,
}

/// A critical requirement whose target does not exist in the arena.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnresolvedDependency {
    pub dependent: ResourceRef,
    pub required: ResourceRef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpansionPlan {
    /// Seeds plus everything added by dependency, ascending by id.
    pub resolved: Vec<ResourceRef>,
    pub added_by_dependency: Vec<DependencyAddition>,
    pub suggestions: Vec<EdgeSuggestion>,
    /// Each cycle starts at its smallest member. Cycles never abort resolution.
    pub cycles: Vec<Vec<ResourceRef>>,
    pub unresolved_critical: Vec<UnresolvedDependency>,
    /// `conflicts` edges leaving resolved resources.
    pub conflict_edges: Vec<DependencyEdge>,
}

pub struct DependencyGraphResolver {
    outgoing: BTreeMap<ResourceRef, Vec<DependencyEdge>>,
}

impl DependencyGraphResolver {
    pub fn new(edges: impl IntoIterator<Item = DependencyEdge>) -> Self {
        let mut outgoing: BTreeMap<ResourceRef, Vec<DependencyEdge>> = BTreeMap::new();
        for edge in edges {
            outgoing.entry(edge.source).or_default().push(edge);
        }
        for edges in outgoing.values_mut() {
            edges.sort_by(|a, b| (a.target, a.kind, a.id).cmp(&(b.target, b.kind, b.id)));
            edges.dedup_by_key(|e| e.id);
        }
        Self { outgoing }
    }

    /// Expand `seeds` to a dependency-closed set.
    ///
    /// `exists` reports whether a referenced resource is present in the
    /// arena. Targets that do not exist are reported as unresolved instead of
    /// being added.
    pub fn resolve(
        &self,
        seeds: &[ResourceRef],
        options: ResolveOptions,
        exists: impl Fn(&ResourceRef) -> bool,
    ) -> ExpansionPlan {
        let mut working: BTreeSet<ResourceRef> = seeds.iter().copied().collect();
        let mut pending = working.clone();
        let mut additions: BTreeMap<ResourceRef, DependencyAddition> = BTreeMap::new();
        let mut suggestions = BTreeSet::new();
        let mut unresolved = BTreeSet::new();
        let mut conflict_edges = Vec::new();

        while let Some(node) = pending.pop_first() {
            for edge in self.edges_from(node) {
                let forced = match classify(edge) {
                    EdgeClass::Critical => true,
                    EdgeClass::Optional => {
                        edge.kind == EdgeKind::Enhances && options.include_enhancements
                    }
                    EdgeClass::Exclusion => {
                        conflict_edges.push(edge.clone());
                        continue;
                    }
                };

                if !forced {
                    if !exists(&edge.target) {
                        continue;
                    }
                    suggestions.insert(EdgeSuggestion {
                        source: edge.source,
                        target: edge.target,
                        kind: edge.kind,
                    });
                    continue;
                }

                if !exists(&edge.target) {
                    if edge.critical {
                        unresolved.insert(UnresolvedDependency {
                            dependent: edge.source,
                            required: edge.target,
                        });
                    }
                    continue;
                }

                if working.insert(edge.target) {
                    pending.insert(edge.target);
                    additions.insert(
                        edge.target,
                        DependencyAddition {
                            resource: edge.target,
                            required_by: edge.source,
                            via: edge.kind,
                        },
                    );
                }
            }
        }

        suggestions.retain(|s: &EdgeSuggestion| !working.contains(&s.target));
        conflict_edges.sort_by_key(|e| e.id);

        let cycles = self.find_cycles(&working);
        if !cycles.is_empty() {
            tracing::warn!("Dependency cycles detected: {:?}", cycles);
        }

        ExpansionPlan {
            resolved: working.into_iter().collect(),
            added_by_dependency: additions.into_values().collect(),
            suggestions: suggestions.into_iter().collect(),
            cycles,
            unresolved_critical: unresolved.into_iter().collect(),
            conflict_edges,
        }
    }

    fn edges_from(&self, node: ResourceRef) -> &[DependencyEdge] {
        self.outgoing.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Colouring DFS over `requires`/`enhances` edges inside `nodes`.
    fn find_cycles(&self, nodes: &BTreeSet<ResourceRef>) -> Vec<Vec<ResourceRef>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        fn visit(
            resolver: &DependencyGraphResolver,
            node: ResourceRef,
            nodes: &BTreeSet<ResourceRef>,
            colors: &mut BTreeMap<ResourceRef, Color>,
            path: &mut Vec<ResourceRef>,
            found: &mut BTreeSet<Vec<ResourceRef>>,
        ) {
            colors.insert(node, Color::Gray);
            path.push(node);

            for edge in resolver.edges_from(node) {
                if classify(edge) == EdgeClass::Exclusion || !nodes.contains(&edge.target) {
                    continue;
                }
                match colors.get(&edge.target).copied().unwrap_or(Color::White) {
                    Color::White => visit(resolver, edge.target, nodes, colors, path, found),
                    Color::Gray => {
                        if let Some(start) = path.iter().position(|n| *n == edge.target) {
                            found.insert(canonical_cycle(&path[start..]));
                        }
                    }
                    Color::Black => {}
                }
            }

            path.pop();
            colors.insert(node, Color::Black);
        }

        let mut colors = BTreeMap::new();
        let mut found = BTreeSet::new();
        let mut path = Vec::new();
        for node in nodes {
            if !colors.contains_key(node) {
                visit(self, *node, nodes, &mut colors, &mut path, &mut found);
            }
        }
        found.into_iter().collect()
    }
}

/// Rotate a cycle so it starts at its smallest member.
fn canonical_cycle(members: &[ResourceRef]) -> Vec<ResourceRef> {
    let start = members
        .iter()
        .enumerate()
        .min_by_key(|(_, r)| **r)
        .map(|(i, _)| i)
        .unwrap_or(0);
    members[start..]
        .iter()
        .chain(&members[..start])
        .copied()
        .collect()
}
