//! The assembly engine: dependency resolution, conflict detection, and the
//! three write paths (direct assignment, import, export) built on them.

mod assigner;
mod conflicts;
mod export;
mod import;
mod resolver;

pub use assigner::ResourceAssigner;
pub use conflicts::{Candidate, ConflictDetector, ConflictFinding, ConflictReport, ConflictRule, Severity};
pub use export::{
    agent_path, merge_config_overrides, render, BundleManifest, ExportAssembler, ExportBundle,
    ExportSnapshot, ResolvedEntry, HOOKS_PATH, MANIFEST_PATH, RULES_PATH, SETTINGS_PATH,
    TEMPLATE_VERSION,
};
pub use import::{
    BaselineEntry, ImportOrchestrator, ImportOutcome, ImportPlan, ImportPolicy, ImportState,
    PlannedAssignment,
};
pub use resolver::{
    classify, DependencyAddition, DependencyGraphResolver, EdgeClass, EdgeSuggestion,
    ExpansionPlan, ResolveOptions, UnresolvedDependency,
};
