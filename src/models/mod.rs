//! Domain models for StackForge.
//!
//! # Core Concepts
//!
//! ## Shared Entities
//!
//! - [`Resource`]: An agent, rule or hook definition. Resources live in one
//!   arena keyed by id and are shared by every project that assigns them.
//! - [`DependencyEdge`]: A declared `requires`, `enhances` or `conflicts`
//!   relation between two resources, independent of any project.
//!
//! ## Project-Scoped Entities
//!
//! - [`Project`]: Top-level container that resources are assembled into.
//! - [`Assignment`]: The link between a project and a resource, carrying
//!   primary flag, ordering and project-local configuration.
//! - [`Overrides`]: Caller-confirmed exceptions to conflict and dependency checks.
//! - [`ExportRecord`]: Append-only history of export attempts.

mod assignment;
mod dependency;
mod export;
mod project;
mod resource;

pub use assignment::*;
pub use dependency::*;
pub use export::*;
pub use project::*;
pub use resource::*;
