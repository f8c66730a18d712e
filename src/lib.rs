//! Production chain dependency-tree resolver
//!
//! Given a recipe catalog, resolves a requested production rate of an item into
//! the full tree of intermediate items and raw resources needed to make it.
//! Nodes carry stable, path-derived identities so that user edits keyed by node
//! (excess, machine counts, imports) survive recomputation.

pub mod catalog;
pub mod config;
pub mod cycle;
pub mod db;
pub mod error;
pub mod excess;
pub mod identity;
pub mod linker;
pub mod loader;
pub mod models;
pub mod plan;
pub mod report;
pub mod resolver;
pub mod selector;

pub use catalog::{MemoryCatalog, RecipeCatalog};
pub use config::Settings;
pub use error::{CatalogError, ConfigError, PlanError, ResolveError, ResolveWarning};
pub use excess::ExcessLedger;
pub use identity::TreeId;
pub use models::{Dataset, DependencyNode, Item, Recipe};
pub use plan::{PlanBook, TreePlan};
pub use resolver::{Resolution, Resolver};
