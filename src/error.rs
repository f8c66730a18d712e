//! Error and warning types

use std::path::PathBuf;

/// Failure of a single catalog lookup.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored recipe row could not be turned back into a recipe.
    #[error("corrupt recipe '{id}': {detail}")]
    Corrupt { id: String, detail: String },
}

/// Invalid top-level request. No tree is produced.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("requested amount {0} must be a finite, non-negative number")]
    InvalidAmount(f64),

    #[error("recipe override '{0}' does not exist")]
    UnknownOverride(String),

    #[error("invalid tree id '{0}'")]
    InvalidTreeId(String),

    #[error("catalog lookup failed for '{item}': {source}")]
    Catalog {
        item: String,
        source: CatalogError,
    },
}

/// Data-quality problems found while resolving. The affected node becomes a
/// leaf and the rest of the tree is still produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveWarning {
    /// The selected recipe has a non-positive output rate for the item.
    NonPositiveOutput {
        unique_id: String,
        recipe_id: String,
        rate: f64,
    },
    /// The root override names a recipe that does not produce the item.
    OverrideMismatch { item: String, recipe_id: String },
    /// A default-recipe preference is missing or does not produce the item.
    StalePreference { item: String, recipe_id: String },
    /// A lookup failed below the root; the subtree degrades to a leaf.
    CatalogUnavailable { unique_id: String, detail: String },
}

impl std::fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveOutput {
                unique_id,
                recipe_id,
                rate,
            } => write!(
                f,
                "recipe '{}' has output rate {} at {}; treated as raw input",
                recipe_id, rate, unique_id
            ),
            Self::OverrideMismatch { item, recipe_id } => {
                write!(f, "recipe '{}' does not produce '{}'", recipe_id, item)
            }
            Self::StalePreference { item, recipe_id } => write!(
                f,
                "default recipe '{}' for '{}' is unusable; falling back",
                recipe_id, item
            ),
            Self::CatalogUnavailable { unique_id, detail } => {
                write!(f, "lookup failed at {}: {}", unique_id, detail)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Errors from editing or persisting a plan book.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("tree '{0}' not found")]
    TreeNotFound(String),

    #[error("tree '{0}' already exists")]
    TreeExists(String),

    #[error("invalid tree id '{0}'")]
    InvalidTreeId(String),

    #[error("'{0}' is not a node of tree '{1}'")]
    ForeignNode(String, String),

    #[error("node '{0}' cannot be imported")]
    NotImportable(String),

    #[error("tree '{0}' is not an imported tree")]
    NotImported(String),

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
