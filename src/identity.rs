//! Stable, path-derived node identities
//!
//! A root is identified as `<tree>:<item>`; a child as `<parent>/<index>.<item>`
//! where `index` is the child's position among its parent's children. The whole
//! path is encoded, so two nodes share an id exactly when they sit at the same
//! position in the same tree. `%` and `/` inside item ids are percent-escaped so
//! an item id can never forge a path separator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

pub const TREE_SEPARATOR: char = ':';
pub const PATH_SEPARATOR: char = '/';

/// Identifier of a top-level tree. Non-empty, without `:` or `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TreeId(String);

impl TreeId {
    pub fn new(id: impl Into<String>) -> Result<Self, ResolveError> {
        let id = id.into();
        if id.is_empty() || id.contains([TREE_SEPARATOR, PATH_SEPARATOR]) {
            return Err(ResolveError::InvalidTreeId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TreeId {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TreeId> for String {
    fn from(id: TreeId) -> Self {
        id.0
    }
}

fn escape_segment(item_id: &str) -> String {
    let mut out = String::with_capacity(item_id.len());
    for c in item_id.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            _ => out.push(c),
        }
    }
    out
}

/// Identity of the root node of `tree` producing `item_id`.
pub fn root_id(tree: &TreeId, item_id: &str) -> String {
    format!("{}{}{}", tree, TREE_SEPARATOR, escape_segment(item_id))
}

/// Identity of the `sibling_index`-th child of `parent_unique_id`.
pub fn child_id(parent_unique_id: &str, item_id: &str, sibling_index: usize) -> String {
    format!(
        "{}{}{}.{}",
        parent_unique_id,
        PATH_SEPARATOR,
        sibling_index,
        escape_segment(item_id)
    )
}

/// True if `unique_id` is `ancestor` itself or lies beneath it.
pub fn is_within(unique_id: &str, ancestor: &str) -> bool {
    match unique_id.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with(PATH_SEPARATOR),
        None => false,
    }
}
