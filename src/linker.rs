//! Decoding tree membership from node identities

use std::sync::LazyLock;

use regex::Regex;

use crate::identity::TreeId;

static ROOT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<tree>[^:/]+):(?P<item>[^/]+)$").expect("valid regex"));

static TREE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<tree>[^:/]+):[^/]").expect("valid regex"));

/// Tree a node belongs to, as embedded in its unique id.
pub fn extract_tree_id(unique_id: &str) -> Option<TreeId> {
    let caps = TREE_PREFIX_RE.captures(unique_id)?;
    TreeId::new(&caps["tree"]).ok()
}

/// True if the id names the root node of a tree.
pub fn is_root_id(unique_id: &str) -> bool {
    ROOT_ID_RE.is_match(unique_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{child_id, root_id};

    #[test]
    fn extracts_tree_from_any_depth() {
        let tree = TreeId::new("base").unwrap();
        let root = root_id(&tree, "circuit");
        let deep = child_id(&child_id(&root, "copper-cable", 1), "copper-plate", 0);

        assert_eq!(extract_tree_id(&root), Some(tree.clone()));
        assert_eq!(extract_tree_id(&deep), Some(tree));
    }

    #[test]
    fn rejects_foreign_strings() {
        assert_eq!(extract_tree_id(""), None);
        assert_eq!(extract_tree_id("no-separator"), None);
        assert_eq!(extract_tree_id(":item"), None);
        assert_eq!(extract_tree_id("tree:"), None);
    }

    #[test]
    fn root_detection() {
        let tree = TreeId::new("base").unwrap();
        let root = root_id(&tree, "circuit");
        assert!(is_root_id(&root));
        assert!(!is_root_id(&child_id(&root, "x", 0)));
    }
}
