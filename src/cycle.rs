//! Ancestor-path tracking for cyclic recipe graphs

/// The chain of item ids being expanded on the path from the root to the
/// current node.
///
/// Each branch owns its own guard, so sibling subtrees never observe each
/// other's path. An item may appear any number of times in different branches;
/// it is only rejected when it is already an ancestor of itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleGuard {
    path: Vec<String>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if expanding `item_id` here would re-enter an item already on the path.
    pub fn would_cycle(&self, item_id: &str) -> bool {
        self.path.iter().any(|p| p == item_id)
    }

    /// Guard for the children of `item_id`.
    pub fn descend(&self, item_id: &str) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(item_id.to_string());
        Self { path }
    }

    /// Number of ancestors, which is also the depth of the node being expanded.
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}
