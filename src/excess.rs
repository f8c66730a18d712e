//! User-declared excess production, keyed by node identity

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Quantities of an item already available from elsewhere, per node.
///
/// Keys are node unique ids, so entries follow a node across recomputation for
/// as long as the tree shape above it is unchanged. Entries for nodes that no
/// longer exist are kept but never looked up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExcessLedger {
    entries: BTreeMap<String, f64>,
}

impl ExcessLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded excess for a node, 0 if none.
    pub fn lookup(&self, unique_id: &str) -> f64 {
        self.entries.get(unique_id).copied().unwrap_or(0.0)
    }

    /// Record excess for a node. Values are stored as entered; recording zero
    /// removes the entry.
    pub fn record(&mut self, unique_id: impl Into<String>, quantity: f64) {
        let unique_id = unique_id.into();
        if quantity == 0.0 {
            self.entries.remove(&unique_id);
        } else {
            self.entries.insert(unique_id, quantity);
        }
    }

    pub fn remove(&mut self, unique_id: &str) -> Option<f64> {
        self.entries.remove(unique_id)
    }

    /// Excess usable against a demand of `amount`, clamped into `[0, amount]`.
    /// Non-finite entries count as zero.
    pub fn credit(&self, unique_id: &str, amount: f64) -> f64 {
        let recorded = self.lookup(unique_id);
        if !recorded.is_finite() {
            return 0.0;
        }
        recorded.clamp(0.0, amount.max(0.0))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ExcessLedger {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        let mut ledger = Self::new();
        for (k, v) in iter {
            ledger.record(k, v);
        }
        ledger
    }
}
