//! Data models for items, recipes and resolved dependency trees

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A transformation consuming `inputs` and producing `outputs`, both expressed
/// as rates over the same reference window (per minute).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "in", default)]
    pub inputs: IndexMap<String, f64>, // declaration order is significant
    #[serde(rename = "out")]
    pub outputs: IndexMap<String, f64>,
    #[serde(default)]
    pub time: f64, // cycle duration in seconds
}

impl Recipe {
    /// Output rate of `item_id`, if this recipe produces it at all.
    pub fn output_rate(&self, item_id: &str) -> Option<f64> {
        self.outputs.get(item_id).copied()
    }

    pub fn produces(&self, item_id: &str) -> bool {
        self.outputs.contains_key(item_id)
    }

    /// Check the structural invariants a recipe must satisfy before it is stored.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("recipe id is empty".to_string());
        }
        if self.outputs.is_empty() {
            return Err(format!("recipe '{}' has no outputs", self.id));
        }
        for (item, rate) in self.inputs.iter().chain(self.outputs.iter()) {
            if !rate.is_finite() || *rate < 0.0 {
                return Err(format!(
                    "recipe '{}' has invalid rate {} for '{}'",
                    self.id, rate, item
                ));
            }
        }
        if !self.time.is_finite() || self.time < 0.0 {
            return Err(format!("recipe '{}' has invalid time {}", self.id, self.time));
        }
        Ok(())
    }
}

/// A bundle of reference data, as stored in dataset JSON files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
}

/// One node of a resolved production tree
///
/// Produced fresh on every resolution pass. `amount` is the gross rate requested
/// by the parent; it is negative for byproducts, which represent surplus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyNode {
    pub id: String,
    pub amount: f64,
    pub unique_id: String,
    pub is_root: bool,
    pub is_byproduct: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_import: bool,
    pub available_recipes: Vec<String>,
    pub selected_recipe_id: Option<String>,
    pub excess: f64,
    pub children: Vec<DependencyNode>,
}

impl DependencyNode {
    /// A node with no children and no selected recipe.
    pub fn leaf(id: &str, amount: f64, unique_id: String) -> Self {
        Self {
            id: id.to_string(),
            amount,
            unique_id,
            is_root: false,
            is_byproduct: false,
            is_import: false,
            available_recipes: Vec::new(),
            selected_recipe_id: None,
            excess: 0.0,
            children: Vec::new(),
        }
    }

    /// Demand left after crediting the recorded excess.
    pub fn net_amount(&self) -> f64 {
        self.amount - self.excess
    }

    /// Depth-first, pre-order traversal of this node and all descendants.
    pub fn walk(&self) -> impl Iterator<Item = &DependencyNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    pub fn find(&self, unique_id: &str) -> Option<&DependencyNode> {
        self.walk().find(|n| n.unique_id == unique_id)
    }
}
