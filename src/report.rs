//! Text rendering and summaries of resolved trees

use std::collections::BTreeMap;

use crate::models::DependencyNode;

/// Format a production tree as an indented listing
pub fn format_tree(node: &DependencyNode, indent: usize) -> String {
    let mut output = String::new();
    let prefix = "  ".repeat(indent);

    let marker = if node.is_byproduct {
        " (byproduct)".to_string()
    } else if node.is_import {
        " (imported)".to_string()
    } else if let Some(recipe) = &node.selected_recipe_id {
        format!(" via {}", recipe)
    } else {
        " (raw input)".to_string()
    };

    output.push_str(&format!(
        "{}{} @ {:.3}/min{}",
        prefix,
        node.id,
        node.amount.abs(),
        marker
    ));
    if node.excess > 0.0 {
        output.push_str(&format!(" [excess {:.3}, net {:.3}]", node.excess, node.net_amount()));
    }
    if node.available_recipes.len() > 1 {
        output.push_str(&format!(" ({} recipes)", node.available_recipes.len()));
    }
    output.push_str(&format!("  <{}>\n", node.unique_id));

    for child in &node.children {
        output.push_str(&format_tree(child, indent + 1));
    }

    output
}

/// Summary of a resolved tree
#[derive(Debug, PartialEq)]
pub struct TreeSummary {
    pub target: String,
    pub target_rate: f64,
    pub raw_inputs: Vec<(String, f64)>,
    pub byproducts: Vec<(String, f64)>,
    pub imports: Vec<(String, f64)>,
    pub recipe_usage: Vec<(String, usize)>,
    pub total_excess: f64,
}

/// Generate a summary of a resolved tree
pub fn summarize_tree(root: &DependencyNode) -> TreeSummary {
    let mut raw_inputs: BTreeMap<String, f64> = BTreeMap::new();
    let mut byproducts: BTreeMap<String, f64> = BTreeMap::new();
    let mut imports: BTreeMap<String, f64> = BTreeMap::new();
    let mut recipe_usage: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_excess = 0.0;

    for node in root.walk() {
        total_excess += node.excess;
        if node.is_byproduct {
            *byproducts.entry(node.id.clone()).or_default() += -node.amount;
        } else if node.is_import {
            *imports.entry(node.id.clone()).or_default() += node.net_amount();
        } else if let Some(recipe) = &node.selected_recipe_id {
            *recipe_usage.entry(recipe.clone()).or_default() += 1;
        } else {
            *raw_inputs.entry(node.id.clone()).or_default() += node.net_amount();
        }
    }

    TreeSummary {
        target: root.id.clone(),
        target_rate: root.amount,
        raw_inputs: raw_inputs.into_iter().collect(),
        byproducts: byproducts.into_iter().collect(),
        imports: imports.into_iter().collect(),
        recipe_usage: recipe_usage.into_iter().collect(),
        total_excess,
    }
}

impl std::fmt::Display for TreeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Production Summary ===")?;
        writeln!(f, "Target: {} @ {:.3}/min", self.target, self.target_rate)?;
        writeln!(f)?;

        writeln!(f, "Recipes used:")?;
        for (recipe, nodes) in &self.recipe_usage {
            writeln!(f, "  {} ({} nodes)", recipe, nodes)?;
        }
        writeln!(f)?;

        writeln!(f, "Raw inputs required:")?;
        for (item, rate) in &self.raw_inputs {
            writeln!(f, "  {} @ {:.3}/min", item, rate)?;
        }

        if !self.byproducts.is_empty() {
            writeln!(f)?;
            writeln!(f, "Byproducts:")?;
            for (item, rate) in &self.byproducts {
                writeln!(f, "  {} @ {:.3}/min", item, rate)?;
            }
        }

        if !self.imports.is_empty() {
            writeln!(f)?;
            writeln!(f, "Supplied by other trees:")?;
            for (item, rate) in &self.imports {
                writeln!(f, "  {} @ {:.3}/min", item, rate)?;
            }
        }

        if self.total_excess > 0.0 {
            writeln!(f)?;
            writeln!(f, "Excess credited: {:.3}/min", self.total_excess)?;
        }

        Ok(())
    }
}
