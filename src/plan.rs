//! Persisted planning state
//!
//! A plan book owns everything the resolver is parameterised by between calls:
//! each tree's request, its excess ledger and per-node machine settings, and
//! the links between trees created by importing a subtree.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::RecipeCatalog;
use crate::config::Settings;
use crate::error::{PlanError, ResolveError};
use crate::excess::ExcessLedger;
use crate::identity::{self, TreeId};
use crate::linker;
use crate::models::DependencyNode;
use crate::resolver::{Resolution, Resolver};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreePlan {
    pub item: String,
    pub amount: f64,
    #[serde(default)]
    pub recipe_override: Option<String>,
    #[serde(default)]
    pub excess: ExcessLedger,
    #[serde(default)]
    pub machine_counts: BTreeMap<String, u32>,
    #[serde(default)]
    pub machine_multipliers: BTreeMap<String, f64>,
    /// Nodes of this tree whose subtrees live in trees of their own.
    #[serde(default)]
    pub imports: BTreeSet<String>,
    /// Unique id of the node this tree was imported from.
    #[serde(default)]
    pub origin: Option<String>,
}

impl TreePlan {
    pub fn new(item: impl Into<String>, amount: f64) -> Self {
        Self {
            item: item.into(),
            amount,
            recipe_override: None,
            excess: ExcessLedger::new(),
            machine_counts: BTreeMap::new(),
            machine_multipliers: BTreeMap::new(),
            imports: BTreeSet::new(),
            origin: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanBook {
    pub trees: BTreeMap<TreeId, TreePlan>,
}

impl PlanBook {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn load_or_default(path: &Path) -> Result<Self, PlanError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PlanError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn tree(&self, id: &TreeId) -> Result<&TreePlan, PlanError> {
        self.trees
            .get(id)
            .ok_or_else(|| PlanError::TreeNotFound(id.to_string()))
    }

    pub fn tree_mut(&mut self, id: &TreeId) -> Result<&mut TreePlan, PlanError> {
        self.trees
            .get_mut(id)
            .ok_or_else(|| PlanError::TreeNotFound(id.to_string()))
    }

    pub fn add_tree(&mut self, id: TreeId, plan: TreePlan) -> Result<(), PlanError> {
        check_amount(plan.amount)?;
        if self.trees.contains_key(&id) {
            return Err(PlanError::TreeExists(id.to_string()));
        }
        self.trees.insert(id, plan);
        Ok(())
    }

    pub fn set_amount(&mut self, tree: &TreeId, amount: f64) -> Result<(), PlanError> {
        check_amount(amount)?;
        self.tree_mut(tree)?.amount = amount;
        Ok(())
    }

    /// Record excess against a node. The node must belong to the tree.
    pub fn record_excess(&mut self, tree: &TreeId, unique_id: &str, quantity: f64) -> Result<(), PlanError> {
        check_member(tree, unique_id)?;
        self.tree_mut(tree)?.excess.record(unique_id, quantity);
        Ok(())
    }

    pub fn set_machine_count(&mut self, tree: &TreeId, unique_id: &str, count: u32) -> Result<(), PlanError> {
        check_member(tree, unique_id)?;
        if count == 0 {
            return Err(PlanError::NotPositive {
                field: "machine count",
                value: 0.0,
            });
        }
        self.tree_mut(tree)?
            .machine_counts
            .insert(unique_id.to_string(), count);
        Ok(())
    }

    pub fn set_machine_multiplier(&mut self, tree: &TreeId, unique_id: &str, multiplier: f64) -> Result<(), PlanError> {
        check_member(tree, unique_id)?;
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(PlanError::NotPositive {
                field: "machine multiplier",
                value: multiplier,
            });
        }
        self.tree_mut(tree)?
            .machine_multipliers
            .insert(unique_id.to_string(), multiplier);
        Ok(())
    }

    /// Detach `node` from its tree and register its subtree as tree `new_id`.
    ///
    /// The origin tree keeps the node as an import leaf; the new tree requests
    /// the node's net demand and remembers where it came from. A node that is
    /// already imported, or lies beneath an imported node, is rejected.
    pub fn import_subtree(&mut self, node: &DependencyNode, new_id: TreeId) -> Result<(), PlanError> {
        let origin = linker::extract_tree_id(&node.unique_id)
            .ok_or_else(|| PlanError::InvalidTreeId(node.unique_id.clone()))?;
        if linker::is_root_id(&node.unique_id) || node.is_byproduct || node.is_import {
            return Err(PlanError::NotImportable(node.unique_id.clone()));
        }
        if self.trees.contains_key(&new_id) {
            return Err(PlanError::TreeExists(new_id.to_string()));
        }

        let origin_plan = self.tree_mut(&origin)?;
        if origin_plan
            .imports
            .iter()
            .any(|imported| identity::is_within(&node.unique_id, imported))
        {
            return Err(PlanError::NotImportable(node.unique_id.clone()));
        }
        origin_plan.imports.insert(node.unique_id.clone());

        let mut plan = TreePlan::new(node.id.clone(), node.net_amount().max(0.0));
        plan.origin = Some(node.unique_id.clone());
        info!(origin = %origin, node = %node.unique_id, tree = %new_id, "imported subtree");
        self.trees.insert(new_id, plan);
        Ok(())
    }

    /// Reverse [`import_subtree`](Self::import_subtree): drop the imported tree
    /// and re-attach the node in the tree named by its origin id.
    pub fn unimport(&mut self, imported: &TreeId) -> Result<TreePlan, PlanError> {
        let origin_node = self
            .tree(imported)?
            .origin
            .clone()
            .ok_or_else(|| PlanError::NotImported(imported.to_string()))?;
        let origin = linker::extract_tree_id(&origin_node)
            .ok_or_else(|| PlanError::InvalidTreeId(origin_node.clone()))?;

        // The origin tree may have been deleted meanwhile; the import is still undone
        if let Some(origin_plan) = self.trees.get_mut(&origin) {
            origin_plan.imports.remove(&origin_node);
        }
        info!(origin = %origin, node = %origin_node, tree = %imported, "unimported subtree");
        self.trees
            .remove(imported)
            .ok_or_else(|| PlanError::TreeNotFound(imported.to_string()))
    }

    /// Resolve one tree with its own ledger, imports and override.
    pub async fn resolve<C: RecipeCatalog + ?Sized>(
        &self,
        tree: &TreeId,
        catalog: &C,
        settings: &Settings,
    ) -> Result<Resolution, PlanError> {
        let plan = self.tree(tree)?;
        Resolver::new(catalog, settings, &plan.excess)
            .with_imports(&plan.imports)
            .resolve(tree, &plan.item, plan.amount, plan.recipe_override.as_deref())
            .await
            .map_err(PlanError::from)
    }
}

fn check_amount(amount: f64) -> Result<(), PlanError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ResolveError::InvalidAmount(amount).into());
    }
    Ok(())
}

fn check_member(tree: &TreeId, unique_id: &str) -> Result<(), PlanError> {
    if linker::extract_tree_id(unique_id).as_ref() != Some(tree) {
        return Err(PlanError::ForeignNode(unique_id.to_string(), tree.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::models::Recipe;

    fn recipe(json: &str) -> Recipe {
        serde_json::from_str(json).unwrap()
    }

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new()
            .with_recipe(recipe(r#"{"id":"plate","in":{"iron-ingot":2},"out":{"plate":1}}"#))
            .with_recipe(recipe(r#"{"id":"ingot","in":{"iron-ore":3},"out":{"iron-ingot":1}}"#))
    }

    fn id(s: &str) -> TreeId {
        TreeId::new(s).unwrap()
    }

    fn book() -> PlanBook {
        let mut book = PlanBook::default();
        book.add_tree(id("main"), TreePlan::new("plate", 10.0)).unwrap();
        book
    }

    #[tokio::test]
    async fn import_and_unimport_round_trip() {
        let catalog = catalog();
        let settings = Settings::default();
        let mut book = book();

        let before = book.resolve(&id("main"), &catalog, &settings).await.unwrap();
        let ingot = before.tree.children[0].clone();
        assert_eq!(ingot.unique_id, "main:plate/0.iron-ingot");

        book.import_subtree(&ingot, id("ingots")).unwrap();
        let origin = book.resolve(&id("main"), &catalog, &settings).await.unwrap();
        assert!(origin.tree.children[0].is_import);
        assert!(origin.tree.children[0].children.is_empty());

        let imported = book.resolve(&id("ingots"), &catalog, &settings).await.unwrap();
        assert_eq!(imported.tree.unique_id, "ingots:iron-ingot");
        assert_eq!(imported.tree.amount, 20.0);
        assert_eq!(imported.tree.children[0].amount, 60.0);

        let removed = book.unimport(&id("ingots")).unwrap();
        assert_eq!(removed.origin.as_deref(), Some("main:plate/0.iron-ingot"));
        let after = book.resolve(&id("main"), &catalog, &settings).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn roots_and_byproducts_cannot_be_imported() {
        let catalog = catalog();
        let settings = Settings::default();
        let mut book = book();
        let res = book.resolve(&id("main"), &catalog, &settings).await.unwrap();

        assert!(matches!(
            book.import_subtree(&res.tree, id("other")),
            Err(PlanError::NotImportable(_))
        ));
        assert!(matches!(book.unimport(&id("main")), Err(PlanError::NotImported(_))));
    }

    #[tokio::test]
    async fn imported_nodes_cannot_be_imported_again() {
        let catalog = catalog();
        let settings = Settings::default();
        let mut book = book();

        let before = book.resolve(&id("main"), &catalog, &settings).await.unwrap();
        let ingot = before.tree.children[0].clone();
        book.import_subtree(&ingot, id("a")).unwrap();

        // same node again, through a stale tree and through a fresh one
        assert!(matches!(
            book.import_subtree(&ingot, id("b")),
            Err(PlanError::NotImportable(_))
        ));
        let after = book.resolve(&id("main"), &catalog, &settings).await.unwrap();
        assert!(matches!(
            book.import_subtree(&after.tree.children[0], id("b")),
            Err(PlanError::NotImportable(_))
        ));
        // nor anything beneath it
        let ore = before.tree.find("main:plate/0.iron-ingot/0.iron-ore").unwrap();
        assert!(matches!(
            book.import_subtree(ore, id("b")),
            Err(PlanError::NotImportable(_))
        ));
        assert!(book.tree(&id("b")).is_err());

        book.unimport(&id("a")).unwrap();
        assert_eq!(book.resolve(&id("main"), &catalog, &settings).await.unwrap(), before);
        assert_eq!(book.trees.len(), 1);
    }

    #[tokio::test]
    async fn node_settings_survive_amount_changes() {
        let catalog = catalog();
        let settings = Settings::default();
        let mut book = book();
        let ore = "main:plate/0.iron-ingot/0.iron-ore";

        book.set_machine_count(&id("main"), ore, 4).unwrap();
        book.set_machine_multiplier(&id("main"), ore, 1.5).unwrap();
        book.set_amount(&id("main"), 25.0).unwrap();

        let res = book.resolve(&id("main"), &catalog, &settings).await.unwrap();
        assert!(res.tree.find(ore).is_some());
        assert_eq!(book.tree(&id("main")).unwrap().machine_counts[ore], 4);
    }

    #[test]
    fn edits_are_validated() {
        let mut book = book();
        let main = id("main");
        assert!(matches!(
            book.set_machine_count(&main, "main:plate", 0),
            Err(PlanError::NotPositive { .. })
        ));
        assert!(book.set_machine_multiplier(&main, "main:plate", -1.0).is_err());
        assert!(matches!(
            book.record_excess(&main, "other:plate", 1.0),
            Err(PlanError::ForeignNode(..))
        ));
        assert!(matches!(
            book.add_tree(id("main"), TreePlan::new("x", 1.0)),
            Err(PlanError::TreeExists(_))
        ));
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                book.add_tree(id("other"), TreePlan::new("x", bad)),
                Err(PlanError::Resolve(ResolveError::InvalidAmount(_)))
            ));
            assert!(book.set_amount(&main, bad).is_err());
        }
        assert_eq!(book.tree(&main).unwrap().amount, 10.0);
        book.set_amount(&main, 0.0).unwrap();
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let mut book = book();
        book.record_excess(&id("main"), "main:plate", 2.0).unwrap();
        book.save(&path).unwrap();

        assert_eq!(PlanBook::load(&path).unwrap(), book);
        assert_eq!(
            PlanBook::load_or_default(&dir.path().join("none.json")).unwrap(),
            PlanBook::default()
        );
    }
}
