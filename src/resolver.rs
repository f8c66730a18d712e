//! Dependency tree resolution
//!
//! Walks the recipe graph from a requested item down to raw resources. Each node
//! picks a recipe, scales the recipe's inputs to the node's net demand and
//! resolves them as children; the recipe's other outputs are attached as
//! byproduct leaves. Sibling subtrees are resolved concurrently and assembled in
//! declaration order.

use std::collections::BTreeSet;

use futures::future::{LocalBoxFuture, join_all};
use tracing::{debug, warn};

use crate::catalog::RecipeCatalog;
use crate::config::Settings;
use crate::cycle::CycleGuard;
use crate::error::{ResolveError, ResolveWarning};
use crate::excess::ExcessLedger;
use crate::identity::{self, TreeId};
use crate::models::{DependencyNode, Recipe};
use crate::selector;

static NO_IMPORTS: BTreeSet<String> = BTreeSet::new();

/// A resolved tree plus the data-quality problems met while building it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub tree: DependencyNode,
    pub warnings: Vec<ResolveWarning>,
}

/// Position of a node being resolved
struct Frame {
    item_id: String,
    amount: f64,
    ancestors: CycleGuard,
    unique_id: String,
}

struct Branch {
    node: DependencyNode,
    warnings: Vec<ResolveWarning>,
}

/// Resolves production trees against a catalog.
///
/// Borrows everything it reads and keeps no state between calls, so one
/// resolver can serve any number of concurrent resolutions.
pub struct Resolver<'a, C: RecipeCatalog + ?Sized> {
    catalog: &'a C,
    settings: &'a Settings,
    excess: &'a ExcessLedger,
    imports: &'a BTreeSet<String>,
}

impl<'a, C: RecipeCatalog + ?Sized> Resolver<'a, C> {
    pub fn new(catalog: &'a C, settings: &'a Settings, excess: &'a ExcessLedger) -> Self {
        Self {
            catalog,
            settings,
            excess,
            imports: &NO_IMPORTS,
        }
    }

    /// Unique ids of nodes whose subtrees were moved to trees of their own.
    pub fn with_imports(mut self, imports: &'a BTreeSet<String>) -> Self {
        self.imports = imports;
        self
    }

    /// Resolve `amount` of `item_id` as the root of `tree`.
    ///
    /// `recipe_override` only applies to the root. Fails without producing a
    /// tree when the request itself is invalid; problems below the root turn the
    /// affected node into a leaf and are reported in [`Resolution::warnings`].
    pub async fn resolve(
        &self,
        tree: &TreeId,
        item_id: &str,
        amount: f64,
        recipe_override: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ResolveError::InvalidAmount(amount));
        }

        if let Some(override_id) = recipe_override {
            let exists = self
                .catalog
                .recipe_by_id(override_id)
                .await
                .map_err(|source| ResolveError::Catalog {
                    item: item_id.to_string(),
                    source,
                })?
                .is_some();
            if !exists {
                return Err(ResolveError::UnknownOverride(override_id.to_string()));
            }
        }

        let available = self
            .catalog
            .recipes_for_item(item_id)
            .await
            .map_err(|source| ResolveError::Catalog {
                item: item_id.to_string(),
                source,
            })?;

        let frame = Frame {
            item_id: item_id.to_string(),
            amount,
            ancestors: CycleGuard::new(),
            unique_id: identity::root_id(tree, item_id),
        };
        let Branch { node, warnings } = self.expand(frame, recipe_override, available).await;

        debug!(
            tree = %tree,
            item = item_id,
            amount,
            warnings = warnings.len(),
            "resolved tree"
        );
        Ok(Resolution {
            tree: node,
            warnings,
        })
    }

    /// Childless node for `frame`, still reporting the excess recorded against it.
    fn terminal(&self, frame: &Frame) -> Branch {
        let mut node = DependencyNode::leaf(&frame.item_id, frame.amount, frame.unique_id.clone());
        node.is_root = frame.ancestors.depth() == 0;
        node.excess = self.excess.credit(&frame.unique_id, frame.amount);
        Branch {
            node,
            warnings: Vec::new(),
        }
    }

    fn resolve_node(&self, frame: Frame) -> LocalBoxFuture<'_, Branch> {
        Box::pin(async move {
            if frame.ancestors.would_cycle(&frame.item_id) {
                debug!(item = %frame.item_id, id = %frame.unique_id, "cycle, treating as raw input");
                return self.terminal(&frame);
            }

            if self.imports.contains(&frame.unique_id) {
                let mut branch = self.terminal(&frame);
                branch.node.is_import = true;
                return branch;
            }

            let available = match self.catalog.recipes_for_item(&frame.item_id).await {
                Ok(recipes) => recipes,
                Err(e) => {
                    warn!(item = %frame.item_id, id = %frame.unique_id, error = %e, "recipe lookup failed");
                    let mut branch = self.terminal(&frame);
                    branch.warnings.push(ResolveWarning::CatalogUnavailable {
                        unique_id: frame.unique_id.clone(),
                        detail: e.to_string(),
                    });
                    return branch;
                }
            };

            self.expand(frame, None, available).await
        })
    }

    async fn expand(
        &self,
        frame: Frame,
        recipe_override: Option<&str>,
        available: Vec<Recipe>,
    ) -> Branch {
        let mut branch = self.terminal(&frame);
        let node = &mut branch.node;
        node.available_recipes = available.iter().map(|r| r.id.clone()).collect();

        let selection = selector::select(
            &frame.item_id,
            frame.ancestors.depth(),
            recipe_override,
            self.settings,
            &available,
        );
        branch.warnings.extend(selection.warnings);
        let Some(recipe) = selection.recipe else {
            return branch;
        };

        let output_rate = recipe.output_rate(&frame.item_id).unwrap_or(0.0);
        if !(output_rate > 0.0 && output_rate.is_finite()) {
            warn!(
                item = %frame.item_id,
                recipe = %recipe.id,
                rate = output_rate,
                "recipe has no usable output rate"
            );
            branch.warnings.push(ResolveWarning::NonPositiveOutput {
                unique_id: frame.unique_id.clone(),
                recipe_id: recipe.id.clone(),
                rate: output_rate,
            });
            return branch;
        }
        node.selected_recipe_id = Some(recipe.id.clone());

        // Children scale with the demand left after excess is credited
        let cycles = node.net_amount() / output_rate;
        debug!(
            item = %frame.item_id,
            recipe = %recipe.id,
            source = ?selection.source,
            cycles,
            "expanding node"
        );

        let ancestors = frame.ancestors.descend(&frame.item_id);
        let inputs = recipe
            .inputs
            .iter()
            .enumerate()
            .map(|(index, (input_id, input_rate))| {
                self.resolve_node(Frame {
                    item_id: input_id.clone(),
                    amount: input_rate * cycles,
                    ancestors: ancestors.clone(),
                    unique_id: identity::child_id(&frame.unique_id, input_id, index),
                })
            });

        for child in join_all(inputs).await {
            branch.node.children.push(child.node);
            branch.warnings.extend(child.warnings);
        }

        let offset = recipe.inputs.len();
        let byproducts = recipe
            .outputs
            .iter()
            .filter(|(output_id, _)| *output_id != &frame.item_id);
        for (index, (output_id, output_rate)) in byproducts.enumerate() {
            let mut byproduct = DependencyNode::leaf(
                output_id,
                -(output_rate * cycles),
                identity::child_id(&frame.unique_id, output_id, offset + index),
            );
            byproduct.is_byproduct = true;
            branch.node.children.push(byproduct);
        }

        branch
    }
}
