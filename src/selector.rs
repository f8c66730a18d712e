//! Choosing which recipe expands a node

use tracing::warn;

use crate::config::Settings;
use crate::error::ResolveWarning;
use crate::models::Recipe;

/// Why a recipe was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Override,
    Preference,
    /// Only producer, or lowest recipe id among several.
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'r> {
    pub recipe: Option<&'r Recipe>,
    pub source: Option<SelectionSource>,
    pub warnings: Vec<ResolveWarning>,
}

impl<'r> Selection<'r> {
    fn none(warnings: Vec<ResolveWarning>) -> Self {
        Self {
            recipe: None,
            source: None,
            warnings,
        }
    }

    fn chosen(recipe: &'r Recipe, source: SelectionSource, warnings: Vec<ResolveWarning>) -> Self {
        Self {
            recipe: Some(recipe),
            source: Some(source),
            warnings,
        }
    }
}

/// Pick the recipe for `item_id` out of `available`, the item's producers.
///
/// Resolution order:
/// 1. at depth 0, an explicit `recipe_override` (a mismatch leaves the node
///    without a recipe and is reported)
/// 2. the item's default recipe from `settings`, if it still produces the item
/// 3. the producer with the lowest recipe id
pub fn select<'r>(
    item_id: &str,
    depth: usize,
    recipe_override: Option<&str>,
    settings: &Settings,
    available: &'r [Recipe],
) -> Selection<'r> {
    if depth == 0 {
        if let Some(override_id) = recipe_override {
            return match find_producer(available, override_id, item_id) {
                Some(recipe) => Selection::chosen(recipe, SelectionSource::Override, Vec::new()),
                None => {
                    warn!(item = item_id, recipe = override_id, "override does not produce item");
                    Selection::none(vec![ResolveWarning::OverrideMismatch {
                        item: item_id.to_string(),
                        recipe_id: override_id.to_string(),
                    }])
                }
            };
        }
    }

    let mut warnings = Vec::new();
    if let Some(preferred) = settings.default_recipe(item_id) {
        match find_producer(available, preferred, item_id) {
            Some(recipe) => {
                return Selection::chosen(recipe, SelectionSource::Preference, warnings);
            }
            None => {
                warn!(item = item_id, recipe = preferred, "stale default recipe preference");
                warnings.push(ResolveWarning::StalePreference {
                    item: item_id.to_string(),
                    recipe_id: preferred.to_string(),
                });
            }
        }
    }

    let fallback = available
        .iter()
        .filter(|r| r.produces(item_id))
        .min_by(|a, b| a.id.cmp(&b.id));
    match fallback {
        Some(recipe) => Selection::chosen(recipe, SelectionSource::Fallback, warnings),
        None => Selection::none(warnings),
    }
}

fn find_producer<'r>(available: &'r [Recipe], recipe_id: &str, item_id: &str) -> Option<&'r Recipe> {
    available
        .iter()
        .find(|r| r.id == recipe_id && r.produces(item_id))
}
