//! Read-only recipe and item lookup

use std::collections::BTreeMap;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::CatalogError;
use crate::models::{Dataset, Item, Recipe};

/// Source of recipe data for the resolver.
///
/// Lookups are asynchronous so that backing stores can fetch lazily; the
/// resolver awaits sibling lookups jointly. Implementations are not required to
/// be `Send`, resolution runs on a single thread.
#[async_trait(?Send)]
pub trait RecipeCatalog {
    async fn recipe_by_id(&self, id: &str) -> Result<Option<Recipe>, CatalogError>;

    /// All recipes that list `item_id` among their outputs, ordered by recipe id.
    async fn recipes_for_item(&self, item_id: &str) -> Result<Vec<Recipe>, CatalogError>;

    async fn components(&self) -> Result<Vec<Item>, CatalogError>;

    /// Default recipe for an item: the first producer by recipe id.
    async fn recipe_by_output(&self, item_id: &str) -> Result<Option<Recipe>, CatalogError> {
        Ok(self.recipes_for_item(item_id).await?.into_iter().next())
    }
}

/// Catalog held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    items: IndexMap<String, Item>,
    recipes: BTreeMap<String, Recipe>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(dataset: Dataset) -> Self {
        let mut catalog = Self::new();
        for item in dataset.items {
            catalog.insert_item(item);
        }
        for recipe in dataset.recipes {
            catalog.insert_recipe(recipe);
        }
        catalog
    }

    pub fn insert_item(&mut self, item: Item) {
        self.items.insert(item.id.clone(), item);
    }

    /// Insert or replace a recipe. Validation is left to the loader so tests can
    /// exercise malformed data.
    pub fn insert_recipe(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.id.clone(), recipe);
    }

    pub fn with_recipe(mut self, recipe: Recipe) -> Self {
        self.insert_recipe(recipe);
        self
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

#[async_trait(?Send)]
impl RecipeCatalog for MemoryCatalog {
    async fn recipe_by_id(&self, id: &str) -> Result<Option<Recipe>, CatalogError> {
        Ok(self.recipes.get(id).cloned())
    }

    async fn recipes_for_item(&self, item_id: &str) -> Result<Vec<Recipe>, CatalogError> {
        // BTreeMap iteration keeps the result ordered by recipe id
        Ok(self
            .recipes
            .values()
            .filter(|r| r.produces(item_id))
            .cloned()
            .collect())
    }

    async fn components(&self) -> Result<Vec<Item>, CatalogError> {
        Ok(self.items.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        serde_json::from_str(
            r#"{
                "items": [{"id": "iron-ore", "name": "Iron Ore"}],
                "recipes": [
                    {"id": "z-ingot", "in": {"iron-ore": 30}, "out": {"iron-ingot": 20}},
                    {"id": "a-ingot", "in": {"iron-ore": 40}, "out": {"iron-ingot": 20}}
                ]
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn producers_are_ordered_by_id() {
        let catalog = MemoryCatalog::from_dataset(dataset());
        let ids: Vec<_> = catalog
            .recipes_for_item("iron-ingot")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a-ingot", "z-ingot"]);

        let fallback = catalog.recipe_by_output("iron-ingot").await.unwrap();
        assert_eq!(fallback.map(|r| r.id).as_deref(), Some("a-ingot"));
    }

    #[tokio::test]
    async fn unknown_lookups_are_empty() {
        let catalog = MemoryCatalog::from_dataset(dataset());
        assert!(catalog.recipe_by_id("nope").await.unwrap().is_none());
        assert!(catalog.recipes_for_item("iron-ore").await.unwrap().is_empty());
        assert_eq!(catalog.components().await.unwrap().len(), 1);
    }
}
