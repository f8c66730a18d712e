//! Database schema and operations

use anyhow::{Context, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use rusqlite::{Connection, OptionalExtension};

use crate::catalog::RecipeCatalog;
use crate::error::CatalogError;
use crate::models::{Item, Recipe};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            icon TEXT
        );

        CREATE TABLE IF NOT EXISTS recipes (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            time_s REAL NOT NULL DEFAULT 0
        );

        -- position preserves declaration order of a recipe's inputs and outputs
        CREATE TABLE IF NOT EXISTS recipe_inputs (
            recipe_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            item_id TEXT NOT NULL,
            rate REAL NOT NULL,
            PRIMARY KEY (recipe_id, item_id)
        );

        CREATE TABLE IF NOT EXISTS recipe_outputs (
            recipe_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            item_id TEXT NOT NULL,
            rate REAL NOT NULL,
            PRIMARY KEY (recipe_id, item_id)
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_inputs_recipe ON recipe_inputs(recipe_id);
        CREATE INDEX IF NOT EXISTS idx_recipe_outputs_recipe ON recipe_outputs(recipe_id);
        CREATE INDEX IF NOT EXISTS idx_recipe_outputs_item ON recipe_outputs(item_id);
        "#,
    )?;
    Ok(())
}

/// Insert or replace an item
pub fn upsert_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO items (id, name, icon) VALUES (?1, ?2, ?3)",
        (&item.id, &item.name, &item.icon),
    )
    .with_context(|| format!("Failed to store item {}", item.id))?;
    Ok(())
}

/// Insert or replace a recipe together with its inputs and outputs
pub fn upsert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT OR REPLACE INTO recipes (id, name, time_s) VALUES (?1, ?2, ?3)",
        (&recipe.id, &recipe.name, recipe.time),
    )?;
    tx.execute("DELETE FROM recipe_inputs WHERE recipe_id = ?1", [&recipe.id])?;
    tx.execute("DELETE FROM recipe_outputs WHERE recipe_id = ?1", [&recipe.id])?;

    for (position, (item_id, rate)) in recipe.inputs.iter().enumerate() {
        tx.execute(
            "INSERT INTO recipe_inputs (recipe_id, position, item_id, rate) VALUES (?1, ?2, ?3, ?4)",
            (&recipe.id, position as i64, item_id, rate),
        )?;
    }
    for (position, (item_id, rate)) in recipe.outputs.iter().enumerate() {
        tx.execute(
            "INSERT INTO recipe_outputs (recipe_id, position, item_id, rate) VALUES (?1, ?2, ?3, ?4)",
            (&recipe.id, position as i64, item_id, rate),
        )?;
    }
    tx.commit()
        .with_context(|| format!("Failed to store recipe {}", recipe.id))?;
    Ok(())
}

/// Clear all imported data (for re-import)
pub fn clear_data(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_outputs;
        DELETE FROM recipe_inputs;
        DELETE FROM recipes;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

fn load_rates(conn: &Connection, table: &str, recipe_id: &str) -> rusqlite::Result<IndexMap<String, f64>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT item_id, rate FROM {} WHERE recipe_id = ?1 ORDER BY position",
        table
    ))?;
    let rows = stmt.query_map([recipe_id], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut rates = IndexMap::new();
    for row in rows {
        let (item, rate): (String, f64) = row?;
        rates.insert(item, rate);
    }
    Ok(rates)
}

/// Load a full recipe by id
pub fn get_recipe(conn: &Connection, recipe_id: &str) -> rusqlite::Result<Option<Recipe>> {
    let header = conn
        .query_row(
            "SELECT id, name, time_s FROM recipes WHERE id = ?1",
            [recipe_id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, f64>(2)?)),
        )
        .optional()?;

    let Some((id, name, time)) = header else {
        return Ok(None);
    };
    Ok(Some(Recipe {
        inputs: load_rates(conn, "recipe_inputs", &id)?,
        outputs: load_rates(conn, "recipe_outputs", &id)?,
        id,
        name,
        time,
    }))
}

/// Get the ids of all recipes that produce a given item
pub fn get_producer_ids(conn: &Connection, item_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT DISTINCT recipe_id FROM recipe_outputs WHERE item_id = ?1 ORDER BY recipe_id",
    )?;
    let rows = stmt.query_map([item_id], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all items in the database
pub fn list_items(conn: &Connection) -> rusqlite::Result<Vec<Item>> {
    let mut stmt = conn.prepare("SELECT id, name, icon FROM items ORDER BY name")?;

    let rows = stmt.query_map([], |row| {
        Ok(Item {
            id: row.get(0)?,
            name: row.get(1)?,
            icon: row.get(2)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all recipe ids
pub fn list_recipe_ids(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM recipes ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Recipe catalog backed by the SQLite database
///
/// Queries run synchronously on the calling thread; each await completes without
/// yielding, so a resolution against this catalog blocks its caller until done.
pub struct SqliteCatalog<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteCatalog<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

#[async_trait(?Send)]
impl RecipeCatalog for SqliteCatalog<'_> {
    async fn recipe_by_id(&self, id: &str) -> Result<Option<Recipe>, CatalogError> {
        Ok(get_recipe(self.conn, id)?)
    }

    async fn recipes_for_item(&self, item_id: &str) -> Result<Vec<Recipe>, CatalogError> {
        let mut recipes = Vec::new();
        for id in get_producer_ids(self.conn, item_id)? {
            let recipe = get_recipe(self.conn, &id)?.ok_or_else(|| CatalogError::Corrupt {
                id: id.clone(),
                detail: "outputs reference a missing recipe row".to_string(),
            })?;
            recipes.push(recipe);
        }
        Ok(recipes)
    }

    async fn components(&self) -> Result<Vec<Item>, CatalogError> {
        Ok(list_items(self.conn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn smelter() -> Recipe {
        serde_json::from_str(
            r#"{"id":"smelt","name":"Smelt","in":{"iron-ore":30,"coal":10},"out":{"iron-ingot":20,"slag":5},"time":4}"#,
        )
        .unwrap()
    }

    #[test]
    fn recipe_round_trips_in_declaration_order() {
        let conn = memory_db();
        upsert_recipe(&conn, &smelter()).unwrap();

        let loaded = get_recipe(&conn, "smelt").unwrap().unwrap();
        assert_eq!(loaded, smelter());
        assert!(get_recipe(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn upsert_replaces_rates() {
        let conn = memory_db();
        upsert_recipe(&conn, &smelter()).unwrap();
        let mut changed = smelter();
        changed.inputs.shift_remove("coal");
        upsert_recipe(&conn, &changed).unwrap();

        let loaded = get_recipe(&conn, "smelt").unwrap().unwrap();
        assert_eq!(loaded.inputs.len(), 1);
    }

    #[tokio::test]
    async fn catalog_finds_producers() {
        let conn = memory_db();
        upsert_recipe(&conn, &smelter()).unwrap();
        upsert_item(
            &conn,
            &Item {
                id: "slag".into(),
                name: "Slag".into(),
                icon: None,
            },
        )
        .unwrap();

        let catalog = SqliteCatalog::new(&conn);
        assert_eq!(catalog.recipes_for_item("slag").await.unwrap().len(), 1);
        assert!(catalog.recipes_for_item("coal").await.unwrap().is_empty());
        assert_eq!(catalog.components().await.unwrap()[0].name, "Slag");

        clear_data(&conn).unwrap();
        assert!(list_recipe_ids(&conn).unwrap().is_empty());
    }
}
