//! Loading recipe datasets into the database
//!
//! Datasets are JSON files holding `items` and `recipes` arrays. A directory is
//! scanned recursively; every recipe is validated before it is stored, and a
//! bad file or recipe is counted and skipped rather than aborting the import.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::models::{Dataset, Item, Recipe};

/// Find all dataset files below `data_dir`
pub fn find_dataset_files(data_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(data_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// Parse a single dataset file
pub fn parse_dataset(path: &Path) -> Result<Dataset> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Store a dataset, skipping invalid recipes
pub fn store_dataset(conn: &Connection, dataset: &Dataset, stats: &mut ImportStats) -> Result<()> {
    for item in &dataset.items {
        db::upsert_item(conn, item)?;
        stats.items += 1;
    }

    for recipe in &dataset.recipes {
        if let Err(reason) = recipe.validate() {
            warn!(recipe = %recipe.id, %reason, "skipping invalid recipe");
            stats.skipped += 1;
            continue;
        }
        db::upsert_recipe(conn, recipe)?;
        stats.recipes += 1;
        stats.inputs += recipe.inputs.len();
        stats.outputs += recipe.outputs.len();
        debug!(recipe = %recipe.id, "stored recipe");
    }
    Ok(())
}

/// Import all dataset files under `data_dir` into the database
pub fn import_directory(conn: &Connection, data_dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    let files = find_dataset_files(data_dir);
    info!(dir = %data_dir.display(), files = files.len(), "scanning for datasets");

    for path in &files {
        match parse_dataset(path) {
            Ok(dataset) => store_dataset(conn, &dataset, &mut stats)?,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping dataset");
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportStats {
    pub items: usize,
    pub recipes: usize,
    pub inputs: usize,
    pub outputs: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} items and {} recipes ({} inputs, {} outputs). Skipped: {}, Errors: {}",
            self.items, self.recipes, self.inputs, self.outputs, self.skipped, self.errors
        )
    }
}

fn item(id: &str, name: &str) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        icon: None,
    }
}

fn recipe(id: &str, name: &str, time: f64, inputs: &[(&str, f64)], outputs: &[(&str, f64)]) -> Recipe {
    Recipe {
        id: id.to_string(),
        name: name.to_string(),
        inputs: inputs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        outputs: outputs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        time,
    }
}

/// Small smelting and assembly chain for trying the tool without data files
pub fn sample_dataset() -> Dataset {
    Dataset {
        items: vec![
            item("iron-ore", "Iron Ore"),
            item("copper-ore", "Copper Ore"),
            item("coal", "Coal"),
            item("water", "Water"),
            item("iron-ingot", "Iron Ingot"),
            item("copper-ingot", "Copper Ingot"),
            item("slag", "Slag"),
            item("iron-plate", "Iron Plate"),
            item("copper-wire", "Copper Wire"),
            item("circuit", "Circuit"),
            item("steam", "Steam"),
        ],
        recipes: vec![
            recipe("iron-ingot-recipe", "Iron Ingot", 2.0, &[("iron-ore", 30.0)], &[("iron-ingot", 20.0)]),
            recipe(
                "iron-ingot-coke",
                "Iron Ingot (Coke)",
                4.0,
                &[("iron-ore", 45.0), ("coal", 15.0)],
                &[("iron-ingot", 40.0), ("slag", 5.0)],
            ),
            recipe("copper-ingot-recipe", "Copper Ingot", 2.0, &[("copper-ore", 30.0)], &[("copper-ingot", 30.0)]),
            recipe("iron-plate-recipe", "Iron Plate", 6.0, &[("iron-ingot", 30.0)], &[("iron-plate", 20.0)]),
            recipe("copper-wire-recipe", "Copper Wire", 4.0, &[("copper-ingot", 15.0)], &[("copper-wire", 30.0)]),
            recipe(
                "circuit-recipe",
                "Circuit",
                8.0,
                &[("iron-plate", 10.0), ("copper-wire", 30.0)],
                &[("circuit", 5.0)],
            ),
            // steam and water feed each other
            recipe("boil", "Boil Water", 1.0, &[("water", 60.0), ("coal", 5.0)], &[("steam", 60.0)]),
            recipe("condense", "Condense Steam", 1.0, &[("steam", 60.0)], &[("water", 50.0)]),
        ],
    }
}
