//! Resolver settings
//!
//! Settings are an explicit value handed to each resolution call, never ambient
//! state. They are read-only for the duration of a call.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Preferred recipe per item id, used below the root of a tree.
    pub default_recipes: BTreeMap<String, String>,
}

impl Settings {
    /// Load settings from a TOML file.
    ///
    /// ```toml
    /// [default_recipes]
    /// iron-ingot = "iron-ingot-alt"
    /// ```
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Settings from `path` if given and present, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_recipe(&self, item_id: &str) -> Option<&str> {
        self.default_recipes.get(item_id).map(String::as_str)
    }

    pub fn with_default_recipe(mut self, item_id: &str, recipe_id: &str) -> Self {
        self.default_recipes
            .insert(item_id.to_string(), recipe_id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_default_recipes_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[default_recipes]\niron-ingot = \"alt\"\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.default_recipe("iron-ingot"), Some("alt"));
        assert_eq!(settings.default_recipe("copper"), None);
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert_eq!(
            Settings::load_or_default(Some(path.as_path())).unwrap(),
            Settings::default()
        );
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "default_recipes = 3").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }
}
