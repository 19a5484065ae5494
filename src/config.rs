use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::{CategoryClassifier, CategoryKeywordTable, DEFAULT_CATEGORY};
use crate::error::ConfigError;

#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Config {
    #[serde(default = "default_category")]
    pub default_category: String,
    pub categories: Vec<Category>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Default for Config {
    fn default() -> Self {
        let categories = CategoryKeywordTable::builtin()
            .iter()
            .map(|(name, keywords)| Category {
                name: name.to_string(),
                keywords: keywords.to_vec(),
            })
            .collect();

        Self {
            default_category: default_category(),
            categories,
        }
    }
}

impl Config {
    /// Builds the classifier described by this config, keeping category order.
    pub fn classifier(&self) -> CategoryClassifier {
        let table = self
            .categories
            .iter()
            .fold(CategoryKeywordTable::new(), |table, category| {
                table.with_category(category.name.clone(), &category.keywords)
            });
        CategoryClassifier::new(table, self.default_category.clone())
    }
}

/// Loads the config at `path`, falling back to the built-in categories when the
/// file does not exist.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!("No config at {}, using built-in categories", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Looks for `config.json` next to the executable, then in the working directory.
pub fn find_config() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()));

    let candidates = [
        exe_dir.as_ref().map(|d| d.join("config.json")),
        Some(PathBuf::from("config.json")),
    ];

    for candidate in candidates.iter().flatten() {
        if candidate.exists() {
            tracing::debug!("Found config at {:?}", candidate);
            return candidate.clone();
        }
    }

    PathBuf::from("config.json")
}
