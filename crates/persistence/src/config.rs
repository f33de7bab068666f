//! Catalog-level configuration shared by the transaction and bulk clients.

use serde::{Deserialize, Serialize};

/// How full updates are written to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// Delete the stored document, then run the full create path.
    ///
    /// Not atomic: if the create fails after the delete succeeded, the
    /// resource is gone.
    #[default]
    DeleteThenCreate,
    /// Overwrite the stored document by id in a single write.
    Replace,
}

impl std::fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateStrategy::DeleteThenCreate => write!(f, "delete_then_create"),
            UpdateStrategy::Replace => write!(f, "replace"),
        }
    }
}

impl std::str::FromStr for UpdateStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "delete_then_create" | "delete-then-create" => Ok(UpdateStrategy::DeleteThenCreate),
            "replace" => Ok(UpdateStrategy::Replace),
            other => Err(format!("unknown update strategy: {}", other)),
        }
    }
}

/// Configuration of the catalog adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Name of the collections index (default: `"stac_collections"`).
    #[serde(default = "default_collections_index")]
    pub collections_index: String,

    /// Name of the items index (default: `"stac_items"`).
    #[serde(default = "default_items_index")]
    pub items_index: String,

    /// Write strategy for full updates (default: delete then create).
    #[serde(default)]
    pub update_strategy: UpdateStrategy,
}

fn default_collections_index() -> String {
    "stac_collections".to_string()
}

fn default_items_index() -> String {
    "stac_items".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            collections_index: default_collections_index(),
            items_index: default_items_index(),
            update_strategy: UpdateStrategy::default(),
        }
    }
}

impl CatalogConfig {
    /// Loads configuration from `STAC_COLLECTIONS_INDEX`, `STAC_ITEMS_INDEX`
    /// and `STAC_UPDATE_STRATEGY`, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            collections_index: std::env::var("STAC_COLLECTIONS_INDEX")
                .unwrap_or_else(|_| default_collections_index()),
            items_index: std::env::var("STAC_ITEMS_INDEX")
                .unwrap_or_else(|_| default_items_index()),
            update_strategy: std::env::var("STAC_UPDATE_STRATEGY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }

    /// Uses the given index names.
    pub fn with_indices(
        mut self,
        collections_index: impl Into<String>,
        items_index: impl Into<String>,
    ) -> Self {
        self.collections_index = collections_index.into();
        self.items_index = items_index.into();
        self
    }

    /// Uses the given update strategy.
    pub fn with_update_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.update_strategy = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::default();
        assert_eq!(config.collections_index, "stac_collections");
        assert_eq!(config.items_index, "stac_items");
        assert_eq!(config.update_strategy, UpdateStrategy::DeleteThenCreate);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: CatalogConfig =
            serde_json::from_str(r#"{"items_index": "items_v2", "update_strategy": "replace"}"#)
                .unwrap();
        assert_eq!(config.items_index, "items_v2");
        assert_eq!(config.collections_index, "stac_collections");
        assert_eq!(config.update_strategy, UpdateStrategy::Replace);
    }

    #[test]
    fn test_update_strategy_parse() {
        assert_eq!(
            "delete-then-create".parse::<UpdateStrategy>().unwrap(),
            UpdateStrategy::DeleteThenCreate
        );
        assert_eq!("REPLACE".parse::<UpdateStrategy>().unwrap(), UpdateStrategy::Replace);
        assert!("upsert".parse::<UpdateStrategy>().is_err());
        assert_eq!(UpdateStrategy::Replace.to_string(), "replace");
    }

    #[test]
    fn test_builder() {
        let config = CatalogConfig::default()
            .with_indices("c", "i")
            .with_update_strategy(UpdateStrategy::Replace);
        assert_eq!(config.collections_index, "c");
        assert_eq!(config.items_index, "i");
        assert_eq!(config.update_strategy, UpdateStrategy::Replace);
    }
}
