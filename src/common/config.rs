use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::errors::{ReclaimError, Result};

/// Global reclaim configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Roots searched for application bundles (`~` is expanded)
    #[serde(default = "default_app_roots")]
    pub app_roots: Vec<String>,

    /// App catalog cache lifetime in seconds
    #[serde(default = "default_catalog_ttl")]
    pub catalog_ttl_secs: u64,

    /// Recommendations cache lifetime in seconds
    #[serde(default = "default_recommendations_ttl")]
    pub recommendations_ttl_secs: u64,

    /// Storage map cache lifetime in seconds
    #[serde(default = "default_storage_map_ttl")]
    pub storage_map_ttl_secs: u64,

    /// Override for the cache directory
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Heuristic bounds and floors
    #[serde(default)]
    pub thresholds: Thresholds,
}

/// Every traversal bound and heuristic floor in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub tree_max_depth: usize,
    pub tree_max_children: usize,
    pub bundle_search_depth: usize,
    pub cask_search_depth: usize,
    pub semantic_max_depth: usize,
    pub semantic_min_bytes: u64,
    pub large_item_min_bytes: u64,
    pub large_item_limit: usize,
    pub large_flatten_depth: usize,
    pub large_flatten_limit: usize,
    pub duplicate_min_bytes: u64,
    pub duplicate_flatten_depth: usize,
    pub duplicate_flatten_limit: usize,
    pub duplicate_materiality_bytes: u64,
    pub duplicate_group_limit: usize,
    /// Orphan names must be strictly longer than this
    pub orphan_id_min_len: usize,
    pub metadata_max_depth: usize,
    pub metadata_max_samples: usize,
    pub metadata_result_limit: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            tree_max_depth: 3,
            tree_max_children: 200,
            bundle_search_depth: 2,
            cask_search_depth: 4,
            semantic_max_depth: 6,
            semantic_min_bytes: 20_000_000,
            large_item_min_bytes: 5_000_000,
            large_item_limit: 200,
            large_flatten_depth: 5,
            large_flatten_limit: 1_200,
            duplicate_min_bytes: 5_000_000,
            duplicate_flatten_depth: 6,
            duplicate_flatten_limit: 2_000,
            duplicate_materiality_bytes: 20_000_000,
            duplicate_group_limit: 120,
            orphan_id_min_len: 6,
            metadata_max_depth: 5,
            metadata_max_samples: 2_500,
            metadata_result_limit: 300,
        }
    }
}

fn default_app_roots() -> Vec<String> {
    vec![
        "/Applications".to_string(),
        "~/Applications".to_string(),
        "/opt/homebrew/Caskroom".to_string(),
    ]
}
fn default_catalog_ttl() -> u64 {
    15 * 60
}
fn default_recommendations_ttl() -> u64 {
    20 * 60
}
fn default_storage_map_ttl() -> u64 {
    20 * 60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_roots: default_app_roots(),
            catalog_ttl_secs: default_catalog_ttl(),
            recommendations_ttl_secs: default_recommendations_ttl(),
            storage_map_ttl_secs: default_storage_map_ttl(),
            cache_dir: None,
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    /// Get the reclaim data directory (`$RECLAIM_HOME` or ~/.reclaim)
    pub fn data_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os("RECLAIM_HOME") {
            return PathBuf::from(dir);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".reclaim")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Get the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }

    /// Directory holding the persisted cache files
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        if std::env::var_os("RECLAIM_HOME").is_some() {
            return Self::data_dir().join("cache");
        }
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("reclaim")
    }

    /// Load config from file, or fall back to defaults if it does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| ReclaimError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| ReclaimError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let to_err = |message: String| ReclaimError::Config {
            path: path.to_path_buf(),
            message,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| to_err(e.to_string()))?;
        }
        let contents = toml::to_string_pretty(self).map_err(|e| to_err(e.to_string()))?;
        std::fs::write(path, contents).map_err(|e| to_err(e.to_string()))
    }

    /// Initialize the data and log directories
    pub fn init_dirs() -> Result<()> {
        for dir in [Self::data_dir(), Self::logs_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| ReclaimError::Config {
                path: dir.clone(),
                message: format!("Failed to create directory: {}", e),
            })?;
        }
        Ok(())
    }

    /// App roots with `~` expanded against the current home directory
    pub fn expanded_app_roots(&self) -> Vec<PathBuf> {
        let home = dirs::home_dir().unwrap_or_default();
        self.app_roots
            .iter()
            .map(|root| expand_home(root, &home))
            .collect()
    }

    /// Catalog cache key: deterministic over the configured roots
    pub fn catalog_cache_key(&self) -> String {
        format!("catalog|{}", self.app_roots.join(";"))
    }
}

/// Replace a leading `~` with the given home directory.
pub fn expand_home(path: &str, home: &Path) -> PathBuf {
    match path.strip_prefix('~') {
        Some(rest) => home.join(rest.trim_start_matches('/')),
        None => PathBuf::from(path),
    }
}
