//! Scope-aware composition of the scanners, caches and ranker.
//!
//! [`Services`] is the one place that turns a [`Config`] into wired
//! components; the CLI only ever talks to it.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::apps::{AppCatalogDiscoverer, ArtifactResolver, ArtifactSource, HomeLayout, InstalledApp};
use crate::cache::{
    CacheEntry, CatalogCache, RecommendationsCache, StorageMapCache, CATALOG_CACHE_FILE,
    RECOMMENDATIONS_CACHE_FILE, STORAGE_MAP_CACHE_FILE,
};
use crate::cleaner::{CleanupExecutor, CleanupPlanner};
use crate::common::errors::Result;
use crate::common::Config;
use crate::duplicates::{DuplicateDetector, DuplicateSettings};
use crate::profiles::{ProfileInferenceEngine, RecommendationRanker, RecommendationSet};
use crate::scanner::{DiskNode, DiskTreeScanner, MetadataDiscovery, SemanticUnitDetector, TreeScanner};

/// Which part of the disk an analysis covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanScope {
    #[default]
    Home,
    Applications,
    FullDisk,
}

impl ScanScope {
    pub fn key(self) -> &'static str {
        match self {
            ScanScope::Home => "home",
            ScanScope::Applications => "applications",
            ScanScope::FullDisk => "full_disk",
        }
    }

    pub fn root(self, home: &Path) -> PathBuf {
        match self {
            ScanScope::Home => home.to_path_buf(),
            ScanScope::Applications => PathBuf::from("/Applications"),
            ScanScope::FullDisk => PathBuf::from("/"),
        }
    }

    /// Root for the current user
    pub fn current_root(self) -> PathBuf {
        self.root(&dirs::home_dir().unwrap_or_else(|| PathBuf::from("/")))
    }
}

impl std::fmt::Display for ScanScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ScanScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "home" => Ok(ScanScope::Home),
            "applications" | "apps" => Ok(ScanScope::Applications),
            "full_disk" | "disk" => Ok(ScanScope::FullDisk),
            other => Err(format!(
                "unknown scope '{}' (expected home, applications or full-disk)",
                other
            )),
        }
    }
}

/// A result and whether it was served from cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub value: T,
    pub from_cache: bool,
}

pub fn storage_map_key(scope: ScanScope, root: &Path) -> String {
    format!("{}|{}", scope.key(), root.display())
}

/// Depends on the scope, root, and every app's id and size
pub fn recommendations_key(scope: ScanScope, root: &Path, apps: &[InstalledApp]) -> String {
    let mut fingerprints: Vec<String> = apps
        .iter()
        .map(|a| format!("{}:{}", a.id, a.true_size()))
        .collect();
    fingerprints.sort();
    format!("{}|{}|{}", scope.key(), root.display(), fingerprints.join("|"))
}

/// Cached disk-tree scans keyed by scope and root
pub struct StorageMap {
    scanner: Arc<dyn TreeScanner>,
    cache: Option<Arc<StorageMapCache>>,
    ttl: Duration,
}

impl StorageMap {
    pub fn new(scanner: Arc<dyn TreeScanner>) -> Self {
        Self {
            scanner,
            cache: None,
            ttl: Duration::minutes(20),
        }
    }

    pub fn with_cache(mut self, cache: Arc<StorageMapCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.ttl = ttl;
        self
    }

    pub fn map(&self, scope: ScanScope, root: &Path) -> Result<Sourced<DiskNode>> {
        let key = storage_map_key(scope, root);
        if let Some(entry) = self.cache.as_ref().and_then(|c| c.load(&key, self.ttl)) {
            return Ok(Sourced {
                value: entry.payload,
                from_cache: true,
            });
        }
        self.refresh(scope, root)
    }

    /// Scan regardless of the cache, then write through
    pub fn refresh(&self, scope: ScanScope, root: &Path) -> Result<Sourced<DiskNode>> {
        tracing::info!("scanning {} ({})", root.display(), scope);
        let tree = self.scanner.scan(root)?;
        if let Some(cache) = &self.cache {
            cache.save(CacheEntry::new(storage_map_key(scope, root), tree.clone()));
        }
        Ok(Sourced {
            value: tree,
            from_cache: false,
        })
    }
}

/// Metadata → profile → semantic units → ranked recommendations
pub struct Recommender {
    metadata: MetadataDiscovery,
    inference: ProfileInferenceEngine,
    units: SemanticUnitDetector,
    ranker: RecommendationRanker,
    cache: Option<Arc<RecommendationsCache>>,
    ttl: Duration,
}

impl Recommender {
    pub fn new(metadata: MetadataDiscovery, inference: ProfileInferenceEngine, units: SemanticUnitDetector) -> Self {
        Self {
            metadata,
            inference,
            units,
            ranker: RecommendationRanker,
            cache: None,
            ttl: Duration::minutes(20),
        }
    }

    pub fn with_cache(mut self, cache: Arc<RecommendationsCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.ttl = ttl;
        self
    }

    pub fn recommend(&self, scope: ScanScope, root: &Path, apps: &[InstalledApp]) -> Sourced<RecommendationSet> {
        let key = recommendations_key(scope, root, apps);
        if let Some(entry) = self.cache.as_ref().and_then(|c| c.load(&key, self.ttl)) {
            return Sourced {
                value: entry.payload,
                from_cache: true,
            };
        }

        let metadata = self.metadata.collect(root);
        let profile = self.inference.infer_profile(apps, &metadata);
        let units = self.units.detect_units(root);
        tracing::debug!(
            "{} metadata buckets, {} units, profile {:?}",
            metadata.len(),
            units.len(),
            profile.kinds
        );
        let recommendations = self.ranker.rank(&profile, apps, &units);
        let set = RecommendationSet {
            profile,
            recommendations,
        };

        if let Some(cache) = &self.cache {
            cache.save(CacheEntry::new(key, set.clone()));
        }
        Sourced {
            value: set,
            from_cache: false,
        }
    }
}

/// Every component, wired from one [`Config`]
pub struct Services {
    pub config: Config,
    pub catalog: AppCatalogDiscoverer,
    pub artifacts: ArtifactResolver,
    pub storage: StorageMap,
    pub recommender: Recommender,
    pub units: SemanticUnitDetector,
    pub duplicates: DuplicateDetector,
    pub planner: CleanupPlanner,
    pub executor: CleanupExecutor,
    catalog_cache: Arc<CatalogCache>,
    recommendations_cache: Arc<RecommendationsCache>,
    storage_cache: Arc<StorageMapCache>,
}

impl Services {
    pub fn from_config(config: Config) -> Self {
        Self::with_layout(config, HomeLayout::current())
    }

    pub fn with_layout(config: Config, layout: HomeLayout) -> Self {
        let cache_dir = config.cache_dir();
        let t = &config.thresholds;

        let catalog_cache = Arc::new(CatalogCache::in_dir(&cache_dir, CATALOG_CACHE_FILE));
        let recommendations_cache = Arc::new(RecommendationsCache::in_dir(&cache_dir, RECOMMENDATIONS_CACHE_FILE));
        let storage_cache = Arc::new(StorageMapCache::in_dir(&cache_dir, STORAGE_MAP_CACHE_FILE));

        let storage = StorageMap::new(Arc::new(DiskTreeScanner::new(t.tree_max_depth, t.tree_max_children)))
            .with_cache(
                storage_cache.clone(),
                Duration::seconds(config.storage_map_ttl_secs as i64),
            );
        let recommender = Recommender::new(
            MetadataDiscovery::new(t.metadata_max_depth, t.metadata_max_samples, t.metadata_result_limit),
            ProfileInferenceEngine::new(),
            SemanticUnitDetector::new(t.semantic_max_depth, t.semantic_min_bytes),
        )
        .with_cache(
            recommendations_cache.clone(),
            Duration::seconds(config.recommendations_ttl_secs as i64),
        );

        Self {
            catalog: AppCatalogDiscoverer::from_config(&config, Some(catalog_cache.clone())),
            artifacts: ArtifactResolver::new(layout.clone()).with_orphan_id_min_len(t.orphan_id_min_len),
            storage,
            recommender,
            units: SemanticUnitDetector::new(t.semantic_max_depth, t.semantic_min_bytes),
            duplicates: DuplicateDetector::new(DuplicateSettings::from(t)),
            planner: CleanupPlanner,
            executor: CleanupExecutor::default().with_home(layout.home),
            catalog_cache,
            recommendations_cache,
            storage_cache,
            config,
        }
    }

    /// Artifacts under the user library owned by none of `apps`
    pub fn orphans(&self, apps: &[InstalledApp]) -> Vec<crate::apps::Artifact> {
        let known: HashSet<String> = apps.iter().map(|a| a.bundle_id.clone()).collect();
        self.artifacts.orphan_artifacts(&known)
    }

    /// Empty all three result caches
    pub fn clear_caches(&self) -> Result<()> {
        self.catalog_cache.clear()?;
        self.recommendations_cache.clear()?;
        self.storage_cache.clear()?;
        tracing::info!("caches cleared");
        Ok(())
    }
}
