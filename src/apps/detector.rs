use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use walkdir::WalkDir;

use super::model::InstalledApp;
use crate::cache::{CacheEntry, CatalogCache};
use crate::common::config::Config;
use crate::common::errors::{ReclaimError, Result};
use crate::scanner::walker::{is_hidden, SizeAggregator};

/// Incremental progress of a catalog fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProgress {
    pub message: String,
    pub completed: usize,
    pub total: usize,
}

impl ScanProgress {
    pub fn new(message: impl Into<String>, completed: usize, total: usize) -> Self {
        Self {
            message: message.into(),
            completed,
            total,
        }
    }

    /// Completion in [0, 1], or `None` when the total is unknown
    pub fn fraction(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some((self.completed as f64 / self.total as f64).clamp(0.0, 1.0))
    }
}

/// Where the last catalog came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    Live,
    Cached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchInfo {
    pub source: CatalogSource,
    pub fetched_at: DateTime<Utc>,
}

impl Default for FetchInfo {
    fn default() -> Self {
        Self {
            source: CatalogSource::Live,
            fetched_at: DateTime::<Utc>::from(std::time::UNIX_EPOCH),
        }
    }
}

/// Source of the installed-application list
pub trait AppCatalog: Send + Sync {
    fn fetch_catalog(&self, progress: &mut dyn FnMut(ScanProgress)) -> Result<Vec<InstalledApp>>;

    fn latest_fetch_info(&self) -> FetchInfo;
}

/// Finds `.app` bundles under a set of roots and measures them.
pub struct AppCatalogDiscoverer {
    roots: Vec<PathBuf>,
    bundle_depth: usize,
    cask_depth: usize,
    sizes: SizeAggregator,
    cache: Option<Arc<CatalogCache>>,
    cache_key: String,
    ttl: Duration,
    last_info: Mutex<FetchInfo>,
}

impl AppCatalogDiscoverer {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        let cache_key = format!(
            "catalog|{}",
            roots
                .iter()
                .map(|r| r.display().to_string())
                .collect::<Vec<_>>()
                .join(";")
        );
        Self {
            roots,
            bundle_depth: 2,
            cask_depth: 4,
            sizes: SizeAggregator,
            cache: None,
            cache_key,
            ttl: Duration::minutes(15),
            last_info: Mutex::new(FetchInfo::default()),
        }
    }

    pub fn from_config(config: &Config, cache: Option<Arc<CatalogCache>>) -> Self {
        let mut discoverer = Self::new(config.expanded_app_roots())
            .with_depths(config.thresholds.bundle_search_depth, config.thresholds.cask_search_depth);
        if let Some(cache) = cache {
            discoverer = discoverer.with_cache(
                cache,
                config.catalog_cache_key(),
                Duration::seconds(config.catalog_ttl_secs as i64),
            );
        }
        discoverer
    }

    pub fn with_depths(mut self, bundle_depth: usize, cask_depth: usize) -> Self {
        self.bundle_depth = bundle_depth;
        self.cask_depth = cask_depth;
        self
    }

    pub fn with_cache(mut self, cache: Arc<CatalogCache>, key: impl Into<String>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_key = key.into();
        self.ttl = ttl;
        self
    }

    fn set_info(&self, info: FetchInfo) {
        *self.last_info.lock().unwrap_or_else(|e| e.into_inner()) = info;
    }

    /// Walk the roots regardless of any cached entry, then write through.
    pub fn refresh(&self, progress: &mut dyn FnMut(ScanProgress)) -> Result<Vec<InstalledApp>> {
        progress(ScanProgress::new("Discovering installed apps...", 0, 1));

        let bundles = self.discover_bundles()?;
        let total = bundles.len();
        if total == 0 {
            progress(ScanProgress::new("No installed apps found in scanned locations.", 1, 1));
        }

        let mut apps = Vec::with_capacity(total);
        for (index, bundle) in bundles.iter().enumerate() {
            progress(ScanProgress::new(format!("Measuring {}...", stem(bundle)), index, total));
            apps.push(self.describe(bundle));
            progress(ScanProgress::new(
                format!("Processed {} of {} apps", index + 1, total),
                index + 1,
                total,
            ));
        }

        let entry = CacheEntry::new(self.cache_key.clone(), apps.clone());
        let fetched_at = entry.created_at;
        if let Some(cache) = &self.cache {
            cache.save(entry);
        }
        self.set_info(FetchInfo {
            source: CatalogSource::Live,
            fetched_at,
        });

        let done = total.max(1);
        progress(ScanProgress::new("App discovery complete.", done, done));
        tracing::info!("discovered {} apps", total);
        Ok(apps)
    }

    /// Bundle paths across all roots, de-duplicated by resolved path
    fn discover_bundles(&self) -> Result<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let mut bundles = Vec::new();
        let mut readable_roots = 0usize;
        let mut last_error = None;

        for root in self.roots.iter().filter(|r| r.exists()) {
            if let Err(source) = std::fs::read_dir(root) {
                tracing::warn!("cannot read app root {}: {}", root.display(), source);
                last_error = Some((root.clone(), source));
                continue;
            }
            readable_roots += 1;

            let depth = if root.to_string_lossy().contains("Caskroom") {
                self.cask_depth
            } else {
                self.bundle_depth
            };

            for bundle in scan_for_bundles(root, depth) {
                let resolved = std::fs::canonicalize(&bundle).unwrap_or_else(|_| bundle.clone());
                if seen.insert(resolved) {
                    bundles.push(bundle);
                }
            }
        }

        if readable_roots == 0 {
            if let Some((path, source)) = last_error {
                return Err(ReclaimError::ScanRootInaccessible { path, source });
            }
        }

        bundles.sort_by(|a, b| {
            file_name_lower(a)
                .cmp(&file_name_lower(b))
                .then_with(|| a.cmp(b))
        });
        Ok(bundles)
    }

    fn describe(&self, bundle: &Path) -> InstalledApp {
        let name = stem(bundle);
        let info = read_info_plist(bundle);
        let info_str = |key: &str| {
            info.as_ref()
                .and_then(|d| d.get(key))
                .and_then(|v| v.as_string())
                .map(str::to_string)
                .filter(|s| !s.is_empty())
        };

        let bundle_id = info_str("CFBundleIdentifier")
            .unwrap_or_else(|| format!("unknown.{}", name.to_lowercase()));
        let display_name = info_str("CFBundleDisplayName")
            .or_else(|| info_str("CFBundleName"))
            .unwrap_or_else(|| name.clone());
        let executable_path = info_str("CFBundleExecutable")
            .map(|exe| bundle.join("Contents/MacOS").join(exe))
            .filter(|p| p.exists());
        let last_used = std::fs::metadata(bundle)
            .and_then(|m| m.accessed())
            .ok()
            .map(DateTime::<Utc>::from);

        InstalledApp {
            id: format!("{}:{}", bundle_id, bundle.display()),
            display_name,
            bundle_id,
            bundle_path: bundle.to_path_buf(),
            executable_path,
            last_used,
            bundle_size: self.sizes.size(bundle),
            artifacts: Vec::new(),
        }
    }
}

impl AppCatalog for AppCatalogDiscoverer {
    fn fetch_catalog(&self, progress: &mut dyn FnMut(ScanProgress)) -> Result<Vec<InstalledApp>> {
        progress(ScanProgress::new("Preparing app catalog scan...", 0, 1));

        if let Some(cache) = &self.cache {
            if let Some(entry) = cache.load(&self.cache_key, self.ttl) {
                self.set_info(FetchInfo {
                    source: CatalogSource::Cached,
                    fetched_at: entry.created_at,
                });
                progress(ScanProgress::new("Loaded cached app catalog.", 1, 1));
                return Ok(entry.payload);
            }
        }

        self.refresh(progress)
    }

    fn latest_fetch_info(&self) -> FetchInfo {
        *self.last_info.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// `.app` directories up to `max_depth` below `root`, not descending into them
fn scan_for_bundles(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|e| !is_hidden(e.file_name()));

    while let Some(next) = walker.next() {
        let Ok(entry) = next else { continue };
        let is_app = entry
            .path()
            .extension()
            .map(|e| e.eq_ignore_ascii_case("app"))
            .unwrap_or(false);
        if is_app {
            found.push(entry.path().to_path_buf());
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
        }
    }
    found
}

fn read_info_plist(bundle: &Path) -> Option<plist::Dictionary> {
    ["Contents/Info.plist", "Info.plist"]
        .iter()
        .map(|rel| bundle.join(rel))
        .find(|p| p.exists())
        .and_then(|p| match plist::Value::from_file(&p) {
            Ok(value) => value.into_dictionary(),
            Err(e) => {
                tracing::debug!("unreadable Info.plist {}: {}", p.display(), e);
                None
            }
        })
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
