use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

use super::walker::{is_hidden, is_package_name};

/// Files sharing a parent directory and extension, aggregated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Parent directory of the bucket
    pub path: String,
    pub size_bytes: u64,
    pub file_count: usize,
    /// Depth (relative to the walk root) of the last file seen
    pub depth: usize,
    /// Lower-cased extension, or `none`
    pub extension: String,
}

#[derive(Default)]
struct Bucket {
    bytes: u64,
    count: usize,
    depth: usize,
}

/// Bounded file-pattern sampling used as profile evidence
#[derive(Debug, Clone)]
pub struct MetadataDiscovery {
    max_depth: usize,
    max_samples: usize,
    result_limit: usize,
}

impl Default for MetadataDiscovery {
    fn default() -> Self {
        Self::new(5, 2_500, 300)
    }
}

impl MetadataDiscovery {
    pub fn new(max_depth: usize, max_samples: usize, result_limit: usize) -> Self {
        Self {
            max_depth,
            max_samples,
            result_limit,
        }
    }

    pub fn collect(&self, root: &Path) -> Vec<FileMetadata> {
        if !root.exists() {
            return Vec::new();
        }

        let mut buckets: BTreeMap<(String, String), Bucket> = BTreeMap::new();
        let mut sampled = 0usize;

        let walker = WalkDir::new(root)
            .follow_links(false)
            .min_depth(1)
            .max_depth(self.max_depth)
            .into_iter()
            .filter_entry(|e| {
                !is_hidden(e.file_name()) && !(e.file_type().is_dir() && is_package_name(e.file_name()))
            });

        for entry in walker.filter_map(|e| e.ok()) {
            if sampled >= self.max_samples {
                break;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };

            sampled += 1;
            let extension = entry
                .path()
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "none".to_string());
            let parent = entry
                .path()
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| root.display().to_string());

            let bucket = buckets.entry((parent, extension)).or_default();
            bucket.bytes += metadata.len();
            bucket.count += 1;
            bucket.depth = entry.depth();
        }

        let mut results: Vec<FileMetadata> = buckets
            .into_iter()
            .map(|((path, extension), bucket)| FileMetadata {
                path,
                size_bytes: bucket.bytes,
                file_count: bucket.count,
                depth: bucket.depth,
                extension,
            })
            .collect();
        results.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
        results.truncate(self.result_limit);
        results
    }
}
