use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::walker::{is_hidden, is_package_name, SizeAggregator};
use crate::apps::SafetyLevel;

/// Bulky folder markers, checked in order against lower-cased directory names
const MARKERS: &[(&str, &str)] = &[
    ("checkpoints", "Training checkpoints can grow quickly."),
    ("node_modules", "Dependency folder is often reproducible."),
    (".next", "Build cache for Next.js projects."),
    (".build", "Build output cache folder."),
    ("deriveddata", "Xcode derived data can be safely regenerated."),
    ("dist", "Build artifacts folder."),
];

/// A pattern-recognized folder sized as a single cleanup target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticCleanupUnit {
    pub title: String,
    pub path: PathBuf,
    pub total_bytes: u64,
    pub file_count: usize,
    pub risk: SafetyLevel,
    pub reason: String,
}

impl SemanticCleanupUnit {
    pub fn id(&self) -> String {
        self.path.display().to_string()
    }
}

fn match_marker(name: &str) -> Option<&'static str> {
    let name = name.to_lowercase();
    MARKERS
        .iter()
        .find(|(marker, _)| name == *marker || name.contains(marker))
        .map(|(_, reason)| *reason)
}

/// Finds dependency, build-cache and checkpoint folders below a root
#[derive(Debug, Clone)]
pub struct SemanticUnitDetector {
    sizes: SizeAggregator,
    max_depth: usize,
    min_bytes: u64,
}

impl Default for SemanticUnitDetector {
    fn default() -> Self {
        Self::new(6, 20_000_000)
    }
}

impl SemanticUnitDetector {
    pub fn new(max_depth: usize, min_bytes: u64) -> Self {
        Self {
            sizes: SizeAggregator,
            max_depth,
            min_bytes,
        }
    }

    /// Matched units above the size floor, largest first
    pub fn detect_units(&self, root: &Path) -> Vec<SemanticCleanupUnit> {
        if !root.exists() {
            return Vec::new();
        }

        let mut units = Vec::new();
        let mut walker = WalkDir::new(root)
            .follow_links(false)
            .min_depth(1)
            .max_depth(self.max_depth)
            .into_iter();

        while let Some(next) = walker.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            match match_marker(&name) {
                Some(reason) => {
                    walker.skip_current_dir();
                    let stats = self.sizes.stats(entry.path());
                    if stats.bytes <= self.min_bytes {
                        continue;
                    }
                    units.push(SemanticCleanupUnit {
                        title: name.to_string(),
                        path: entry.path().to_path_buf(),
                        total_bytes: stats.bytes,
                        file_count: stats.file_count,
                        risk: SafetyLevel::Review,
                        reason: reason.to_string(),
                    });
                }
                None if is_hidden(entry.file_name()) || is_package_name(entry.file_name()) => {
                    walker.skip_current_dir();
                }
                None => {}
            }
        }

        tracing::debug!("{} semantic units under {}", units.len(), root.display());
        units.sort_by(|a, b| b.total_bytes.cmp(&a.total_bytes).then_with(|| a.path.cmp(&b.path)));
        units
    }
}
