//! Largest-item ranking and heuristic (name + size) duplicate clustering.
//!
//! Grouping never reads file contents: two files are "duplicates" when their
//! normalized names and exact sizes agree.

pub mod grouper;
pub mod large;

use serde::{Deserialize, Serialize};

pub use grouper::{normalized_name, DuplicateCandidate, DuplicateGroup};
pub use large::{LargeItem, LargeItemSource};

use crate::apps::InstalledApp;
use crate::common::Thresholds;
use crate::scanner::DiskNode;

/// Floors, caps and flatten bounds for detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSettings {
    pub large_item_min_bytes: u64,
    pub large_item_limit: usize,
    pub large_flatten_depth: usize,
    pub large_flatten_limit: usize,
    pub duplicate_min_bytes: u64,
    pub duplicate_flatten_depth: usize,
    pub duplicate_flatten_limit: usize,
    pub materiality_bytes: u64,
    pub group_limit: usize,
}

impl Default for DuplicateSettings {
    fn default() -> Self {
        Self::from(&Thresholds::default())
    }
}

impl From<&Thresholds> for DuplicateSettings {
    fn from(t: &Thresholds) -> Self {
        Self {
            large_item_min_bytes: t.large_item_min_bytes,
            large_item_limit: t.large_item_limit,
            large_flatten_depth: t.large_flatten_depth,
            large_flatten_limit: t.large_flatten_limit,
            duplicate_min_bytes: t.duplicate_min_bytes,
            duplicate_flatten_depth: t.duplicate_flatten_depth,
            duplicate_flatten_limit: t.duplicate_flatten_limit,
            materiality_bytes: t.duplicate_materiality_bytes,
            group_limit: t.duplicate_group_limit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub large_items: Vec<LargeItem>,
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    /// Bytes freed by keeping one copy of every group
    pub fn potential_reclaim(&self) -> u64 {
        self.groups.iter().map(|g| g.reclaimable_bytes()).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DuplicateDetector {
    settings: DuplicateSettings,
}

impl DuplicateDetector {
    pub fn new(settings: DuplicateSettings) -> Self {
        Self { settings }
    }

    pub fn detect(&self, apps: &[InstalledApp], disk_root: Option<&DiskNode>) -> DuplicateReport {
        let candidates = grouper::collect_candidates(apps, disk_root, &self.settings);
        let report = DuplicateReport {
            large_items: large::large_items(apps, disk_root, &self.settings),
            groups: grouper::group_candidates(candidates, &self.settings),
        };
        tracing::debug!(
            "{} large items, {} duplicate groups",
            report.large_items.len(),
            report.groups.len()
        );
        report
    }
}
