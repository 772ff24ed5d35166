use serde::{Deserialize, Serialize};

use super::model::{GroupKind, InstalledApp, SafetyLevel};
use crate::cleaner::{CleanupPlan, CleanupPlanner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartCategoryKind {
    Applications,
    UserData,
    Caches,
    Preferences,
    SystemIntegration,
}

impl SmartCategoryKind {
    pub const ALL: [SmartCategoryKind; 5] = [
        SmartCategoryKind::Applications,
        SmartCategoryKind::UserData,
        SmartCategoryKind::Caches,
        SmartCategoryKind::Preferences,
        SmartCategoryKind::SystemIntegration,
    ];

    fn for_group(kind: GroupKind) -> Self {
        match kind {
            GroupKind::AppBundle => SmartCategoryKind::Applications,
            GroupKind::UserData => SmartCategoryKind::UserData,
            GroupKind::Cache => SmartCategoryKind::Caches,
            GroupKind::Preferences => SmartCategoryKind::Preferences,
            GroupKind::SystemIntegration => SmartCategoryKind::SystemIntegration,
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0)
    }
}

impl std::fmt::Display for SmartCategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SmartCategoryKind::Applications => write!(f, "Applications"),
            SmartCategoryKind::UserData => write!(f, "User Data"),
            SmartCategoryKind::Caches => write!(f, "Caches"),
            SmartCategoryKind::Preferences => write!(f, "Preferences"),
            SmartCategoryKind::SystemIntegration => write!(f, "System Integration"),
        }
    }
}

/// Storage totals for one category, split by safety tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartCategory {
    pub kind: SmartCategoryKind,
    pub total_bytes: u64,
    pub item_count: usize,
    pub safe_bytes: u64,
    pub review_bytes: u64,
    pub risky_bytes: u64,
}

impl SmartCategory {
    fn empty(kind: SmartCategoryKind) -> Self {
        Self {
            kind,
            total_bytes: 0,
            item_count: 0,
            safe_bytes: 0,
            review_bytes: 0,
            risky_bytes: 0,
        }
    }

    fn add(&mut self, bytes: u64, safety: SafetyLevel) {
        self.total_bytes += bytes;
        self.item_count += 1;
        match safety {
            SafetyLevel::Safe => self.safe_bytes += bytes,
            SafetyLevel::Review => self.review_bytes += bytes,
            SafetyLevel::Risky => self.risky_bytes += bytes,
        }
    }
}

/// All five categories, largest first.
///
/// Each app's bundle counts once toward Applications through its
/// `bundle_size`; the bundle's own artifact entry is not added again.
pub fn build_categories(apps: &[InstalledApp]) -> Vec<SmartCategory> {
    let mut categories: Vec<SmartCategory> = SmartCategoryKind::ALL
        .iter()
        .map(|k| SmartCategory::empty(*k))
        .collect();

    for app in apps {
        categories[SmartCategoryKind::Applications.index()].add(app.bundle_size, GroupKind::AppBundle.safety());
        for artifact in &app.artifacts {
            if artifact.kind == GroupKind::AppBundle && artifact.path == app.bundle_path {
                continue;
            }
            let kind = SmartCategoryKind::for_group(artifact.kind);
            categories[kind.index()].add(artifact.size_bytes, artifact.safety());
        }
    }

    categories.sort_by(|a, b| b.total_bytes.cmp(&a.total_bytes).then_with(|| a.kind.index().cmp(&b.kind.index())));
    categories
}

/// One plan holding every safe artifact of every app
pub fn safe_cleanup_plan(apps: &[InstalledApp]) -> CleanupPlan {
    CleanupPlanner.safe_artifacts_plan(apps)
}
