use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::apps::{Artifact, GroupKind, InstalledApp, SafetyLevel};

/// Which of an app's artifacts a cleanup selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupMode {
    RemoveEverything,
    KeepUserData,
}

impl CleanupMode {
    pub fn selects(self, artifact: &Artifact) -> bool {
        match self {
            CleanupMode::RemoveEverything => true,
            CleanupMode::KeepUserData => artifact.kind != GroupKind::UserData,
        }
    }
}

impl std::fmt::Display for CleanupMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanupMode::RemoveEverything => write!(f, "remove everything"),
            CleanupMode::KeepUserData => write!(f, "keep user data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupCandidate {
    pub app: InstalledApp,
    pub mode: CleanupMode,
    pub selected: Vec<Artifact>,
}

/// Ordered candidates; totals count every selection, duplicates included
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanupPlan {
    pub candidates: Vec<CleanupCandidate>,
}

impl CleanupPlan {
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.candidates.iter().flat_map(|c| c.selected.iter())
    }

    pub fn total_bytes(&self) -> u64 {
        self.artifacts().map(|a| a.size_bytes).sum()
    }

    pub fn file_count(&self) -> usize {
        self.artifacts().count()
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }
}

/// Pure plan construction; nothing here touches the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupPlanner;

impl CleanupPlanner {
    pub fn make_plan(&self, app: &InstalledApp, mode: CleanupMode) -> CleanupPlan {
        let selected = app
            .artifacts
            .iter()
            .filter(|a| mode.selects(a))
            .cloned()
            .collect();
        CleanupPlan {
            candidates: vec![CleanupCandidate {
                app: app.clone(),
                mode,
                selected,
            }],
        }
    }

    /// Leftovers of uninstalled apps, wrapped in a synthetic owner
    pub fn orphan_plan(&self, orphans: Vec<Artifact>) -> CleanupPlan {
        let owner = synthetic_app("orphans", "Orphaned Data", "orphans", orphans);
        self.make_plan(&owner, CleanupMode::RemoveEverything)
    }

    /// Every safe-tier artifact across the given apps
    pub fn safe_artifacts_plan(&self, apps: &[InstalledApp]) -> CleanupPlan {
        let safe: Vec<Artifact> = apps
            .iter()
            .flat_map(|app| app.artifacts.iter())
            .filter(|a| a.safety() == SafetyLevel::Safe)
            .cloned()
            .collect();
        let owner = synthetic_app(
            "smart-category-safe-clean",
            "Smart Category Safe Clean",
            "internal.smart.safe.clean",
            safe,
        );
        self.make_plan(&owner, CleanupMode::RemoveEverything)
    }
}

fn synthetic_app(id: &str, name: &str, bundle_id: &str, artifacts: Vec<Artifact>) -> InstalledApp {
    InstalledApp {
        id: id.to_string(),
        display_name: name.to_string(),
        bundle_id: bundle_id.to_string(),
        bundle_path: PathBuf::from("/"),
        executable_path: None,
        last_used: None,
        bundle_size: 0,
        artifacts,
    }
}
