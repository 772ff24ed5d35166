use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::plan::CleanupPlan;
use super::trash::{SystemTrash, Trash};
use crate::common::safety;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// What a plan execution actually did; partial success is normal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupExecutionResult {
    pub reclaimed_bytes: u64,
    pub removed_paths: Vec<PathBuf>,
    pub failures: Vec<CleanupFailure>,
}

impl CleanupExecutionResult {
    pub fn is_successful(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Moves planned artifacts to a [`Trash`], one item at a time.
pub struct CleanupExecutor {
    trash: Arc<dyn Trash>,
    home: PathBuf,
}

impl Default for CleanupExecutor {
    fn default() -> Self {
        Self::new(Arc::new(SystemTrash))
    }
}

impl CleanupExecutor {
    pub fn new(trash: Arc<dyn Trash>) -> Self {
        Self {
            trash,
            home: dirs::home_dir().unwrap_or_default(),
        }
    }

    /// Protected home directories are judged against `home`
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    pub fn execute(&self, plan: &CleanupPlan) -> CleanupExecutionResult {
        self.execute_with(plan, &mut |_| {})
    }

    /// Execute, reporting each path before it is attempted
    pub fn execute_with(&self, plan: &CleanupPlan, on_item: &mut dyn FnMut(&Path)) -> CleanupExecutionResult {
        let mut result = CleanupExecutionResult::default();
        let mut seen = HashSet::new();

        for artifact in plan.artifacts() {
            if !seen.insert(artifact.path.clone()) {
                continue;
            }
            // Already gone: neither removed nor failed
            if std::fs::symlink_metadata(&artifact.path).is_err() {
                tracing::debug!("skipping missing path {}", artifact.path.display());
                continue;
            }
            on_item(&artifact.path);

            if safety::is_protected_under(&artifact.path, &self.home) {
                tracing::warn!("refusing to trash protected path {}", artifact.path.display());
                result.failures.push(CleanupFailure {
                    path: artifact.path.clone(),
                    reason: "refusing to remove a protected location".to_string(),
                });
                continue;
            }

            match self.trash.move_to_trash(&artifact.path) {
                Ok(()) => {
                    result.reclaimed_bytes += artifact.size_bytes;
                    result.removed_paths.push(artifact.path.clone());
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    result.failures.push(CleanupFailure {
                        path: artifact.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "cleanup moved {} items ({} bytes), {} failures",
            result.removed_paths.len(),
            result.reclaimed_bytes,
            result.failures.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::{Artifact, GroupKind, InstalledApp};
    use crate::cleaner::{CleanupMode, CleanupPlanner, HoldingArea};
    use tempfile::TempDir;

    fn app_with(artifacts: Vec<Artifact>) -> InstalledApp {
        InstalledApp {
            id: "x".into(),
            display_name: "X".into(),
            bundle_id: "com.x".into(),
            bundle_path: PathBuf::from("/Applications/X.app"),
            executable_path: None,
            last_used: None,
            bundle_size: 0,
            artifacts,
        }
    }

    #[test]
    fn test_duplicate_paths_moved_once() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("cache.db");
        std::fs::write(&file, vec![0u8; 10]).unwrap();

        let artifact = Artifact::new(&file, GroupKind::Cache, 10, false);
        let plan = CleanupPlanner.make_plan(&app_with(vec![artifact.clone(), artifact]), CleanupMode::RemoveEverything);
        assert_eq!(plan.total_bytes(), 20);

        let executor = CleanupExecutor::new(Arc::new(HoldingArea::new(dir.path().join("holding"))))
            .with_home(dir.path().join("home"));
        let result = executor.execute(&plan);
        assert!(result.is_successful());
        assert_eq!(result.reclaimed_bytes, 10);
        assert_eq!(result.removed_paths, vec![file]);
    }

    #[test]
    fn test_protected_path_is_failure() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().to_path_buf();
        std::fs::create_dir_all(home.join("Documents")).unwrap();

        let plan = CleanupPlanner.make_plan(
            &app_with(vec![Artifact::new(home.join("Documents"), GroupKind::UserData, 5, true)]),
            CleanupMode::RemoveEverything,
        );
        let executor = CleanupExecutor::new(Arc::new(HoldingArea::new(dir.path().join("holding"))))
            .with_home(&home);
        let result = executor.execute(&plan);
        assert_eq!(result.failures.len(), 1);
        assert!(home.join("Documents").exists());
    }
}
