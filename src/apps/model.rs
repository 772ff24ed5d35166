use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Coarse risk tier guiding which artifacts qualify for low-friction cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    /// Caches and logs, regenerated on demand
    Safe,
    /// Preferences, bundles, and user data
    Review,
    /// Launch agents, daemons, preference panes
    Risky,
}

impl std::fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyLevel::Safe => write!(f, "safe"),
            SafetyLevel::Review => write!(f, "review"),
            SafetyLevel::Risky => write!(f, "risky"),
        }
    }
}

/// What role a path plays for its application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    AppBundle,
    UserData,
    Cache,
    Preferences,
    SystemIntegration,
}

impl GroupKind {
    pub const ALL: [GroupKind; 5] = [
        GroupKind::AppBundle,
        GroupKind::UserData,
        GroupKind::Cache,
        GroupKind::Preferences,
        GroupKind::SystemIntegration,
    ];

    /// Safety is a pure function of the group kind.
    pub fn safety(self) -> SafetyLevel {
        match self {
            GroupKind::Cache => SafetyLevel::Safe,
            GroupKind::Preferences | GroupKind::AppBundle | GroupKind::UserData => {
                SafetyLevel::Review
            }
            GroupKind::SystemIntegration => SafetyLevel::Risky,
        }
    }
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKind::AppBundle => write!(f, "App Bundle"),
            GroupKind::UserData => write!(f, "User Data"),
            GroupKind::Cache => write!(f, "Cache"),
            GroupKind::Preferences => write!(f, "Preferences"),
            GroupKind::SystemIntegration => write!(f, "System Integration"),
        }
    }
}

/// A path judged to belong to an application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: GroupKind,
    pub size_bytes: u64,
    pub is_dir: bool,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, kind: GroupKind, size_bytes: u64, is_dir: bool) -> Self {
        Self {
            path: path.into(),
            kind,
            size_bytes,
            is_dir,
        }
    }

    pub fn safety(&self) -> SafetyLevel {
        self.kind.safety()
    }
}

/// Non-owning view of an app's artifacts sharing one kind
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactGroup<'a> {
    pub kind: GroupKind,
    pub artifacts: Vec<&'a Artifact>,
}

impl ArtifactGroup<'_> {
    pub fn total_bytes(&self) -> u64 {
        self.artifacts.iter().map(|a| a.size_bytes).sum()
    }
}

/// An installed application bundle and what it left around the disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledApp {
    /// `<bundle id>:<bundle path>`, unique within one scan
    pub id: String,
    pub display_name: String,
    pub bundle_id: String,
    pub bundle_path: PathBuf,
    pub executable_path: Option<PathBuf>,
    pub last_used: Option<DateTime<Utc>>,
    pub bundle_size: u64,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl InstalledApp {
    /// Total footprint: bundle plus every resolved artifact
    pub fn true_size(&self) -> u64 {
        self.bundle_size + self.artifact_bytes()
    }

    pub fn artifact_bytes(&self) -> u64 {
        self.artifacts.iter().map(|a| a.size_bytes).sum()
    }

    /// Artifacts grouped by kind, largest group first
    pub fn grouped_artifacts(&self) -> Vec<ArtifactGroup<'_>> {
        let mut by_kind: BTreeMap<GroupKind, Vec<&Artifact>> = BTreeMap::new();
        for artifact in &self.artifacts {
            by_kind.entry(artifact.kind).or_default().push(artifact);
        }

        let mut groups: Vec<ArtifactGroup<'_>> = by_kind
            .into_iter()
            .map(|(kind, mut artifacts)| {
                artifacts.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
                ArtifactGroup { kind, artifacts }
            })
            .collect();
        groups.sort_by(|a, b| b.total_bytes().cmp(&a.total_bytes()));
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with(artifacts: Vec<Artifact>) -> InstalledApp {
        InstalledApp {
            id: "com.example.app:/Applications/Example.app".into(),
            display_name: "Example".into(),
            bundle_id: "com.example.app".into(),
            bundle_path: PathBuf::from("/Applications/Example.app"),
            executable_path: None,
            last_used: None,
            bundle_size: 1_000,
            artifacts,
        }
    }

    #[test]
    fn test_safety_follows_kind() {
        assert_eq!(GroupKind::Cache.safety(), SafetyLevel::Safe);
        assert_eq!(GroupKind::Preferences.safety(), SafetyLevel::Review);
        assert_eq!(GroupKind::AppBundle.safety(), SafetyLevel::Review);
        assert_eq!(GroupKind::UserData.safety(), SafetyLevel::Review);
        assert_eq!(GroupKind::SystemIntegration.safety(), SafetyLevel::Risky);
    }

    #[test]
    fn test_true_size_adds_artifacts() {
        let app = app_with(vec![
            Artifact::new("/a", GroupKind::Cache, 200, true),
            Artifact::new("/b", GroupKind::UserData, 300, true),
        ]);
        assert_eq!(app.true_size(), 1_500);
    }

    #[test]
    fn test_grouped_artifacts_sorted_by_total() {
        let app = app_with(vec![
            Artifact::new("/c1", GroupKind::Cache, 100, true),
            Artifact::new("/u1", GroupKind::UserData, 250, true),
            Artifact::new("/c2", GroupKind::Cache, 300, true),
        ]);
        let groups = app.grouped_artifacts();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].kind, GroupKind::Cache);
        assert_eq!(groups[0].total_bytes(), 400);
        assert_eq!(groups[0].artifacts[0].path, PathBuf::from("/c2"));
        assert_eq!(groups[1].total_bytes(), 250);
    }
}
