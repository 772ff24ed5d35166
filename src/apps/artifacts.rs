use glob::{MatchOptions, Pattern};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use super::model::{Artifact, GroupKind, InstalledApp};
use crate::scanner::walker::{is_hidden, SizeAggregator};

/// Library locations holding per-app files, keyed by bundle id
const BUNDLE_ID_TEMPLATES: &[&str] = &[
    "Application Support/{}",
    "Caches/{}",
    "Preferences/{}.plist",
    "Saved Application State/{}.savedState",
    "Containers/{}",
    "HTTPStorages/{}",
    "WebKit/{}",
    "Logs/{}",
];

/// Library locations keyed by the bundle's file stem
const APP_NAME_TEMPLATES: &[&str] = &["Application Support/{}", "Caches/{}", "Logs/{}"];

/// System library locations keyed by the bundle's file stem
const SYSTEM_NAME_TEMPLATES: &[&str] = &["Application Support/{}", "PreferencePanes/{}.prefPane"];

/// Roots whose entries are matched on a bundle-id substring
const USER_SCAN_DIRS: &[&str] = &["Group Containers", "LaunchAgents"];
const SYSTEM_SCAN_DIRS: &[&str] = &["LaunchAgents", "LaunchDaemons"];

/// Top-level roots searched for leftovers of uninstalled apps
const ORPHAN_ROOTS: &[&str] = &["Containers", "Caches", "Application Support", "Preferences"];

/// Ordered path-substring rules; the first hit wins
const CLASSIFICATION_RULES: &[(&[&str], GroupKind)] = &[
    (&["/Caches/", "/Logs/"], GroupKind::Cache),
    (&["/Preferences/"], GroupKind::Preferences),
    (
        &["/LaunchAgents/", "/LaunchDaemons/", "/PreferencePanes/"],
        GroupKind::SystemIntegration,
    ),
];

/// The home and system library roots artifact templates expand against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLayout {
    pub home: PathBuf,
    pub system_library: PathBuf,
}

impl HomeLayout {
    pub fn new(home: impl Into<PathBuf>, system_library: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            system_library: system_library.into(),
        }
    }

    /// The running user's layout
    pub fn current() -> Self {
        Self::new(dirs::home_dir().unwrap_or_default(), "/Library")
    }

    pub fn user_library(&self) -> PathBuf {
        self.home.join("Library")
    }
}

/// Anything that can associate paths with applications
pub trait ArtifactSource: Send + Sync {
    fn artifacts(&self, app: &InstalledApp) -> Vec<Artifact>;

    fn orphan_artifacts(&self, known_ids: &HashSet<String>) -> Vec<Artifact>;
}

/// Classify a path by convention, relative to the owning bundle.
pub fn classify(path: &Path, bundle_path: &Path) -> GroupKind {
    if !bundle_path.as_os_str().is_empty() && path == bundle_path {
        return GroupKind::AppBundle;
    }
    let text = path.to_string_lossy();
    CLASSIFICATION_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| text.contains(n)))
        .map(|(_, kind)| *kind)
        .unwrap_or(GroupKind::UserData)
}

/// Bundle-id-shaped token from an entry name, if it looks like one
pub fn extract_bundle_id(name: &str, min_len: usize) -> Option<String> {
    let token = name.strip_suffix(".plist").unwrap_or(name);
    if token.contains('.') && token.chars().count() > min_len {
        Some(token.to_string())
    } else {
        None
    }
}

/// Resolves conventional side-effect locations for apps and finds orphans.
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    layout: HomeLayout,
    sizes: SizeAggregator,
    orphan_id_min_len: usize,
}

impl ArtifactResolver {
    pub fn new(layout: HomeLayout) -> Self {
        Self {
            layout,
            sizes: SizeAggregator,
            orphan_id_min_len: 6,
        }
    }

    pub fn with_orphan_id_min_len(mut self, min_len: usize) -> Self {
        self.orphan_id_min_len = min_len;
        self
    }

    pub fn layout(&self) -> &HomeLayout {
        &self.layout
    }

    /// Every location an app could own, before existence checks
    fn candidate_paths(&self, app: &InstalledApp) -> BTreeSet<PathBuf> {
        let user_library = self.layout.user_library();
        let bundle_id = app.bundle_id.as_str();
        let app_name = app
            .bundle_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut paths = BTreeSet::new();
        paths.insert(app.bundle_path.clone());

        if !bundle_id.is_empty() {
            for template in BUNDLE_ID_TEMPLATES {
                paths.insert(user_library.join(template.replace("{}", bundle_id)));
            }
        }
        if !app_name.is_empty() {
            for template in APP_NAME_TEMPLATES {
                paths.insert(user_library.join(template.replace("{}", &app_name)));
            }
            for template in SYSTEM_NAME_TEMPLATES {
                paths.insert(self.layout.system_library.join(template.replace("{}", &app_name)));
            }
        }

        if !bundle_id.is_empty() {
            let scan_dirs = USER_SCAN_DIRS
                .iter()
                .map(|d| user_library.join(d))
                .chain(SYSTEM_SCAN_DIRS.iter().map(|d| self.layout.system_library.join(d)));
            for dir in scan_dirs {
                paths.extend(matching_entries(&dir, bundle_id));
            }
        }

        paths
    }

    fn measure(&self, path: PathBuf, bundle_path: &Path) -> Option<Artifact> {
        let metadata = std::fs::symlink_metadata(&path).ok()?;
        let size = self.sizes.size(&path);
        if size == 0 {
            return None;
        }
        let kind = classify(&path, bundle_path);
        Some(Artifact::new(path, kind, size, metadata.is_dir()))
    }
}

impl ArtifactSource for ArtifactResolver {
    fn artifacts(&self, app: &InstalledApp) -> Vec<Artifact> {
        let mut artifacts: Vec<Artifact> = self
            .candidate_paths(app)
            .into_iter()
            .filter_map(|path| self.measure(path, &app.bundle_path))
            .collect();

        sort_by_size(&mut artifacts);
        tracing::debug!("{}: {} artifacts", app.display_name, artifacts.len());
        artifacts
    }

    fn orphan_artifacts(&self, known_ids: &HashSet<String>) -> Vec<Artifact> {
        let user_library = self.layout.user_library();
        let mut artifacts = Vec::new();

        for root in ORPHAN_ROOTS.iter().map(|r| user_library.join(r)) {
            let entries = match std::fs::read_dir(&root) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            for entry in entries.filter_map(|e| e.ok()) {
                let name = entry.file_name();
                if is_hidden(&name) {
                    continue;
                }
                let Some(bundle_id) = extract_bundle_id(&name.to_string_lossy(), self.orphan_id_min_len) else {
                    continue;
                };
                if known_ids.contains(&bundle_id) {
                    continue;
                }
                if let Some(artifact) = self.measure(entry.path(), Path::new("")) {
                    artifacts.push(artifact);
                }
            }
        }

        sort_by_size(&mut artifacts);
        artifacts
    }
}

/// Entries of `dir` whose name contains `token`, case-insensitively
fn matching_entries(dir: &Path, token: &str) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let pattern = format!(
        "{}/*{}*",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(token)
    );
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    match glob::glob_with(&pattern, options) {
        Ok(paths) => paths.filter_map(|p| p.ok()).collect(),
        Err(e) => {
            tracing::debug!("bad glob {}: {}", pattern, e);
            Vec::new()
        }
    }
}

fn sort_by_size(artifacts: &mut [Artifact]) {
    artifacts.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then_with(|| a.path.cmp(&b.path)));
}
