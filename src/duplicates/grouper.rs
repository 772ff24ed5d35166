use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use super::DuplicateSettings;
use crate::apps::InstalledApp;
use crate::scanner::DiskNode;

/// Trailing version or hash-looking runs: `_v2`, `-3`, ` 1 2`, `_a1b2c3d4`
static VERSION_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[_\-\s](?:v)?\d+|[_\-\s][0-9a-f]{6,})+$").expect("static regex is valid")
});

/// A file that may have same-named, same-sized twins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Bundle id of the owning app, when the file is an app artifact
    pub source_bundle_id: Option<String>,
}

/// Candidates sharing a normalized name and an exact size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// `<normalized name>|<size>`
    pub key: String,
    pub name: String,
    pub total_bytes: u64,
    /// Sorted by path
    pub members: Vec<DuplicateCandidate>,
}

impl DuplicateGroup {
    /// Bytes freed by keeping only the first member
    pub fn reclaimable_bytes(&self) -> u64 {
        let kept = self.members.first().map(|m| m.size_bytes).unwrap_or(0);
        self.total_bytes.saturating_sub(kept)
    }
}

/// Lower-cased file stem with trailing version/hash suffixes removed
pub fn normalized_name(path: &Path) -> String {
    let base = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let reduced = VERSION_SUFFIX.replace(&base, "");
    if reduced.is_empty() {
        base
    } else {
        reduced.into_owned()
    }
}

/// Non-directory artifacts first, then disk leaves; each path appears once.
pub fn collect_candidates(
    apps: &[InstalledApp],
    disk_root: Option<&DiskNode>,
    settings: &DuplicateSettings,
) -> Vec<DuplicateCandidate> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut candidates = Vec::new();

    for app in apps {
        for artifact in app.artifacts.iter().filter(|a| !a.is_dir) {
            if seen.insert(artifact.path.clone()) {
                candidates.push(DuplicateCandidate {
                    path: artifact.path.clone(),
                    size_bytes: artifact.size_bytes,
                    source_bundle_id: Some(app.bundle_id.clone()),
                });
            }
        }
    }

    if let Some(root) = disk_root {
        let nodes = root.breadth_first(settings.duplicate_flatten_depth, settings.duplicate_flatten_limit);
        for node in nodes
            .into_iter()
            .filter(|n| !n.is_dir && n.size_bytes > settings.duplicate_min_bytes)
        {
            if seen.insert(node.path.clone()) {
                candidates.push(DuplicateCandidate {
                    path: node.path.clone(),
                    size_bytes: node.size_bytes,
                    source_bundle_id: None,
                });
            }
        }
    }

    candidates
}

/// Group candidates by `(normalized name, size)` and keep the material groups
pub fn group_candidates(candidates: Vec<DuplicateCandidate>, settings: &DuplicateSettings) -> Vec<DuplicateGroup> {
    let mut by_key: BTreeMap<(String, u64), Vec<DuplicateCandidate>> = BTreeMap::new();
    for candidate in candidates {
        let name = normalized_name(&candidate.path);
        by_key.entry((name, candidate.size_bytes)).or_default().push(candidate);
    }

    let mut groups: Vec<DuplicateGroup> = by_key
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|((name, size), mut members)| {
            members.sort_by(|a, b| a.path.cmp(&b.path));
            DuplicateGroup {
                key: format!("{}|{}", name, size),
                total_bytes: members.iter().map(|m| m.size_bytes).sum(),
                name,
                members,
            }
        })
        .filter(|g| {
            g.total_bytes > settings.materiality_bytes || g.members.iter().any(|m| m.source_bundle_id.is_some())
        })
        .collect();

    groups.sort_by(|a, b| b.total_bytes.cmp(&a.total_bytes).then_with(|| a.key.cmp(&b.key)));
    groups.truncate(settings.group_limit);
    groups
}
