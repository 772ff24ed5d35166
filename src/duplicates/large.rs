use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::DuplicateSettings;
use crate::apps::InstalledApp;
use crate::scanner::DiskNode;

/// Where a large item was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LargeItemSource {
    Bundle,
    Artifact,
    Disk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeItem {
    pub id: String,
    pub title: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub is_dir: bool,
    pub source: LargeItemSource,
    pub source_bundle_id: Option<String>,
}

fn title_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "/".to_string())
}

/// Bundles, artifacts and disk leaves over the floor, largest first
pub fn large_items(apps: &[InstalledApp], disk_root: Option<&DiskNode>, settings: &DuplicateSettings) -> Vec<LargeItem> {
    let mut items: Vec<LargeItem> = Vec::new();

    for app in apps {
        items.push(LargeItem {
            id: format!("bundle:{}", app.id),
            title: app.display_name.clone(),
            path: app.bundle_path.clone(),
            size_bytes: app.bundle_size,
            is_dir: true,
            source: LargeItemSource::Bundle,
            source_bundle_id: Some(app.bundle_id.clone()),
        });
        for artifact in &app.artifacts {
            items.push(LargeItem {
                id: format!("artifact:{}|{}", artifact.path.display(), app.bundle_id),
                title: title_of(&artifact.path),
                path: artifact.path.clone(),
                size_bytes: artifact.size_bytes,
                is_dir: artifact.is_dir,
                source: LargeItemSource::Artifact,
                source_bundle_id: Some(app.bundle_id.clone()),
            });
        }
    }

    if let Some(root) = disk_root {
        // Leaves only: an internal node's bytes are already its children's
        let nodes = root.breadth_first(settings.large_flatten_depth, settings.large_flatten_limit);
        for node in nodes
            .into_iter()
            .filter(|n| n.is_leaf() && n.size_bytes > settings.large_item_min_bytes)
        {
            items.push(LargeItem {
                id: format!("disk:{}", node.path.display()),
                title: if node.name.is_empty() { "/".to_string() } else { node.name.clone() },
                path: node.path.clone(),
                size_bytes: node.size_bytes,
                is_dir: node.is_dir,
                source: LargeItemSource::Disk,
                source_bundle_id: None,
            });
        }
    }

    items.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then_with(|| a.id.cmp(&b.id)));
    items.truncate(settings.large_item_limit);
    items
}
