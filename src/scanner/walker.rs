use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;
use walkdir::WalkDir;

/// Directory extensions macOS presents as opaque packages
const PACKAGE_EXTENSIONS: &[&str] = &[
    "app",
    "appex",
    "bundle",
    "kext",
    "plugin",
    "prefpane",
    "xpc",
    "qlgenerator",
    "mdimporter",
    "saver",
    "pkg",
    "mpkg",
    "rtfd",
    "photoslibrary",
    "musiclibrary",
    "xcarchive",
];

/// Bytes and regular-file count below a path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStats {
    pub bytes: u64,
    pub file_count: usize,
}

/// Names starting with a dot are hidden
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Whether a directory name carries a package extension
pub fn is_package_name(name: &OsStr) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            PACKAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Recursive size measurement with a fixed traversal policy.
///
/// Hidden entries and the insides of nested packages are skipped. Symlinks
/// are never followed, including one passed as the root, and count as zero.
/// Directories contribute nothing of their own. Any I/O error makes the
/// affected entry count as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeAggregator;

impl SizeAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Total bytes below `path`
    pub fn size(&self, path: &Path) -> u64 {
        self.stats(path).bytes
    }

    /// Total bytes and regular-file count below `path`
    pub fn stats(&self, path: &Path) -> PathStats {
        let root = match std::fs::symlink_metadata(path) {
            Ok(metadata) if !metadata.file_type().is_symlink() => metadata,
            _ => return PathStats::default(),
        };

        let mut stats = PathStats::default();
        let mut walker = WalkDir::new(path)
            .follow_links(false)
            .follow_root_links(false)
            .min_depth(1)
            .into_iter();

        while let Some(next) = walker.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::trace!("skipping unreadable entry under {}: {}", path.display(), e);
                    continue;
                }
            };

            let file_type = entry.file_type();
            if is_hidden(entry.file_name()) {
                if file_type.is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            }

            if file_type.is_dir() {
                if is_package_name(entry.file_name()) {
                    walker.skip_current_dir();
                }
                continue;
            }

            if file_type.is_file() {
                if let Ok(metadata) = entry.metadata() {
                    stats.bytes += metadata.len();
                    stats.file_count += 1;
                }
            }
        }

        // Single-file "bundles": the walk below a regular file is empty
        if stats.bytes == 0 && root.is_file() && root.len() > 0 {
            return PathStats {
                bytes: root.len(),
                file_count: 1,
            };
        }

        stats
    }
}
