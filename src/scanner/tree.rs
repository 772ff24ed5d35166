use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use super::walker::{is_hidden, SizeAggregator};
use crate::common::errors::{ReclaimError, Result};

/// One node of a size-sorted directory tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskNode {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub is_dir: bool,
    /// Sorted by size, largest first
    #[serde(default)]
    pub children: Vec<DiskNode>,
}

impl DiskNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Breadth-first listing of descendants (the root itself excluded),
    /// bounded by depth and by the number of nodes returned.
    pub fn breadth_first(&self, max_depth: usize, limit: usize) -> Vec<&DiskNode> {
        let mut result = Vec::new();
        let mut queue: VecDeque<(&DiskNode, usize)> = VecDeque::new();
        queue.push_back((self, 0));

        while let Some((node, depth)) = queue.pop_front() {
            if result.len() >= limit {
                break;
            }
            if depth > 0 {
                result.push(node);
            }
            if depth >= max_depth {
                continue;
            }
            for child in &node.children {
                queue.push_back((child, depth + 1));
            }
        }

        result
    }
}

/// Anything that can produce a disk tree for a root
pub trait TreeScanner: Send + Sync {
    fn scan(&self, root: &Path) -> Result<DiskNode>;
}

/// Depth- and fan-out-bounded directory tree builder.
///
/// Internal node sizes are the sum of their children; nodes at the depth
/// limit and plain files are leaves measured with [`SizeAggregator`].
#[derive(Debug, Clone)]
pub struct DiskTreeScanner {
    sizes: SizeAggregator,
    max_depth: usize,
    max_children: usize,
}

struct Pending {
    path: PathBuf,
    name: String,
    is_dir: bool,
    depth: usize,
    size_bytes: u64,
    children: Vec<usize>,
}

impl Default for DiskTreeScanner {
    fn default() -> Self {
        Self::new(3, 200)
    }
}

impl DiskTreeScanner {
    pub fn new(max_depth: usize, max_children: usize) -> Self {
        Self {
            sizes: SizeAggregator,
            max_depth,
            max_children,
        }
    }

    fn is_internal(&self, pending: &Pending) -> bool {
        pending.is_dir && pending.depth < self.max_depth
    }

    /// Visible children of a directory, name-ordered and capped
    fn list_children(&self, dir: &Path) -> std::io::Result<Vec<(PathBuf, String, bool)>> {
        let mut children: Vec<(PathBuf, String, bool)> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .filter(|e| !is_hidden(&e.file_name()))
            .map(|e| {
                let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
                (e.path(), e.file_name().to_string_lossy().to_string(), is_dir)
            })
            .collect();
        children.sort_by(|a, b| a.1.cmp(&b.1));
        children.truncate(self.max_children);
        Ok(children)
    }
}

impl TreeScanner for DiskTreeScanner {
    fn scan(&self, root: &Path) -> Result<DiskNode> {
        // The requested root may itself be a link; links below it are leaves.
        let metadata = std::fs::metadata(root).map_err(|source| {
            ReclaimError::ScanRootInaccessible {
                path: root.to_path_buf(),
                source,
            }
        })?;

        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());

        // Children always land after their parent, so a reverse sweep
        // over the arena assembles the tree bottom-up.
        let mut arena = vec![Pending {
            path: root.to_path_buf(),
            name: root_name,
            is_dir: metadata.is_dir(),
            depth: 0,
            size_bytes: 0,
            children: Vec::new(),
        }];
        let mut stack = vec![0usize];

        while let Some(idx) = stack.pop() {
            if !self.is_internal(&arena[idx]) {
                arena[idx].size_bytes = self.sizes.size(&arena[idx].path);
                continue;
            }

            let children = match self.list_children(&arena[idx].path) {
                Ok(children) => children,
                Err(source) if idx == 0 => {
                    return Err(ReclaimError::ScanRootInaccessible {
                        path: root.to_path_buf(),
                        source,
                    });
                }
                Err(e) => {
                    tracing::debug!("unreadable directory {}: {}", arena[idx].path.display(), e);
                    Vec::new()
                }
            };

            let depth = arena[idx].depth + 1;
            for (path, name, is_dir) in children {
                let child_idx = arena.len();
                arena.push(Pending {
                    path,
                    name,
                    is_dir,
                    depth,
                    size_bytes: 0,
                    children: Vec::new(),
                });
                arena[idx].children.push(child_idx);
                stack.push(child_idx);
            }
        }

        let mut built: Vec<Option<DiskNode>> = Vec::with_capacity(arena.len());
        built.resize_with(arena.len(), || None);

        for idx in (0..arena.len()).rev() {
            let internal = self.is_internal(&arena[idx]);
            let pending = &mut arena[idx];

            let node = if internal {
                let mut children: Vec<DiskNode> = pending
                    .children
                    .iter()
                    .filter_map(|&child| built[child].take())
                    .collect();
                children.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then_with(|| a.name.cmp(&b.name)));
                DiskNode {
                    name: std::mem::take(&mut pending.name),
                    path: std::mem::take(&mut pending.path),
                    size_bytes: children.iter().map(|c| c.size_bytes).sum(),
                    is_dir: true,
                    children,
                }
            } else {
                DiskNode {
                    name: std::mem::take(&mut pending.name),
                    path: std::mem::take(&mut pending.path),
                    size_bytes: pending.size_bytes,
                    is_dir: pending.is_dir,
                    children: Vec::new(),
                }
            };
            built[idx] = Some(node);
        }

        built
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| ReclaimError::ScanRootInaccessible {
                path: root.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "empty scan"),
            })
    }
}
