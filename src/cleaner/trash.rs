use std::path::{Path, PathBuf};

use crate::common::errors::{ReclaimError, Result};

/// A recoverable removal primitive; nothing behind it deletes permanently.
pub trait Trash: Send + Sync {
    fn move_to_trash(&self, path: &Path) -> Result<()>;
}

/// The platform trash (Finder's Trash on macOS)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTrash;

impl Trash for SystemTrash {
    fn move_to_trash(&self, path: &Path) -> Result<()> {
        trash::delete(path).map_err(|e| ReclaimError::Trash {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// A directory items are relocated into, for systems without a usable trash.
///
/// Each item lands under a numbered slot so equal file names never collide.
#[derive(Debug, Clone)]
pub struct HoldingArea {
    root: PathBuf,
}

impl HoldingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn next_slot(&self) -> PathBuf {
        let taken = std::fs::read_dir(&self.root).map(|d| d.count()).unwrap_or(0);
        let mut n = taken + 1;
        loop {
            let slot = self.root.join(format!("{:06}", n));
            if !slot.exists() {
                return slot;
            }
            n += 1;
        }
    }
}

impl Trash for HoldingArea {
    fn move_to_trash(&self, path: &Path) -> Result<()> {
        let to_err = |e: std::io::Error| ReclaimError::Trash {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let metadata = std::fs::symlink_metadata(path).map_err(to_err)?;
        let slot = self.next_slot();
        std::fs::create_dir_all(&slot).map_err(to_err)?;
        let name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "item".into());
        let target = slot.join(name);

        // Rename first; copy then remove when crossing filesystems
        if std::fs::rename(path, &target).is_ok() {
            return Ok(());
        }

        if metadata.is_dir() {
            copy_dir_recursive(path, &target).map_err(to_err)?;
            std::fs::remove_dir_all(path).map_err(to_err)
        } else {
            std::fs::copy(path, &target).map_err(to_err)?;
            std::fs::remove_file(path).map_err(to_err)
        }
    }
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
