//! # reclaim
//!
//! Offline storage intelligence for macOS.
//!
//! reclaim discovers installed applications and everything they leave
//! behind, and maps where disk space goes. It features:
//!
//! - **True app size**: bundle plus caches, containers, preferences and launch agents
//! - **Orphan detection**: leftovers from apps that are no longer installed
//! - **Storage maps**: bounded, size-sorted directory trees, cached per scope
//! - **Heuristic duplicates**: name and size clustering without reading file contents
//! - **Semantic units**: node_modules, DerivedData, checkpoints and friends, sized as one target
//! - **Profile-aware ranking**: recommendations biased toward what the user appears to do
//! - **Reversible cleanup**: everything goes to the Trash, never deleted outright

pub mod apps;
pub mod cache;
pub mod cleaner;
pub mod cli;
pub mod common;
pub mod duplicates;
pub mod pipeline;
pub mod profiles;
pub mod scanner;
