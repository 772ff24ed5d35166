//! Filesystem measurement: recursive sizing, bounded disk trees, semantic
//! folder detection and file-pattern sampling.

pub mod metadata;
pub mod semantic;
pub mod tree;
pub mod walker;

pub use metadata::{FileMetadata, MetadataDiscovery};
pub use semantic::{SemanticCleanupUnit, SemanticUnitDetector};
pub use tree::{DiskNode, DiskTreeScanner, TreeScanner};
pub use walker::{PathStats, SizeAggregator};
