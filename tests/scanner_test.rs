use std::path::Path;
use tempfile::TempDir;

use reclaim::common::format;
use reclaim::common::ReclaimError;
use reclaim::scanner::{DiskNode, DiskTreeScanner, MetadataDiscovery, SemanticUnitDetector, SizeAggregator, TreeScanner};

fn write(path: &Path, size: usize) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, vec![0u8; size]).unwrap();
}

// ─── Format tests ─────────────────────────────────────────────────────────────

#[test]
fn test_format_size_boundaries() {
    assert_eq!(format::format_size(0), "0 B");
    assert_eq!(format::format_size(1023), "1023 B");
    assert_eq!(format::format_size(1024), "1.0 KB");
    assert_eq!(format::format_size(1024 * 1024), "1.00 MB");
    assert!(format::format_size(u64::MAX).contains("TB"));
}

#[test]
fn test_format_path_without_home() {
    assert_eq!(format::format_path(Path::new("/tmp/test.txt")), "/tmp/test.txt");
}

// ─── Size aggregation ─────────────────────────────────────────────────────────

#[test]
fn test_missing_path_measures_zero() {
    let stats = SizeAggregator::new().stats(Path::new("/definitely/not/here/reclaim"));
    assert_eq!(stats.bytes, 0);
    assert_eq!(stats.file_count, 0);
}

#[test]
fn test_hidden_and_package_contents_skipped() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("visible.bin"), 100);
    write(&dir.path().join(".hidden/blob"), 1000);
    write(&dir.path().join("Nested.app/Contents/MacOS/exe"), 500);

    let stats = SizeAggregator::new().stats(dir.path());
    assert_eq!(stats.bytes, 100);
    assert_eq!(stats.file_count, 1);
}

#[test]
fn test_single_file_size() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("archive.zip");
    write(&file, 777);
    assert_eq!(SizeAggregator::new().size(&file), 777);
}

// ─── Disk tree ────────────────────────────────────────────────────────────────

#[test]
fn test_file_root_is_a_leaf_with_raw_size() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("disk.img");
    write(&file, 4096);

    let node = DiskTreeScanner::new(0, 200).scan(&file).unwrap();
    assert!(node.children.is_empty());
    assert_eq!(node.size_bytes, 4096);
    assert_eq!(node.name, "disk.img");
}

#[test]
fn test_depth_zero_directory_root_is_measured_whole() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("a/b/c.bin"), 300);
    write(&dir.path().join("d.bin"), 200);

    let node = DiskTreeScanner::new(0, 200).scan(dir.path()).unwrap();
    assert!(node.children.is_empty());
    assert_eq!(node.size_bytes, 500);
}

#[test]
fn test_internal_nodes_sum_children_and_sort_largest_first() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("small/x"), 10);
    write(&dir.path().join("large/y"), 1000);
    write(&dir.path().join("large/deeper/z"), 500);
    write(&dir.path().join("medium.bin"), 100);

    let root = DiskTreeScanner::default().scan(dir.path()).unwrap();

    fn check(node: &DiskNode) {
        if !node.children.is_empty() {
            assert_eq!(node.size_bytes, node.children.iter().map(|c| c.size_bytes).sum::<u64>());
            for pair in node.children.windows(2) {
                assert!(pair[0].size_bytes >= pair[1].size_bytes);
            }
            node.children.iter().for_each(check);
        }
    }
    check(&root);

    assert_eq!(root.size_bytes, 1610);
    let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["large", "medium.bin", "small"]);
}

#[test]
fn test_fan_out_cap() {
    let dir = TempDir::new().unwrap();
    for i in 0..10 {
        write(&dir.path().join(format!("f{:02}", i)), 10);
    }
    let root = DiskTreeScanner::new(3, 4).scan(dir.path()).unwrap();
    assert_eq!(root.children.len(), 4);
    assert_eq!(root.size_bytes, 40);
}

#[test]
fn test_missing_root_is_an_error() {
    let err = DiskTreeScanner::default()
        .scan(Path::new("/definitely/not/here/reclaim"))
        .unwrap_err();
    assert!(matches!(err, ReclaimError::ScanRootInaccessible { .. }));
}

// ─── Semantic units & metadata ────────────────────────────────────────────────

#[test]
fn test_semantic_units_found_and_not_nested() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("web/node_modules/react/index.js"), 5000);
    write(&dir.path().join("web/node_modules/pkg/node_modules/inner.js"), 1000);
    write(&dir.path().join("ml/checkpoints/epoch1.pt"), 9000);
    write(&dir.path().join("ml/tiny/dist/bundle.js"), 5);

    let units = SemanticUnitDetector::new(6, 100).detect_units(dir.path());
    assert_eq!(units.len(), 2);
    assert_eq!(units[0].title, "checkpoints");
    assert_eq!(units[0].total_bytes, 9000);
    assert_eq!(units[1].title, "node_modules");
    assert_eq!(units[1].total_bytes, 6000);
    assert_eq!(units[1].file_count, 2);
}

#[test]
fn test_metadata_buckets_by_parent_and_extension() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("runs/a.pt"), 300);
    write(&dir.path().join("runs/b.pt"), 200);
    write(&dir.path().join("runs/notes"), 10);
    write(&dir.path().join(".cache/hidden.pt"), 999);

    let buckets = MetadataDiscovery::default().collect(dir.path());
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].extension, "pt");
    assert_eq!(buckets[0].size_bytes, 500);
    assert_eq!(buckets[0].file_count, 2);
    assert_eq!(buckets[1].extension, "none");
}
