use chrono::Duration;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use reclaim::apps::{
    self, AppCatalog, AppCatalogDiscoverer, ArtifactResolver, ArtifactSource, CatalogSource, GroupKind, HomeLayout,
    InstalledApp, SmartCategoryKind,
};
use reclaim::cache::{CatalogCache, CATALOG_CACHE_FILE};

const INFO_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleIdentifier</key>
    <string>com.example.editor</string>
    <key>CFBundleName</key>
    <string>Editor</string>
    <key>CFBundleDisplayName</key>
    <string>Example Editor</string>
    <key>CFBundleExecutable</key>
    <string>editor</string>
</dict>
</plist>
"#;

fn write(path: &Path, size: usize) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, vec![0u8; size]).unwrap();
}

fn make_editor(apps_root: &Path) -> PathBuf {
    let bundle = apps_root.join("Editor.app");
    write(&bundle.join("Contents/MacOS/editor"), 2048);
    std::fs::write(bundle.join("Contents/Info.plist"), INFO_PLIST).unwrap();
    bundle
}

// ─── Catalog ──────────────────────────────────────────────────────────────────

#[test]
fn test_catalog_reads_info_plist() {
    let dir = TempDir::new().unwrap();
    let bundle = make_editor(dir.path());

    let discoverer = AppCatalogDiscoverer::new(vec![dir.path().to_path_buf()]);
    let apps = discoverer.fetch_catalog(&mut |_| {}).unwrap();

    assert_eq!(apps.len(), 1);
    let app = &apps[0];
    assert_eq!(app.bundle_id, "com.example.editor");
    assert_eq!(app.display_name, "Example Editor");
    assert_eq!(app.id, format!("com.example.editor:{}", bundle.display()));
    assert_eq!(app.executable_path, Some(bundle.join("Contents/MacOS/editor")));
    assert!(app.bundle_size >= 2048);
}

#[test]
fn test_roots_listed_twice_yield_one_app() {
    let dir = TempDir::new().unwrap();
    make_editor(dir.path());

    let discoverer = AppCatalogDiscoverer::new(vec![dir.path().to_path_buf(), dir.path().to_path_buf()]);
    assert_eq!(discoverer.fetch_catalog(&mut |_| {}).unwrap().len(), 1);
}

#[test]
fn test_second_fetch_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let apps_root = dir.path().join("Applications");
    make_editor(&apps_root);

    let cache = Arc::new(CatalogCache::in_dir(&dir.path().join("cache"), CATALOG_CACHE_FILE));
    let discoverer = AppCatalogDiscoverer::new(vec![apps_root.clone()]).with_cache(
        cache.clone(),
        "catalog|test",
        Duration::minutes(15),
    );

    let first = discoverer.fetch_catalog(&mut |_| {}).unwrap();
    assert_eq!(discoverer.latest_fetch_info().source, CatalogSource::Live);

    // A new bundle is invisible until the cache expires or is refreshed
    write(&apps_root.join("Other.app/Contents/MacOS/other"), 64);

    let mut events = Vec::new();
    let second = discoverer.fetch_catalog(&mut |p| events.push(p.message)).unwrap();
    assert_eq!(first, second);
    assert_eq!(discoverer.latest_fetch_info().source, CatalogSource::Cached);
    assert_eq!(events.last().map(String::as_str), Some("Loaded cached app catalog."));

    let refreshed = discoverer.refresh(&mut |_| {}).unwrap();
    assert_eq!(refreshed.len(), 2);
    assert_eq!(discoverer.latest_fetch_info().source, CatalogSource::Live);
    assert!(cache.path().exists());
}

// ─── Artifacts ────────────────────────────────────────────────────────────────

fn editor_app(bundle: PathBuf) -> InstalledApp {
    InstalledApp {
        id: format!("com.example.editor:{}", bundle.display()),
        display_name: "Example Editor".into(),
        bundle_id: "com.example.editor".into(),
        bundle_path: bundle,
        executable_path: None,
        last_used: None,
        bundle_size: 2048,
        artifacts: Vec::new(),
    }
}

#[test]
fn test_resolver_finds_and_classifies_artifacts() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("home");
    let system = dir.path().join("system");
    let library = home.join("Library");
    let bundle = make_editor(&dir.path().join("Applications"));

    write(&library.join("Caches/com.example.editor/cache.db"), 4000);
    write(&library.join("Application Support/com.example.editor/data.sqlite"), 3000);
    write(&library.join("Preferences/com.example.editor.plist"), 100);
    write(&library.join("LaunchAgents/com.example.editor.helper.plist"), 50);
    write(&system.join("LaunchDaemons/com.example.editor.daemon.plist"), 60);
    // Empty locations are not artifacts
    std::fs::create_dir_all(library.join("Logs/Editor")).unwrap();

    let resolver = ArtifactResolver::new(HomeLayout::new(&home, &system));
    let artifacts = resolver.artifacts(&editor_app(bundle.clone()));

    let kind_of = |p: &Path| artifacts.iter().find(|a| a.path == p).map(|a| a.kind);
    assert_eq!(artifacts.len(), 6);
    assert_eq!(kind_of(&bundle), Some(GroupKind::AppBundle));
    assert_eq!(kind_of(&library.join("Caches/com.example.editor")), Some(GroupKind::Cache));
    assert_eq!(
        kind_of(&library.join("Application Support/com.example.editor")),
        Some(GroupKind::UserData)
    );
    assert_eq!(
        kind_of(&library.join("Preferences/com.example.editor.plist")),
        Some(GroupKind::Preferences)
    );
    assert_eq!(
        kind_of(&library.join("LaunchAgents/com.example.editor.helper.plist")),
        Some(GroupKind::SystemIntegration)
    );
    assert_eq!(
        kind_of(&system.join("LaunchDaemons/com.example.editor.daemon.plist")),
        Some(GroupKind::SystemIntegration)
    );
    assert!(artifacts.windows(2).all(|w| w[0].size_bytes >= w[1].size_bytes));
}

#[cfg(unix)]
#[test]
fn test_symlinked_cache_is_not_measured_through() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("home");
    let library = home.join("Library");
    let bundle = make_editor(&dir.path().join("Applications"));

    let elsewhere = dir.path().join("external/editor-cache");
    write(&elsewhere.join("blob"), 50_000);
    std::fs::create_dir_all(library.join("Caches")).unwrap();
    std::os::unix::fs::symlink(&elsewhere, library.join("Caches/com.example.editor")).unwrap();

    let resolver = ArtifactResolver::new(HomeLayout::new(&home, dir.path().join("system")));
    let artifacts = resolver.artifacts(&editor_app(bundle));

    assert!(artifacts.iter().all(|a| a.path != library.join("Caches/com.example.editor")));
    assert!(artifacts.iter().all(|a| a.size_bytes < 50_000));
}

#[test]
fn test_orphans_exclude_known_ids() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("home");
    let library = home.join("Library");

    write(&library.join("Caches/com.gone.app/blob"), 500);
    write(&library.join("Caches/com.example.editor/blob"), 500);
    write(&library.join("Preferences/com.gone.app.plist"), 20);
    write(&library.join("Caches/.DS_Store"), 10);
    write(&library.join("Caches/noidentifier/blob"), 10);

    let resolver = ArtifactResolver::new(HomeLayout::new(&home, dir.path().join("system")));
    let known: HashSet<String> = ["com.example.editor".to_string()].into_iter().collect();
    let orphans = resolver.orphan_artifacts(&known);

    let paths: Vec<&Path> = orphans.iter().map(|a| a.path.as_path()).collect();
    assert_eq!(
        paths,
        vec![
            library.join("Caches/com.gone.app").as_path(),
            library.join("Preferences/com.gone.app.plist").as_path(),
        ]
    );
}

// ─── Categories ───────────────────────────────────────────────────────────────

#[test]
fn test_categories_and_safe_plan_over_resolved_apps() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("home");
    let library = home.join("Library");
    let bundle = make_editor(&dir.path().join("Applications"));
    write(&library.join("Caches/com.example.editor/cache.db"), 4000);
    write(&library.join("Preferences/com.example.editor.plist"), 100);

    let mut installed = vec![editor_app(bundle)];
    let resolver = ArtifactResolver::new(HomeLayout::new(&home, dir.path().join("system")));
    let mut last = None;
    apps::resolve_all(&mut installed, &resolver, &mut |p| last = Some(p));
    assert_eq!(last.map(|p| p.message), Some("Artifact resolution complete.".to_string()));

    let categories = apps::build_categories(&installed);
    let caches = categories.iter().find(|c| c.kind == SmartCategoryKind::Caches).unwrap();
    assert_eq!(caches.total_bytes, 4000);
    assert_eq!(caches.safe_bytes, 4000);

    let plan = apps::safe_cleanup_plan(&installed);
    assert_eq!(plan.file_count(), 1);
    assert_eq!(plan.total_bytes(), 4000);
}
