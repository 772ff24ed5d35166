use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Binary isolated under its own data directory
fn reclaim(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("reclaim").unwrap();
    cmd.env("RECLAIM_HOME", home).env_remove("RECLAIM_LOG");
    cmd
}

fn write_config(home: &Path, contents: &str) {
    std::fs::create_dir_all(home).unwrap();
    std::fs::write(home.join("config.toml"), contents).unwrap();
}

// ─── Help & version ──────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    reclaim(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apps"))
        .stdout(predicate::str::contains("uninstall"))
        .stdout(predicate::str::contains("orphans"))
        .stdout(predicate::str::contains("map"))
        .stdout(predicate::str::contains("dups"))
        .stdout(predicate::str::contains("units"))
        .stdout(predicate::str::contains("recommend"))
        .stdout(predicate::str::contains("categories"));
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    reclaim(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reclaim"));
}

#[test]
fn test_unknown_scope_rejected() {
    let home = TempDir::new().unwrap();
    reclaim(home.path())
        .args(["map", "--scope", "moon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown scope"));
}

// ─── Units ───────────────────────────────────────────────────────────────────

#[test]
fn test_units_json() {
    let home = TempDir::new().unwrap();
    write_config(home.path(), "[thresholds]\nsemantic_min_bytes = 100\n");

    let project = TempDir::new().unwrap();
    let modules = project.path().join("web/node_modules/left-pad");
    std::fs::create_dir_all(&modules).unwrap();
    std::fs::write(modules.join("index.js"), vec![0u8; 2048]).unwrap();

    reclaim(home.path())
        .args(["units", project.path().to_str().unwrap(), "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"node_modules\""))
        .stdout(predicate::str::contains("\"total_bytes\": 2048"));
}

#[test]
fn test_units_missing_path_fails() {
    let home = TempDir::new().unwrap();
    reclaim(home.path())
        .args(["units", "/definitely/not/here/reclaim"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path does not exist"));
}

// ─── Apps ────────────────────────────────────────────────────────────────────

#[test]
fn test_uninstall_unknown_app_fails() {
    let home = TempDir::new().unwrap();
    let apps = home.path().join("Applications");
    write_config(
        home.path(),
        &format!("app_roots = [\"{}\"]\n", apps.display()),
    );

    reclaim(home.path())
        .args(["uninstall", "NoSuchApp", "--dry-run", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No installed application matches"));
}

// ─── Config & cache ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_and_reset() {
    let home = TempDir::new().unwrap();
    write_config(home.path(), "catalog_ttl_secs = 42\n");

    reclaim(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("catalog_ttl_secs = 42"));

    reclaim(home.path()).args(["config", "reset"]).assert().success();

    reclaim(home.path())
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"catalog_ttl_secs\": 900"));
}

#[test]
fn test_cache_clear() {
    let home = TempDir::new().unwrap();
    let cache = home.path().join("cache");
    std::fs::create_dir_all(&cache).unwrap();
    std::fs::write(cache.join("storage-map-cache.json"), "{}").unwrap();

    reclaim(home.path()).args(["cache", "clear"]).assert().success();
    assert!(!cache.join("storage-map-cache.json").exists());
}
