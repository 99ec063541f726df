use assert_cmd::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn shiplog(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("shiplog").unwrap();
    // Keep logs and default paths inside the test sandbox.
    cmd.env("XDG_CONFIG_HOME", config_home);
    cmd
}

fn write_entry(dir: &Path, name: &str) {
    let entry = serde_json::json!({
        "data": {"by_repo": {}, "repo_list": [], "warning": null},
        "timestamp": "2026-08-06T00:00:00Z",
        "ttl_secs": 3600,
    });
    std::fs::write(dir.join(name), serde_json::to_vec(&entry).unwrap()).unwrap();
}

#[test]
fn cache_stats_reports_an_empty_store() {
    let home = tempdir().unwrap();
    let cache = tempdir().unwrap();

    let assert = shiplog(home.path())
        .arg("--cache-dir")
        .arg(cache.path())
        .args(["cache", "stats"])
        .assert()
        .success();

    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(out.contains("Entries: 0"), "unexpected output: {out}");
}

#[test]
fn cache_stats_counts_existing_entries() {
    let home = tempdir().unwrap();
    let cache = tempdir().unwrap();
    write_entry(cache.path(), "commits-aaaaaaaaaa-1111.json");
    write_entry(cache.path(), "commits-bbbbbbbbbb-2222.json");

    let assert = shiplog(home.path())
        .arg("--cache-dir")
        .arg(cache.path())
        .args(["cache", "stats"])
        .assert()
        .success();

    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(out.contains("Entries: 2"), "unexpected output: {out}");
}

#[test]
fn cache_clear_removes_entries() {
    let home = tempdir().unwrap();
    let cache = tempdir().unwrap();
    write_entry(cache.path(), "commits-aaaaaaaaaa-1111.json");

    shiplog(home.path())
        .arg("--cache-dir")
        .arg(cache.path())
        .args(["cache", "clear"])
        .assert()
        .success();

    assert!(!cache.path().join("commits-aaaaaaaaaa-1111.json").exists());
}

#[test]
fn cache_invalidate_is_user_scoped() {
    use shiplog::cache::{CommitCache, CommitsCache};
    use shiplog::model::CommitSet;
    use std::time::Duration;

    let home = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();

    let cache = CommitsCache::open(Some(cache_dir.path().to_path_buf())).unwrap();
    let set = CommitSet::default();
    cache
        .set("alice", "2026-08-06", &set, Duration::from_secs(600))
        .unwrap();
    cache
        .set("bob", "2026-08-06", &set, Duration::from_secs(600))
        .unwrap();

    shiplog(home.path())
        .arg("--cache-dir")
        .arg(cache_dir.path())
        .args(["cache", "invalidate", "alice"])
        .assert()
        .success();

    assert!(cache.get("alice", "2026-08-06").unwrap().is_none());
    assert!(cache.get("bob", "2026-08-06").unwrap().is_some());
}

#[test]
fn help_mentions_the_cache_subcommand() {
    let home = tempdir().unwrap();
    let assert = shiplog(home.path()).arg("--help").assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(out.contains("cache"));
}
