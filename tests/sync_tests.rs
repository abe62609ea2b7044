//! Integration tests for export, import, status and sync

#![allow(deprecated)]

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

mod common;
use common::{init_with_tagset, tagweave_cmd, tagweave_in};

/// Upstream workspace with People: Person > Character, exported and
/// imported into a second workspace
fn shared_workspaces() -> (TempDir, TempDir, std::path::PathBuf) {
    let upstream = TempDir::new().unwrap();
    init_with_tagset(upstream.path(), "People");
    tagweave_in(upstream.path())
        .args(["tag", "add", "People", "Person"])
        .assert()
        .success();
    tagweave_in(upstream.path())
        .args(["tag", "add", "People", "Character", "--parent", "Person"])
        .assert()
        .success();

    let exchange = upstream.path().join("people.toml");
    tagweave_in(upstream.path())
        .arg("export")
        .arg("People")
        .arg(&exchange)
        .assert()
        .success();

    let local = TempDir::new().unwrap();
    tagweave_cmd().arg("init").arg(local.path()).assert().success();
    tagweave_in(local.path())
        .arg("import")
        .arg(&exchange)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported tagset People"));

    (upstream, local, exchange)
}

#[test]
fn test_export_writes_tag_tables() {
    let (_upstream, _local, exchange) = shared_workspaces();

    let content = fs::read_to_string(exchange).unwrap();
    assert!(content.contains("name = \"People\""));
    assert!(content.contains("[[tag]]"));
    assert!(content.contains("name = \"Character\""));
}

#[test]
fn test_import_twice_fails() {
    let (_upstream, local, exchange) = shared_workspaces();

    tagweave_in(local.path())
        .arg("import")
        .arg(&exchange)
        .assert()
        .failure()
        .stderr(predicate::str::contains("tagweave sync"));
}

#[test]
fn test_status_after_import_is_in_sync() {
    let (_upstream, local, exchange) = shared_workspaces();

    tagweave_in(local.path())
        .args(["status", "People", "--against"])
        .arg(&exchange)
        .assert()
        .success()
        .stdout("People is in sync\n");
}

#[test]
fn test_sync_follows_upstream_edits() {
    let (upstream, local, exchange) = shared_workspaces();

    tagweave_in(upstream.path())
        .args(["tagset", "rename", "People", "Figures"])
        .assert()
        .success();
    tagweave_in(upstream.path())
        .args(["tag", "remove", "Figures", "Character"])
        .assert()
        .success();
    tagweave_in(upstream.path())
        .args(["tag", "add", "Figures", "Place"])
        .assert()
        .success();
    tagweave_in(upstream.path())
        .arg("export")
        .arg("Figures")
        .arg(&exchange)
        .assert()
        .success();

    tagweave_in(local.path())
        .args(["sync", "People", "--dry-run", "--from"])
        .arg(&exchange)
        .assert()
        .success()
        .stdout(predicate::str::contains("People differs from the incoming copy"))
        .stdout(predicate::str::contains("1 removed"))
        .stdout(predicate::str::contains("1 added"));

    // dry run leaves the workspace untouched
    tagweave_in(local.path())
        .args(["tree", "People"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Character"));

    tagweave_in(local.path())
        .args(["sync", "People", "--from"])
        .arg(&exchange)
        .assert()
        .success()
        .stdout(predicate::str::contains("Synchronized People"))
        .stdout(predicate::str::contains("renamed to Figures"));

    tagweave_in(local.path())
        .args(["tree", "Figures"])
        .assert()
        .success()
        .stdout("Figures\n  Person #4682b4\n  Place #4682b4\n");

    tagweave_in(local.path())
        .args(["status", "Figures", "--against"])
        .arg(&exchange)
        .assert()
        .success()
        .stdout("Figures is in sync\n");
}

#[test]
fn test_sync_with_unrelated_tagset_fails() {
    let (_upstream, local, exchange) = shared_workspaces();
    tagweave_in(local.path())
        .args(["tagset", "new", "Places"])
        .assert()
        .success();

    tagweave_in(local.path())
        .args(["sync", "Places", "--from"])
        .arg(&exchange)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Incoming uuid"));
}

#[test]
fn test_sync_with_dangling_parent_fails() {
    let (_upstream, local, exchange) = shared_workspaces();
    let content = fs::read_to_string(&exchange).unwrap();
    assert!(content.contains("parent_uuid = \"\""));
    fs::write(
        &exchange,
        content.replacen("parent_uuid = \"\"", "parent_uuid = \"missing\"", 1),
    )
    .unwrap();

    tagweave_in(local.path())
        .args(["sync", "People", "--from"])
        .arg(&exchange)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
}
