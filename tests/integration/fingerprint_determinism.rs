//! Integration tests for fingerprint determinism

use super::test_utils::Fixture;
use filetime::{set_file_mtime, FileTime};
use ro::fingerprint;
use std::fs;
use std::time::{Duration, SystemTime};

fn node_fixture() -> Fixture {
    let fixture = Fixture::new();
    fixture.write("people/ara/attributes.yml", "name: Ara\n");
    fixture.write("people/ara/bio.md", "bio");
    fixture.write("people/ara/assets/a.png", b"png");
    fixture
}

/// Move a file's mtime well into the future so the key must change
fn touch_future(path: &std::path::Path) {
    let future = SystemTime::now() + Duration::from_secs(3600);
    set_file_mtime(path, FileTime::from_system_time(future)).unwrap();
}

#[test]
fn test_same_tree_same_fingerprint() {
    let fixture = node_fixture();
    let dir = fixture.path().join("people/ara");

    let first = fingerprint::compute(&dir).unwrap();
    let second = fingerprint::compute(&dir).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.digest.len(), 64);
}

#[test]
fn test_mtime_change_changes_fingerprint() {
    let fixture = node_fixture();
    let dir = fixture.path().join("people/ara");

    let before = fingerprint::compute(&dir).unwrap();
    touch_future(&dir.join("bio.md"));
    let after = fingerprint::compute(&dir).unwrap();
    assert_ne!(before, after);
}

#[test]
fn test_nested_change_changes_fingerprint() {
    let fixture = node_fixture();
    let dir = fixture.path().join("people/ara");

    let before = fingerprint::compute(&dir).unwrap();
    touch_future(&dir.join("assets/a.png"));
    assert_ne!(before, fingerprint::compute(&dir).unwrap());
}

#[test]
fn test_addition_and_removal_change_fingerprint() {
    let fixture = node_fixture();
    let dir = fixture.path().join("people/ara");

    let original = fingerprint::compute(&dir).unwrap();
    fixture.write("people/ara/extra.html", "extra");
    let added = fingerprint::compute(&dir).unwrap();
    assert_ne!(original, added);

    fs::remove_file(dir.join("extra.html")).unwrap();
    let removed = fingerprint::compute(&dir).unwrap();
    assert_ne!(added, removed);
}

#[test]
fn test_hidden_entries_are_ignored() {
    let fixture = node_fixture();
    let dir = fixture.path().join("people/ara");

    let before = fingerprint::compute(&dir).unwrap();
    fixture.write("people/ara/.DS_Store", "junk");
    fixture.write("people/ara/.cache/entry", "junk");
    let after = fingerprint::compute(&dir).unwrap();

    // The node directory itself is not an entry, so its own timestamp bump
    // does not count either.
    assert_eq!(before, after);
}

#[test]
fn test_fingerprint_of_missing_directory() {
    let fixture = Fixture::new();
    assert!(fingerprint::compute(&fixture.path().join("people/nobody"))
        .unwrap_err()
        .is_not_found());
}
