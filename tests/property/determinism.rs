//! Property-based tests for fingerprint determinism

use proptest::prelude::*;
use ro::fingerprint;
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

fn file_names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-z]{1,8}(\\.[a-z]{1,3})?", 1..8)
}

/// Same tree, same digest; one more file, different digest
#[test]
fn test_fingerprint_determinism_property() {
    let mut runner = proptest::test_runner::TestRunner::new(ProptestConfig::with_cases(32));

    runner
        .run(&file_names(), |names| {
            let temp_dir = TempDir::new().unwrap();
            for name in &names {
                fs::write(temp_dir.path().join(name), name.as_bytes()).unwrap();
            }

            let first = fingerprint::compute(temp_dir.path()).unwrap();
            let second = fingerprint::compute(temp_dir.path()).unwrap();
            prop_assert_eq!(&first, &second);

            fs::write(temp_dir.path().join("zz-extra"), b"extra").unwrap();
            let third = fingerprint::compute(temp_dir.path()).unwrap();
            prop_assert_ne!(&first, &third);
            Ok(())
        })
        .unwrap();
}

/// Entry names are part of the scan, sorted, whatever the creation order
#[test]
fn test_scan_is_sorted_property() {
    let mut runner = proptest::test_runner::TestRunner::new(ProptestConfig::with_cases(32));

    runner
        .run(&file_names(), |names| {
            let temp_dir = TempDir::new().unwrap();
            for name in names.iter().rev() {
                fs::write(temp_dir.path().join(name), b"x").unwrap();
            }

            let scanned: Vec<String> = fingerprint::scan(temp_dir.path())
                .into_iter()
                .map(|(relative, _)| relative)
                .collect();
            let expected: Vec<String> = names.into_iter().collect();
            prop_assert_eq!(scanned, expected);
            Ok(())
        })
        .unwrap();
}
