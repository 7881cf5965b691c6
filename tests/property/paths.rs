//! Property-based tests for path joining, keys, slugs and query strings

use proptest::prelude::*;
use ro::path;
use ro::urls::query_string_for;
use ro::KeyPath;

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,10}"
}

proptest! {
    #[test]
    fn join_never_has_empty_segments(parts in prop::collection::vec("[a-z./]{0,12}", 0..6)) {
        let joined = path::join(&parts);
        prop_assert!(!joined.starts_with('/'));
        prop_assert!(!joined.ends_with('/'));
        prop_assert!(!joined.contains("//"));
        prop_assert!(joined.split('/').all(|s| s != "." && s != ".."));
    }

    #[test]
    fn join_is_associative(a in segment(), b in segment(), c in segment()) {
        let left = path::join(&[path::join(&[a.as_str(), b.as_str()]), c.clone()]);
        let right = path::join(&[a.clone(), path::join(&[b.as_str(), c.as_str()])]);
        prop_assert_eq!(left, right);
    }

    #[test]
    fn absolute_is_rooted(parts in prop::collection::vec(segment(), 0..5)) {
        let absolute = path::absolute(&parts);
        prop_assert!(absolute.starts_with('/'));
        prop_assert_eq!(&absolute[1..], path::join(&parts));
    }

    #[test]
    fn file_key_keeps_directories_and_stem(
        dirs in prop::collection::vec("[a-z]{1,6}", 0..3),
        stem in "[a-z]{1,6}",
        extensions in prop::collection::vec("[a-z]{1,4}", 0..3),
    ) {
        let mut file = stem.clone();
        for extension in &extensions {
            file.push('.');
            file.push_str(extension);
        }
        let mut relative = dirs.clone();
        relative.push(file);

        let key = KeyPath::for_file(&relative.join("/"));
        let mut expected = dirs;
        expected.push(stem);
        prop_assert_eq!(key.segments(), expected.as_slice());
    }

    #[test]
    fn slug_is_lowercase_words(name in "\\PC{0,24}") {
        let slug = path::slug_for(&name);
        prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
        prop_assert_eq!(path::slug_for(&slug), slug.clone());
    }

    #[test]
    fn query_string_is_order_independent(
        params in prop::collection::btree_map("[a-z]{1,5}", prop::collection::vec("[a-z ]{0,5}", 1..3), 0..5),
    ) {
        let forward: Vec<(String, Vec<String>)> = params.clone().into_iter().collect();
        let mut backward = forward.clone();
        backward.reverse();

        let a = query_string_for(&forward);
        let b = query_string_for(&backward);
        let mut pairs_a: Vec<&str> = a.split('&').collect();
        let mut pairs_b: Vec<&str> = b.split('&').collect();
        pairs_a.sort();
        pairs_b.sort();
        prop_assert_eq!(pairs_a, pairs_b);
        prop_assert!(!a.contains(' '));
    }
}
