//! Integration tests for cycle detection across rendered attributes

use super::test_utils::Fixture;
use ro::{LoadState, RoError};

#[test]
fn test_self_reference_is_a_cycle() {
    let fixture = Fixture::new();
    fixture.write("people/ara/bio.html", "<p>{{ node.bio }}</p>");
    let node = fixture.root().node("people/ara").unwrap();

    match node.get("bio") {
        Err(RoError::Cycle { node, chain }) => {
            assert_eq!(node, "people/ara");
            assert_eq!(chain, vec!["bio", "bio"]);
        }
        other => panic!("expected cycle, got {:?}", other),
    }
}

#[test]
fn test_transitive_cycle_reports_full_chain() {
    let fixture = Fixture::new();
    fixture.write("people/ara/a.html", "{{ node.b }}");
    fixture.write("people/ara/b.html", "{{ node.get('c') }}");
    fixture.write("people/ara/c.html", "{{ node.a }}");
    let node = fixture.root().node("people/ara").unwrap();

    match node.get("a") {
        Err(RoError::Cycle { chain, .. }) => assert_eq!(chain, vec!["a", "b", "c", "a"]),
        other => panic!("expected cycle, got {:?}", other),
    }
}

#[test]
fn test_cycle_does_not_poison_other_attributes() {
    let fixture = Fixture::new();
    fixture.write("people/ara/attributes.yml", "name: Ara\n");
    fixture.write("people/ara/bio.html", "{{ node.bio }}");
    fixture.write("people/ara/card.html", "{{ node.name }}");
    let node = fixture.root().node("people/ara").unwrap();

    assert!(matches!(node.get("bio"), Err(RoError::Cycle { .. })));
    assert_eq!(node.get("card").unwrap().unwrap().as_str(), Some("Ara"));
    assert!(matches!(node.get("bio"), Err(RoError::Cycle { .. })));
    assert!(node.load_state().is_loaded());
}

#[test]
fn test_cycle_surfaces_from_materialization() {
    let fixture = Fixture::new();
    fixture.write("people/ara/bio.html", "{{ node.bio }}");
    let node = fixture.root().node("people/ara").unwrap();

    assert!(matches!(node.as_json(), Err(RoError::Cycle { .. })));
    assert_ne!(node.load_state(), LoadState::Loading);
}

#[test]
fn test_shared_dependency_is_not_a_cycle() {
    let fixture = Fixture::new();
    fixture.write("people/ara/base.html", "base");
    fixture.write("people/ara/left.html", "{{ node.base }}-left");
    fixture.write("people/ara/right.html", "{{ node.base }}-{{ node.left }}");
    let node = fixture.root().node("people/ara").unwrap();

    assert_eq!(
        node.get("right").unwrap().unwrap().as_str(),
        Some("base-base-left")
    );
}
