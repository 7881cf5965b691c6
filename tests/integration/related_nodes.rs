//! Integration tests for related node resolution

use super::test_utils::Fixture;
use ro::{Engine, Node, RoError};
use std::sync::Arc;

fn team_fixture() -> Fixture {
    let fixture = Fixture::new();
    fixture.write("people/ara/attributes.yml", "name: Ara\nrole: lead\n");
    fixture.write("people/mo/attributes.yml", "name: Mo\nrole: dev\n");
    fixture.write("people/jo/attributes.yml", "name: Jo\nrole: dev\n");
    fixture.write("projects/ro/attributes.yml", "name: ro\n");
    fixture.write(
        "projects/site/attributes.yml",
        "name: site\nrelated:\n  team:\n    people: [ara, mo]\n  reviewers:\n    people: mo, jo\n  projects: ro\n",
    );
    fixture
}

fn identifiers(nodes: &[Node]) -> Vec<String> {
    nodes.iter().map(Node::identifier).collect()
}

#[test]
fn test_related_follows_every_relationship_once() {
    let fixture = team_fixture();
    let root = fixture.root();
    let site = root.node("projects/site").unwrap();

    let related = site.related::<&str>(&[]).unwrap();
    assert_eq!(
        identifiers(&related),
        vec!["people/ara", "people/mo", "people/jo", "projects/ro"]
    );
    assert!(related.iter().all(|node| node.load_state().is_loaded()));
}

#[test]
fn test_related_keeps_declaration_order_of_relationships() {
    let fixture = team_fixture();
    fixture.write(
        "projects/docs/attributes.yml",
        "related:\n  zteam:\n    people: [mo]\n  advisors:\n    people: [ara]\n",
    );
    let root = fixture.root();
    let docs = root.node("projects/docs").unwrap();

    assert_eq!(
        identifiers(&docs.related::<&str>(&[]).unwrap()),
        vec!["people/mo", "people/ara"]
    );
}

#[test]
fn test_related_filter_selects_relationships() {
    let fixture = team_fixture();
    let root = fixture.root();
    let site = root.node("projects/site").unwrap();

    assert_eq!(
        identifiers(&site.related(&["team"]).unwrap()),
        vec!["people/ara", "people/mo"]
    );
    assert_eq!(
        identifiers(&site.related(&["projects"]).unwrap()),
        vec!["projects/ro"]
    );
    assert!(site.related(&["nobody"]).unwrap().is_empty());
}

#[test]
fn test_related_where_narrows_results() {
    let fixture = team_fixture();
    let root = fixture.root();
    let site = root.node("projects/site").unwrap();

    let devs = site
        .related_where(&["team", "reviewers"], |node| {
            node.get("role")
                .ok()
                .flatten()
                .and_then(|role| role.as_str().map(|r| r == "dev"))
                .unwrap_or(false)
        })
        .unwrap();
    assert_eq!(identifiers(&devs), vec!["people/mo", "people/jo"]);
}

#[test]
fn test_missing_related_nodes_are_skipped() {
    let fixture = Fixture::new();
    fixture.write("people/ara/attributes.yml", "name: Ara\n");
    fixture.write(
        "posts/hello/attributes.yml",
        "related:\n  authors:\n    people: [ghost, ara]\n",
    );
    let root = fixture.root();
    let post = root.node("posts/hello").unwrap();

    assert_eq!(identifiers(&post.related::<&str>(&[]).unwrap()), vec!["people/ara"]);
}

#[test]
fn test_node_without_related_attribute() {
    let fixture = team_fixture();
    let root = fixture.root();
    let ara = root.node("people/ara").unwrap();

    assert!(ara.related::<&str>(&[]).unwrap().is_empty());
}

#[test]
fn test_detached_node_cannot_resolve_relations() {
    let fixture = team_fixture();
    let engine = Arc::new(Engine::new(fixture.path()).unwrap());
    let detached = Node::new(fixture.path().join("projects/site"), engine).unwrap();

    assert!(matches!(
        detached.related::<&str>(&[]),
        Err(RoError::NotFound(_))
    ));
}
