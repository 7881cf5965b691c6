//! Integration tests for asset lookup and url expansion

use super::test_utils::Fixture;
use ro::RoError;

fn asset_fixture() -> Fixture {
    let fixture = Fixture::new();
    fixture.write("people/ara/attributes.yml", "name: Ara\n");
    fixture.write("people/ara/assets/profile-pic.jpg", b"jpg");
    fixture.write("people/ara/assets/docs/cv.pdf", b"pdf");
    fixture.write("people/ara/assets/.hidden.png", b"png");
    fixture
}

#[test]
fn test_fuzzy_name_finds_asset() {
    let fixture = asset_fixture();
    let node = fixture.root().node("people/ara").unwrap();

    let asset = node.asset_for("profile_pic").unwrap();
    assert_eq!(asset.relative_path(), "profile-pic.jpg");
    assert!(asset.url().unwrap().ends_with("/people/ara/assets/profile-pic.jpg"));
}

#[test]
fn test_exact_and_nested_names() {
    let fixture = asset_fixture();
    let node = fixture.root().node("people/ara").unwrap();

    assert_eq!(
        node.asset_for("profile-pic.jpg").unwrap().relative_path(),
        "profile-pic.jpg"
    );
    assert_eq!(node.asset_for("docs/cv").unwrap().relative_path(), "docs/cv.pdf");
}

#[test]
fn test_missing_asset() {
    let fixture = asset_fixture();
    let node = fixture.root().node("people/ara").unwrap();

    assert!(matches!(node.asset_for("nothing"), Err(RoError::NotFound(_))));
    assert!(node.asset_for_opt("nothing").is_none());
}

#[test]
fn test_asset_listing_skips_hidden_files() {
    let fixture = asset_fixture();
    let node = fixture.root().node("people/ara").unwrap();

    let names: Vec<String> = node.assets().iter().map(|a| a.relative_path()).collect();
    assert_eq!(names, vec!["docs/cv.pdf", "profile-pic.jpg"]);
    assert_eq!(
        node.asset_urls().unwrap(),
        vec![
            "/ro/people/ara/assets/docs/cv.pdf",
            "/ro/people/ara/assets/profile-pic.jpg",
        ]
    );
}

#[test]
fn test_malformed_markup_is_rewritten_leniently() {
    let fixture = asset_fixture();
    fixture.write(
        "people/ara/photo.html",
        "<div><img src=\"assets/profile-pic.jpg\"><br></div>",
    );
    let node = fixture.root().node("people/ara").unwrap();

    assert_eq!(
        node.get("photo").unwrap().unwrap().as_str(),
        Some("<div><img src='/ro/people/ara/assets/profile-pic.jpg'><br></div>")
    );
}

#[test]
fn test_reference_to_missing_asset_fails_render() {
    let fixture = asset_fixture();
    fixture.write("people/ara/photo.html", "<img src=\"assets/gone.jpg\"/>");
    let node = fixture.root().node("people/ara").unwrap();

    assert!(matches!(
        node.get("photo"),
        Err(RoError::StrategyExhausted { .. })
    ));
}

#[test]
fn test_asset_url_from_template() {
    let fixture = asset_fixture();
    fixture.write("people/ara/cv.html", "{{ node.asset_url('docs/cv') }}");
    let node = fixture.root().node("people/ara").unwrap();

    assert_eq!(
        node.get("cv").unwrap().unwrap().as_str(),
        Some("/ro/people/ara/assets/docs/cv.pdf")
    );
}
