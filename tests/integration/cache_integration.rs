//! Integration tests for cache short-circuiting of node loads

use super::test_utils::Fixture;
use filetime::{set_file_mtime, FileTime};
use ro::fingerprint::{self, Fingerprint};
use ro::template::{Renderer, TemplateRenderer};
use ro::{
    Attributes, CacheError, CacheStore, LoadSource, LoadState, MemoryCache, Node, RoError,
    SledCache, Value,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

fn cached_fixture() -> Fixture {
    let fixture = Fixture::new();
    fixture.write("people/ara/attributes.yml", "name: Ara\n");
    fixture.write("people/ara/bio.md", "{{ node.name }} writes *code*");
    fixture
}

/// Cache that fails every call and counts them
#[derive(Default)]
struct BrokenCache {
    calls: AtomicUsize,
}

impl CacheStore for BrokenCache {
    fn read(&self, _key: &Fingerprint) -> Result<Option<Attributes>, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Backend("read refused".to_string()))
    }

    fn write(&self, _key: &Fingerprint, _value: &Attributes) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Backend("write refused".to_string()))
    }
}

/// Template renderer that counts its renders
#[derive(Default)]
struct CountingRenderer {
    inner: TemplateRenderer,
    renders: AtomicUsize,
}

impl CountingRenderer {
    fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl Renderer for CountingRenderer {
    fn render(&self, path: &Path, node: &Node) -> Result<String, RoError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        self.inner.render(path, node)
    }
}

#[test]
fn test_memory_cache_hit_on_second_root() {
    let fixture = cached_fixture();
    let cache = Arc::new(MemoryCache::new());
    let engine = Arc::new(fixture.engine().with_cache(cache.clone()));

    let first = ro::Root::new(Arc::clone(&engine));
    let node = first.node("people/ara").unwrap();
    assert_eq!(node.load().unwrap(), LoadState::Loaded(LoadSource::Disk));
    assert_eq!(cache.len(), 1);

    let second = ro::Root::new(engine);
    let again = second.node("people/ara").unwrap();
    drop(node);
    drop(first);

    assert_eq!(again.load().unwrap(), LoadState::Loaded(LoadSource::Cache));
    assert_eq!(
        again.get("bio").unwrap().unwrap().as_str(),
        Some("<p>Ara writes <em>code</em></p>")
    );
}

#[test]
fn test_cache_hit_outlives_the_node_that_filled_it() {
    let fixture = cached_fixture();
    let engine = Arc::new(fixture.engine().with_cache(Arc::new(MemoryCache::new())));

    {
        let first = ro::Root::new(Arc::clone(&engine));
        first.node("people/ara").unwrap().load().unwrap();
    }

    let node = ro::Root::new(engine).node("people/ara").unwrap();
    assert_eq!(node.load().unwrap(), LoadState::Loaded(LoadSource::Cache));
    assert_eq!(
        node.get("bio").unwrap().unwrap().as_str(),
        Some("<p>Ara writes <em>code</em></p>")
    );
}

#[test]
fn test_cache_hit_reuses_computed_values_and_renders_the_rest_itself() {
    let fixture = cached_fixture();
    fixture.write("people/ara/card.html", "<b>{{ node.identifier }}</b>");
    let renderer = Arc::new(CountingRenderer::default());
    let engine = Arc::new(
        fixture
            .engine()
            .with_renderer(renderer.clone())
            .with_cache(Arc::new(MemoryCache::new())),
    );

    let first = ro::Root::new(Arc::clone(&engine)).node("people/ara").unwrap();
    first.get("bio").unwrap();
    assert_eq!(renderer.renders(), 1);

    let second = ro::Root::new(engine).node("people/ara").unwrap();
    assert_eq!(second.load().unwrap(), LoadState::Loaded(LoadSource::Cache));
    assert!(matches!(second.attributes().unwrap().get(&"bio".into()), Some(Value::Data(_))));
    second.get("bio").unwrap();
    assert_eq!(renderer.renders(), 1);

    assert_eq!(
        second.get("card").unwrap().unwrap().as_str(),
        Some("<b>people/ara</b>")
    );
    assert_eq!(renderer.renders(), 2);
    first.get("card").unwrap();
    assert_eq!(renderer.renders(), 3);
}

#[test]
fn test_cycle_on_cached_node_reports_only_its_own_keys() {
    let fixture = cached_fixture();
    fixture.write("people/ara/echo.html", "{{ node.echo }}");
    let engine = Arc::new(fixture.engine().with_cache(Arc::new(MemoryCache::new())));

    let first = ro::Root::new(Arc::clone(&engine)).node("people/ara").unwrap();
    first.get("bio").unwrap();
    assert!(matches!(first.get("echo"), Err(RoError::Cycle { .. })));

    let second = ro::Root::new(engine).node("people/ara").unwrap();
    match second.get("echo") {
        Err(RoError::Cycle { node, chain }) => {
            assert_eq!(node, "people/ara");
            assert_eq!(chain, vec!["echo".to_string(), "echo".to_string()]);
        }
        other => panic!("expected cycle, got {:?}", other),
    }
    assert_eq!(second.load_state(), LoadState::Loaded(LoadSource::Cache));
}

#[test]
fn test_sled_cache_write_does_not_render() {
    let fixture = cached_fixture();
    let db_dir = tempfile::TempDir::new().unwrap();
    let renderer = Arc::new(CountingRenderer::default());
    let cache = Arc::new(SledCache::new(db_dir.path()).unwrap());
    let engine = Arc::new(
        fixture
            .engine()
            .with_renderer(renderer.clone())
            .with_cache(cache),
    );

    let node = ro::Root::new(Arc::clone(&engine)).node("people/ara").unwrap();
    assert_eq!(node.load().unwrap(), LoadState::Loaded(LoadSource::Disk));
    assert_eq!(renderer.renders(), 0);

    let cached = ro::Root::new(engine).node("people/ara").unwrap();
    assert_eq!(cached.load().unwrap(), LoadState::Loaded(LoadSource::Cache));
    assert_eq!(renderer.renders(), 0);
    assert_eq!(
        cached.get("bio").unwrap().unwrap().as_str(),
        Some("<p>Ara writes <em>code</em></p>")
    );
    assert_eq!(renderer.renders(), 1);
}

#[test]
fn test_sled_cache_survives_reopen() {
    let fixture = cached_fixture();
    let db_dir = tempfile::TempDir::new().unwrap();

    {
        let cache = Arc::new(SledCache::new(db_dir.path()).unwrap());
        let root = fixture.root_with(fixture.engine().with_cache(cache.clone()));
        let node = root.node("people/ara").unwrap();
        assert_eq!(node.load().unwrap(), LoadState::Loaded(LoadSource::Disk));
        cache.flush().unwrap();
    }

    let cache = Arc::new(SledCache::new(db_dir.path()).unwrap());
    let root = fixture.root_with(fixture.engine().with_cache(cache));
    let node = root.node("people/ara").unwrap();

    assert_eq!(node.load().unwrap(), LoadState::Loaded(LoadSource::Cache));
    assert_eq!(node.get("name").unwrap().unwrap().as_str(), Some("Ara"));
    assert_eq!(
        node.get("bio").unwrap().unwrap().as_str(),
        Some("<p>Ara writes <em>code</em></p>")
    );
}

#[test]
fn test_cache_failures_are_swallowed() {
    let fixture = cached_fixture();
    let cache = Arc::new(BrokenCache::default());
    let root = fixture.root_with(fixture.engine().with_cache(cache.clone()));
    let node = root.node("people/ara").unwrap();

    assert_eq!(node.load().unwrap(), LoadState::Loaded(LoadSource::Disk));
    assert_eq!(node.get("name").unwrap().unwrap().as_str(), Some("Ara"));
    assert_eq!(cache.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_stale_entry_is_not_served() {
    let fixture = cached_fixture();
    let cache = Arc::new(MemoryCache::new());
    let engine = Arc::new(fixture.engine().with_cache(cache.clone()));

    let node = ro::Root::new(Arc::clone(&engine)).node("people/ara").unwrap();
    node.load().unwrap();
    let before = fingerprint::compute(node.path()).unwrap();

    let sidecar = fixture.write("people/ara/attributes.yml", "name: Ara Lee\n");
    let future = SystemTime::now() + Duration::from_secs(3600);
    set_file_mtime(&sidecar, FileTime::from_system_time(future)).unwrap();
    assert_ne!(before, fingerprint::compute(node.path()).unwrap());

    let fresh = ro::Root::new(engine).node("people/ara").unwrap();
    assert_eq!(fresh.load().unwrap(), LoadState::Loaded(LoadSource::Disk));
    assert_eq!(fresh.get("name").unwrap().unwrap().as_str(), Some("Ara Lee"));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_engine_without_cache_always_loads_from_disk() {
    let fixture = cached_fixture();
    let engine = Arc::new(
        fixture
            .engine()
            .with_cache(Arc::new(MemoryCache::new()))
            .without_cache(),
    );

    ro::Root::new(Arc::clone(&engine))
        .node("people/ara")
        .unwrap()
        .load()
        .unwrap();
    let node = ro::Root::new(engine).node("people/ara").unwrap();
    assert_eq!(node.load().unwrap(), LoadState::Loaded(LoadSource::Disk));
}
