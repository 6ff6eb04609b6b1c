//! Integration tests for the SQLite-backed context store.

use vcontext::store::{ContextItem, ContextStore, SearchQuery, StoreError, DEFAULT_IMPORTANCE};

fn item(id: &str, content: &str) -> ContextItem {
    ContextItem {
        id: id.to_string(),
        created_at: 1_700_000_000,
        source: None,
        thread_id: None,
        role: None,
        title: None,
        content: content.to_string(),
        tags: None,
        importance: DEFAULT_IMPORTANCE,
    }
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

#[test]
fn reopen_is_idempotent_and_keeps_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested").join("ctx.db");

    {
        let store = ContextStore::open(&path).unwrap();
        store.insert(&item("keep-me", "survives a reopen")).unwrap();
    }

    let store = ContextStore::open(&path).unwrap();
    assert_eq!(store.get("keep-me").unwrap().content, "survives a reopen");

    let hits = store.search(&SearchQuery::new("reopen")).unwrap();
    assert_eq!(hits.len(), 1, "index must survive reopen without duplication");
}

#[test]
fn open_creates_parent_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("a").join("b").join("ctx.db");
    ContextStore::open(&path).unwrap();
    assert!(path.exists());
}

// ---------------------------------------------------------------------------
// Insert / get
// ---------------------------------------------------------------------------

#[test]
fn get_returns_every_field() {
    let store = ContextStore::open_in_memory().unwrap();
    let original = ContextItem {
        id: "full".into(),
        created_at: 42,
        source: Some("cli".into()),
        thread_id: Some("t-1".into()),
        role: Some("assistant".into()),
        title: Some("Deploy notes".into()),
        content: "deploy service X to cluster".into(),
        tags: Some(vec!["ops".into(), "deploy".into()]),
        importance: 5,
    };
    store.insert(&original).unwrap();
    assert_eq!(store.get("full").unwrap(), original);
}

#[test]
fn empty_strings_are_distinct_from_absent() {
    let store = ContextStore::open_in_memory().unwrap();
    let mut with_empty = item("empty-fields", "body");
    with_empty.source = Some(String::new());
    with_empty.title = Some(String::new());
    with_empty.tags = Some(vec![]);
    store.insert(&with_empty).unwrap();

    let got = store.get("empty-fields").unwrap();
    assert_eq!(got.source.as_deref(), Some(""));
    assert_eq!(got.title.as_deref(), Some(""));
    assert_eq!(got.tags, Some(vec![]));
    assert_eq!(got.role, None);
    assert_eq!(got.thread_id, None);
}

#[test]
fn absent_tags_stay_absent() {
    let store = ContextStore::open_in_memory().unwrap();
    store.insert(&item("no-tags", "body")).unwrap();
    assert_eq!(store.get("no-tags").unwrap().tags, None);
}

#[test]
fn get_unknown_id_is_not_found() {
    let store = ContextStore::open_in_memory().unwrap();
    assert!(matches!(store.get("missing"), Err(StoreError::NotFound)));
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[test]
fn inserted_item_is_immediately_searchable() {
    let store = ContextStore::open_in_memory().unwrap();
    store
        .insert(&item("deploy", "deploy service X to cluster"))
        .unwrap();

    let hits = store.search(&SearchQuery::new("deploy cluster")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "deploy");
    assert!(hits[0].snippet.contains("deploy"));
}

#[test]
fn empty_store_yields_no_results() {
    let store = ContextStore::open_in_memory().unwrap();
    let hits = store
        .search(&SearchQuery::new("nonexistent term").top_k(3))
        .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn results_are_ranked_best_first() {
    let store = ContextStore::open_in_memory().unwrap();
    store
        .insert(&item(
            "weak",
            "rust appears once in this much longer sentence about many other unrelated topics",
        ))
        .unwrap();
    store
        .insert(&item("strong", "rust rust rust compiler"))
        .unwrap();

    let hits = store.search(&SearchQuery::new("rust")).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["strong", "weak"]);
}

#[test]
fn top_k_limits_result_count() {
    let store = ContextStore::open_in_memory().unwrap();
    for i in 0..10 {
        store
            .insert(&item(&format!("n-{i}"), "common needle phrase"))
            .unwrap();
    }
    let hits = store.search(&SearchQuery::new("needle").top_k(3)).unwrap();
    assert_eq!(hits.len(), 3);
}

#[test]
fn min_importance_filters() {
    let store = ContextStore::open_in_memory().unwrap();
    for importance in 1..=5 {
        let mut it = item(&format!("imp-{importance}"), "ranked by importance");
        it.importance = importance;
        store.insert(&it).unwrap();
    }

    let hits = store
        .search(&SearchQuery::new("importance").top_k(50).min_importance(4))
        .unwrap();
    let mut ids: Vec<String> = hits.into_iter().map(|h| h.id).collect();
    ids.sort();
    assert_eq!(ids, vec!["imp-4", "imp-5"]);
}

#[test]
fn thread_filter_restricts_results() {
    let store = ContextStore::open_in_memory().unwrap();
    let mut a = item("in-thread", "shared topic words");
    a.thread_id = Some("alpha".into());
    let mut b = item("other-thread", "shared topic words");
    b.thread_id = Some("beta".into());
    let c = item("no-thread", "shared topic words");
    for it in [&a, &b, &c] {
        store.insert(it).unwrap();
    }

    let hits = store
        .search(&SearchQuery::new("topic").thread_id("alpha"))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "in-thread");
    assert_eq!(hits[0].thread_id.as_deref(), Some("alpha"));
}

#[test]
fn long_content_snippet_is_truncated_with_ellipsis() {
    let store = ContextStore::open_in_memory().unwrap();
    let filler = "lorem ipsum dolor sit amet ".repeat(20);
    let content = format!("{filler} kubernetes rollout {filler}");
    store.insert(&item("long", &content)).unwrap();

    let hits = store.search(&SearchQuery::new("kubernetes")).unwrap();
    assert_eq!(hits.len(), 1);
    let snippet = &hits[0].snippet;
    assert!(snippet.contains("kubernetes"));
    assert!(snippet.contains("..."));
    assert!(snippet.len() < content.len());
}

#[test]
fn search_projects_optional_fields() {
    let store = ContextStore::open_in_memory().unwrap();
    let mut it = item("projected", "projection check");
    it.title = Some("Title".into());
    it.source = Some("unit".into());
    it.importance = 4;
    store.insert(&it).unwrap();

    let hits = store.search(&SearchQuery::new("projection")).unwrap();
    let hit = &hits[0];
    assert_eq!(hit.title.as_deref(), Some("Title"));
    assert_eq!(hit.source.as_deref(), Some("unit"));
    assert_eq!(hit.thread_id, None);
    assert_eq!(hit.importance, 4);
    assert_eq!(hit.created_at, 1_700_000_000);
}

#[test]
fn invalid_query_syntax_is_an_error() {
    let store = ContextStore::open_in_memory().unwrap();
    store.insert(&item("x", "anything at all")).unwrap();
    let err = store.search(&SearchQuery::new("anything AND")).unwrap_err();
    assert!(matches!(err, StoreError::Sqlite(_)));
}
