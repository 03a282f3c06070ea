//! End-to-end flows through MediaLibrary on a SQLite file.

use mediadex_config::DatabaseConfig;
use mediadex_core::{ContentKind, MediaRecord};
use mediadex_search::{LibraryError, MatchIndicator, MediaLibrary, PageView, Reply};
use mediadex_store::{MediaStore, StoreError};
use tempfile::TempDir;

fn setup_library() -> (TempDir, MediaLibrary) {
    let dir = tempfile::tempdir().unwrap();
    let store = MediaStore::open(&DatabaseConfig::sqlite(dir.path().join("media.db"))).unwrap();
    store.ensure_schema().unwrap();
    (dir, MediaLibrary::new(store))
}

fn record(name: &str, uid: &str, kind: ContentKind) -> MediaRecord {
    MediaRecord::new(name, format!("file-{uid}"), uid, kind)
}

fn seed_episodes(lib: &mut MediaLibrary, count: usize) {
    for i in 0..count {
        let rec = record(&format!("Show.S01E{i:02}.mkv"), &format!("ep{i}"), ContentKind::Video);
        lib.receive_media(100, rec).unwrap();
    }
    // Discard the batch so only the stored records remain.
    lib.handle_callback(100, "done").unwrap();
}

fn expect_page(reply: Reply) -> PageView {
    match reply {
        Reply::Page(view) => view,
        other => panic!("expected a page, got {other:?}"),
    }
}

#[test]
fn test_search_filter_matches_all_terms() {
    let (_dir, mut lib) = setup_library();
    lib.receive_media(1, record("Dune.2021.mkv", "u1", ContentKind::Video))
        .unwrap();
    lib.receive_media(1, record("Dune.Part.Two.mkv", "u2", ContentKind::Video))
        .unwrap();

    let view = expect_page(lib.search(2, "/search dune 2021").unwrap());
    assert_eq!(view.indicator, MatchIndicator::MatchFound);
    assert_eq!(view.entries.len(), 1);
    assert_eq!(view.entries[0].name, "Dune.2021.mkv");
    assert_eq!(view.entries[0].token, "search#u1");
}

#[test]
fn test_pagination_and_clamping() {
    let (_dir, mut lib) = setup_library();
    seed_episodes(&mut lib, 25);

    let first = expect_page(lib.search(5, "show").unwrap());
    assert_eq!(first.page_count, 3);
    assert_eq!(first.entries.len(), 10);
    assert!(first.shows_navigation());

    let second = expect_page(lib.handle_callback(5, "next#0").unwrap());
    assert_eq!(second.page, 1);
    let third = expect_page(lib.handle_callback(5, "next#1").unwrap());
    assert_eq!(third.entries.len(), 5);

    // Past the last page re-renders the last page.
    let still_third = expect_page(lib.handle_callback(5, "next#2").unwrap());
    assert_eq!(still_third, third);

    // Before the first page re-renders the first page.
    let still_first = expect_page(lib.handle_callback(5, "back#0").unwrap());
    assert_eq!(still_first, first);
    assert_eq!(
        lib.sessions().get(5).unwrap().browsing.as_ref().unwrap().page,
        0
    );
}

#[test]
fn test_empty_result_is_single_page() {
    let (_dir, mut lib) = setup_library();
    seed_episodes(&mut lib, 3);

    let view = expect_page(lib.search(1, "/search nothing").unwrap());
    assert!(view.entries.is_empty());
    assert_eq!(view.page_count, 1);
    assert_eq!(view.indicator, MatchIndicator::NoMatch);
    assert_eq!(view.indicator.label(), "MATCH NOT FOUND");
    assert!(!view.shows_navigation());
}

#[test]
fn test_deliver_record_from_token() {
    let (_dir, mut lib) = setup_library();
    let doc = record("Manual.pdf", "doc-1", ContentKind::Document);
    lib.receive_media(1, doc.clone()).unwrap();

    // A single term may span dots when it equals the whole space-separated name.
    let view = expect_page(lib.search(1, "manual.pdf").unwrap());
    let token = view.entries[0].token.clone();
    assert_eq!(lib.handle_callback(1, &token).unwrap(), Reply::Deliver(doc));

    assert!(matches!(
        lib.handle_callback(1, "search#missing"),
        Err(LibraryError::Store(StoreError::RecordNotFound(_)))
    ));
}

#[test]
fn test_replay_destroys_batch() {
    let (_dir, mut lib) = setup_library();
    let a = record("a.mkv", "a", ContentKind::Video);
    let b = record("b.pdf", "b", ContentKind::Document);
    lib.receive_media(9, a.clone()).unwrap();
    lib.receive_media(9, b.clone()).unwrap();
    lib.receive_media(10, record("c.mkv", "c", ContentKind::Video))
        .unwrap();

    assert_eq!(
        lib.handle_callback(9, "ftr_btn").unwrap(),
        Reply::Replay(vec![a, b])
    );
    assert!(matches!(
        lib.handle_callback(9, "ftr_btn"),
        Err(LibraryError::NoPendingBatch(9))
    ));
    // The other requester's batch is untouched.
    assert!(lib.sessions().get(10).unwrap().pending.is_some());
}

#[test]
fn test_done_closes_only_that_requester() {
    let (_dir, mut lib) = setup_library();
    seed_episodes(&mut lib, 12);
    lib.search(1, "show").unwrap();
    lib.search(2, "show").unwrap();
    lib.receive_media(1, record("x.mkv", "x", ContentKind::Video))
        .unwrap();

    assert_eq!(lib.handle_callback(1, "done").unwrap(), Reply::Closed);
    assert!(lib.sessions().get(1).is_none());
    assert!(matches!(
        lib.handle_callback(1, "next#0"),
        Err(LibraryError::NoActiveSearch(1))
    ));
    assert_eq!(expect_page(lib.handle_callback(2, "next#0").unwrap()).page, 1);
}

#[test]
fn test_bad_tokens_do_not_touch_state() {
    let (_dir, mut lib) = setup_library();
    seed_episodes(&mut lib, 12);
    lib.search(1, "show").unwrap();

    assert!(matches!(
        lib.handle_callback(1, "rewind#0"),
        Err(LibraryError::UnknownAction(_))
    ));
    assert!(matches!(
        lib.handle_callback(1, "next#x"),
        Err(LibraryError::MalformedToken { .. })
    ));
    assert!(lib.sessions().get(1).unwrap().browsing.is_some());
}

#[test]
fn test_reply_serializes_for_ui() {
    let (_dir, mut lib) = setup_library();
    let reply = lib
        .receive_media(1, record("a.mkv", "a", ContentKind::Video))
        .unwrap();
    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["reply"], "prompt");
    assert_eq!(json["body"]["pending"], 1);
    assert_eq!(json["body"]["saved"], "stored");
}
