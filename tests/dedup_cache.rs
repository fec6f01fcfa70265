// tests/dedup_cache.rs
//
// Bounded FIFO dedup cache: eviction order, idempotent remember, snapshot
// persistence.

use market_news_relay::ingest::dedup::{dedup_keys, load_snapshot, save_snapshot};
use market_news_relay::{Article, DedupCache};

#[test]
fn capacity_plus_one_inserts_evict_only_the_first() {
    let cap = 5;
    let mut c = DedupCache::new(cap);
    for i in 0..=cap {
        assert!(c.remember(format!("id{i}")));
    }
    assert_eq!(c.len(), cap);
    assert!(!c.seen("id0"));
    for i in 1..=cap {
        assert!(c.seen(&format!("id{i}")), "id{i} should survive");
    }
}

#[test]
fn size_never_exceeds_capacity() {
    let mut c = DedupCache::new(3);
    for i in 0..50 {
        c.remember(format!("k{i}"));
        assert!(c.len() <= 3);
    }
    assert_eq!(c.snapshot(), vec!["k47", "k48", "k49"]);
}

#[test]
fn remembering_twice_is_a_no_op() {
    let mut c = DedupCache::new(3);
    c.remember("a");
    c.remember("b");
    assert!(!c.remember("a"));
    c.remember("c");
    c.remember("d");
    // "a" kept its original slot, so it is the one evicted.
    assert!(!c.seen("a"));
    assert_eq!(c.snapshot(), vec!["b", "c", "d"]);
}

#[test]
fn zero_capacity_is_clamped() {
    let mut c = DedupCache::new(0);
    assert_eq!(c.capacity(), 1);
    c.remember("x");
    c.remember("y");
    assert_eq!(c.snapshot(), vec!["y"]);
}

#[test]
fn keys_cover_url_and_optional_title() {
    let a = Article {
        url: Some(" https://x.test/1 ".into()),
        title: "Rates  Hold".into(),
        ..Article::default()
    };
    assert_eq!(dedup_keys(&a, false), vec!["url:https://x.test/1".to_string()]);

    let with_title = dedup_keys(&a, true);
    assert_eq!(with_title.len(), 2);
    let title_key = &with_title[1];
    assert!(title_key.starts_with("title:"));
    assert_eq!(title_key.len(), "title:".len() + 16);

    let b = Article {
        url: None,
        title: "rates hold".into(),
        ..Article::default()
    };
    assert_eq!(dedup_keys(&b, true), vec![title_key.clone()]);
}

#[tokio::test]
async fn snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("dedup.json");

    let mut c = DedupCache::new(3);
    for id in ["a", "b", "c", "d"] {
        c.remember(id);
    }
    save_snapshot(&path, &c).await.unwrap();

    let restored = DedupCache::from_ids(3, load_snapshot(&path).await);
    assert_eq!(restored.snapshot(), c.snapshot());
    assert!(!restored.seen("a"));
    assert!(restored.seen("d"));
}

#[tokio::test]
async fn missing_or_corrupt_snapshot_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_snapshot(&dir.path().join("absent.json")).await.is_empty());

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{not json").unwrap();
    assert!(load_snapshot(&bad).await.is_empty());
}
