use std::path::PathBuf;
use std::thread;

use serde_json::json;
use tempfile::TempDir;
use vector_store::config::Config;
use vector_store::embedding::hash_embedding;
use vector_store::models::Metadata;
use vector_store::store::VectorStore;

fn setup_store() -> (TempDir, VectorStore) {
    let tmp = TempDir::new().unwrap();
    let store = VectorStore::open(Config::hashed(db_path(&tmp))).unwrap();
    (tmp, store)
}

fn db_path(tmp: &TempDir) -> PathBuf {
    tmp.path().join("vector_db").join("vectors.sqlite")
}

fn meta(value: serde_json::Value) -> Metadata {
    value.as_object().cloned().unwrap()
}

fn source_contents(store: &VectorStore, source_id: &str) -> Vec<String> {
    store
        .source_chunks(source_id)
        .unwrap()
        .into_iter()
        .map(|c| c.content)
        .collect()
}

#[test]
fn test_empty_store() {
    let (_tmp, store) = setup_store();
    assert_eq!(store.count().unwrap(), 0);
    assert!(store.query("anything", 5).unwrap().is_empty());
}

#[test]
fn test_store_created_lazily() {
    let (tmp, store) = setup_store();
    assert!(!db_path(&tmp).exists());
    assert_eq!(store.count().unwrap(), 0);
    assert!(db_path(&tmp).exists());
}

#[test]
fn test_ingest_count_delete() {
    let (_tmp, store) = setup_store();

    let stored = store
        .ingest("DOC", "para one\n\npara two", &Metadata::new())
        .unwrap();
    assert_eq!(stored, 2);
    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(source_contents(&store, "DOC"), vec!["para one", "para two"]);

    store.delete_source("DOC").unwrap();
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_delete_is_idempotent() {
    let (_tmp, store) = setup_store();
    store.delete_source("MISSING").unwrap();
    store.ingest("A", "keep me", &Metadata::new()).unwrap();
    store.delete_source("MISSING").unwrap();
    store.delete_source("MISSING").unwrap();
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_reingest_is_idempotent() {
    let (_tmp, store) = setup_store();
    let text = "first\n\nsecond\n\nthird";
    let metadata = meta(json!({"type": "features"}));

    let n1 = store.ingest("PROGRAM_FEATURES", text, &metadata).unwrap();
    let n2 = store.ingest("PROGRAM_FEATURES", text, &metadata).unwrap();

    assert_eq!(n1, 3);
    assert_eq!(n1, n2);
    assert_eq!(store.count().unwrap(), 3);
    assert_eq!(source_contents(&store, "PROGRAM_FEATURES").len(), 3);
}

#[test]
fn test_ingest_replaces_source() {
    let (_tmp, store) = setup_store();
    store
        .ingest("S", "old one\n\nold two\n\nold three", &Metadata::new())
        .unwrap();
    store.ingest("OTHER", "untouched", &Metadata::new()).unwrap();

    store.ingest("S", "new one", &Metadata::new()).unwrap();

    assert_eq!(source_contents(&store, "S"), vec!["new one"]);
    assert_eq!(source_contents(&store, "OTHER"), vec!["untouched"]);
    assert_eq!(store.count().unwrap(), 2);
}

#[test]
fn test_empty_ingest_is_noop() {
    let (_tmp, store) = setup_store();
    store.ingest("S", "kept", &Metadata::new()).unwrap();

    assert_eq!(store.ingest("S", "", &Metadata::new()).unwrap(), 0);
    assert_eq!(store.ingest("S", "  \n\n \n\n", &Metadata::new()).unwrap(), 0);

    // A blank ingest does not clear the previous chunks.
    assert_eq!(source_contents(&store, "S"), vec!["kept"]);
}

#[test]
fn test_ids_never_reused() {
    let (_tmp, store) = setup_store();
    store.ingest("S", "a\n\nb", &Metadata::new()).unwrap();
    let first_max = store
        .source_chunks("S")
        .unwrap()
        .iter()
        .map(|c| c.id)
        .max()
        .unwrap();

    store.delete_source("S").unwrap();
    store.ingest("S", "c", &Metadata::new()).unwrap();

    let chunks = store.source_chunks("S").unwrap();
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].id > first_max);
}

#[test]
fn test_self_match_scores_one() {
    let (_tmp, store) = setup_store();
    store
        .ingest("A", "the quick brown fox", &Metadata::new())
        .unwrap();
    store.ingest("B", "lorem ipsum\n\ndolor sit amet", &Metadata::new()).unwrap();

    let results = store.query("the quick brown fox", 3).unwrap();
    assert_eq!(results[0].source_id, "A");
    assert_eq!(results[0].content, "the quick brown fox");
    assert!((results[0].score - 1.0).abs() < 1e-5);
}

#[test]
fn test_query_picks_matching_source() {
    let (_tmp, store) = setup_store();
    store.ingest("A", "alpha beta", &Metadata::new()).unwrap();
    store.ingest("B", "gamma delta", &Metadata::new()).unwrap();

    let results = store.query("alpha beta", 1).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_id, "A");
}

#[test]
fn test_top_k_bound_and_ordering() {
    let (_tmp, store) = setup_store();
    let text = (0..6)
        .map(|i| format!("paragraph {}", i))
        .collect::<Vec<_>>()
        .join("\n\n");
    store.ingest("S", &text, &Metadata::new()).unwrap();
    let total = store.count().unwrap() as usize;

    for k in [0usize, 1, 3, 6, 10] {
        let results = store.query("paragraph 2", k).unwrap();
        assert_eq!(results.len(), k.min(total), "top_k = {}", k);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn test_metadata_round_trips() {
    let (_tmp, store) = setup_store();
    let metadata = meta(json!({
        "type": "research",
        "version": 2,
        "tags": ["a", "b"],
        "nested": {"ok": true}
    }));
    store.ingest("R", "guidelines", &metadata).unwrap();

    let results = store.query("guidelines", 1).unwrap();
    assert_eq!(results[0].metadata, metadata);
}

#[test]
fn test_embedding_round_trips_exactly() {
    let (_tmp, store) = setup_store();
    store.ingest("S", "exact bits", &Metadata::new()).unwrap();

    let chunks = store.source_chunks("S").unwrap();
    assert_eq!(chunks[0].embedding, hash_embedding("exact bits", 32));
}

#[test]
fn test_reset_empties_store() {
    let (_tmp, store) = setup_store();
    store.ingest("A", "one\n\ntwo", &Metadata::new()).unwrap();
    store.reset().unwrap();

    assert_eq!(store.count().unwrap(), 0);
    assert!(store.query("one", 5).unwrap().is_empty());

    // Usable again afterwards.
    assert_eq!(store.ingest("A", "three", &Metadata::new()).unwrap(), 1);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_independent_stores() {
    let tmp = TempDir::new().unwrap();
    let first = VectorStore::open(Config::hashed(tmp.path().join("one.sqlite"))).unwrap();
    let second = VectorStore::open(Config::hashed(tmp.path().join("two.sqlite"))).unwrap();

    first.ingest("S", "only in first", &Metadata::new()).unwrap();

    assert_eq!(first.count().unwrap(), 1);
    assert_eq!(second.count().unwrap(), 0);
}

#[test]
fn test_persists_across_instances() {
    let tmp = TempDir::new().unwrap();
    let path = db_path(&tmp);

    {
        let store = VectorStore::open(Config::hashed(&path)).unwrap();
        store.ingest("S", "durable", &Metadata::new()).unwrap();
    }

    let reopened = VectorStore::open(Config::hashed(&path)).unwrap();
    assert_eq!(reopened.count().unwrap(), 1);
    assert_eq!(reopened.query("durable", 1).unwrap()[0].source_id, "S");
}

#[test]
fn test_unwritable_path_fails() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("not_a_dir");
    std::fs::write(&blocker, "file").unwrap();

    let store = VectorStore::open(Config::hashed(blocker.join("vectors.sqlite"))).unwrap();
    assert!(store.count().is_err());
    assert!(store.ingest("S", "text", &Metadata::new()).is_err());
    assert!(store.query("text", 1).is_err());
}

#[test]
fn test_concurrent_ingest_and_query() {
    let tmp = TempDir::new().unwrap();
    let path = db_path(&tmp);

    // Create the file up front so every thread finds it in WAL mode.
    VectorStore::open(Config::hashed(&path))
        .unwrap()
        .ingest("SEED", "seed", &Metadata::new())
        .unwrap();

    let writers: Vec<_> = (0..4)
        .map(|i| {
            let path = path.clone();
            thread::spawn(move || {
                let store = VectorStore::open(Config::hashed(&path)).unwrap();
                for round in 0..5 {
                    let text = format!("writer {} round {}\n\nsecond paragraph {}", i, round, i);
                    assert_eq!(
                        store
                            .ingest(&format!("W{}", i), &text, &Metadata::new())
                            .unwrap(),
                        2
                    );
                }
            })
        })
        .collect();

    let reader = {
        let path = path.clone();
        thread::spawn(move || {
            let store = VectorStore::open(Config::hashed(&path)).unwrap();
            for _ in 0..10 {
                // Every source is always either absent or complete.
                for count in store.source_counts().unwrap() {
                    if count.source_id.starts_with('W') {
                        assert_eq!(count.chunks, 2);
                    }
                }

                let results = store.query("second paragraph", 100).unwrap();
                for source_id in results.iter().map(|r| &r.source_id) {
                    if source_id.starts_with('W') {
                        let seen = results.iter().filter(|r| &r.source_id == source_id).count();
                        assert_eq!(seen, 2, "source {} seen half-replaced", source_id);
                    }
                }
            }
        })
    };

    for w in writers {
        w.join().unwrap();
    }
    reader.join().unwrap();

    let store = VectorStore::open(Config::hashed(&path)).unwrap();
    assert_eq!(store.count().unwrap(), 1 + 4 * 2);
}
