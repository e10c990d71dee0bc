//! Integration tests for the backend contract and composition

mod common;

use common::*;
use eager_cache::{
    CacheBackend, CacheValue, ChainedCache, DefaultTtlCache, FileCache, KeyPrefixCache, MemoryCache,
    NullCache,
};
use eager_cache::backends::file_cache::FILE_MAGIC;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Behaviour every storing backend must share
async fn assert_backend_contract(backend: &dyn CacheBackend) {
    let name = backend.name();
    let key = test_key("contract");

    assert_eq!(backend.fetch(&key).await.unwrap(), None, "{name}: absent fetch");
    assert!(!backend.contains(&key).await.unwrap(), "{name}: absent contains");

    let value = json!({"plugins": ["Goals", "Ecommerce"], "count": 2});
    assert!(backend.save(&key, value.clone().into(), Duration::ZERO).await.unwrap());
    assert_eq!(
        backend.fetch(&key).await.unwrap(),
        Some(CacheValue::Data(value)),
        "{name}: fetch after save"
    );
    assert!(backend.contains(&key).await.unwrap(), "{name}: contains after save");

    assert!(backend.save(&key, "replaced".into(), Duration::from_secs(60)).await.unwrap());
    assert_eq!(
        backend.fetch(&key).await.unwrap(),
        Some(CacheValue::Data(json!("replaced"))),
        "{name}: overwrite"
    );

    assert!(backend.delete(&key).await.unwrap());
    assert_eq!(backend.fetch(&key).await.unwrap(), None, "{name}: fetch after delete");
    assert!(backend.delete(&key).await.unwrap(), "{name}: delete is idempotent");

    let other = test_key("contract_other");
    backend.save(&key, 1_i64.into(), Duration::ZERO).await.unwrap();
    backend.save(&other, 2_i64.into(), Duration::ZERO).await.unwrap();
    assert!(backend.flush().await.unwrap());
    assert!(!backend.contains(&key).await.unwrap(), "{name}: flush");
    assert!(!backend.contains(&other).await.unwrap(), "{name}: flush");
}

#[tokio::test]
async fn test_memory_backend_contract() {
    init_tracing();
    assert_backend_contract(&MemoryCache::new()).await;
}

#[cfg(feature = "moka")]
#[tokio::test]
async fn test_moka_backend_contract() {
    init_tracing();
    assert_backend_contract(&eager_cache::MokaCache::default()).await;
}

#[tokio::test]
async fn test_file_backend_contract() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    assert_backend_contract(&FileCache::new(dir.path())).await;
}

#[tokio::test]
async fn test_chained_backend_contract() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let chained = ChainedCache::new(vec![
        Arc::new(MemoryCache::new()) as Arc<dyn CacheBackend>,
        Arc::new(FileCache::new(dir.path())),
    ]);
    assert_backend_contract(&chained).await;
}

#[tokio::test]
async fn test_decorator_backends_contract() {
    init_tracing();
    let ttl = DefaultTtlCache::new(Arc::new(MemoryCache::new()), Duration::from_secs(300));
    assert_backend_contract(&ttl).await;

    let prefixed = KeyPrefixCache::new(Arc::new(MemoryCache::new()), "app_");
    assert_backend_contract(&prefixed).await;
}

// ===== Null =====

#[tokio::test]
async fn test_null_backend_accepts_and_forgets() {
    let backend = NullCache::new();

    assert!(backend.save("k", "v".into(), Duration::ZERO).await.unwrap());
    assert_eq!(backend.fetch("k").await.unwrap(), None);
    assert!(!backend.contains("k").await.unwrap());
    assert!(backend.delete("k").await.unwrap());
    assert!(backend.flush().await.unwrap());
    assert_eq!(backend.name(), "Null");
}

// ===== Memory =====

#[tokio::test]
async fn test_memory_keeps_object_identity() {
    struct Session {
        user: String,
    }

    let backend = MemoryCache::new();
    let handle = CacheValue::object(Session {
        user: "anonymous".to_string(),
    });

    backend.save("session", handle.clone(), Duration::ZERO).await.unwrap();
    let fetched = backend.fetch("session").await.unwrap().unwrap();

    assert_eq!(fetched, handle);
    let session = fetched.downcast_object::<Session>().unwrap();
    assert_eq!(session.user, "anonymous");
}

#[tokio::test]
async fn test_memory_entry_expires_after_ttl() {
    let backend = MemoryCache::new();
    backend.save("short", 1_i64.into(), Duration::from_millis(50)).await.unwrap();
    backend.save("forever", 2_i64.into(), Duration::ZERO).await.unwrap();

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_eq!(backend.fetch("short").await.unwrap(), None);
    assert!(backend.contains("forever").await.unwrap());
}

#[tokio::test]
async fn test_memory_stats_and_cleanup() {
    let backend = MemoryCache::new();
    backend.save("a", 1_i64.into(), Duration::from_millis(20)).await.unwrap();
    backend.save("b", 2_i64.into(), Duration::ZERO).await.unwrap();

    backend.fetch("b").await.unwrap();
    backend.fetch("missing").await.unwrap();

    let stats = backend.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.sets, 2);
    assert_eq!(stats.size, 2);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(backend.cleanup_expired(), 1);
    assert_eq!(backend.len(), 1);
}

// ===== File =====

#[tokio::test]
async fn test_file_save_creates_missing_directory() {
    let root = tempfile::tempdir().unwrap();
    let directory = root.path().join("nested").join("cache");
    let backend = FileCache::new(&directory);

    assert!(backend.save("k", "v".into(), Duration::ZERO).await.unwrap());

    assert!(directory.is_dir());
    assert!(backend.file_path("k").is_file());
}

#[tokio::test]
async fn test_file_entries_are_visible_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let writer = FileCache::new(dir.path());
    let reader = FileCache::new(dir.path());

    writer.save("shared", json!({"a": 1}).into(), Duration::ZERO).await.unwrap();

    assert_eq!(
        reader.fetch("shared").await.unwrap(),
        Some(CacheValue::Data(json!({"a": 1})))
    );
}

/// Raw cache file: magic, big-endian lifetime, payload
fn file_bytes(lifetime: u64, payload: &[u8]) -> Vec<u8> {
    let mut raw = FILE_MAGIC.to_vec();
    raw.extend_from_slice(&lifetime.to_be_bytes());
    raw.extend_from_slice(payload);
    raw
}

#[tokio::test]
async fn test_file_expired_entry_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileCache::new(dir.path());

    tokio::fs::write(backend.file_path("old"), file_bytes(1, b"1"))
        .await
        .unwrap();
    tokio::fs::write(backend.file_path("fresh"), file_bytes(0, b"1"))
        .await
        .unwrap();

    assert_eq!(backend.fetch("old").await.unwrap(), None);
    assert!(!backend.contains("old").await.unwrap());
    assert_eq!(backend.fetch("fresh").await.unwrap(), Some(CacheValue::Data(json!(1))));
}

#[tokio::test]
async fn test_file_stores_payload_without_inflation() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileCache::new(dir.path());
    let value = json!({"plugins": ["Goals", "Ecommerce"], "settings": {"theme": "dark"}});
    let payload = serde_json::to_vec(&value).unwrap();

    backend.save("eagercache", value.into(), Duration::ZERO).await.unwrap();

    let raw = tokio::fs::read(backend.file_path("eagercache")).await.unwrap();
    assert_eq!(raw, file_bytes(0, &payload));
}

#[tokio::test]
async fn test_file_huge_ttl_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileCache::new(dir.path());

    for ttl in [Duration::from_secs(u64::MAX), Duration::MAX] {
        assert!(backend.save("k", "v".into(), ttl).await.unwrap());
        assert_eq!(backend.fetch("k").await.unwrap(), Some(CacheValue::Data(json!("v"))));
    }
}

#[tokio::test]
async fn test_file_sub_second_ttl_outlives_the_save() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileCache::new(dir.path());

    backend.save("k", "v".into(), Duration::from_millis(1)).await.unwrap();

    // Rounded up to a whole second, still readable right away
    assert!(backend.contains("k").await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_file_concurrent_saves_of_one_key_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FileCache::new(dir.path()));

    let mut handles = Vec::new();
    for index in 0..64_i64 {
        let backend = Arc::clone(&backend);
        handles.push(tokio::spawn(async move {
            backend
                .save("shared", json!({"writer": index}).into(), Duration::ZERO)
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    // Exactly one complete value wins
    let Some(CacheValue::Data(value)) = backend.fetch("shared").await.unwrap() else {
        panic!("shared entry missing after concurrent saves");
    };
    assert!(value["writer"].as_i64().is_some_and(|writer| (0..64).contains(&writer)));

    let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        names.push(entry.file_name());
    }
    assert_eq!(names, vec![std::ffi::OsString::from("shared.cache")]);
}

#[tokio::test]
async fn test_file_unparsable_entry_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileCache::new(dir.path());

    tokio::fs::write(backend.file_path("broken"), b"\x00\x01 truncated")
        .await
        .unwrap();

    assert_eq!(backend.fetch("broken").await.unwrap(), None);
    assert!(!backend.contains("broken").await.unwrap());
}

#[tokio::test]
async fn test_file_rejects_object_handles() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileCache::new(dir.path());

    let result = backend.save("obj", CacheValue::object(1_u8), Duration::ZERO).await;

    assert!(result.is_err());
    assert!(!backend.file_path("obj").exists());
}

#[tokio::test]
async fn test_file_flush_only_removes_cache_files() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileCache::new(dir.path());
    backend.save("a", 1_i64.into(), Duration::ZERO).await.unwrap();
    let nested = FileCache::new(dir.path().join("sub"));
    nested.save("b", 2_i64.into(), Duration::ZERO).await.unwrap();
    let unrelated = dir.path().join("keep.txt");
    tokio::fs::write(&unrelated, b"keep").await.unwrap();

    assert!(backend.flush().await.unwrap());

    assert!(!backend.contains("a").await.unwrap());
    assert!(!nested.contains("b").await.unwrap());
    assert!(unrelated.exists());
}

#[tokio::test]
async fn test_file_flush_of_missing_directory_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileCache::new(dir.path().join("never_created"));
    assert!(backend.flush().await.unwrap());
}

// ===== Chained =====

#[tokio::test]
async fn test_chained_hit_back_fills_faster_tiers_only() {
    let fast = RecordingBackend::new();
    let middle = RecordingBackend::new();
    let slow = RecordingBackend::new();
    middle.save("k", "v".into(), Duration::ZERO).await.unwrap();

    let chained = ChainedCache::new(vec![fast.as_backend(), middle.as_backend(), slow.as_backend()]);

    assert_eq!(chained.fetch("k").await.unwrap(), Some(CacheValue::Data(json!("v"))));

    assert_eq!(fast.stored("k").await, Some(json!("v")));
    assert_eq!(fast.saves()[0].ttl, Duration::ZERO);
    assert_eq!(slow.stored("k").await, None);
    assert_eq!(slow.fetch_count(), 0);
}

#[tokio::test]
async fn test_chained_first_tier_hit_skips_the_rest() {
    let fast = RecordingBackend::new();
    let slow = RecordingBackend::new();
    fast.save("k", 1_i64.into(), Duration::ZERO).await.unwrap();

    let chained = ChainedCache::new(vec![fast.as_backend(), slow.as_backend()]);
    chained.fetch("k").await.unwrap();

    assert_eq!(slow.fetch_count(), 0);
}

#[tokio::test]
async fn test_chained_back_fill_failure_still_returns_value() {
    let slow = RecordingBackend::new();
    slow.save("k", 1_i64.into(), Duration::ZERO).await.unwrap();

    let chained = ChainedCache::new(vec![Arc::new(FailingBackend) as Arc<dyn CacheBackend>, slow.as_backend()]);

    assert_eq!(chained.fetch("k").await.unwrap(), Some(CacheValue::Data(json!(1))));
}

#[tokio::test]
async fn test_chained_writes_reach_every_tier() {
    let first = RecordingBackend::new();
    let second = RecordingBackend::new();
    let chained = ChainedCache::new(vec![first.as_backend(), second.as_backend()]);

    chained.save("k", "v".into(), Duration::from_secs(30)).await.unwrap();
    assert_eq!(first.saves()[0].ttl, Duration::from_secs(30));
    assert_eq!(second.stored("k").await, Some(json!("v")));

    chained.delete("k").await.unwrap();
    assert_eq!(first.deletes(), vec!["k".to_string()]);
    assert_eq!(second.deletes(), vec!["k".to_string()]);
}

#[tokio::test]
async fn test_chained_save_reports_any_rejecting_tier() {
    let accepting = RecordingBackend::new();
    let rejecting = RecordingBackend::new();
    rejecting.reject_saves();
    let chained = ChainedCache::new(vec![accepting.as_backend(), rejecting.as_backend()]);

    assert!(!chained.save("k", "v".into(), Duration::ZERO).await.unwrap());
    assert_eq!(accepting.stored("k").await, Some(json!("v")));
}

#[tokio::test]
async fn test_chained_contains_checks_every_tier() {
    let first = RecordingBackend::new();
    let second = RecordingBackend::new();
    second.save("k", 1_i64.into(), Duration::ZERO).await.unwrap();
    let chained = ChainedCache::new(vec![first.as_backend(), second.as_backend()]);

    assert!(chained.contains("k").await.unwrap());
    assert!(!chained.contains("other").await.unwrap());
    assert_eq!(chained.backends().len(), 2);
}

#[tokio::test]
async fn test_empty_chain_behaves_like_null() {
    let chained = ChainedCache::new(Vec::new());

    assert!(chained.save("k", 1_i64.into(), Duration::ZERO).await.unwrap());
    assert_eq!(chained.fetch("k").await.unwrap(), None);
}

// ===== Decorators =====

#[tokio::test]
async fn test_default_ttl_applies_only_without_ttl() {
    let inner = RecordingBackend::new();
    let backend = DefaultTtlCache::new(inner.as_backend(), Duration::from_secs(300));

    backend.save("a", 1_i64.into(), Duration::ZERO).await.unwrap();
    backend.save("b", 2_i64.into(), Duration::from_secs(5)).await.unwrap();

    let saves = inner.saves();
    assert_eq!(saves[0].ttl, Duration::from_secs(300));
    assert_eq!(saves[1].ttl, Duration::from_secs(5));
    assert_eq!(backend.default_ttl(), Duration::from_secs(300));
}

#[tokio::test]
async fn test_key_prefix_namespaces_keys() {
    let inner = RecordingBackend::new();
    let backend = KeyPrefixCache::new(inner.as_backend(), "site1_");

    backend.save("k", "v".into(), Duration::ZERO).await.unwrap();

    assert_eq!(inner.stored("site1_k").await, Some(json!("v")));
    assert_eq!(inner.stored("k").await, None);
    assert_eq!(backend.fetch("k").await.unwrap(), Some(CacheValue::Data(json!("v"))));
    assert!(backend.contains("k").await.unwrap());

    backend.delete("k").await.unwrap();
    assert_eq!(inner.deletes(), vec!["site1_k".to_string()]);
    assert_eq!(backend.prefix(), "site1_");
}

#[tokio::test]
async fn test_key_prefix_flush_clears_whole_inner_backend() {
    let inner = RecordingBackend::new();
    inner.save("outside", 1_i64.into(), Duration::ZERO).await.unwrap();
    let backend = KeyPrefixCache::new(inner.as_backend(), "p_");
    backend.save("inside", 2_i64.into(), Duration::ZERO).await.unwrap();

    backend.flush().await.unwrap();

    assert_eq!(inner.stored("outside").await, None);
    assert_eq!(inner.stored("p_inside").await, None);
}
