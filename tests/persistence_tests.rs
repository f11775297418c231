//! Persistence Tests
//!
//! Drives the cache and session store over a file-backed store across
//! simulated process restarts.

use std::fs;
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use prayer_cache::{FileStorage, KeyValueStorage, SharedStorage, TtlCache, VerifiedSessions};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

const NAMESPACE: &str = "prayer_cache:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PrayerRequest {
    id: u32,
    name: String,
    approved: bool,
}

fn open(dir: &TempDir) -> SharedStorage {
    Arc::new(FileStorage::open(dir.path().join("storage.json")).unwrap())
}

fn sample_prayers() -> Vec<PrayerRequest> {
    vec![
        PrayerRequest {
            id: 1,
            name: "Test Prayer".to_string(),
            approved: true,
        },
        PrayerRequest {
            id: 2,
            name: "Healing for a friend".to_string(),
            approved: false,
        },
    ]
}

#[test]
fn test_entry_survives_restart() {
    let dir = TempDir::new().unwrap();

    {
        let mut cache = TtlCache::new(open(&dir), NAMESPACE, 60_000);
        cache.set("prayers", &sample_prayers(), None).unwrap();
    }

    let mut cache = TtlCache::new(open(&dir), NAMESPACE, 60_000);
    let prayers: Option<Vec<PrayerRequest>> = cache.get("prayers");
    assert_eq!(prayers, Some(sample_prayers()));
}

#[test]
fn test_expired_entry_not_served_after_restart() {
    let dir = TempDir::new().unwrap();

    {
        let mut cache = TtlCache::new(open(&dir), NAMESPACE, 60_000);
        cache.set("test_key", "short lived", Some(100)).unwrap();
    }

    sleep(Duration::from_millis(150));

    let storage = open(&dir);
    let mut cache = TtlCache::new(storage.clone(), NAMESPACE, 60_000);
    assert_eq!(cache.get::<String>("test_key"), None);
    assert_eq!(storage.get_item("prayer_cache:test_key").unwrap(), None);
}

#[test]
fn test_invalidate_all_survives_restart() {
    let dir = TempDir::new().unwrap();

    {
        let storage = open(&dir);
        let mut cache = TtlCache::new(storage.clone(), NAMESPACE, 60_000);
        let sessions = VerifiedSessions::new(storage, 60_000);

        cache.set("k1", &1, None).unwrap();
        cache.set("k2", &2, None).unwrap();
        sessions.record_verification("member@example.com", None).unwrap();

        cache.invalidate_all();
    }

    let storage = open(&dir);
    let mut cache = TtlCache::new(storage.clone(), NAMESPACE, 60_000);
    let sessions = VerifiedSessions::new(storage, 60_000);

    assert_eq!(cache.get::<i32>("k1"), None);
    assert_eq!(cache.get::<i32>("k2"), None);
    // Sessions live outside the cache namespace
    assert!(sessions.is_recently_verified("Member@Example.com"));
}

#[test]
fn test_quota_exceeded_degrades_to_memory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");

    let storage: SharedStorage = Arc::new(FileStorage::open_with_quota(&path, 64).unwrap());
    let mut cache = TtlCache::new(storage, NAMESPACE, 60_000);

    let large = "x".repeat(1024);
    cache.set("large", &large, None).unwrap();

    assert_eq!(cache.get::<String>("large"), Some(large));
    assert_eq!(cache.stats().storage_errors, 1);

    let mut restarted = TtlCache::new(open(&dir), NAMESPACE, 60_000);
    assert_eq!(restarted.get::<String>("large"), None);
}

#[test]
fn test_corrupt_entry_is_miss() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    fs::write(&path, r#"{"prayer_cache:broken": "{\"value\": oops"}"#).unwrap();

    let mut cache = TtlCache::new(open(&dir), NAMESPACE, 60_000);
    assert_eq!(cache.get::<String>("broken"), None);
}

#[test]
fn test_sweep_reclaims_unread_entries() {
    let dir = TempDir::new().unwrap();

    {
        let mut cache = TtlCache::new(open(&dir), NAMESPACE, 60_000);
        cache.set("stale", "v", Some(50)).unwrap();
        cache.set("fresh", "v", Some(60_000)).unwrap();
    }

    sleep(Duration::from_millis(100));

    let storage = open(&dir);
    let mut cache = TtlCache::new(storage.clone(), NAMESPACE, 60_000);
    assert_eq!(cache.sweep_expired(), 1);

    let keys = storage.keys().unwrap();
    assert_eq!(keys, vec!["prayer_cache:fresh".to_string()]);
}
