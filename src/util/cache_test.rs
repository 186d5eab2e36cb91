use super::*;
use crate::config::StorageConfig;

const HOUR_MS: i64 = 60 * 60 * 1000;

fn storage_with_ttl(ttl_secs: u64) -> SafeStorage {
    SafeStorage::in_memory().with_config(StorageConfig { cache_ttl_secs: ttl_secs, ..StorageConfig::default() })
}

#[test]
fn key_applies_prefix() {
    let storage = SafeStorage::in_memory();
    let cache = CacheStore::new(&storage);
    assert_eq!(cache.key("user"), "cache:user");
}

#[test]
fn store_then_load_before_expiry() {
    let storage = storage_with_ttl(3600);
    let cache = CacheStore::new(&storage);
    assert!(cache.store("credits", &42_i64, 1_000));
    assert_eq!(cache.load::<i64>("credits", 1_000 + HOUR_MS - 1), Some(42));
}

#[test]
fn load_drops_expired_entry() {
    let storage = storage_with_ttl(3600);
    let cache = CacheStore::new(&storage);
    cache.store("credits", &42_i64, 0);

    assert_eq!(cache.load::<i64>("credits", HOUR_MS), None);
    assert!(!storage.has_key("cache:credits"));
}

#[test]
fn load_drops_malformed_entry() {
    let storage = SafeStorage::in_memory();
    storage.set("cache:user", "garbage");
    let cache = CacheStore::new(&storage);

    assert_eq!(cache.load::<String>("user", 0), None);
    assert!(!storage.has_key("cache:user"));
}

#[test]
fn envelope_records_timestamps() {
    let storage = storage_with_ttl(10);
    let cache = CacheStore::new(&storage);
    cache.store("flag", &true, 5_000);

    let entry: Option<CacheEntry<bool>> = storage.get_json("cache:flag", None);
    assert_eq!(entry, Some(CacheEntry { value: true, stored_at_ms: 5_000, expires_at_ms: 15_000 }));
}

#[test]
fn invalidate_removes_entry() {
    let storage = SafeStorage::in_memory();
    let cache = CacheStore::new(&storage);
    cache.store("user", &"ada", 0);
    assert!(cache.invalidate("user"));
    assert_eq!(cache.load::<String>("user", 0), None);
}

#[test]
fn clean_expired_only_touches_prefixed_keys() {
    let storage = storage_with_ttl(1);
    let cache = CacheStore::new(&storage);
    cache.store("old", &1, 0);
    cache.store("fresh", &2, 10_000);
    storage.set("cache:broken", "{");
    storage.set("app:settings", "{");

    assert_eq!(cache.clean_expired(5_000), 2);
    assert_eq!(storage.all_keys(), vec!["cache:fresh".to_owned(), "app:settings".to_owned()]);
}

#[test]
fn detached_cache_is_inert() {
    let storage = SafeStorage::detached();
    let cache = CacheStore::new(&storage);
    assert!(!cache.store("user", &"ada", 0));
    assert_eq!(cache.load::<String>("user", 0), None);
    assert_eq!(cache.clean_expired(0), 0);
}

#[test]
fn now_ms_is_after_2020() {
    assert!(now_ms() > 1_577_836_800_000);
}
