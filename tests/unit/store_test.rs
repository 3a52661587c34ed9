use std::fs;
use std::path::Path;
use std::time::Duration;

use slidecache::cache::{CacheStore, Evictor, METADATA_FILENAME};
use slidecache::CacheError;
use slidecache::clock::mtime_millis;
use slidecache::imaging;

use crate::helpers::{bump_mtime, fake_entry, file_count, store_fixture, write_png};

fn generate(store: &CacheStore, source: &Path) {
    let mtime = mtime_millis(&fs::metadata(source).unwrap());
    let thumb = imaging::decode_thumbnail(source, 300).unwrap();
    store.store(source, &thumb, mtime).unwrap();
}

#[test]
fn cache_file_name_is_hashed_source_path() {
    let (_temp, store, _src) = store_fixture();
    let a = store.cache_file_for(Path::new("/photos/a.png"));
    let b = store.cache_file_for(Path::new("/photos/b.png"));

    assert_eq!(a, store.cache_file_for(Path::new("/photos/a.png")));
    assert_ne!(a, b);
    assert_eq!(a.parent(), Some(store.dir()));

    let name = a.file_name().unwrap().to_string_lossy().into_owned();
    let (stem, ext) = name.split_once('.').unwrap();
    assert_eq!(ext, "thumb");
    assert_eq!(stem.len(), 64);
    assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn stored_thumbnail_is_jpeg_capped_at_300() {
    let (_temp, store, src) = store_fixture();
    let source = write_png(&src, "wide.png", 2000, 1000);

    generate(&store, &source);

    let entry = store.lookup(&source).expect("entry should be valid");
    let bytes = fs::read(&entry.cache_file).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8], "thumbnail should be JPEG");
    assert_eq!(entry.size_bytes, bytes.len() as u64);

    let thumb = imaging::decode(&entry.cache_file).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (300, 150));
}

#[test]
fn small_sources_are_not_upscaled() {
    let (_temp, store, src) = store_fixture();
    let source = write_png(&src, "small.png", 120, 80);

    generate(&store, &source);

    let entry = store.lookup(&source).unwrap();
    let thumb = imaging::decode(&entry.cache_file).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (120, 80));
}

#[test]
fn lookup_misses_after_source_changes() {
    let (_temp, store, src) = store_fixture();
    let source = write_png(&src, "a.png", 64, 64);
    generate(&store, &source);
    assert!(store.lookup(&source).is_some());

    bump_mtime(&source, Duration::from_secs(30));

    assert!(store.lookup(&source).is_none());
    assert!(store.get(&source).is_some(), "stale entry is kept until replaced");
}

#[test]
fn lookup_misses_when_thumbnail_file_is_gone() {
    let (_temp, store, src) = store_fixture();
    let source = write_png(&src, "a.png", 64, 64);
    generate(&store, &source);

    fs::remove_file(store.cache_file_for(&source)).unwrap();

    assert!(store.lookup(&source).is_none());
}

#[test]
fn lookup_misses_when_source_is_gone() {
    let (_temp, store, src) = store_fixture();
    let source = write_png(&src, "a.png", 64, 64);
    generate(&store, &source);

    fs::remove_file(&source).unwrap();

    assert!(store.lookup(&source).is_none());
}

#[test]
fn regenerating_replaces_entry_in_place() {
    let (_temp, store, src) = store_fixture();
    let source = write_png(&src, "a.png", 64, 64);
    generate(&store, &source);
    bump_mtime(&source, Duration::from_secs(30));
    generate(&store, &source);

    assert_eq!(store.len(), 1);
    assert!(store.lookup(&source).is_some());
    // One thumbnail file, no leftover temp files
    assert_eq!(file_count(store.dir()), 1);
}

#[test]
fn touch_updates_last_access_only() {
    let (_temp, store, _src) = store_fixture();
    let entry = fake_entry(&store, "/photos/a.png", 10, 5);

    assert!(store.touch_at(&entry.source_path, 99));
    let touched = store.get(&entry.source_path).unwrap();
    assert_eq!(touched.last_access, 99);
    assert_eq!(touched.size_bytes, entry.size_bytes);

    assert!(!store.touch(Path::new("/photos/unknown.png")));
}

#[test]
fn total_size_sums_entries() {
    let (_temp, store, _src) = store_fixture();
    fake_entry(&store, "/p/a.png", 100, 1);
    fake_entry(&store, "/p/b.png", 250, 2);
    assert_eq!(store.total_size(), 350);
    assert_eq!(store.len(), 2);
}

#[test]
fn remove_deletes_file_and_entry() {
    let (_temp, store, _src) = store_fixture();
    let entry = fake_entry(&store, "/p/a.png", 100, 1);

    let removed = store.remove(&entry.source_path).unwrap();

    assert_eq!(removed, Some(entry.clone()));
    assert!(!entry.cache_file.exists());
    assert!(store.is_empty());
}

#[test]
fn remove_with_missing_file_still_drops_entry() {
    let (_temp, store, _src) = store_fixture();
    let entry = fake_entry(&store, "/p/a.png", 100, 1);
    fs::remove_file(&entry.cache_file).unwrap();

    assert!(store.remove(&entry.source_path).unwrap().is_some());
    assert!(store.is_empty());
}

#[test]
fn persist_and_restore_round_trip() {
    let (temp, store, src) = store_fixture();
    let a = write_png(&src, "a.png", 64, 32);
    let b = write_png(&src, "b.png", 32, 64);
    generate(&store, &a);
    generate(&store, &b);
    store.touch_at(&a, 1234);
    store.persist().unwrap();

    let reopened = CacheStore::open(temp.path().join("cache"), 85).unwrap();

    assert_eq!(reopened.entries(), store.entries());
    assert_eq!(reopened.get(&a).unwrap().last_access, 1234);
    assert!(reopened.lookup(&b).is_some());
}

#[test]
fn metadata_record_uses_source_path_keys() {
    let (_temp, store, _src) = store_fixture();
    let entry = fake_entry(&store, "/photos/a.png", 42, 7);
    store.persist().unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.metadata_path()).unwrap()).unwrap();
    let record = &json["/photos/a.png"];
    assert_eq!(record["size_bytes"], 42);
    assert_eq!(record["last_access"], 7);
    assert_eq!(record["last_modified"], 1);
    assert_eq!(record["cache_file"], &*entry.cache_file.to_string_lossy());
}

#[test]
fn restore_drops_entries_pointing_outside_the_cache() {
    let (temp, store, _src) = store_fixture();
    let outside = temp.path().join("notes.txt");
    fs::write(&outside, b"keep me").unwrap();
    let honest = fake_entry(&store, "/photos/ok.jpg", 100, 5);
    store.persist().unwrap();

    let mut json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.metadata_path()).unwrap()).unwrap();
    json["/photos/x.jpg"] = serde_json::json!({
        "last_modified": 1,
        "size_bytes": 5_000_000,
        "last_access": 0,
        "cache_file": outside.to_string_lossy(),
    });
    fs::write(store.metadata_path(), json.to_string()).unwrap();

    let reopened = CacheStore::open(temp.path().join("cache"), 85).unwrap();

    assert_eq!(reopened.len(), 1);
    assert!(reopened.get(Path::new("/photos/x.jpg")).is_none());
    assert_eq!(reopened.get(&honest.source_path), Some(honest.clone()));

    Evictor::new(1024 * 1024).run(&reopened);
    assert!(reopened.remove(Path::new("/photos/x.jpg")).unwrap().is_none());
    assert_eq!(fs::read(&outside).unwrap(), b"keep me");
}

#[test]
fn corrupt_metadata_restores_empty() {
    let (temp, store, _src) = store_fixture();
    fake_entry(&store, "/p/a.png", 10, 1);
    fs::write(store.dir().join(METADATA_FILENAME), "{ not json").unwrap();

    let reopened = CacheStore::open(temp.path().join("cache"), 85).unwrap();

    assert!(reopened.is_empty());
}

#[test]
fn missing_metadata_restores_empty() {
    let (_temp, store, _src) = store_fixture();
    fake_entry(&store, "/p/a.png", 10, 1);

    assert_eq!(store.restore(), 0);
    assert!(store.is_empty());
}

#[test]
fn clear_all_leaves_directory_empty() {
    let (temp, store, _src) = store_fixture();
    fake_entry(&store, "/p/a.png", 10, 1);
    fake_entry(&store, "/p/b.png", 10, 2);
    fs::write(store.dir().join("stray.tmp"), b"x").unwrap();
    store.persist().unwrap();

    let removed = store.clear_all().unwrap();

    assert_eq!(removed, 4);
    assert!(store.dir().is_dir());
    assert_eq!(file_count(store.dir()), 0);
    assert!(store.is_empty());

    let reopened = CacheStore::open(temp.path().join("cache"), 85).unwrap();
    assert!(reopened.is_empty());
}

#[test]
fn clear_all_recreates_missing_directory() {
    let (_temp, store, _src) = store_fixture();
    fs::remove_dir_all(store.dir()).unwrap();

    assert_eq!(store.clear_all().unwrap(), 0);
    assert!(store.dir().is_dir());
}

#[test]
fn store_after_clear_is_discarded() {
    let (_temp, store, src) = store_fixture();
    let source = write_png(&src, "a.png", 40, 40);
    let mtime = mtime_millis(&fs::metadata(&source).unwrap());
    let thumb = imaging::decode_thumbnail(&source, 300).unwrap();

    let generation = store.generation();
    store.clear_all().unwrap();
    let result = store.store_for_generation(&source, &thumb, mtime, generation);

    assert!(matches!(result, Err(CacheError::Cleared { .. })));
    assert!(store.is_empty());
    assert_eq!(file_count(store.dir()), 0);

    // A fresh generation stores normally
    store
        .store_for_generation(&source, &thumb, mtime, store.generation())
        .unwrap();
    assert!(store.lookup(&source).is_some());
}
