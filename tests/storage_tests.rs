use elyora::Storage;
use elyora::progress;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_set_get_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    assert!(storage.is_empty());
    storage.set("readerTheme", "dark");
    assert_eq!(storage.get("readerTheme"), Some("dark"));
    assert_eq!(storage.len(), 1);
    assert!(storage.contains("readerTheme"));
}

#[test]
fn test_missing_key_is_none() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::open(temp_dir.path());

    assert_eq!(storage.get("sidebarExpanded"), None);
    assert!(!storage.contains("sidebarExpanded"));
}

#[test]
fn test_values_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut storage = Storage::open(temp_dir.path());
        storage.set("readerTheme", "dark");
        storage.set("sidebarExpanded", "true");
    }

    let storage = Storage::open(temp_dir.path());
    assert_eq!(storage.get("readerTheme"), Some("dark"));
    assert_eq!(storage.get("sidebarExpanded"), Some("true"));
    assert_eq!(storage.len(), 2);
}

#[test]
fn test_remove_deletes_key_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut storage = Storage::open(temp_dir.path());
        storage.set("readerTheme", "dark");
        storage.set("fav_starlit-guide", "1");
        storage.remove("fav_starlit-guide");
    }

    let storage = Storage::open(temp_dir.path());
    assert_eq!(storage.get("readerTheme"), Some("dark"));
    assert_eq!(storage.get("fav_starlit-guide"), None);
}

#[test]
fn test_corrupt_file_yields_empty_store() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("storage.json"), "{not json at all").unwrap();

    let storage = Storage::open(temp_dir.path());
    assert!(storage.is_empty());
}

#[test]
fn test_corrupt_store_recovers_after_write() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("storage.json"), "[1, 2, 3]").unwrap();

    {
        let mut storage = Storage::open(temp_dir.path());
        storage.set("readerTheme", "light");
    }

    let storage = Storage::open(temp_dir.path());
    assert_eq!(storage.get("readerTheme"), Some("light"));
}

#[test]
fn test_json_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    storage.set_json("favorites", &vec!["starlit-guide", "atomic-habits"]);
    let parsed: Vec<String> = storage
        .get_json("favorites")
        .expect("Failed to read back favorites list");
    assert_eq!(parsed, vec!["starlit-guide", "atomic-habits"]);
}

#[test]
fn test_get_json_discards_malformed_value() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    storage.set("favorites", "definitely not a list");
    let parsed: Option<Vec<String>> = storage.get_json("favorites");
    assert!(parsed.is_none());
}

#[test]
fn test_in_memory_store() {
    let mut storage = Storage::in_memory();
    storage.set("readerTheme", "dark");
    assert_eq!(storage.get("readerTheme"), Some("dark"));
    storage.flush().expect("In-memory flush should be a no-op");
}

#[test]
fn test_progress_defaults_to_first_chapter() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::open(temp_dir.path());

    assert_eq!(progress::load_progress(&storage, "starlit-guide"), 1);
}

#[test]
fn test_progress_roundtrip_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut storage = Storage::open(temp_dir.path());
        progress::save_progress(&mut storage, "starlit-guide", 3);
    }

    let storage = Storage::open(temp_dir.path());
    assert_eq!(progress::load_progress(&storage, "starlit-guide"), 3);
    assert_eq!(progress::load_progress(&storage, "atomic-habits"), 1);
}

#[test]
fn test_progress_rejects_non_positive_chapter() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    storage.set("progress_starlit-guide", r#"{"chapter":0}"#);
    assert_eq!(progress::load_progress(&storage, "starlit-guide"), 1);
}

#[test]
fn test_progress_ignores_garbage_record() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    storage.set("progress_starlit-guide", "chapter three-ish");
    assert_eq!(progress::load_progress(&storage, "starlit-guide"), 1);
}
