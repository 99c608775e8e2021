use elyora::Storage;
use elyora::markers::{self, MarkerKind};
use tempfile::TempDir;

#[test]
fn test_unmarked_by_default() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::open(temp_dir.path());

    assert!(!markers::is_marked(&storage, MarkerKind::Favourite, "starlit-guide"));
    assert!(!markers::is_marked(&storage, MarkerKind::Download, "starlit-guide"));
    assert!(markers::marked_books(&storage, MarkerKind::Favourite).is_empty());
}

#[test]
fn test_toggle_marks_and_unmarks() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    assert!(markers::toggle(&mut storage, MarkerKind::Favourite, "starlit-guide"));
    assert!(markers::is_marked(&storage, MarkerKind::Favourite, "starlit-guide"));

    assert!(!markers::toggle(&mut storage, MarkerKind::Favourite, "starlit-guide"));
    assert!(!markers::is_marked(&storage, MarkerKind::Favourite, "starlit-guide"));
    assert!(markers::marked_books(&storage, MarkerKind::Favourite).is_empty());
}

#[test]
fn test_marked_books_keep_insertion_order() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    markers::toggle(&mut storage, MarkerKind::Favourite, "self-mastery");
    markers::toggle(&mut storage, MarkerKind::Favourite, "starlit-guide");
    markers::toggle(&mut storage, MarkerKind::Favourite, "atomic-habits");
    assert_eq!(
        markers::marked_books(&storage, MarkerKind::Favourite),
        vec!["self-mastery", "starlit-guide", "atomic-habits"]
    );

    // Removing from the middle keeps the rest in place; re-adding appends.
    markers::toggle(&mut storage, MarkerKind::Favourite, "starlit-guide");
    assert_eq!(
        markers::marked_books(&storage, MarkerKind::Favourite),
        vec!["self-mastery", "atomic-habits"]
    );
    markers::toggle(&mut storage, MarkerKind::Favourite, "starlit-guide");
    assert_eq!(
        markers::marked_books(&storage, MarkerKind::Favourite),
        vec!["self-mastery", "atomic-habits", "starlit-guide"]
    );
}

#[test]
fn test_favourites_and_downloads_independent() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    markers::toggle(&mut storage, MarkerKind::Favourite, "starlit-guide");
    assert!(markers::is_marked(&storage, MarkerKind::Favourite, "starlit-guide"));
    assert!(!markers::is_marked(&storage, MarkerKind::Download, "starlit-guide"));

    markers::toggle(&mut storage, MarkerKind::Download, "starlit-guide");
    markers::toggle(&mut storage, MarkerKind::Favourite, "starlit-guide");
    assert!(!markers::is_marked(&storage, MarkerKind::Favourite, "starlit-guide"));
    assert!(markers::is_marked(&storage, MarkerKind::Download, "starlit-guide"));
}

#[test]
fn test_markers_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut storage = Storage::open(temp_dir.path());
        markers::toggle(&mut storage, MarkerKind::Download, "business-tactics");
    }

    let storage = Storage::open(temp_dir.path());
    assert!(markers::is_marked(&storage, MarkerKind::Download, "business-tactics"));
    assert_eq!(
        markers::marked_books(&storage, MarkerKind::Download),
        vec!["business-tactics"]
    );
}

#[test]
fn test_legacy_flag_counts_as_marked() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    storage.set("fav_starlit-guide", "1");
    assert!(markers::is_marked(&storage, MarkerKind::Favourite, "starlit-guide"));
    assert!(!markers::is_marked(&storage, MarkerKind::Download, "starlit-guide"));

    // The membership list itself was never written.
    assert!(markers::marked_books(&storage, MarkerKind::Favourite).is_empty());
}

#[test]
fn test_legacy_zero_flag_is_not_marked() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    storage.set("download_starlit-guide", "0");
    assert!(!markers::is_marked(&storage, MarkerKind::Download, "starlit-guide"));
}

#[test]
fn test_toggle_retires_legacy_flag() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    storage.set("download_business-tactics", "1");
    let marked = markers::toggle(&mut storage, MarkerKind::Download, "business-tactics");

    // Toggling a legacy-marked book unmarks it and deletes the old flag.
    assert!(!marked);
    assert!(!storage.contains("download_business-tactics"));
    assert!(!markers::is_marked(&storage, MarkerKind::Download, "business-tactics"));
    assert!(markers::marked_books(&storage, MarkerKind::Download).is_empty());
}

#[test]
fn test_toggle_unmarked_also_clears_legacy_flag() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    storage.set("fav_self-mastery", "0");
    let marked = markers::toggle(&mut storage, MarkerKind::Favourite, "self-mastery");

    assert!(marked);
    assert!(!storage.contains("fav_self-mastery"));
    assert_eq!(
        markers::marked_books(&storage, MarkerKind::Favourite),
        vec!["self-mastery"]
    );
}
