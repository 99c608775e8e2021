use tracing::debug;

use crate::storage::Storage;

/// The two per-book flags a reader can toggle from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Favourite,
    Download,
}

impl MarkerKind {
    /// Key of the ordered membership list, the single source of truth.
    fn list_key(self) -> &'static str {
        match self {
            MarkerKind::Favourite => "favorites",
            MarkerKind::Download => "downloads",
        }
    }

    /// Per-book flag key written by earlier releases. Read for migration,
    /// never written.
    fn legacy_flag_key(self, book_id: &str) -> String {
        match self {
            MarkerKind::Favourite => format!("fav_{book_id}"),
            MarkerKind::Download => format!("download_{book_id}"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MarkerKind::Favourite => "favourites",
            MarkerKind::Download => "downloads",
        }
    }
}

fn member_list(storage: &Storage, kind: MarkerKind) -> Vec<String> {
    storage.get_json(kind.list_key()).unwrap_or_default()
}

/// Whether a book is currently marked.
///
/// Membership in the list wins; a leftover legacy flag set to "1" also
/// counts so state written by earlier releases survives until the next
/// toggle migrates it.
pub fn is_marked(storage: &Storage, kind: MarkerKind, book_id: &str) -> bool {
    if member_list(storage, kind).iter().any(|id| id == book_id) {
        return true;
    }
    storage.get(&kind.legacy_flag_key(book_id)) == Some("1")
}

/// Flips the marker and returns the new state.
///
/// The membership list is rewritten in insertion order without duplicates,
/// and whatever legacy flag exists for the book is deleted so the list is
/// the only record left behind.
pub fn toggle(storage: &mut Storage, kind: MarkerKind, book_id: &str) -> bool {
    let was_marked = is_marked(storage, kind, book_id);
    let mut list = member_list(storage, kind);
    if was_marked {
        list.retain(|id| id != book_id);
    } else if !list.iter().any(|id| id == book_id) {
        list.push(book_id.to_string());
    }
    storage.set_json(kind.list_key(), &list);
    storage.remove(&kind.legacy_flag_key(book_id));
    debug!(
        "Toggled {} for {}: now {}",
        kind.label(),
        book_id,
        !was_marked
    );
    !was_marked
}

/// Marked book ids in the order they were first marked.
pub fn marked_books(storage: &Storage, kind: MarkerKind) -> Vec<String> {
    member_list(storage, kind)
}
