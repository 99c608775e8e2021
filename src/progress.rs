use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::Storage;

#[derive(Debug, Serialize, Deserialize)]
struct ProgressRecord {
    chapter: u32,
}

fn progress_key(book_id: &str) -> String {
    format!("progress_{book_id}")
}

/// Last-read chapter for a book, 1-based.
///
/// Defaults to chapter 1 when nothing was saved yet or the saved record is
/// unreadable. The value is not bounds-checked here; the reader clamps it
/// against the book it opens.
pub fn load_progress(storage: &Storage, book_id: &str) -> u32 {
    storage
        .get_json::<ProgressRecord>(&progress_key(book_id))
        .map(|record| record.chapter)
        .filter(|&chapter| chapter >= 1)
        .unwrap_or(1)
}

pub fn save_progress(storage: &mut Storage, book_id: &str, chapter: u32) {
    debug!("Saving progress for {}: chapter {}", book_id, chapter);
    storage.set_json(&progress_key(book_id), &ProgressRecord { chapter });
}
