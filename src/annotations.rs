use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NoteError, SelectionError};
use crate::storage::Storage;

pub const HIGHLIGHTS_KEY: &str = "bookHighlights";
pub const NOTES_KEY: &str = "bookNotes";

/// A saved text highlight.
///
/// The selection is anchored by paragraph index plus character offsets
/// (`start` inclusive, `end` exclusive) within that paragraph; `text` is a
/// snapshot of the selected run kept for listings and previews. Offsets are
/// the authoritative record, so equal phrases elsewhere in the chapter are
/// never marked by mistake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: String,
    pub book: String,
    pub chapter: u32,
    pub paragraph: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Yellow,
    Blue,
    Green,
    Pink,
}

impl NoteColor {
    pub fn label(self) -> &'static str {
        match self {
            NoteColor::Yellow => "yellow",
            NoteColor::Blue => "blue",
            NoteColor::Green => "green",
            NoteColor::Pink => "pink",
        }
    }

    /// Cycle order used by the note editor.
    pub fn next(self) -> NoteColor {
        match self {
            NoteColor::Yellow => NoteColor::Blue,
            NoteColor::Blue => NoteColor::Green,
            NoteColor::Green => NoteColor::Pink,
            NoteColor::Pink => NoteColor::Yellow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub book: String,
    pub chapter: u32,
    pub text: String,
    #[serde(rename = "private")]
    pub is_private: bool,
    pub color: NoteColor,
    pub timestamp: String,
}

type HighlightMap = BTreeMap<String, Vec<Highlight>>;
type NoteMap = BTreeMap<String, Vec<Note>>;

/// All highlights saved for a book, oldest first.
pub fn highlights_for(storage: &Storage, book_id: &str) -> Vec<Highlight> {
    let map: HighlightMap = storage.get_json(HIGHLIGHTS_KEY).unwrap_or_default();
    map.get(book_id).cloned().unwrap_or_default()
}

/// Highlights restricted to one chapter of a book.
pub fn highlights_for_chapter(storage: &Storage, book_id: &str, chapter: u32) -> Vec<Highlight> {
    highlights_for(storage, book_id)
        .into_iter()
        .filter(|highlight| highlight.chapter == chapter)
        .collect()
}

/// Records a highlight over `paragraph_text[start..end]` (character offsets).
///
/// Rejects ranges that fall outside the paragraph and selections that are
/// blank once sliced. On success the highlight is appended to the book's
/// history and persisted.
pub fn create_highlight(
    storage: &mut Storage,
    book_id: &str,
    chapter: u32,
    paragraph: usize,
    paragraph_text: &str,
    start: usize,
    end: usize,
) -> Result<Highlight, SelectionError> {
    let len = paragraph_text.chars().count();
    if start >= end || end > len {
        return Err(SelectionError::OutOfRange { start, end, len });
    }
    let text: String = paragraph_text
        .chars()
        .skip(start)
        .take(end - start)
        .collect();
    if text.trim().is_empty() {
        return Err(SelectionError::EmptySelection);
    }
    let now = Utc::now();
    let highlight = Highlight {
        id: format!("hl-{}", now.timestamp_millis()),
        book: book_id.to_string(),
        chapter,
        paragraph,
        start,
        end,
        text,
        timestamp: now.to_rfc3339(),
    };
    let mut map: HighlightMap = storage.get_json(HIGHLIGHTS_KEY).unwrap_or_default();
    map.entry(book_id.to_string())
        .or_default()
        .push(highlight.clone());
    storage.set_json(HIGHLIGHTS_KEY, &map);
    debug!(
        "Saved highlight {} on {} chapter {} paragraph {}",
        highlight.id, book_id, chapter, paragraph
    );
    Ok(highlight)
}

/// All notes saved for a book, oldest first.
pub fn notes_for(storage: &Storage, book_id: &str) -> Vec<Note> {
    let map: NoteMap = storage.get_json(NOTES_KEY).unwrap_or_default();
    map.get(book_id).cloned().unwrap_or_default()
}

/// Appends a note to the book's history.
///
/// The text is trimmed before saving; an all-whitespace note is rejected
/// and nothing is written.
pub fn add_note(
    storage: &mut Storage,
    book_id: &str,
    chapter: u32,
    text: &str,
    is_private: bool,
    color: NoteColor,
) -> Result<Note, NoteError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(NoteError::EmptyText);
    }
    let note = Note {
        book: book_id.to_string(),
        chapter,
        text: trimmed.to_string(),
        is_private,
        color,
        timestamp: Utc::now().to_rfc3339(),
    };
    let mut map: NoteMap = storage.get_json(NOTES_KEY).unwrap_or_default();
    map.entry(book_id.to_string()).or_default().push(note.clone());
    storage.set_json(NOTES_KEY, &map);
    debug!("Saved note on {} chapter {}", book_id, chapter);
    Ok(note)
}
