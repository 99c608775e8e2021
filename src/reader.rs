use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::constants::{
    CONTENT_COLS_PER_FONT_PT, FONT_SIZE_DEFAULT, FONT_SIZE_MAX, FONT_SIZE_MIN, FONT_SIZE_STEP,
};
use crate::progress;
use crate::storage::Storage;

pub const THEME_KEY: &str = "readerTheme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// Saved preference, defaulting to light when absent or unrecognised.
    pub fn from_storage(storage: &Storage) -> Theme {
        match storage.get(THEME_KEY) {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// One open book.
///
/// Holds the transient reading state: current chapter, text size and theme.
/// Chapter position persists across sessions; text size deliberately does
/// not and resets to the default on every open.
#[derive(Debug)]
pub struct ReaderSession {
    book_id: String,
    total_chapters: u32,
    current_chapter: u32,
    font_size: u16,
    theme: Theme,
}

impl ReaderSession {
    /// Opens a book at its saved position.
    ///
    /// Returns `None` for an id the catalog does not know. Saved progress
    /// beyond the advertised chapter count is clamped into range, and the
    /// landing chapter is written back so the book has a progress record
    /// from its first open onward.
    pub fn open(catalog: &Catalog, storage: &mut Storage, book_id: &str) -> Option<ReaderSession> {
        let book = catalog.get(book_id)?;
        let total_chapters = book.total_chapters.max(1);
        let current_chapter = progress::load_progress(storage, book_id).clamp(1, total_chapters);
        progress::save_progress(storage, book_id, current_chapter);
        info!("Opened {} at chapter {}", book_id, current_chapter);
        Some(ReaderSession {
            book_id: book_id.to_string(),
            total_chapters,
            current_chapter,
            font_size: FONT_SIZE_DEFAULT,
            theme: Theme::from_storage(storage),
        })
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn current_chapter(&self) -> u32 {
        self.current_chapter
    }

    pub fn total_chapters(&self) -> u32 {
        self.total_chapters
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Moves to a chapter, clamped to the book's range. Returns whether the
    /// position changed; progress is saved only on an actual move.
    pub fn go_to_chapter(&mut self, storage: &mut Storage, chapter: u32) -> bool {
        let clamped = chapter.clamp(1, self.total_chapters);
        if clamped == self.current_chapter {
            return false;
        }
        self.current_chapter = clamped;
        progress::save_progress(storage, &self.book_id, clamped);
        debug!("Moved {} to chapter {}", self.book_id, clamped);
        true
    }

    pub fn next_chapter(&mut self, storage: &mut Storage) -> bool {
        self.go_to_chapter(storage, self.current_chapter.saturating_add(1))
    }

    pub fn previous_chapter(&mut self, storage: &mut Storage) -> bool {
        self.go_to_chapter(storage, self.current_chapter.saturating_sub(1).max(1))
    }

    pub fn increase_font(&mut self) {
        self.font_size = (self.font_size + FONT_SIZE_STEP).min(FONT_SIZE_MAX);
    }

    pub fn decrease_font(&mut self) {
        self.font_size = self.font_size.saturating_sub(FONT_SIZE_STEP).max(FONT_SIZE_MIN);
    }

    /// Display width of the text column for the current size.
    pub fn content_width(&self) -> u16 {
        self.font_size * CONTENT_COLS_PER_FONT_PT
    }

    pub fn toggle_theme(&mut self, storage: &mut Storage) {
        self.theme = self.theme.toggled();
        storage.set(THEME_KEY, self.theme.as_str());
    }

    /// Whole-book position as a percentage of chapters entered.
    pub fn progress_percent(&self) -> u16 {
        let percent = (self.current_chapter as f64 / self.total_chapters as f64) * 100.0;
        percent.round() as u16
    }
}
