use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use elyora::annotations;
use elyora::progress;
use elyora::{App, Catalog, Storage};
use tempfile::TempDir;

fn test_app(temp_dir: &TempDir) -> App {
    App::new(Catalog::builtin(), Storage::open(temp_dir.path()))
}

fn press(app: &mut App, code: KeyCode) {
    app.handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
}

#[test]
fn test_app_initialization() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir);

    assert!(!app.is_reading());
    assert!(app.open_book_id().is_none());
    assert!(app.current_chapter().is_none());
    assert!(!app.sidebar_expanded());
    assert!(app.latest_toast().is_none());
    assert_eq!(app.catalog().len(), 6);
}

#[test]
fn test_open_reader_enters_reader() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = test_app(&temp_dir);

    assert!(app.open_reader("self-mastery"));
    assert!(app.is_reading());
    assert_eq!(app.open_book_id(), Some("self-mastery"));
    assert_eq!(app.current_chapter(), Some(1));
    assert!(app.storage().contains("progress_self-mastery"));
}

#[test]
fn test_open_reader_unknown_book_returns_to_library() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = test_app(&temp_dir);

    assert!(!app.open_reader("no-such-book"));
    assert!(!app.is_reading());
    assert!(app.open_book_id().is_none());
    assert_eq!(app.latest_toast(), Some("Book \"no-such-book\" not found"));
}

#[test]
fn test_open_reader_restores_saved_progress() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut storage = Storage::open(temp_dir.path());
        progress::save_progress(&mut storage, "business-tactics", 4);
    }

    let mut app = test_app(&temp_dir);
    assert!(app.open_reader("business-tactics"));
    assert_eq!(app.current_chapter(), Some(4));
}

#[test]
fn test_reanchor_highlights_mid_paragraph() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = test_app(&temp_dir);
    assert!(app.open_reader("starlit-guide"));

    // Select the word "the" out of "In the beginning, ...": enter selection
    // mode, jump a word ahead, re-drop the anchor there, extend two
    // characters, confirm.
    press(&mut app, KeyCode::Char('v'));
    press(&mut app, KeyCode::Char('w'));
    press(&mut app, KeyCode::Char('v'));
    press(&mut app, KeyCode::Char('l'));
    press(&mut app, KeyCode::Char('l'));
    press(&mut app, KeyCode::Enter);

    let highlights = annotations::highlights_for(app.storage(), "starlit-guide");
    assert_eq!(highlights.len(), 1);
    assert_eq!(highlights[0].text, "the");
    assert_eq!(highlights[0].chapter, 1);
    assert_eq!(highlights[0].paragraph, 0);
    assert_eq!(highlights[0].start, 3);
    assert_eq!(highlights[0].end, 6);
    assert_eq!(app.latest_toast(), Some("Highlighted: \"the\""));
}

#[test]
fn test_selection_starts_at_scrolled_paragraph() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = test_app(&temp_dir);
    assert!(app.open_reader("starlit-guide"));

    // Shrink the viewport so the chapter overflows, scroll past the first
    // paragraph, and select: the selection opens on the paragraph at the
    // top of the view, not at the start of the chapter.
    app.handle_event(Event::Resize(80, 12));
    for _ in 0..4 {
        press(&mut app, KeyCode::Char('j'));
    }
    press(&mut app, KeyCode::Char('v'));
    press(&mut app, KeyCode::Enter);

    let highlights = annotations::highlights_for(app.storage(), "starlit-guide");
    assert_eq!(highlights.len(), 1);
    assert_eq!(highlights[0].paragraph, 1);
    assert_eq!(highlights[0].text, "S");
}

#[test]
fn test_toggle_sidebar_persists() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = test_app(&temp_dir);

    app.toggle_sidebar();
    assert!(app.sidebar_expanded());
    assert_eq!(app.storage().get("sidebarExpanded"), Some("true"));

    app.toggle_sidebar();
    assert!(!app.sidebar_expanded());
    assert_eq!(app.storage().get("sidebarExpanded"), Some("false"));
}

#[test]
fn test_sidebar_state_restored_on_startup() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut storage = Storage::open(temp_dir.path());
        storage.set("sidebarExpanded", "true");
    }

    let app = test_app(&temp_dir);
    assert!(app.sidebar_expanded());
}
