use elyora::annotations::{self, NoteColor};
use elyora::render;
use elyora::{Catalog, NoteError, RunKind, SelectionError, Storage};
use tempfile::TempDir;

const PARAGRAPH: &str =
    "The keeper's warnings echoed in her mind as she climbed the spiral staircase.";

#[test]
fn test_create_highlight_snapshots_text() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    let highlight =
        annotations::create_highlight(&mut storage, "starlit-guide", 1, 2, PARAGRAPH, 4, 21)
            .expect("Failed to create highlight");

    assert_eq!(highlight.text, "keeper's warnings");
    assert_eq!(highlight.book, "starlit-guide");
    assert_eq!(highlight.chapter, 1);
    assert_eq!(highlight.paragraph, 2);
    assert_eq!(highlight.start, 4);
    assert_eq!(highlight.end, 21);
    assert!(highlight.id.starts_with("hl-"));
    // RFC 3339 timestamps keep date and time separated by 'T'.
    assert!(highlight.timestamp.contains('T'));
}

#[test]
fn test_highlight_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut storage = Storage::open(temp_dir.path());
        annotations::create_highlight(&mut storage, "starlit-guide", 1, 2, PARAGRAPH, 4, 21)
            .expect("Failed to create highlight");
    }

    let storage = Storage::open(temp_dir.path());
    let highlights = annotations::highlights_for(&storage, "starlit-guide");
    assert_eq!(highlights.len(), 1);
    assert_eq!(highlights[0].text, "keeper's warnings");
    assert!(annotations::highlights_for(&storage, "atomic-habits").is_empty());
}

#[test]
fn test_highlight_reappears_when_chapter_renders() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());
    let catalog = Catalog::builtin();
    let book = catalog.get("starlit-guide").unwrap();
    assert_eq!(book.chapter(1).unwrap().paragraphs[2], PARAGRAPH);

    annotations::create_highlight(&mut storage, "starlit-guide", 1, 2, PARAGRAPH, 4, 21)
        .expect("Failed to create highlight");

    let saved = annotations::highlights_for_chapter(&storage, "starlit-guide", 1);
    let rendered = render::render_chapter(book.chapter(1).unwrap(), &saved, None);
    let marked: Vec<&str> = rendered.paragraphs[2]
        .runs
        .iter()
        .filter(|run| run.kind == RunKind::Highlight)
        .map(|run| run.text.as_str())
        .collect();
    assert_eq!(marked, vec!["keeper's warnings"]);

    // The next chapter renders clean.
    let saved = annotations::highlights_for_chapter(&storage, "starlit-guide", 2);
    let rendered = render::render_chapter(book.chapter(2).unwrap(), &saved, None);
    assert!(rendered
        .paragraphs
        .iter()
        .flat_map(|paragraph| paragraph.runs.iter())
        .all(|run| run.kind == RunKind::Plain));
}

#[test]
fn test_out_of_range_selection_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    let result = annotations::create_highlight(&mut storage, "starlit-guide", 1, 0, "short", 2, 50);
    match result.unwrap_err() {
        SelectionError::OutOfRange { start, end, len } => {
            assert_eq!(start, 2);
            assert_eq!(end, 50);
            assert_eq!(len, 5);
        }
        other => panic!("Expected OutOfRange, got: {:?}", other),
    }

    let result = annotations::create_highlight(&mut storage, "starlit-guide", 1, 0, "short", 3, 3);
    match result.unwrap_err() {
        SelectionError::OutOfRange { .. } => {}
        other => panic!("Expected OutOfRange, got: {:?}", other),
    }
    assert!(annotations::highlights_for(&storage, "starlit-guide").is_empty());
}

#[test]
fn test_blank_selection_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    let result =
        annotations::create_highlight(&mut storage, "starlit-guide", 1, 0, "word   word", 4, 7);
    match result.unwrap_err() {
        SelectionError::EmptySelection => {}
        other => panic!("Expected EmptySelection, got: {:?}", other),
    }
    assert!(annotations::highlights_for(&storage, "starlit-guide").is_empty());
}

#[test]
fn test_highlights_filtered_by_chapter() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    annotations::create_highlight(&mut storage, "starlit-guide", 1, 0, PARAGRAPH, 0, 3)
        .expect("Failed to create first highlight");
    annotations::create_highlight(&mut storage, "starlit-guide", 2, 0, PARAGRAPH, 4, 21)
        .expect("Failed to create second highlight");

    let chapter_one = annotations::highlights_for_chapter(&storage, "starlit-guide", 1);
    assert_eq!(chapter_one.len(), 1);
    assert_eq!(chapter_one[0].text, "The");

    let chapter_two = annotations::highlights_for_chapter(&storage, "starlit-guide", 2);
    assert_eq!(chapter_two.len(), 1);
    assert_eq!(chapter_two[0].text, "keeper's warnings");

    assert!(annotations::highlights_for_chapter(&storage, "starlit-guide", 3).is_empty());
    assert_eq!(annotations::highlights_for(&storage, "starlit-guide").len(), 2);
}

#[test]
fn test_note_trimmed_and_saved() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    let note = annotations::add_note(
        &mut storage,
        "starlit-guide",
        2,
        "  remember the staircase  ",
        false,
        NoteColor::Yellow,
    )
    .expect("Failed to save note");

    assert_eq!(note.text, "remember the staircase");
    assert_eq!(note.chapter, 2);
    assert!(!note.is_private);
    assert_eq!(note.color, NoteColor::Yellow);

    let notes = annotations::notes_for(&storage, "starlit-guide");
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].text, "remember the staircase");
}

#[test]
fn test_blank_note_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    let result = annotations::add_note(
        &mut storage,
        "starlit-guide",
        1,
        "   \t ",
        false,
        NoteColor::Yellow,
    );
    match result.unwrap_err() {
        NoteError::EmptyText => {}
    }
    assert!(annotations::notes_for(&storage, "starlit-guide").is_empty());
}

#[test]
fn test_notes_append_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    annotations::add_note(&mut storage, "starlit-guide", 1, "first", false, NoteColor::Yellow)
        .expect("Failed to save first note");
    annotations::add_note(&mut storage, "starlit-guide", 3, "second", true, NoteColor::Pink)
        .expect("Failed to save second note");

    let notes = annotations::notes_for(&storage, "starlit-guide");
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].text, "first");
    assert_eq!(notes[1].text, "second");
    assert!(notes[1].is_private);
    assert_eq!(notes[1].color, NoteColor::Pink);
}

#[test]
fn test_note_serialized_field_names() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = Storage::open(temp_dir.path());

    annotations::add_note(&mut storage, "starlit-guide", 1, "keep this", true, NoteColor::Pink)
        .expect("Failed to save note");

    let raw = storage.get("bookNotes").expect("Notes key missing");
    assert!(raw.contains("\"private\":true"));
    assert!(raw.contains("\"color\":\"pink\""));
}

#[test]
fn test_note_color_cycle() {
    assert_eq!(NoteColor::Yellow.next(), NoteColor::Blue);
    assert_eq!(NoteColor::Blue.next(), NoteColor::Green);
    assert_eq!(NoteColor::Green.next(), NoteColor::Pink);
    assert_eq!(NoteColor::Pink.next(), NoteColor::Yellow);
    // Labels share the lowercase vocabulary the records are stored with.
    assert_eq!(NoteColor::Yellow.label(), "yellow");
    assert_eq!(NoteColor::Pink.label(), "pink");
}
