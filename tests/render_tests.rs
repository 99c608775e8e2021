use elyora::Chapter;
use elyora::annotations::Highlight;
use elyora::render::{self, RunKind};

fn chapter(paragraphs: &[&str]) -> Chapter {
    Chapter {
        title: "Chapter 1: The Beginning".to_string(),
        subtitle: "The journey starts".to_string(),
        paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
    }
}

// Render only reads the paragraph index and the character offsets; the
// snapshot text is along for the ride.
fn highlight(paragraph: usize, start: usize, end: usize) -> Highlight {
    Highlight {
        id: format!("hl-{}-{}", paragraph, start),
        book: "starlit-guide".to_string(),
        chapter: 1,
        paragraph,
        start,
        end,
        text: String::new(),
        timestamp: "2024-05-01T10:00:00+00:00".to_string(),
    }
}

#[test]
fn test_runs_concatenate_to_source() {
    let chapter = chapter(&["The journey starts here.", "Second paragraph."]);
    let rendered = render::render_chapter(&chapter, &[], None);

    assert_eq!(rendered.paragraphs.len(), 2);
    assert_eq!(rendered.paragraphs[0].text(), "The journey starts here.");
    assert_eq!(rendered.paragraphs[1].text(), "Second paragraph.");
    assert!(!rendered.search_found());
}

#[test]
fn test_highlight_splits_paragraph_into_runs() {
    let chapter = chapter(&["The journey starts here."]);
    let rendered = render::render_chapter(&chapter, &[highlight(0, 4, 11)], None);

    let runs = &rendered.paragraphs[0].runs;
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[0].text, "The ");
    assert_eq!(runs[0].kind, RunKind::Plain);
    assert_eq!(runs[1].text, "journey");
    assert_eq!(runs[1].kind, RunKind::Highlight);
    assert_eq!(runs[2].text, " starts here.");
    assert_eq!(runs[2].kind, RunKind::Plain);
    assert_eq!(rendered.paragraphs[0].text(), "The journey starts here.");
}

#[test]
fn test_adjacent_highlights_merge() {
    let chapter = chapter(&["abcdefg"]);
    let rendered =
        render::render_chapter(&chapter, &[highlight(0, 0, 3), highlight(0, 3, 7)], None);

    let runs = &rendered.paragraphs[0].runs;
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].text, "abcdefg");
    assert_eq!(runs[0].kind, RunKind::Highlight);
}

#[test]
fn test_highlight_only_marks_its_paragraph() {
    let chapter = chapter(&["same text", "same text"]);
    let rendered = render::render_chapter(&chapter, &[highlight(1, 0, 4)], None);

    assert!(rendered.paragraphs[0]
        .runs
        .iter()
        .all(|run| run.kind == RunKind::Plain));
    assert_eq!(rendered.paragraphs[1].runs[0].kind, RunKind::Highlight);
    assert_eq!(rendered.paragraphs[1].runs[0].text, "same");
}

#[test]
fn test_stale_highlight_offsets_clamped() {
    let chapter = chapter(&["short"]);

    // End past the paragraph is clipped to what exists.
    let rendered = render::render_chapter(&chapter, &[highlight(0, 2, 50)], None);
    let runs = &rendered.paragraphs[0].runs;
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].text, "sh");
    assert_eq!(runs[1].text, "ort");
    assert_eq!(runs[1].kind, RunKind::Highlight);

    // A span entirely beyond the text is dropped.
    let rendered = render::render_chapter(&chapter, &[highlight(0, 9, 12)], None);
    let runs = &rendered.paragraphs[0].runs;
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].kind, RunKind::Plain);
    assert_eq!(runs[0].text, "short");
}

#[test]
fn test_search_is_case_insensitive() {
    let chapter = chapter(&["The Journey starts.", "Another journey begins."]);
    let rendered = render::render_chapter(&chapter, &[], Some("journey"));

    assert!(rendered.search_found());
    assert_eq!(rendered.search_hits, 2);

    // The match keeps the original casing of the text.
    let marked: Vec<&str> = rendered.paragraphs[0]
        .runs
        .iter()
        .filter(|run| run.kind == RunKind::SearchMatch)
        .map(|run| run.text.as_str())
        .collect();
    assert_eq!(marked, vec!["Journey"]);
}

#[test]
fn test_search_counts_every_occurrence() {
    let chapter = chapter(&["the cat and the hat, the end"]);
    let rendered = render::render_chapter(&chapter, &[], Some("the"));

    assert_eq!(rendered.search_hits, 3);
}

#[test]
fn test_search_query_is_literal() {
    let chapter = chapter(&["1. Begin. Then 1x begins."]);
    let rendered = render::render_chapter(&chapter, &[], Some("1."));

    // "1." must not behave as a regex and swallow "1x".
    assert_eq!(rendered.search_hits, 1);
    let marked: Vec<&str> = rendered.paragraphs[0]
        .runs
        .iter()
        .filter(|run| run.kind == RunKind::SearchMatch)
        .map(|run| run.text.as_str())
        .collect();
    assert_eq!(marked, vec!["1."]);
}

#[test]
fn test_search_match_wins_over_highlight() {
    let chapter = chapter(&["magic crystal"]);
    let rendered = render::render_chapter(&chapter, &[highlight(0, 0, 5)], Some("magic"));

    let runs = &rendered.paragraphs[0].runs;
    assert_eq!(runs[0].text, "magic");
    assert_eq!(runs[0].kind, RunKind::SearchMatch);
    assert_eq!(rendered.paragraphs[0].text(), "magic crystal");
}

#[test]
fn test_blank_query_leaves_no_marks() {
    let chapter = chapter(&["The journey starts here."]);

    for query in [None, Some(""), Some("   ")] {
        let rendered = render::render_chapter(&chapter, &[], query);
        assert!(!rendered.search_found());
        assert!(rendered.paragraphs[0]
            .runs
            .iter()
            .all(|run| run.kind == RunKind::Plain));
    }
}

#[test]
fn test_new_query_replaces_previous_marks() {
    let chapter = chapter(&["The journey starts here."]);

    let first = render::render_chapter(&chapter, &[], Some("the"));
    assert!(first.search_found());

    // Re-rendering with a different query carries nothing over.
    let second = render::render_chapter(&chapter, &[], Some("zzz"));
    assert!(!second.search_found());
    assert_eq!(second.search_hits, 0);
    assert!(second.paragraphs[0]
        .runs
        .iter()
        .all(|run| run.kind == RunKind::Plain));
}

#[test]
fn test_empty_paragraph_renders_no_runs() {
    let chapter = chapter(&["", "text"]);
    let rendered = render::render_chapter(&chapter, &[], None);

    assert!(rendered.paragraphs[0].runs.is_empty());
    assert_eq!(rendered.paragraphs[0].text(), "");
    assert_eq!(rendered.paragraphs[1].text(), "text");
}

#[test]
fn test_char_slice_counts_characters() {
    assert_eq!(render::char_slice("héllo wörld", 2, 5), "llo");
    assert_eq!(render::char_slice("héllo", 0, 50), "héllo");
    assert_eq!(render::char_slice("héllo", 4, 2), "");
}

#[test]
fn test_search_matches_report_char_offsets() {
    // The multi-byte 'é' must not shift the reported offsets.
    let spans = render::search_matches("héllo wörld wörld", "wörld");
    assert_eq!(spans, vec![(6, 11), (12, 17)]);
}
