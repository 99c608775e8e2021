use regex::Regex;
use tracing::debug;

use crate::annotations::Highlight;
use crate::catalog::Chapter;

/// How a run of chapter text should be drawn.
///
/// Search matches win over highlights where the two overlap, so an active
/// search stays visible inside highlighted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Plain,
    Highlight,
    SearchMatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub kind: RunKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedParagraph {
    pub runs: Vec<TextRun>,
}

impl RenderedParagraph {
    /// The paragraph text with markup stripped. Always equals the source
    /// paragraph regardless of how many spans decorate it.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChapter {
    pub paragraphs: Vec<RenderedParagraph>,
    pub search_hits: usize,
}

impl RenderedChapter {
    pub fn search_found(&self) -> bool {
        self.search_hits > 0
    }
}

/// Copies `text[start..end]` measured in characters.
pub fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// Finds every literal, case-insensitive occurrence of `query` in a
/// paragraph. Returned spans are character offsets, start inclusive and end
/// exclusive, in order and non-overlapping.
pub fn search_matches(paragraph: &str, query: &str) -> Vec<(usize, usize)> {
    if query.is_empty() {
        return Vec::new();
    }
    let pattern = format!("(?i){}", regex::escape(query));
    let regex = match Regex::new(&pattern) {
        Ok(regex) => regex,
        Err(err) => {
            debug!("Search pattern rejected: {}", err);
            return Vec::new();
        }
    };
    regex
        .find_iter(paragraph)
        .map(|found| {
            let start = paragraph[..found.start()].chars().count();
            let len = found.as_str().chars().count();
            (start, start + len)
        })
        .collect()
}

/// Projects one chapter into flat display runs.
///
/// Takes the chapter text, the highlights saved for this chapter, and the
/// active search query, and decides per character which kind wins. The
/// inputs stay untouched; calling this again with a different query is how
/// search marks appear and disappear.
pub fn render_chapter(
    chapter: &Chapter,
    highlights: &[Highlight],
    query: Option<&str>,
) -> RenderedChapter {
    let query = query.map(str::trim).filter(|q| !q.is_empty());
    let mut paragraphs = Vec::with_capacity(chapter.paragraphs.len());
    let mut search_hits = 0;
    for (index, paragraph) in chapter.paragraphs.iter().enumerate() {
        let len = paragraph.chars().count();
        let highlight_spans: Vec<(usize, usize)> = highlights
            .iter()
            .filter(|highlight| highlight.paragraph == index)
            .filter_map(|highlight| {
                // Offsets may predate a catalog revision; drop what no
                // longer fits instead of panicking mid-draw.
                let end = highlight.end.min(len);
                (highlight.start < end).then_some((highlight.start, end))
            })
            .collect();
        let search_spans = query
            .map(|q| search_matches(paragraph, q))
            .unwrap_or_default();
        search_hits += search_spans.len();
        paragraphs.push(RenderedParagraph {
            runs: merge_runs(paragraph, &highlight_spans, &search_spans),
        });
    }
    RenderedChapter {
        paragraphs,
        search_hits,
    }
}

/// Splits a paragraph at every span boundary and tags each piece.
fn merge_runs(
    text: &str,
    highlights: &[(usize, usize)],
    searches: &[(usize, usize)],
) -> Vec<TextRun> {
    let len = text.chars().count();
    if len == 0 {
        return Vec::new();
    }
    let mut bounds = vec![0, len];
    for &(start, end) in highlights.iter().chain(searches) {
        bounds.push(start.min(len));
        bounds.push(end.min(len));
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut runs: Vec<TextRun> = Vec::new();
    for window in bounds.windows(2) {
        let (start, end) = (window[0], window[1]);
        if start == end {
            continue;
        }
        let kind = if covers(searches, start) {
            RunKind::SearchMatch
        } else if covers(highlights, start) {
            RunKind::Highlight
        } else {
            RunKind::Plain
        };
        let piece = char_slice(text, start, end);
        match runs.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(&piece),
            _ => runs.push(TextRun { text: piece, kind }),
        }
    }
    runs
}

fn covers(spans: &[(usize, usize)], point: usize) -> bool {
    spans.iter().any(|&(start, end)| start <= point && point < end)
}
