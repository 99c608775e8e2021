use crate::annotations::{self, NoteColor};
use crate::catalog::{Book, Catalog, Chapter};
use crate::constants::{
    DEFAULT_TERMINAL_HEIGHT, EVENT_POLL_MS, HIGHLIGHT_PREVIEW_LEN, READER_FOOTER_HEIGHT,
    READER_HEADER_HEIGHT, SIDEBAR_WIDTH_COLLAPSED, SIDEBAR_WIDTH_EXPANDED, UI_RESERVED_HEIGHT,
};
use crate::error::{NoteError, SelectionError, UiError};
use crate::markers::{self, MarkerKind};
use crate::reader::{ReaderSession, Theme};
use crate::render::{self, RenderedParagraph, RunKind};
use crate::storage::Storage;
use crate::toast::ToastQueue;
use chrono::DateTime;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, BorderType, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph,
        Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
};
use std::io;
use std::time::Duration;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

pub const SIDEBAR_KEY: &str = "sidebarExpanded";

const MENU: [(&str, &str, &str); 5] = [
    ("1", "⌂", "Home"),
    ("2", "♥", "Favourites"),
    ("3", "⬇", "Downloads"),
    ("4", "✉", "Feedback"),
    ("5", "?", "Help"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Library,
    Favourites,
    Downloads,
    Feedback,
    Help,
}

impl Page {
    fn menu_index(self) -> usize {
        match self {
            Page::Library => 0,
            Page::Favourites => 1,
            Page::Downloads => 2,
            Page::Feedback => 3,
            Page::Help => 4,
        }
    }
}

#[derive(Debug)]
enum Screen {
    Library,
    Favourites,
    Downloads,
    Feedback,
    Help,
    Reader(ReaderView),
}

impl Screen {
    fn page(&self) -> Option<Page> {
        match self {
            Screen::Library => Some(Page::Library),
            Screen::Favourites => Some(Page::Favourites),
            Screen::Downloads => Some(Page::Downloads),
            Screen::Feedback => Some(Page::Feedback),
            Screen::Help => Some(Page::Help),
            Screen::Reader(_) => None,
        }
    }
}

/// Character selection in progress inside the reader.
///
/// Anchor and cursor are character offsets of grapheme starts inside one
/// paragraph; the saved range spans from the smaller offset through the end
/// of the grapheme under the larger one.
#[derive(Debug, Clone, Copy)]
struct Selection {
    paragraph: usize,
    anchor: usize,
    cursor: usize,
}

#[derive(Debug)]
struct ReaderView {
    session: ReaderSession,
    scroll_offset: usize,
    search_input: Option<String>,
    active_query: Option<String>,
    selection: Option<Selection>,
}

impl ReaderView {
    fn new(session: ReaderSession) -> ReaderView {
        ReaderView {
            session,
            scroll_offset: 0,
            search_input: None,
            active_query: None,
            selection: None,
        }
    }

    /// Entering a chapter starts from a clean slate: top of the text, no
    /// search marks, no pending selection.
    fn reset_for_chapter(&mut self) {
        self.scroll_offset = 0;
        self.search_input = None;
        self.active_query = None;
        self.selection = None;
    }
}

#[derive(Debug)]
enum Modal {
    None,
    BookDetails {
        book_id: String,
    },
    NoteEditor {
        text: String,
        private: bool,
        color: NoteColor,
    },
    NotesList {
        selected_index: usize,
    },
    ChapterIndex {
        selected_index: usize,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum FeedbackField {
    #[default]
    Name,
    Email,
    Message,
}

impl FeedbackField {
    fn next(self) -> FeedbackField {
        match self {
            FeedbackField::Name => FeedbackField::Email,
            FeedbackField::Email => FeedbackField::Message,
            FeedbackField::Message => FeedbackField::Name,
        }
    }

    fn previous(self) -> FeedbackField {
        match self {
            FeedbackField::Name => FeedbackField::Message,
            FeedbackField::Email => FeedbackField::Name,
            FeedbackField::Message => FeedbackField::Email,
        }
    }
}

#[derive(Debug, Default)]
struct FeedbackForm {
    name: String,
    email: String,
    message: String,
    field: FeedbackField,
}

impl FeedbackForm {
    fn field_mut(&mut self) -> &mut String {
        match self.field {
            FeedbackField::Name => &mut self.name,
            FeedbackField::Email => &mut self.email,
            FeedbackField::Message => &mut self.message,
        }
    }
}

/// Everything a frame needs, borrowed from the app for the draw call.
struct DrawState<'a> {
    catalog: &'a Catalog,
    storage: &'a Storage,
    screen: &'a Screen,
    modal: &'a Modal,
    sidebar_expanded: bool,
    library_query: &'a str,
    search_focused: bool,
    library_index: usize,
    shelf_index: usize,
    feedback: &'a FeedbackForm,
    toast: Option<&'a str>,
    terminal_height: usize,
}

pub struct App {
    catalog: Catalog,
    storage: Storage,
    screen: Screen,
    modal: Modal,
    sidebar_expanded: bool,
    toasts: ToastQueue,
    library_query: String,
    search_focused: bool,
    library_index: usize,
    shelf_index: usize,
    feedback: FeedbackForm,
    terminal_height: usize,
    terminal: Option<Terminal<CrosstermBackend<io::Stdout>>>,
}

impl App {
    pub fn new(catalog: Catalog, storage: Storage) -> App {
        let sidebar_expanded = storage.get(SIDEBAR_KEY) == Some("true");
        App {
            catalog,
            storage,
            screen: Screen::Library,
            modal: Modal::None,
            sidebar_expanded,
            toasts: ToastQueue::new(),
            library_query: String::new(),
            search_focused: false,
            library_index: 0,
            shelf_index: 0,
            feedback: FeedbackForm::default(),
            terminal_height: DEFAULT_TERMINAL_HEIGHT,
            terminal: None,
        }
    }

    // Public accessors for testing
    #[allow(dead_code)]
    pub fn is_reading(&self) -> bool {
        matches!(self.screen, Screen::Reader(_))
    }

    #[allow(dead_code)]
    pub fn open_book_id(&self) -> Option<&str> {
        match &self.screen {
            Screen::Reader(view) => Some(view.session.book_id()),
            _ => None,
        }
    }

    #[allow(dead_code)]
    pub fn current_chapter(&self) -> Option<u32> {
        match &self.screen {
            Screen::Reader(view) => Some(view.session.current_chapter()),
            _ => None,
        }
    }

    #[allow(dead_code)]
    pub fn sidebar_expanded(&self) -> bool {
        self.sidebar_expanded
    }

    #[allow(dead_code)]
    pub fn latest_toast(&self) -> Option<&str> {
        self.toasts.latest()
    }

    #[allow(dead_code)]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[allow(dead_code)]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Opens a book in the reader. An id the catalog does not know lands on
    /// the library page instead of an error state.
    pub fn open_reader(&mut self, book_id: &str) -> bool {
        match ReaderSession::open(&self.catalog, &mut self.storage, book_id) {
            Some(session) => {
                self.modal = Modal::None;
                self.screen = Screen::Reader(ReaderView::new(session));
                true
            }
            None => {
                warn!("Unknown book id {:?}, returning to the library", book_id);
                self.toasts.push(format!("Book \"{}\" not found", book_id));
                self.screen = Screen::Library;
                false
            }
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_expanded = !self.sidebar_expanded;
        let value = if self.sidebar_expanded { "true" } else { "false" };
        self.storage.set(SIDEBAR_KEY, value);
    }

    /// Routes one terminal event. Returns true when the app should exit.
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) => {
                if self.handle_modal_input(key) {
                    return false;
                }
                if matches!(self.screen, Screen::Reader(_)) {
                    self.handle_reader_input(key)
                } else {
                    self.handle_browse_input(key)
                }
            }
            Event::Resize(_, rows) => {
                self.terminal_height = rows as usize;
                false
            }
            _ => false,
        }
    }

    pub fn run(&mut self) -> Result<(), UiError> {
        self.setup_terminal()?;

        loop {
            self.draw_frame()?;

            // Poll instead of block so expired toasts leave the screen
            // without waiting for a keypress.
            if !event::poll(Duration::from_millis(EVENT_POLL_MS))? {
                continue;
            }
            if self.handle_event(event::read()?) {
                break;
            }
        }

        self.cleanup_terminal()?;

        Ok(())
    }

    fn setup_terminal(&mut self) -> Result<(), UiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        self.terminal = Some(terminal);
        Ok(())
    }

    fn cleanup_terminal(&mut self) -> Result<(), UiError> {
        if let Some(mut terminal) = self.terminal.take() {
            disable_raw_mode()?;
            execute!(
                terminal.backend_mut(),
                LeaveAlternateScreen,
                DisableMouseCapture
            )?;
            terminal.show_cursor()?;
        }
        Ok(())
    }

    fn draw_frame(&mut self) -> Result<(), UiError> {
        let toast = self.toasts.current().map(|toast| toast.message.clone());
        if let Some(terminal) = self.terminal.as_mut() {
            self.terminal_height = terminal.size()?.height as usize;
            let state = DrawState {
                catalog: &self.catalog,
                storage: &self.storage,
                screen: &self.screen,
                modal: &self.modal,
                sidebar_expanded: self.sidebar_expanded,
                library_query: &self.library_query,
                search_focused: self.search_focused,
                library_index: self.library_index,
                shelf_index: self.shelf_index,
                feedback: &self.feedback,
                toast: toast.as_deref(),
                terminal_height: self.terminal_height,
            };
            terminal.draw(|f| Self::draw_ui(f, &state))?;
        }
        Ok(())
    }

    fn draw_ui(f: &mut Frame, state: &DrawState) {
        match state.screen {
            Screen::Reader(view) => Self::draw_reader(f, state, view),
            _ => Self::draw_browse(f, state),
        }
        Self::draw_modal(f, state);
        if let Some(message) = state.toast {
            Self::draw_toast(f, message);
        }
    }

    // ----- browse screens -----

    fn draw_browse(f: &mut Frame, state: &DrawState) {
        let sidebar_width = if state.sidebar_expanded {
            SIDEBAR_WIDTH_EXPANDED
        } else {
            SIDEBAR_WIDTH_COLLAPSED
        };
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(sidebar_width), Constraint::Min(0)])
            .split(f.area());

        Self::draw_sidebar(f, state, chunks[0]);
        match state.screen {
            Screen::Library => Self::draw_library(f, state, chunks[1]),
            Screen::Favourites => Self::draw_shelf(f, state, chunks[1], MarkerKind::Favourite),
            Screen::Downloads => Self::draw_shelf(f, state, chunks[1], MarkerKind::Download),
            Screen::Feedback => Self::draw_feedback(f, state, chunks[1]),
            Screen::Help => Self::draw_help(f, chunks[1]),
            Screen::Reader(_) => {}
        }
    }

    fn draw_sidebar(f: &mut Frame, state: &DrawState, area: Rect) {
        let active = state.screen.page().map(Page::menu_index);
        let mut lines = vec![Line::from("")];
        for (index, (key, icon, label)) in MENU.iter().enumerate() {
            let style = if active == Some(index) {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let text = if state.sidebar_expanded {
                format!(" {} {} {}", key, icon, label)
            } else {
                format!(" {}", icon)
            };
            lines.push(Line::from(Span::styled(text, style)));
        }
        lines.push(Line::from(""));
        let hint = if state.sidebar_expanded {
            " s ◀ collapse"
        } else {
            " s"
        };
        lines.push(Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(Color::DarkGray),
        )));

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray));
        if state.sidebar_expanded {
            block = block
                .title(" ELYORA ")
                .title_style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD));
        }
        f.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_library(f: &mut Frame, state: &DrawState, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Welcome banner
                Constraint::Length(3), // Filter box
                Constraint::Min(0),    // Book list
                Constraint::Length(2), // Help text
            ])
            .split(area);

        let banner = Paragraph::new(vec![
            Line::from(vec![
                Span::styled("Welcome to ", Style::default().fg(Color::White)),
                Span::styled(
                    "ELYORA",
                    Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(Span::styled(
                "Your gateway to infinite stories",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Magenta))
                .padding(Padding::horizontal(1)),
        );
        f.render_widget(banner, chunks[0]);

        let filter_style = if state.search_focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let filter_text = if state.library_query.is_empty() && !state.search_focused {
            "Search books...".to_string()
        } else if state.search_focused {
            format!("{}█", state.library_query)
        } else {
            state.library_query.to_string()
        };
        let filter = Paragraph::new(format!("🔍 {}", filter_text))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(filter_style)
                    .title(" Filter "),
            )
            .style(filter_style);
        f.render_widget(filter, chunks[1]);

        let books = state.catalog.filter(state.library_query);
        let list_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!("📚 All Books ({}) ", books.len()));
        if books.is_empty() {
            let empty = Paragraph::new("No books match your search.")
                .block(list_block)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            f.render_widget(empty, chunks[2]);
        } else {
            let items: Vec<ListItem> = books
                .iter()
                .map(|book| Self::book_list_item(book, state.storage))
                .collect();
            let list = List::new(items)
                .block(list_block)
                .highlight_style(
                    Style::default()
                        .bg(Color::Cyan)
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("▶ ");
            let mut list_state = ListState::default();
            list_state.select(Some(state.library_index.min(books.len() - 1)));
            f.render_stateful_widget(list, chunks[2], &mut list_state);
        }

        let help = Paragraph::new(Line::from(vec![
            Span::styled("↑↓", Style::default().fg(Color::Cyan)),
            Span::styled(":select ", Style::default().fg(Color::DarkGray)),
            Span::styled("⏎", Style::default().fg(Color::Yellow)),
            Span::styled(":details ", Style::default().fg(Color::DarkGray)),
            Span::styled("r", Style::default().fg(Color::Green)),
            Span::styled(":read ", Style::default().fg(Color::DarkGray)),
            Span::styled("f", Style::default().fg(Color::Red)),
            Span::styled(":favourite ", Style::default().fg(Color::DarkGray)),
            Span::styled("d", Style::default().fg(Color::Green)),
            Span::styled(":download ", Style::default().fg(Color::DarkGray)),
            Span::styled("/", Style::default().fg(Color::Magenta)),
            Span::styled(":filter ", Style::default().fg(Color::DarkGray)),
            Span::styled("q", Style::default().fg(Color::Red)),
            Span::styled(":quit", Style::default().fg(Color::DarkGray)),
        ]))
        .alignment(Alignment::Center);
        f.render_widget(help, chunks[3]);
    }

    fn book_list_item(book: &Book, storage: &Storage) -> ListItem<'static> {
        let mut spans = vec![
            Span::styled(
                book.title.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  by {}", book.author), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("  ⭐ {:.1}", book.rating), Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("  {} chapters", book.total_chapters),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if markers::is_marked(storage, MarkerKind::Favourite, &book.id) {
            spans.push(Span::styled("  ♥", Style::default().fg(Color::Red)));
        }
        if markers::is_marked(storage, MarkerKind::Download, &book.id) {
            spans.push(Span::styled("  ⬇", Style::default().fg(Color::Green)));
        }
        ListItem::new(Line::from(spans))
    }

    fn draw_shelf(f: &mut Frame, state: &DrawState, area: Rect, kind: MarkerKind) {
        let books: Vec<&Book> = markers::marked_books(state.storage, kind)
            .iter()
            .filter_map(|id| state.catalog.get(id))
            .collect();

        let (heading, count_line, empty_title, empty_hint) = match kind {
            MarkerKind::Favourite => (
                "❤ My favourites",
                format!("{} favourite books saved", books.len()),
                "No favourites yet",
                "Save your favourite books to easily access them anytime.",
            ),
            MarkerKind::Download => (
                "⬇ Downloaded Books",
                format!("{} downloaded books (available offline)", books.len()),
                "No downloads yet",
                "Download books for offline reading by pressing d on any book.",
            ),
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Page header
                Constraint::Min(0),    // Shelf list
                Constraint::Length(2), // Help text
            ])
            .split(area);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                heading,
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(count_line, Style::default().fg(Color::DarkGray))),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Cyan))
                .padding(Padding::horizontal(1)),
        );
        f.render_widget(header, chunks[0]);

        if books.is_empty() {
            let empty = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    empty_title,
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(empty_hint, Style::default().fg(Color::DarkGray))),
                Line::from(""),
                Line::from(Span::styled(
                    "Press 1 to browse books",
                    Style::default().fg(Color::Cyan),
                )),
            ])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .alignment(Alignment::Center);
            f.render_widget(empty, chunks[1]);
        } else {
            let items: Vec<ListItem> = books
                .iter()
                .map(|book| Self::book_list_item(book, state.storage))
                .collect();
            let list = List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(Color::Cyan)),
                )
                .highlight_style(
                    Style::default()
                        .bg(Color::Cyan)
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("▶ ");
            let mut list_state = ListState::default();
            list_state.select(Some(state.shelf_index.min(books.len() - 1)));
            f.render_stateful_widget(list, chunks[1], &mut list_state);
        }

        let remove_key = match kind {
            MarkerKind::Favourite => "f",
            MarkerKind::Download => "d",
        };
        let help = Paragraph::new(Line::from(vec![
            Span::styled("↑↓", Style::default().fg(Color::Cyan)),
            Span::styled(":select ", Style::default().fg(Color::DarkGray)),
            Span::styled("⏎", Style::default().fg(Color::Yellow)),
            Span::styled(":details ", Style::default().fg(Color::DarkGray)),
            Span::styled("r", Style::default().fg(Color::Green)),
            Span::styled(":read ", Style::default().fg(Color::DarkGray)),
            Span::styled(remove_key, Style::default().fg(Color::Red)),
            Span::styled(":remove ", Style::default().fg(Color::DarkGray)),
            Span::styled("1-5", Style::default().fg(Color::Cyan)),
            Span::styled(":pages", Style::default().fg(Color::DarkGray)),
        ]))
        .alignment(Alignment::Center);
        f.render_widget(help, chunks[2]);
    }

    fn draw_feedback(f: &mut Frame, state: &DrawState, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Page header
                Constraint::Length(3), // Name
                Constraint::Length(3), // Email
                Constraint::Length(3), // Message
                Constraint::Length(4), // Other ways to reach us
                Constraint::Min(0),
                Constraint::Length(2), // Help text
            ])
            .split(area);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                "💬 Share Your Feedback",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Help us improve ELYORA by sharing your thoughts, suggestions, or reporting issues.",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Cyan))
                .padding(Padding::horizontal(1)),
        )
        .wrap(Wrap { trim: true });
        f.render_widget(header, chunks[0]);

        let form = state.feedback;
        Self::draw_feedback_field(
            f,
            chunks[1],
            "Name",
            &form.name,
            "Your full name",
            form.field == FeedbackField::Name,
        );
        Self::draw_feedback_field(
            f,
            chunks[2],
            "Email",
            &form.email,
            "your@email.com",
            form.field == FeedbackField::Email,
        );
        Self::draw_feedback_field(
            f,
            chunks[3],
            "Message",
            &form.message,
            "Tell us about your experience...",
            form.field == FeedbackField::Message,
        );

        let contact = Paragraph::new(vec![
            Line::from(Span::styled(
                "Email support: support@elyora.com",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "Response time: usually within 24 hours",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Other ways to reach us ")
                .padding(Padding::horizontal(1)),
        );
        f.render_widget(contact, chunks[4]);

        let help = Paragraph::new(Line::from(vec![
            Span::styled("Tab", Style::default().fg(Color::Yellow)),
            Span::styled(":next field ", Style::default().fg(Color::DarkGray)),
            Span::styled("⏎", Style::default().fg(Color::Green)),
            Span::styled(":send ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Red)),
            Span::styled(":back to library", Style::default().fg(Color::DarkGray)),
        ]))
        .alignment(Alignment::Center);
        f.render_widget(help, chunks[6]);
    }

    fn draw_feedback_field(
        f: &mut Frame,
        area: Rect,
        label: &str,
        value: &str,
        placeholder: &str,
        focused: bool,
    ) {
        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let content = if value.is_empty() && !focused {
            Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray))
        } else if focused {
            Span::styled(format!("{}█", value), Style::default().fg(Color::White))
        } else {
            Span::styled(value.to_string(), Style::default().fg(Color::White))
        };
        let field = Paragraph::new(Line::from(content)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(border_style)
                .title(format!(" {} * ", label)),
        );
        f.render_widget(field, area);
    }

    fn draw_help(f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(2)])
            .split(area);

        let feature = |icon: &str, name: &str, blurb: &str| {
            Line::from(vec![
                Span::styled(format!("  {} ", icon), Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("{:<20}", name),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(blurb.to_string(), Style::default().fg(Color::DarkGray)),
            ])
        };

        let lines = vec![
            Line::from(Span::styled(
                "❓ Help Center",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Everything you need to know about using ELYORA",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Key Features",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            feature("🔍", "Smart Search", "find books by title or author with real-time filtering"),
            feature("❤", "Favourites", "save your favourite books for quick access later"),
            feature("⬇", "Offline Reading", "download books for offline reading"),
            feature("📖", "Continue Reading", "pick up where you left off automatically"),
            feature("🖊", "Highlights & Notes", "mark important passages and add personal notes"),
            feature("⚙", "Customizable Reader", "adjust text size and themes while you read"),
            Line::from(""),
            Line::from(Span::styled(
                "Keys",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "  1-5 switch pages, s sidebar, / filter, q quit",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "  Enter details, r read, f favourite, d download",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "  Reader: ←→ chapters, ↑↓ scroll, +/- text size, t theme, / search",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "  Reader: v highlight, n add note, N view notes, c chapters",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Still need help?  ", Style::default().fg(Color::White)),
                Span::styled(
                    "support@elyora.com (usually within 24 hours)",
                    Style::default().fg(Color::Cyan),
                ),
            ]),
        ];

        let help_page = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(" Help ")
                    .padding(Padding::horizontal(1)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(help_page, chunks[0]);

        let help = Paragraph::new(Line::from(vec![
            Span::styled("1-5", Style::default().fg(Color::Cyan)),
            Span::styled(":pages ", Style::default().fg(Color::DarkGray)),
            Span::styled("s", Style::default().fg(Color::Yellow)),
            Span::styled(":sidebar ", Style::default().fg(Color::DarkGray)),
            Span::styled("q", Style::default().fg(Color::Red)),
            Span::styled(":quit", Style::default().fg(Color::DarkGray)),
        ]))
        .alignment(Alignment::Center);
        f.render_widget(help, chunks[1]);
    }

    // ----- reader screen -----

    fn draw_reader(f: &mut Frame, state: &DrawState, view: &ReaderView) {
        let Some(book) = state.catalog.get(view.session.book_id()) else {
            return;
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(READER_HEADER_HEIGHT as u16),
                Constraint::Min(0),
                Constraint::Length(READER_FOOTER_HEIGHT as u16),
            ])
            .split(f.area());

        let title_line = Line::from(vec![
            Span::styled("📖 ", Style::default().fg(Color::Cyan)),
            Span::styled(
                book.title.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
        ]);
        let author_line = Line::from(vec![
            Span::styled("   by ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                book.author.clone(),
                Style::default().fg(Color::LightBlue).add_modifier(Modifier::ITALIC),
            ),
            Span::styled(
                format!(
                    "   {}px · {} theme",
                    view.session.font_size(),
                    view.session.theme().as_str()
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        let header = Paragraph::new(vec![title_line, author_line])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Cyan))
                    .padding(Padding::horizontal(1)),
            )
            .alignment(Alignment::Left);
        f.render_widget(header, chunks[0]);

        // Text size maps to the width of the centered reading column.
        let column_width = view.session.content_width().min(chunks[1].width);
        let content_area = Rect {
            x: chunks[1].x + chunks[1].width.saturating_sub(column_width) / 2,
            y: chunks[1].y,
            width: column_width,
            height: chunks[1].height,
        };

        let lines = Self::build_reader_lines(book, view, state.storage);
        let total_lines = lines.len();
        let visible_lines = state.terminal_height.saturating_sub(UI_RESERVED_HEIGHT);
        let visible: Vec<Line> = lines
            .into_iter()
            .skip(view.scroll_offset)
            .take(visible_lines)
            .collect();

        let chapter_number = view.session.current_chapter();
        let chapter_title = book
            .chapter(chapter_number)
            .map(|chapter| chapter.title.clone())
            .unwrap_or_else(|| format!("Chapter {}", chapter_number));
        let content_style = match view.session.theme() {
            Theme::Dark => Style::default().fg(Color::White),
            Theme::Light => Style::default().fg(Color::Black).bg(Color::White),
        };
        let content = Paragraph::new(visible)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Blue))
                    .title(format!("│ {} ", chapter_title))
                    .title_style(Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD))
                    .padding(Padding::new(2, 1, 0, 0)),
            )
            .style(content_style)
            .wrap(Wrap { trim: false });
        f.render_widget(content, content_area);

        if total_lines > visible_lines {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█")
                .style(Style::default().fg(Color::Cyan));

            let mut scrollbar_state =
                ScrollbarState::new(total_lines.saturating_sub(visible_lines))
                    .position(view.scroll_offset);

            let scrollbar_area = Rect {
                x: content_area.x + content_area.width.saturating_sub(1),
                y: content_area.y + 1,
                width: 1,
                height: content_area.height.saturating_sub(2),
            };

            f.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
        }

        Self::draw_reader_footer(f, view, chunks[2]);
    }

    fn draw_reader_footer(f: &mut Frame, view: &ReaderView, area: Rect) {
        let footer_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Progress bar
                Constraint::Length(2), // Help text
            ])
            .split(area);

        let progress_label = format!(
            "Chapter {} of {} · {}% complete",
            view.session.current_chapter(),
            view.session.total_chapters(),
            view.session.progress_percent()
        );
        let progress = Gauge::default()
            .block(Block::default())
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
            .percent(view.session.progress_percent())
            .label(progress_label);
        f.render_widget(progress, footer_chunks[0]);

        let dim = Style::default().fg(Color::DarkGray);
        let help_lines = if let Some(input) = &view.search_input {
            vec![Line::from(vec![
                Span::styled("🔍 Search in book: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("{}█", input),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::styled("   ⏎:search  Esc:cancel", dim),
            ])]
        } else if view.selection.is_some() {
            vec![Line::from(vec![
                Span::styled("←→", Style::default().fg(Color::Cyan)),
                Span::styled(":extend ", dim),
                Span::styled("w/b", Style::default().fg(Color::Green)),
                Span::styled(":word ", dim),
                Span::styled("v", Style::default().fg(Color::Yellow)),
                Span::styled(":anchor ", dim),
                Span::styled("↑↓", Style::default().fg(Color::Cyan)),
                Span::styled(":paragraph ", dim),
                Span::styled("⏎", Style::default().fg(Color::Yellow)),
                Span::styled(":save highlight ", dim),
                Span::styled("Esc", Style::default().fg(Color::Red)),
                Span::styled(":cancel", dim),
            ])]
        } else {
            vec![
                Line::from(vec![
                    Span::styled("q", Style::default().fg(Color::Red)),
                    Span::styled(":library ", dim),
                    Span::styled("←→", Style::default().fg(Color::Green)),
                    Span::styled(":chapter ", dim),
                    Span::styled("↑↓", Style::default().fg(Color::Cyan)),
                    Span::styled(":scroll ", dim),
                    Span::styled("⎵", Style::default().fg(Color::Yellow)),
                    Span::styled(":page ", dim),
                    Span::styled("+/-", Style::default().fg(Color::Yellow)),
                    Span::styled(":text size ", dim),
                    Span::styled("t", Style::default().fg(Color::Magenta)),
                    Span::styled(":theme", dim),
                ]),
                Line::from(vec![
                    Span::styled("/", Style::default().fg(Color::Magenta)),
                    Span::styled(":search ", dim),
                    Span::styled("v", Style::default().fg(Color::Yellow)),
                    Span::styled(":highlight ", dim),
                    Span::styled("n", Style::default().fg(Color::Green)),
                    Span::styled(":add note ", dim),
                    Span::styled("N", Style::default().fg(Color::Green)),
                    Span::styled(":view notes ", dim),
                    Span::styled("c", Style::default().fg(Color::Blue)),
                    Span::styled(":chapters", dim),
                ]),
            ]
        };
        let footer = Paragraph::new(help_lines)
            .block(
                Block::default()
                    .borders(Borders::TOP | Borders::LEFT | Borders::RIGHT)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .alignment(Alignment::Center);
        f.render_widget(footer, footer_chunks[1]);
    }

    fn build_reader_lines(book: &Book, view: &ReaderView, storage: &Storage) -> Vec<Line<'static>> {
        let theme = view.session.theme();
        let number = view.session.current_chapter();
        let mut lines = Vec::new();
        match book.chapter(number) {
            Some(chapter) => {
                lines.push(Line::from(Span::styled(
                    chapter.title.clone(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                if !chapter.subtitle.is_empty() {
                    lines.push(Line::from(Span::styled(
                        chapter.subtitle.clone(),
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                    )));
                }
                lines.push(Line::from(""));

                let highlights =
                    annotations::highlights_for_chapter(storage, &book.id, number);
                let rendered =
                    render::render_chapter(chapter, &highlights, view.active_query.as_deref());
                for (index, paragraph) in rendered.paragraphs.iter().enumerate() {
                    let selection = view.selection.filter(|sel| sel.paragraph == index);
                    lines.push(paragraph_line(
                        &chapter.paragraphs[index],
                        paragraph,
                        selection,
                        theme,
                    ));
                    lines.push(Line::from(""));
                }
                if !rendered.paragraphs.is_empty() {
                    lines.pop();
                }
            }
            None => {
                lines.push(Line::from(Span::styled(
                    "This chapter has no content yet.".to_string(),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Use ←/→ to move between chapters.".to_string(),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        lines
    }

    /// Line count of `build_reader_lines` without building the spans.
    /// Keep the two in sync.
    fn reader_line_total(book: &Book, chapter_number: u32) -> usize {
        match book.chapter(chapter_number) {
            Some(chapter) => {
                let body = if chapter.paragraphs.is_empty() {
                    0
                } else {
                    chapter.paragraphs.len() * 2 - 1
                };
                chapter_head_lines(chapter) + body
            }
            None => 3,
        }
    }

    // ----- modals -----

    fn draw_modal(f: &mut Frame, state: &DrawState) {
        match state.modal {
            Modal::None => {}
            Modal::BookDetails { book_id } => Self::draw_book_details(f, state, book_id),
            Modal::NoteEditor { text, private, color } => {
                Self::draw_note_editor(f, state, text, *private, *color)
            }
            Modal::NotesList { selected_index } => {
                Self::draw_notes_list(f, state, *selected_index)
            }
            Modal::ChapterIndex { selected_index } => {
                Self::draw_chapter_index(f, state, *selected_index)
            }
        }
    }

    fn draw_book_details(f: &mut Frame, state: &DrawState, book_id: &str) {
        let Some(book) = state.catalog.get(book_id) else {
            return;
        };
        let popup = popup_area(f.area(), 70, 70);
        clear_popup(f, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(popup);

        let favourite = markers::is_marked(state.storage, MarkerKind::Favourite, &book.id);
        let downloaded = markers::is_marked(state.storage, MarkerKind::Download, &book.id);
        let marker_line = |marked: bool, icon: &str, yes: &str, no: &str, color: Color| {
            if marked {
                Line::from(Span::styled(
                    format!("{} {}", icon, yes),
                    Style::default().fg(color),
                ))
            } else {
                Line::from(Span::styled(
                    format!("{} {}", icon, no),
                    Style::default().fg(Color::DarkGray),
                ))
            }
        };

        let body = Paragraph::new(vec![
            Line::from(vec![
                Span::styled("📖 ", Style::default().fg(Color::Cyan)),
                Span::styled(
                    book.title.clone(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(Span::styled(
                format!("by {}", book.author),
                Style::default().fg(Color::LightBlue).add_modifier(Modifier::ITALIC),
            )),
            Line::from(vec![
                Span::styled(stars(book.rating), Style::default().fg(Color::Yellow)),
                Span::styled(format!(" {:.1}", book.rating), Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("   {} chapters", book.total_chapters),
                    Style::default().fg(Color::DarkGray),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                book.description.clone(),
                Style::default().fg(Color::White),
            )),
            Line::from(""),
            marker_line(
                favourite,
                "♥",
                "In your favourites",
                "Not in favourites",
                Color::Red,
            ),
            marker_line(
                downloaded,
                "⬇",
                "Downloaded for offline reading",
                "Not downloaded",
                Color::Green,
            ),
            Line::from(""),
            Line::from(Span::styled(
                "No reviews yet.",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )),
            Line::from(Span::styled(
                format!("cover: {}", book.cover),
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .wrap(Wrap { trim: true });

        let frame_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Magenta))
            .title(" Book details ");
        f.render_widget(frame_block, popup);
        f.render_widget(body, chunks[0]);

        let help = Paragraph::new(Line::from(vec![
            Span::styled("⏎", Style::default().fg(Color::Green)),
            Span::styled(" start reading  ", Style::default().fg(Color::DarkGray)),
            Span::styled("f", Style::default().fg(Color::Red)),
            Span::styled(" favourite  ", Style::default().fg(Color::DarkGray)),
            Span::styled("d", Style::default().fg(Color::Green)),
            Span::styled(" download  ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::styled(" close", Style::default().fg(Color::DarkGray)),
        ]))
        .alignment(Alignment::Center);
        f.render_widget(help, chunks[1]);
    }

    fn draw_note_editor(
        f: &mut Frame,
        state: &DrawState,
        text: &str,
        private: bool,
        color: NoteColor,
    ) {
        let popup = popup_area(f.area(), 60, 50);
        clear_popup(f, popup);

        let title = match state.screen {
            Screen::Reader(view) => {
                format!(" Add Note (Chapter {}) ", view.session.current_chapter())
            }
            _ => " Add Note ".to_string(),
        };
        let frame_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title);
        f.render_widget(frame_block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(1), // Color and privacy options
                Constraint::Min(0),    // Note text
                Constraint::Length(1), // Help text
            ])
            .split(popup);

        let options = Paragraph::new(Line::from(vec![
            Span::styled("Color: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("● {}", color.label()),
                Style::default().fg(note_color(color)),
            ),
            Span::styled("    Private note: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                if private { "[x]" } else { "[ ]" },
                Style::default().fg(Color::White),
            ),
        ]));
        f.render_widget(options, chunks[0]);

        let body = if text.is_empty() {
            Paragraph::new(Span::styled(
                "Write your note here...",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))
        } else {
            Paragraph::new(format!("{}█", text)).style(Style::default().fg(Color::White))
        };
        f.render_widget(body.wrap(Wrap { trim: false }), chunks[1]);

        let help = Paragraph::new(Line::from(vec![
            Span::styled("⏎", Style::default().fg(Color::Green)),
            Span::styled(" save  ", Style::default().fg(Color::DarkGray)),
            Span::styled("Tab", Style::default().fg(Color::Yellow)),
            Span::styled(" color  ", Style::default().fg(Color::DarkGray)),
            Span::styled("Ctrl+p", Style::default().fg(Color::Magenta)),
            Span::styled(" private  ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Red)),
            Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
        ]))
        .alignment(Alignment::Center);
        f.render_widget(help, chunks[2]);
    }

    fn draw_notes_list(f: &mut Frame, state: &DrawState, selected_index: usize) {
        let Screen::Reader(view) = state.screen else {
            return;
        };
        let notes = annotations::notes_for(state.storage, view.session.book_id());
        let popup = popup_area(f.area(), 70, 70);
        clear_popup(f, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(popup);

        let items: Vec<ListItem> = notes
            .iter()
            .map(|note| {
                let accent = Style::default().fg(note_color(note.color));
                let mut meta = vec![
                    Span::styled("▎", accent),
                    Span::styled(
                        format!(
                            "Chapter {} • {}",
                            note.chapter,
                            format_timestamp(&note.timestamp)
                        ),
                        Style::default().fg(Color::DarkGray),
                    ),
                ];
                if note.is_private {
                    meta.push(Span::styled(
                        "  (private)",
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                    ));
                }
                ListItem::new(Text::from(vec![
                    Line::from(meta),
                    Line::from(vec![
                        Span::styled("▎", accent),
                        Span::styled(note.text.clone(), Style::default().fg(Color::White)),
                    ]),
                    Line::from(""),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(format!(" Your Notes ({}) ", notes.len())),
            )
            .highlight_style(Style::default().add_modifier(Modifier::BOLD))
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        list_state.select(if notes.is_empty() {
            None
        } else {
            Some(selected_index.min(notes.len() - 1))
        });
        f.render_stateful_widget(list, chunks[0], &mut list_state);

        let help = Paragraph::new(Line::from(vec![
            Span::styled("↑↓", Style::default().fg(Color::Yellow)),
            Span::raw(" navigate  "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" close"),
        ]))
        .alignment(Alignment::Center);
        f.render_widget(help, chunks[1]);
    }

    fn draw_chapter_index(f: &mut Frame, state: &DrawState, selected_index: usize) {
        let Screen::Reader(view) = state.screen else {
            return;
        };
        let Some(book) = state.catalog.get(view.session.book_id()) else {
            return;
        };
        let popup = popup_area(f.area(), 60, 50);
        clear_popup(f, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(popup);

        let items: Vec<ListItem> = (1..=book.total_chapters)
            .map(|number| {
                let title = book
                    .chapter(number)
                    .map(|chapter| chapter.title.clone())
                    .unwrap_or_else(|| format!("Chapter {}", number));
                let marker = if number == view.session.current_chapter() {
                    "● "
                } else {
                    "  "
                };
                ListItem::new(format!("{}{}: {}", marker, number, title))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Blue))
                    .title(format!("📑 Chapters ({}) ", book.total_chapters))
                    .style(Style::default().fg(Color::Blue)),
            )
            .style(Style::default().fg(Color::White))
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        list_state.select(Some(selected_index));
        f.render_stateful_widget(list, chunks[0], &mut list_state);

        let help = Paragraph::new(Line::from(vec![
            Span::styled("↑↓", Style::default().fg(Color::Blue)),
            Span::raw(" navigate  "),
            Span::styled("Enter", Style::default().fg(Color::Blue)),
            Span::raw(" open  "),
            Span::styled("Esc", Style::default().fg(Color::Blue)),
            Span::raw(" close"),
        ]))
        .alignment(Alignment::Center);
        f.render_widget(help, chunks[1]);
    }

    fn draw_toast(f: &mut Frame, message: &str) {
        let area = f.area();
        let width = (message.chars().count() as u16 + 4).min(area.width.saturating_sub(2));
        let height = 3u16.min(area.height);
        let rect = Rect {
            x: area.width.saturating_sub(width + 1),
            y: area.height.saturating_sub(height + 1),
            width,
            height,
        };
        f.render_widget(Clear, rect);
        let toast = Paragraph::new(message.to_string())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .style(Style::default().fg(Color::Yellow))
            .wrap(Wrap { trim: true });
        f.render_widget(toast, rect);
    }

    // ----- input: modals -----

    fn handle_modal_input(&mut self, key: KeyEvent) -> bool {
        let modal = std::mem::replace(&mut self.modal, Modal::None);

        match modal {
            Modal::None => false,
            Modal::BookDetails { book_id } => {
                match key.code {
                    KeyCode::Esc => {}
                    KeyCode::Enter | KeyCode::Char('r') => {
                        self.open_reader(&book_id);
                    }
                    KeyCode::Char('f') => {
                        self.toggle_marker(MarkerKind::Favourite, &book_id);
                        self.modal = Modal::BookDetails { book_id };
                    }
                    KeyCode::Char('d') => {
                        self.toggle_marker(MarkerKind::Download, &book_id);
                        self.modal = Modal::BookDetails { book_id };
                    }
                    _ => self.modal = Modal::BookDetails { book_id },
                }
                true
            }
            Modal::NoteEditor {
                mut text,
                mut private,
                mut color,
            } => {
                match key.code {
                    KeyCode::Char('p') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        private = !private;
                        self.modal = Modal::NoteEditor { text, private, color };
                    }
                    KeyCode::Esc => {}
                    KeyCode::Enter => {
                        if !self.save_note(&text, private, color) {
                            self.modal = Modal::NoteEditor { text, private, color };
                        }
                    }
                    KeyCode::Tab => {
                        color = color.next();
                        self.modal = Modal::NoteEditor { text, private, color };
                    }
                    KeyCode::Backspace => {
                        text.pop();
                        self.modal = Modal::NoteEditor { text, private, color };
                    }
                    KeyCode::Char(c) => {
                        text.push(c);
                        self.modal = Modal::NoteEditor { text, private, color };
                    }
                    _ => self.modal = Modal::NoteEditor { text, private, color },
                }
                true
            }
            Modal::NotesList { mut selected_index } => {
                let count = match &self.screen {
                    Screen::Reader(view) => {
                        annotations::notes_for(&self.storage, view.session.book_id()).len()
                    }
                    _ => 0,
                };
                match key.code {
                    KeyCode::Esc => {}
                    KeyCode::Up | KeyCode::Char('k') => {
                        selected_index = selected_index.saturating_sub(1);
                        self.modal = Modal::NotesList { selected_index };
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        if selected_index + 1 < count {
                            selected_index += 1;
                        }
                        self.modal = Modal::NotesList { selected_index };
                    }
                    _ => self.modal = Modal::NotesList { selected_index },
                }
                true
            }
            Modal::ChapterIndex { mut selected_index } => {
                let total = match &self.screen {
                    Screen::Reader(view) => view.session.total_chapters() as usize,
                    _ => 0,
                };
                match key.code {
                    KeyCode::Esc => {}
                    KeyCode::Up | KeyCode::Char('k') => {
                        selected_index = selected_index.saturating_sub(1);
                        self.modal = Modal::ChapterIndex { selected_index };
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        if selected_index + 1 < total {
                            selected_index += 1;
                        }
                        self.modal = Modal::ChapterIndex { selected_index };
                    }
                    KeyCode::Enter => {
                        self.jump_to_chapter(selected_index as u32 + 1);
                    }
                    _ => self.modal = Modal::ChapterIndex { selected_index },
                }
                true
            }
        }
    }

    // ----- input: browse screens -----

    fn handle_browse_input(&mut self, key: KeyEvent) -> bool {
        if self.search_focused && matches!(self.screen, Screen::Library) {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => self.search_focused = false,
                KeyCode::Backspace => {
                    self.library_query.pop();
                    self.library_index = 0;
                }
                KeyCode::Char(c) => {
                    self.library_query.push(c);
                    self.library_index = 0;
                }
                _ => {}
            }
            return false;
        }

        // The feedback form captures plain typing, so it handles its own keys.
        if matches!(self.screen, Screen::Feedback) {
            self.handle_feedback_key(key);
            return false;
        }

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('s') => self.toggle_sidebar(),
            KeyCode::Char('1') => self.go_to_page(Page::Library),
            KeyCode::Char('2') => self.go_to_page(Page::Favourites),
            KeyCode::Char('3') => self.go_to_page(Page::Downloads),
            KeyCode::Char('4') => self.go_to_page(Page::Feedback),
            KeyCode::Char('5') => self.go_to_page(Page::Help),
            KeyCode::Char('/') if matches!(self.screen, Screen::Library) => {
                self.search_focused = true;
            }
            _ => match self.screen.page() {
                Some(Page::Library) => self.handle_library_key(key),
                Some(Page::Favourites) => self.handle_shelf_key(key, MarkerKind::Favourite),
                Some(Page::Downloads) => self.handle_shelf_key(key, MarkerKind::Download),
                _ => {}
            },
        }
        false
    }

    fn go_to_page(&mut self, page: Page) {
        self.screen = match page {
            Page::Library => Screen::Library,
            Page::Favourites => Screen::Favourites,
            Page::Downloads => Screen::Downloads,
            Page::Feedback => Screen::Feedback,
            Page::Help => Screen::Help,
        };
        self.shelf_index = 0;
        self.search_focused = false;
    }

    fn visible_library_ids(&self) -> Vec<String> {
        self.catalog
            .filter(&self.library_query)
            .iter()
            .map(|book| book.id.clone())
            .collect()
    }

    fn shelf_ids(&self, kind: MarkerKind) -> Vec<String> {
        markers::marked_books(&self.storage, kind)
            .into_iter()
            .filter(|id| self.catalog.get(id).is_some())
            .collect()
    }

    fn handle_library_key(&mut self, key: KeyEvent) {
        let ids = self.visible_library_ids();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.library_index = (self.library_index + 1).min(ids.len().saturating_sub(1));
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.library_index = self.library_index.saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some(id) = ids.get(self.library_index) {
                    self.modal = Modal::BookDetails { book_id: id.clone() };
                }
            }
            KeyCode::Char('r') => {
                if let Some(id) = ids.get(self.library_index).cloned() {
                    self.open_reader(&id);
                }
            }
            KeyCode::Char('f') => {
                if let Some(id) = ids.get(self.library_index).cloned() {
                    self.toggle_marker(MarkerKind::Favourite, &id);
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = ids.get(self.library_index).cloned() {
                    self.toggle_marker(MarkerKind::Download, &id);
                }
            }
            _ => {}
        }
    }

    fn handle_shelf_key(&mut self, key: KeyEvent, kind: MarkerKind) {
        let ids = self.shelf_ids(kind);
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.shelf_index = (self.shelf_index + 1).min(ids.len().saturating_sub(1));
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.shelf_index = self.shelf_index.saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some(id) = ids.get(self.shelf_index) {
                    self.modal = Modal::BookDetails { book_id: id.clone() };
                }
            }
            KeyCode::Char('r') => {
                if let Some(id) = ids.get(self.shelf_index).cloned() {
                    self.open_reader(&id);
                }
            }
            KeyCode::Char('f') => {
                if let Some(id) = ids.get(self.shelf_index).cloned() {
                    self.toggle_marker(MarkerKind::Favourite, &id);
                    self.clamp_shelf_index(kind);
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = ids.get(self.shelf_index).cloned() {
                    self.toggle_marker(MarkerKind::Download, &id);
                    self.clamp_shelf_index(kind);
                }
            }
            _ => {}
        }
    }

    fn clamp_shelf_index(&mut self, kind: MarkerKind) {
        let len = self.shelf_ids(kind).len();
        self.shelf_index = self.shelf_index.min(len.saturating_sub(1));
    }

    fn handle_feedback_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.go_to_page(Page::Library),
            KeyCode::Tab => self.feedback.field = self.feedback.field.next(),
            KeyCode::BackTab => self.feedback.field = self.feedback.field.previous(),
            KeyCode::Enter => self.submit_feedback(),
            KeyCode::Backspace => {
                self.feedback.field_mut().pop();
            }
            KeyCode::Char(c) => self.feedback.field_mut().push(c),
            _ => {}
        }
    }

    fn submit_feedback(&mut self) {
        let form = &self.feedback;
        if form.name.trim().is_empty()
            || form.email.trim().is_empty()
            || form.message.trim().is_empty()
        {
            self.toasts.push("Please fill in name, email and message");
            return;
        }
        if !form.email.contains('@') {
            self.toasts.push("Please enter a valid email address");
            return;
        }
        self.feedback = FeedbackForm::default();
        self.toasts
            .push("Thanks for your feedback! We usually respond within 24 hours.");
    }

    fn toggle_marker(&mut self, kind: MarkerKind, book_id: &str) {
        let marked = markers::toggle(&mut self.storage, kind, book_id);
        let message = match (kind, marked) {
            (MarkerKind::Favourite, true) => "Added to favourites",
            (MarkerKind::Favourite, false) => "Removed from favourites",
            (MarkerKind::Download, true) => "Downloaded for offline reading",
            (MarkerKind::Download, false) => "Removed from downloads",
        };
        self.toasts.push(message);
    }

    // ----- input: reader -----

    fn handle_reader_input(&mut self, key: KeyEvent) -> bool {
        if self.reader_search_active() {
            self.handle_reader_search_key(key);
            return false;
        }
        if self.reader_selection_active() {
            self.handle_selection_key(key);
            return false;
        }
        self.handle_reader_nav_key(key);
        false
    }

    fn reader_search_active(&self) -> bool {
        matches!(&self.screen, Screen::Reader(view) if view.search_input.is_some())
    }

    fn reader_selection_active(&self) -> bool {
        matches!(&self.screen, Screen::Reader(view) if view.selection.is_some())
    }

    fn handle_reader_nav_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.close_reader(),
            KeyCode::Right | KeyCode::Char('l') => self.next_chapter(),
            KeyCode::Left | KeyCode::Char('h') => self.previous_chapter(),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(),
            KeyCode::PageDown | KeyCode::Char(' ') => self.page_down(),
            KeyCode::PageUp | KeyCode::Char('b') => self.page_up(),
            KeyCode::Home | KeyCode::Char('g') => self.scroll_to_top(),
            KeyCode::End | KeyCode::Char('G') => self.scroll_to_bottom(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_font(true),
            KeyCode::Char('-') | KeyCode::Char('_') => self.adjust_font(false),
            KeyCode::Char('t') => self.toggle_reader_theme(),
            KeyCode::Char('/') => self.open_search_prompt(),
            KeyCode::Char('v') => self.start_selection(),
            KeyCode::Char('n') => self.modal = Modal::NoteEditor {
                text: String::new(),
                private: false,
                color: NoteColor::Yellow,
            },
            KeyCode::Char('N') => self.open_notes_list(),
            KeyCode::Char('c') => self.open_chapter_index(),
            _ => {}
        }
    }

    fn close_reader(&mut self) {
        self.screen = Screen::Library;
    }

    fn next_chapter(&mut self) {
        if let Screen::Reader(view) = &mut self.screen {
            if view.session.next_chapter(&mut self.storage) {
                view.reset_for_chapter();
            }
        }
    }

    fn previous_chapter(&mut self) {
        if let Screen::Reader(view) = &mut self.screen {
            if view.session.previous_chapter(&mut self.storage) {
                view.reset_for_chapter();
            }
        }
    }

    fn jump_to_chapter(&mut self, chapter: u32) {
        if let Screen::Reader(view) = &mut self.screen {
            if view.session.go_to_chapter(&mut self.storage, chapter) {
                view.reset_for_chapter();
            }
        }
    }

    fn page_size(&self) -> usize {
        self.terminal_height.saturating_sub(UI_RESERVED_HEIGHT)
    }

    fn reader_max_scroll(&self) -> usize {
        let Screen::Reader(view) = &self.screen else {
            return 0;
        };
        let Some(book) = self.catalog.get(view.session.book_id()) else {
            return 0;
        };
        Self::reader_line_total(book, view.session.current_chapter())
            .saturating_sub(self.page_size())
    }

    fn scroll_down(&mut self) {
        let max_scroll = self.reader_max_scroll();
        if let Screen::Reader(view) = &mut self.screen {
            if view.scroll_offset < max_scroll {
                view.scroll_offset += 1;
            }
        }
    }

    fn scroll_up(&mut self) {
        if let Screen::Reader(view) = &mut self.screen {
            view.scroll_offset = view.scroll_offset.saturating_sub(1);
        }
    }

    fn page_down(&mut self) {
        let page_size = self.page_size();
        let max_scroll = self.reader_max_scroll();
        if let Screen::Reader(view) = &mut self.screen {
            view.scroll_offset = (view.scroll_offset + page_size).min(max_scroll);
        }
    }

    fn page_up(&mut self) {
        let page_size = self.page_size();
        if let Screen::Reader(view) = &mut self.screen {
            view.scroll_offset = view.scroll_offset.saturating_sub(page_size);
        }
    }

    fn scroll_to_top(&mut self) {
        if let Screen::Reader(view) = &mut self.screen {
            view.scroll_offset = 0;
        }
    }

    fn scroll_to_bottom(&mut self) {
        let max_scroll = self.reader_max_scroll();
        if let Screen::Reader(view) = &mut self.screen {
            view.scroll_offset = max_scroll;
        }
    }

    fn adjust_font(&mut self, increase: bool) {
        if let Screen::Reader(view) = &mut self.screen {
            if increase {
                view.session.increase_font();
            } else {
                view.session.decrease_font();
            }
        }
    }

    fn toggle_reader_theme(&mut self) {
        if let Screen::Reader(view) = &mut self.screen {
            view.session.toggle_theme(&mut self.storage);
        }
    }

    fn open_search_prompt(&mut self) {
        if let Screen::Reader(view) = &mut self.screen {
            view.search_input = Some(view.active_query.clone().unwrap_or_default());
        }
    }

    fn handle_reader_search_key(&mut self, key: KeyEvent) {
        let submitted = {
            let Screen::Reader(view) = &mut self.screen else {
                return;
            };
            let Some(input) = view.search_input.as_mut() else {
                return;
            };
            match key.code {
                KeyCode::Esc => {
                    view.search_input = None;
                    None
                }
                KeyCode::Enter => {
                    let query = input.trim().to_string();
                    view.search_input = None;
                    Some(query)
                }
                KeyCode::Backspace => {
                    input.pop();
                    None
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    None
                }
                _ => None,
            }
        };
        if let Some(query) = submitted {
            self.run_search(&query);
        }
    }

    /// Applies a search to the current chapter and reports the outcome.
    /// An empty query just clears the marks, without a notice.
    fn run_search(&mut self, query: &str) {
        let Screen::Reader(view) = &mut self.screen else {
            return;
        };
        if query.is_empty() {
            view.active_query = None;
            return;
        }
        view.active_query = Some(query.to_string());
        let book_id = view.session.book_id();
        let chapter_number = view.session.current_chapter();
        let found = self
            .catalog
            .get(book_id)
            .and_then(|book| book.chapter(chapter_number))
            .map(|chapter| {
                let highlights =
                    annotations::highlights_for_chapter(&self.storage, book_id, chapter_number);
                render::render_chapter(chapter, &highlights, Some(query)).search_found()
            })
            .unwrap_or(false);
        let message = if found {
            format!("Found \"{}\" in current chapter", query)
        } else {
            format!("\"{}\" not found in current chapter", query)
        };
        self.toasts.push(message);
    }

    fn start_selection(&mut self) {
        let Screen::Reader(view) = &mut self.screen else {
            return;
        };
        let Some(chapter) = self
            .catalog
            .get(view.session.book_id())
            .and_then(|book| book.chapter(view.session.current_chapter()))
        else {
            return;
        };
        let Some(paragraph) = initial_selection_paragraph(chapter, view.scroll_offset) else {
            return;
        };
        view.selection = Some(Selection {
            paragraph,
            anchor: 0,
            cursor: 0,
        });
    }

    fn handle_selection_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                if let Screen::Reader(view) = &mut self.screen {
                    view.selection = None;
                }
            }
            KeyCode::Enter | KeyCode::Char('y') => self.confirm_selection(),
            _ => self.move_selection(key),
        }
    }

    fn move_selection(&mut self, key: KeyEvent) {
        let Screen::Reader(view) = &mut self.screen else {
            return;
        };
        let Some(chapter) = self
            .catalog
            .get(view.session.book_id())
            .and_then(|book| book.chapter(view.session.current_chapter()))
        else {
            return;
        };
        let Some(selection) = view.selection.as_mut() else {
            return;
        };
        let Some(paragraph) = chapter.paragraphs.get(selection.paragraph) else {
            return;
        };

        match key.code {
            KeyCode::Right | KeyCode::Char('l') => {
                selection.cursor = next_grapheme(paragraph, selection.cursor);
            }
            KeyCode::Left | KeyCode::Char('h') => {
                selection.cursor = prev_grapheme(paragraph, selection.cursor);
            }
            KeyCode::Char('w') => {
                selection.cursor = next_word_start(paragraph, selection.cursor);
            }
            KeyCode::Char('b') => {
                selection.cursor = prev_word_start(paragraph, selection.cursor);
            }
            KeyCode::Home | KeyCode::Char('0') => selection.cursor = 0,
            KeyCode::End | KeyCode::Char('$') => {
                selection.cursor = last_grapheme_start(paragraph);
            }
            // Pressing v again drops the anchor at the cursor, so a span
            // can start mid-paragraph.
            KeyCode::Char('v') => selection.anchor = selection.cursor,
            KeyCode::Down | KeyCode::Char('j') => {
                let next = selection.paragraph + 1;
                if chapter
                    .paragraphs
                    .get(next)
                    .is_some_and(|paragraph| !paragraph.is_empty())
                {
                    *selection = Selection {
                        paragraph: next,
                        anchor: 0,
                        cursor: 0,
                    };
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if selection.paragraph > 0 {
                    let previous = selection.paragraph - 1;
                    if chapter
                        .paragraphs
                        .get(previous)
                        .is_some_and(|paragraph| !paragraph.is_empty())
                    {
                        *selection = Selection {
                            paragraph: previous,
                            anchor: 0,
                            cursor: 0,
                        };
                    }
                }
            }
            _ => {}
        }
    }

    fn confirm_selection(&mut self) {
        let Screen::Reader(view) = &mut self.screen else {
            return;
        };
        let Some(selection) = view.selection.take() else {
            return;
        };
        let book_id = view.session.book_id().to_string();
        let chapter_number = view.session.current_chapter();
        let Some(paragraph) = self
            .catalog
            .get(&book_id)
            .and_then(|book| book.chapter(chapter_number))
            .and_then(|chapter| chapter.paragraphs.get(selection.paragraph))
        else {
            self.toasts.push("Could not highlight this selection");
            return;
        };
        let (start, end) = selection_range(paragraph, &selection);
        match annotations::create_highlight(
            &mut self.storage,
            &book_id,
            chapter_number,
            selection.paragraph,
            paragraph,
            start,
            end,
        ) {
            Ok(highlight) => {
                self.toasts
                    .push(format!("Highlighted: \"{}\"", preview(&highlight.text)));
            }
            // A blank selection silently clears, like deselecting in a page.
            Err(SelectionError::EmptySelection) => {}
            Err(SelectionError::OutOfRange { .. }) => {
                self.toasts.push("Could not highlight this selection");
            }
        }
    }

    fn save_note(&mut self, text: &str, private: bool, color: NoteColor) -> bool {
        let Screen::Reader(view) = &self.screen else {
            return true;
        };
        match annotations::add_note(
            &mut self.storage,
            view.session.book_id(),
            view.session.current_chapter(),
            text,
            private,
            color,
        ) {
            Ok(_) => {
                self.toasts.push("Note saved successfully!");
                true
            }
            Err(NoteError::EmptyText) => {
                self.toasts.push("Please enter a note before saving");
                false
            }
        }
    }

    fn open_notes_list(&mut self) {
        let Screen::Reader(view) = &self.screen else {
            return;
        };
        let notes = annotations::notes_for(&self.storage, view.session.book_id());
        if notes.is_empty() {
            self.toasts.push("No notes yet. Add one!");
            return;
        }
        self.modal = Modal::NotesList { selected_index: 0 };
    }

    fn open_chapter_index(&mut self) {
        if let Screen::Reader(view) = &self.screen {
            self.modal = Modal::ChapterIndex {
                selected_index: view.session.current_chapter().saturating_sub(1) as usize,
            };
        }
    }
}

fn popup_area(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let popup_width = area.width.saturating_mul(width_percent).saturating_div(100);
    let popup_height = area.height.saturating_mul(height_percent).saturating_div(100);
    let x = area.width.saturating_sub(popup_width).saturating_div(2);
    let y = area.height.saturating_sub(popup_height).saturating_div(2);
    Rect {
        x,
        y,
        width: popup_width,
        height: popup_height,
    }
}

fn clear_popup(f: &mut Frame, popup: Rect) {
    // Shadow behind the floating box
    let shadow = Rect {
        x: popup.x + 1,
        y: popup.y + 1,
        width: popup.width,
        height: popup.height,
    };
    f.render_widget(Block::default().style(Style::default().bg(Color::Black)), shadow);
    f.render_widget(Clear, popup);
}

fn paragraph_line(
    source: &str,
    paragraph: &RenderedParagraph,
    selection: Option<Selection>,
    theme: Theme,
) -> Line<'static> {
    let plain = match theme {
        Theme::Dark => Style::default().fg(Color::White),
        Theme::Light => Style::default().fg(Color::Black),
    };

    // An in-progress selection paints over saved marks until it resolves.
    if let Some(selection) = selection {
        let (start, end) = selection_range(source, &selection);
        let len = source.chars().count();
        let mut spans = Vec::new();
        if start > 0 {
            spans.push(Span::styled(render::char_slice(source, 0, start), plain));
        }
        spans.push(Span::styled(
            render::char_slice(source, start, end),
            Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD),
        ));
        if end < len {
            spans.push(Span::styled(render::char_slice(source, end, len), plain));
        }
        return Line::from(spans);
    }

    let spans: Vec<Span> = paragraph
        .runs
        .iter()
        .map(|run| {
            let style = match run.kind {
                RunKind::Plain => plain,
                RunKind::Highlight => Style::default().bg(Color::LightYellow).fg(Color::Black),
                RunKind::SearchMatch => Style::default()
                    .bg(Color::Yellow)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            };
            Span::styled(run.text.clone(), style)
        })
        .collect();
    Line::from(spans)
}

/// Lines `build_reader_lines` spends on the chapter heading: title, blank
/// separator, and the subtitle when there is one.
fn chapter_head_lines(chapter: &Chapter) -> usize {
    if chapter.subtitle.is_empty() { 2 } else { 3 }
}

/// Paragraph where a fresh selection lands: the first non-empty paragraph
/// at or below the top of the scrolled view, falling back to the first
/// non-empty paragraph of the chapter.
fn initial_selection_paragraph(chapter: &Chapter, scroll: usize) -> Option<usize> {
    // Paragraph i sits on logical line head + 2i.
    let top = scroll.saturating_sub(chapter_head_lines(chapter)).div_ceil(2);
    (top..chapter.paragraphs.len())
        .find(|&index| !chapter.paragraphs[index].is_empty())
        .or_else(|| {
            chapter
                .paragraphs
                .iter()
                .position(|paragraph| !paragraph.is_empty())
        })
}

/// Characters covered by a selection: from the smaller endpoint through the
/// end of the grapheme under the larger one.
fn selection_range(text: &str, selection: &Selection) -> (usize, usize) {
    let start = selection.anchor.min(selection.cursor);
    let tail = selection.anchor.max(selection.cursor);
    (start, grapheme_end(text, tail))
}

fn grapheme_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut seen = 0;
    for grapheme in text.graphemes(true) {
        starts.push(seen);
        seen += grapheme.chars().count();
    }
    starts
}

fn next_grapheme(text: &str, cursor: usize) -> usize {
    grapheme_starts(text)
        .into_iter()
        .find(|&start| start > cursor)
        .unwrap_or(cursor)
}

fn prev_grapheme(text: &str, cursor: usize) -> usize {
    grapheme_starts(text)
        .into_iter()
        .rev()
        .find(|&start| start < cursor)
        .unwrap_or(0)
}

fn last_grapheme_start(text: &str) -> usize {
    grapheme_starts(text).last().copied().unwrap_or(0)
}

fn grapheme_end(text: &str, start: usize) -> usize {
    let mut seen = 0;
    for grapheme in text.graphemes(true) {
        let width = grapheme.chars().count();
        if seen == start {
            return seen + width;
        }
        seen += width;
    }
    text.chars().count()
}

fn word_starts(text: &str) -> Vec<usize> {
    text.unicode_word_indices()
        .map(|(byte_index, _)| text[..byte_index].chars().count())
        .collect()
}

fn next_word_start(text: &str, cursor: usize) -> usize {
    word_starts(text)
        .into_iter()
        .find(|&start| start > cursor)
        .unwrap_or_else(|| last_grapheme_start(text))
}

fn prev_word_start(text: &str, cursor: usize) -> usize {
    word_starts(text)
        .into_iter()
        .rev()
        .find(|&start| start < cursor)
        .unwrap_or(0)
}

fn note_color(color: NoteColor) -> Color {
    match color {
        NoteColor::Yellow => Color::Yellow,
        NoteColor::Blue => Color::Blue,
        NoteColor::Green => Color::Green,
        NoteColor::Pink => Color::LightMagenta,
    }
}

fn stars(rating: f64) -> String {
    let clamped = rating.clamp(0.0, 5.0);
    let full = clamped.floor() as usize;
    let half = clamped.fract() != 0.0;
    let empty = 5usize.saturating_sub(clamped.ceil() as usize);
    let mut out = "★".repeat(full);
    if half {
        out.push('⭐');
    }
    out.push_str(&"☆".repeat(empty));
    out
}

fn preview(text: &str) -> String {
    if text.chars().count() > HIGHLIGHT_PREVIEW_LEN {
        let cut: String = text.chars().take(HIGHLIGHT_PREVIEW_LEN).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
