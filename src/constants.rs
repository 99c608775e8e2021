// Reader typography
pub const FONT_SIZE_MIN: u16 = 12;
pub const FONT_SIZE_MAX: u16 = 24;
pub const FONT_SIZE_STEP: u16 = 2;
pub const FONT_SIZE_DEFAULT: u16 = 16;
pub const CONTENT_COLS_PER_FONT_PT: u16 = 5;

// UI
pub const READER_HEADER_HEIGHT: usize = 4;
pub const READER_FOOTER_HEIGHT: usize = 3;
pub const UI_RESERVED_HEIGHT: usize = READER_HEADER_HEIGHT + READER_FOOTER_HEIGHT + 2;
pub const DEFAULT_TERMINAL_HEIGHT: usize = 24;
pub const SIDEBAR_WIDTH_EXPANDED: u16 = 18;
pub const SIDEBAR_WIDTH_COLLAPSED: u16 = 4;

// Notifications
pub const TOAST_DURATION_MS: u64 = 3000;
pub const EVENT_POLL_MS: u64 = 200;

// Annotations
pub const HIGHLIGHT_PREVIEW_LEN: usize = 30;

// Storage
pub const STORAGE_FILE_NAME: &str = "storage.json";
pub const DATA_DIR_NAME: &str = "elyora";
