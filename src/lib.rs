pub mod annotations;
pub mod catalog;
pub mod constants;
pub mod error;
pub mod markers;
pub mod progress;
pub mod reader;
pub mod render;
pub mod storage;
pub mod toast;
pub mod ui;

pub use catalog::{Book, Catalog, Chapter};
pub use error::{NoteError, SelectionError, StorageError, UiError};
pub use reader::{ReaderSession, Theme};
pub use render::{RenderedChapter, RunKind, TextRun};
pub use storage::Storage;
pub use ui::App;
