use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;

mod annotations;
mod catalog;
mod constants;
mod error;
mod markers;
mod progress;
mod reader;
mod render;
mod storage;
mod toast;
mod ui;

use catalog::Catalog;
use storage::Storage;
use ui::App;

#[derive(Parser)]
#[command(name = "elyora")]
#[command(about = "A terminal reading room for the ELYORA library")]
struct Cli {
    /// Book id to open straight in the reader
    book_id: Option<String>,

    /// Directory holding reader state (defaults to the platform data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Append diagnostics to this file; without it nothing is logged
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    let data_dir = cli
        .data_dir
        .unwrap_or_else(storage::default_data_dir);
    let storage = Storage::open(&data_dir);
    let mut app = App::new(Catalog::builtin(), storage);

    if let Some(book_id) = &cli.book_id {
        app.open_reader(book_id);
    }

    app.run()
        .map_err(|e| -> Box<dyn std::error::Error> { Box::new(e) })?;

    Ok(())
}
