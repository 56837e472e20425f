//! Status command handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use laca_core::migrate::LEGACY_KEY;
use laca_core::{Book, Config, FileLegacyStorage, RecordStore};

use crate::output::{Output, OutputFormat};

#[derive(Debug, Serialize)]
struct Status {
    database: PathBuf,
    database_size: u64,
    legacy_pending: bool,
    books: usize,
    sessions: usize,
    pages_read: u64,
    save_delay_ms: u64,
    saved_display_ms: u64,
}

impl Status {
    async fn gather(store: &dyn RecordStore, config: &Config) -> Result<Self> {
        let books = store.get_all().await.context("Failed to load books")?;
        let database = config.database_path();
        let database_size = std::fs::metadata(&database).map(|m| m.len()).unwrap_or(0);
        let legacy_pending = FileLegacyStorage::new(config.legacy_dir())
            .path_for(LEGACY_KEY)
            .exists();

        Ok(Self {
            database,
            database_size,
            legacy_pending,
            books: books.len(),
            sessions: books.iter().map(|b| b.sessions.len()).sum(),
            pages_read: books.iter().map(Book::pages_read).sum(),
            save_delay_ms: config.save_delay_ms,
            saved_display_ms: config.saved_display_ms,
        })
    }
}

/// Show status information
pub async fn show(store: &dyn RecordStore, config: &Config, output: &Output) -> Result<()> {
    let status = Status::gather(store, config).await?;

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        OutputFormat::Quiet => {
            println!("{}", status.books);
        }
        OutputFormat::Human => {
            println!("LaCa Status");
            println!("===========");
            println!();
            println!("Storage:");
            println!("  Database: {}", status.database.display());
            println!("  Size:     {}", human_size(status.database_size));
            if status.legacy_pending {
                println!("  Legacy data waiting to be imported (run `laca migrate`)");
            }
            println!();
            println!("Saving:");
            println!("  Delay:         {} ms", status.save_delay_ms);
            println!("  Saved display: {} ms", status.saved_display_ms);
            println!();
            println!("Contents:");
            println!("  Books:      {}", status.books);
            println!("  Sessions:   {}", status.sessions);
            println!("  Pages read: {}", status.pages_read);
        }
    }

    Ok(())
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
