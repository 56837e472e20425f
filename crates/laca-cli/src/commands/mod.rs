//! Command handlers

pub mod book;
pub mod clear;
pub mod config;
pub mod export;
pub mod migrate;
pub mod session;
pub mod status;

use std::sync::Arc;

use anyhow::{bail, Result};

use laca_core::{Book, Config, DebouncedPersist, PersistOptions, RecordStore, SaveStatus};

use crate::output::{short_id, Output};

/// Store handle shared between commands and the persistence task
pub type SharedStore = Arc<dyn RecordStore>;

/// Find a book by full id or unique id prefix
pub async fn resolve_book(store: &dyn RecordStore, id: &str) -> Result<Book> {
    if let Some(book) = store.get(id).await? {
        return Ok(book);
    }

    let books = store.get_all().await?;
    let mut matches: Vec<Book> = books.into_iter().filter(|b| b.id.starts_with(id)).collect();

    match matches.len() {
        0 => bail!("No book found matching: {}", id),
        1 => Ok(matches.remove(0)),
        _ => {
            eprintln!("Multiple books match '{}':", id);
            for book in &matches {
                eprintln!("  {} - {}", book.id, book.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

/// Find a session in `book` by full id or unique id prefix
pub fn resolve_session_id(book: &Book, id: &str) -> Result<String> {
    if let Some(session) = book.session(id) {
        return Ok(session.id.clone());
    }

    let matches: Vec<_> = book
        .sessions
        .iter()
        .filter(|s| s.id.starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No session found matching: {}", id),
        1 => Ok(matches[0].id.clone()),
        _ => {
            eprintln!("Multiple sessions match '{}':", id);
            for session in &matches {
                eprintln!(
                    "  {} - {} (p. {}-{})",
                    short_id(&session.id),
                    session.date,
                    session.from_page,
                    session.to_page
                );
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

/// Start a debounced persistence controller over `store`
pub fn persist(store: &SharedStore, config: &Config) -> DebouncedPersist {
    DebouncedPersist::spawn(Arc::clone(store), PersistOptions::from(config))
}

/// Wait for pending writes, report the outcome, and fail on a write error
pub async fn finish(persist: DebouncedPersist, output: &Output) -> Result<()> {
    let status = persist.close().await;
    output.save_status(&status);

    if let SaveStatus::Error(msg) = status {
        bail!("Changes were not saved: {}", msg);
    }
    Ok(())
}

/// Save one snapshot and wait for it
pub async fn save_book(
    store: &SharedStore,
    config: &Config,
    book: &Book,
    output: &Output,
) -> Result<()> {
    let persist = persist(store, config);
    persist.save(book);
    finish(persist, output).await
}
