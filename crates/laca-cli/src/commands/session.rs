//! Reading session command handlers
//!
//! Sessions are children of books; every change rewrites the whole book.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use laca_core::{Config, ReadingSession};

use super::{resolve_book, resolve_session_id, save_book, SharedStore};
use crate::editor::{confirm, edit_text};
use crate::output::{short_id, Output};

/// Fields accepted by `session add`
pub struct NewSession {
    pub from: u32,
    pub to: u32,
    pub summary: Option<String>,
    pub date: Option<String>,
}

/// Log a reading session against a book
pub async fn add(
    store: &SharedStore,
    config: &Config,
    book_id: String,
    new: NewSession,
    output: &Output,
) -> Result<()> {
    if new.from > new.to {
        bail!("Start page {} is after end page {}", new.from, new.to);
    }

    let mut book = resolve_book(store.as_ref(), &book_id).await?;

    let summary = match new.summary {
        Some(summary) => summary,
        None => {
            let initial = format!(
                "<!-- Session for: {} -->\n<!-- Pages {}-{} -->\n\n",
                book.title, new.from, new.to
            );
            edit_text(&initial).context("Failed to edit summary")?
        }
    };

    let mut session = ReadingSession::new(new.from, new.to, summary);
    if let Some(date) = new.date {
        session = session.on(parse_date(&date)?);
    }
    let session_id = session.id.clone();
    book.add_session(session);

    save_book(store, config, &book, output).await?;

    output.success(&format!(
        "Added session {} to {}",
        short_id(&session_id),
        book.title
    ));
    Ok(())
}

/// List the sessions of a book
pub async fn list(store: &SharedStore, book_id: String, output: &Output) -> Result<()> {
    let book = resolve_book(store.as_ref(), &book_id).await?;
    output.print_sessions(&book);
    Ok(())
}

/// Remove a session from a book
pub async fn delete(
    store: &SharedStore,
    config: &Config,
    book_id: String,
    session_id: String,
    output: &Output,
) -> Result<()> {
    let mut book = resolve_book(store.as_ref(), &book_id).await?;
    let session_id = resolve_session_id(&book, &session_id)?;

    if output.should_prompt() {
        println!("Delete session {} from {}", short_id(&session_id), book.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    book.remove_session(&session_id);
    save_book(store, config, &book, output).await?;

    output.success(&format!("Deleted session: {}", session_id));
    Ok(())
}

/// Validate a `YYYY-MM-DD` date
fn parse_date(date: &str) -> Result<String> {
    let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD.", date))?;
    Ok(parsed.format("%Y-%m-%d").to_string())
}
