//! Book command handlers

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use laca_core::models::MAX_RATING;
use laca_core::{Book, Config, RecordStore, StoreError};

use super::{finish, persist, resolve_book, save_book, SharedStore};
use crate::editor::{confirm, edit_text, is_yes, prompt_with_default};
use crate::output::{short_id, Output};

/// Fields accepted by `book add`
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub rating: Option<f64>,
    pub review: Option<String>,
    pub cover: Option<String>,
}

/// Add a new book
pub async fn add(store: &SharedStore, config: &Config, new: NewBook, output: &Output) -> Result<()> {
    if new.title.trim().is_empty() {
        bail!("Title cannot be empty");
    }

    let mut book = Book::new(new.title.trim(), new.author.trim());
    if let Some(rating) = new.rating {
        book.set_rating(parse_rating(rating)?);
    }
    if let Some(review) = new.review {
        book.set_review(review);
    }
    if let Some(path) = new.cover {
        book.set_cover(Some(cover_data_url(Path::new(&path))?));
    }

    save_book(store, config, &book, output).await?;

    output.success(&format!("Added book: {}", book.id));
    output.print_book(&book);
    Ok(())
}

/// List all books, newest first
pub async fn list(store: &SharedStore, output: &Output) -> Result<()> {
    let mut books = store.get_all().await.context("Failed to load books")?;
    books.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.title.cmp(&b.title)));

    output.print_books(&books);
    Ok(())
}

/// Show a single book
pub async fn show(store: &SharedStore, id: String, output: &Output) -> Result<()> {
    let book = resolve_book(store.as_ref(), &id).await?;
    output.print_book(&book);
    Ok(())
}

/// Edit a book interactively
///
/// Every answered prompt is handed to the debounced controller straight
/// away, so a quick run of answers collapses into a single write.
pub async fn edit(store: &SharedStore, config: &Config, id: String, output: &Output) -> Result<()> {
    let mut book = resolve_book(store.as_ref(), &id).await?;
    let persist = persist(store, config);

    println!("Editing book: {}", book.id);
    println!("Press Enter to keep current value, or type new value.\n");

    if let Some(title) = prompt_with_default("Title", &book.title)? {
        book.set_title(title);
        persist.save(&book);
        output.save_status(&persist.status());
    }

    if let Some(author) = prompt_with_default("Author", &book.author)? {
        book.set_author(author);
        persist.save(&book);
        output.save_status(&persist.status());
    }

    let current_rating = book.rating.to_string();
    if let Some(rating) = prompt_with_default("Rating (0-5)", &current_rating)? {
        match rating.parse::<f64>() {
            Ok(value) => {
                book.set_rating(value);
                persist.save(&book);
                output.save_status(&persist.status());
            }
            Err(_) => output.warn(&format!("Not a number, rating unchanged: {}", rating)),
        }
    }

    if let Some(answer) = prompt_with_default("Edit review in editor? (y/N)", "")? {
        if is_yes(&answer) {
            let review = edit_text(&review_template(&book)).context("Failed to edit review")?;
            book.set_review(review);
            persist.save(&book);
            output.save_status(&persist.status());
        }
    }

    finish(persist, output).await?;
    output.print_book(&book);
    Ok(())
}

/// Set the final review (opens the editor if no text is given)
pub async fn review(
    store: &SharedStore,
    config: &Config,
    id: String,
    text: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut book = resolve_book(store.as_ref(), &id).await?;

    let review = match text {
        Some(text) => text,
        None => edit_text(&review_template(&book)).context("Failed to edit review")?,
    };
    book.set_review(review);

    save_book(store, config, &book, output).await?;
    output.success(&format!("Updated review for {}", book.title));
    Ok(())
}

/// Set the rating
pub async fn rate(
    store: &SharedStore,
    config: &Config,
    id: String,
    rating: f64,
    output: &Output,
) -> Result<()> {
    let mut book = resolve_book(store.as_ref(), &id).await?;
    book.set_rating(parse_rating(rating)?);

    save_book(store, config, &book, output).await?;
    output.success(&format!("Rated {} {}/5", book.title, book.rating));
    Ok(())
}

/// Delete a book
///
/// A record that no longer parses can still be deleted by its full id.
pub async fn delete(store: &SharedStore, id: String, output: &Output) -> Result<()> {
    let (book_id, title) = match store.get(&id).await {
        Ok(Some(book)) => (book.id, book.title),
        Ok(None) => {
            let book = resolve_book(store.as_ref(), &id).await?;
            (book.id, book.title)
        }
        Err(StoreError::CorruptRecord { id, .. }) => (id, "(corrupted record)".to_string()),
        Err(e) => return Err(e).context("Failed to load book"),
    };

    if output.should_prompt() {
        println!("Delete book: {} - {}", short_id(&book_id), title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete(&book_id)
        .await
        .context("Failed to delete book")?;

    output.success(&format!("Deleted book: {}", book_id));
    Ok(())
}

fn parse_rating(rating: f64) -> Result<f64> {
    if !(0.0..=MAX_RATING).contains(&rating) {
        bail!("Rating must be between 0 and {}", MAX_RATING);
    }
    Ok(rating)
}

fn review_template(book: &Book) -> String {
    format!(
        "<!-- Review for: {} by {} -->\n<!-- Lines like these are ignored -->\n\n{}",
        book.title, book.author, book.review
    )
}

/// Read an image file into a base64 data URL
fn cover_data_url(path: &Path) -> Result<String> {
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => bail!("Cover must be a .png, .jpg or .jpeg file: {}", path.display()),
    };

    let bytes = fs::read(path).with_context(|| format!("Failed to read cover: {:?}", path))?;
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use laca_core::{MemoryStore, SqliteStore};
    use rusqlite::Connection;
    use tempfile::TempDir;

    use crate::output::OutputFormat;

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating(4.5).unwrap(), 4.5);
        assert_eq!(parse_rating(0.0).unwrap(), 0.0);
        assert!(parse_rating(5.5).is_err());
        assert!(parse_rating(-1.0).is_err());
    }

    #[test]
    fn test_cover_data_url() {
        let temp_dir = TempDir::new().unwrap();
        let png = temp_dir.path().join("cover.PNG");
        fs::write(&png, b"hello").unwrap();

        assert_eq!(
            cover_data_url(&png).unwrap(),
            "data:image/png;base64,aGVsbG8="
        );

        let gif = temp_dir.path().join("cover.gif");
        fs::write(&gif, b"GIF89a").unwrap();
        assert!(cover_data_url(&gif).is_err());
    }

    #[test]
    fn test_review_template_keeps_existing_review() {
        let mut book = Book::with_id("b1", "Dune", "Herbert");
        book.set_review("Great");
        let template = review_template(&book);

        assert!(template.starts_with("<!--"));
        assert!(template.ends_with("Great"));
    }

    #[tokio::test]
    async fn test_add_rate_and_delete() {
        let memory = Arc::new(MemoryStore::new());
        let store: SharedStore = memory.clone();
        let config = Config::default();
        let output = Output::new(OutputFormat::Json);

        let new = NewBook {
            title: "  Bumi Manusia ".to_string(),
            author: "Pramoedya Ananta Toer".to_string(),
            rating: Some(4.0),
            review: None,
            cover: None,
        };
        add(&store, &config, new, &output).await.unwrap();

        let books = memory.get_all().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Bumi Manusia");
        assert_eq!(books[0].rating, 4.0);

        let id = books[0].id.clone();
        rate(&store, &config, id[..6].to_string(), 5.0, &output)
            .await
            .unwrap();
        assert_eq!(memory.get(&id).await.unwrap().unwrap().rating, 5.0);

        assert!(rate(&store, &config, id.clone(), 7.0, &output).await.is_err());

        delete(&store, id.clone(), &output).await.unwrap();
        assert_eq!(memory.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_rejects_blank_title() {
        let memory = Arc::new(MemoryStore::new());
        let store: SharedStore = memory.clone();
        let new = NewBook {
            title: "   ".to_string(),
            author: String::new(),
            rating: None,
            review: None,
            cover: None,
        };

        let result = add(&store, &Config::default(), new, &Output::new(OutputFormat::Quiet)).await;
        assert!(result.is_err());
        assert!(memory.puts().await.is_empty());
    }

    fn store_with_corrupt_row(temp_dir: &TempDir) -> SharedStore {
        let path = temp_dir.path().join("laca.db");
        let sqlite = SqliteStore::open_at(&path).unwrap();
        Connection::open(&path)
            .unwrap()
            .execute(
                "INSERT INTO books (id, data, updated_at) VALUES ('bad-1', '{not json', 0)",
                [],
            )
            .unwrap();
        Arc::new(sqlite)
    }

    #[tokio::test]
    async fn test_delete_by_prefix_next_to_corrupt_row() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with_corrupt_row(&temp_dir);
        store
            .put(&Book::with_id("good-123", "Dune", "Herbert"))
            .await
            .unwrap();

        delete(&store, "good".to_string(), &Output::new(OutputFormat::Json))
            .await
            .unwrap();

        assert_eq!(store.get("good-123").await.unwrap(), None);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_corrupt_row_by_full_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with_corrupt_row(&temp_dir);

        delete(&store, "bad-1".to_string(), &Output::new(OutputFormat::Json))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_prefix_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with_corrupt_row(&temp_dir);

        let result = delete(&store, "bad".to_string(), &Output::new(OutputFormat::Json)).await;

        assert!(result.is_err());
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
