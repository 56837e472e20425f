//! Export command handler

use std::path::PathBuf;

use anyhow::{Context, Result};

use laca_core::{export_book_pdf, Config, ExportOptions};

use super::{resolve_book, SharedStore};
use crate::output::{Output, OutputFormat};

/// Write a book's reading sheet as PDF
pub async fn export(
    store: &SharedStore,
    config: &Config,
    book_id: String,
    out: Option<PathBuf>,
    open_after: bool,
    output: &Output,
) -> Result<()> {
    let book = resolve_book(store.as_ref(), &book_id).await?;
    let dir = out.unwrap_or_else(|| config.export_dir());

    let path = export_book_pdf(&book, &dir, &ExportOptions::default())
        .with_context(|| format!("Failed to export '{}'", book.title))?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({"book_id": book.id, "path": path})
            );
        }
        OutputFormat::Quiet => println!("{}", path.display()),
        OutputFormat::Human => output.success(&format!("Exported to {}", path.display())),
    }

    if open_after {
        if let Err(e) = open::that(&path) {
            output.warn(&format!("Could not open {}: {}", path.display(), e));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use laca_core::{Book, MemoryStore};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_export_to_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store: SharedStore = Arc::new(MemoryStore::with_books([Book::with_id(
            "b1",
            "Laut Bercerita",
            "Leila S. Chudori",
        )]));
        let output = Output::new(OutputFormat::Quiet);

        export(
            &store,
            &Config::default(),
            "b1".to_string(),
            Some(temp_dir.path().to_path_buf()),
            false,
            &output,
        )
        .await
        .unwrap();

        let written = std::fs::read(temp_dir.path().join("Laut_Bercerita.pdf")).unwrap();
        assert!(written.starts_with(b"%PDF"));
    }
}
