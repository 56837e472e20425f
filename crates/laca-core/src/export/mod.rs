//! PDF export
//!
//! A book is laid out against the [`Canvas`] trait, then rendered with
//! [`PdfCanvas`]. Keeping layout behind a trait lets tests inspect exactly
//! what lands on each page without parsing PDF output.

mod canvas;
mod layout;
mod metrics;
mod pdf;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::Book;

pub use canvas::{Canvas, CoverImage, DrawOp, ImageFormat, RecordingCanvas, TextStyle};
pub use layout::{decode_cover, layout_book, session_header, PAGE_HEIGHT, PAGE_WIDTH};
pub use metrics::{text_width, wrap_text};
pub use pdf::PdfCanvas;

/// Name printed in every page header
pub const APP_NAME: &str = "LaCa — Lembar Baca";

const MAX_FILENAME_STEM: usize = 50;
const FALLBACK_STEM: &str = "book";

/// Errors that can occur during export
#[derive(Error, Debug)]
pub enum ExportError {
    /// One element could not be drawn
    #[error("Failed to render {element}: {details}")]
    Render {
        element: &'static str,
        details: String,
    },

    /// The PDF document could not be produced
    #[error("Failed to build PDF: {0}")]
    Pdf(String),

    /// The finished file could not be written
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    pub fn render(element: &'static str, details: impl Into<String>) -> Self {
        Self::Render {
            element,
            details: details.into(),
        }
    }
}

/// Settings for one export
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Date printed in each footer
    pub printed_on: String,
    /// Name printed in each header
    pub app_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            printed_on: Local::now().format("%-d/%-m/%Y").to_string(),
            app_name: APP_NAME.to_string(),
        }
    }
}

/// File name for a book's export
///
/// Keeps letters, digits, underscores, hyphens and whitespace; each run of
/// whitespace becomes one underscore. The stem is capped at 50 characters.
pub fn export_filename(title: &str) -> String {
    let mut stem = String::new();
    let mut in_space = false;

    for c in title.chars() {
        if c.is_whitespace() {
            if !in_space {
                stem.push('_');
            }
            in_space = true;
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            stem.push(c);
            in_space = false;
        }
    }

    let stem: String = stem.chars().take(MAX_FILENAME_STEM).collect();
    if stem.is_empty() {
        format!("{}.pdf", FALLBACK_STEM)
    } else {
        format!("{}.pdf", stem)
    }
}

/// Render `book` to PDF bytes
///
/// A cover that cannot be decoded or embedded is skipped; the rest of the
/// document is still produced.
pub fn render_book_pdf(book: &Book, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    let mut canvas = PdfCanvas::new(&book.title)?;
    let pages = layout_book(&mut canvas, book, options);
    debug!("Laid out '{}' on {} page(s)", book.title, pages);
    canvas.into_bytes()
}

/// Render `book` and write it into `dir` under [`export_filename`]
///
/// Creates `dir` if needed and overwrites an existing file of the same
/// name. Returns the written path.
pub fn export_book_pdf(book: &Book, dir: &Path, options: &ExportOptions) -> Result<PathBuf, ExportError> {
    let bytes = render_book_pdf(book, options)?;

    fs::create_dir_all(dir).map_err(|source| ExportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(export_filename(&book.title));
    fs::write(&path, bytes).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;

    info!("Exported '{}' to {}", book.title, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::dune;
    use tempfile::TempDir;

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename("Dune"), "Dune.pdf");
        assert_eq!(export_filename("Bumi   Manusia"), "Bumi_Manusia.pdf");
        assert_eq!(export_filename("Harry Potter: Vol. 1"), "Harry_Potter_Vol_1.pdf");
        assert_eq!(export_filename("well-read_notes"), "well-read_notes.pdf");
        assert_eq!(export_filename("!!!"), "book.pdf");
        assert_eq!(export_filename(""), "book.pdf");
    }

    #[test]
    fn test_export_filename_truncates() {
        let name = export_filename(&"a".repeat(80));
        assert_eq!(name, format!("{}.pdf", "a".repeat(50)));
    }

    #[test]
    fn test_default_options() {
        let options = ExportOptions::default();
        assert_eq!(options.app_name, APP_NAME);
        assert_eq!(options.printed_on.matches('/').count(), 2);
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render_book_pdf(&dune(), &ExportOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_with_broken_cover() {
        let mut book = dune();
        book.cover = Some("data:image/png;base64,aGVsbG8=".to_string());

        let bytes = render_book_pdf(&book, &ExportOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_export_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("exports");

        let path = export_book_pdf(&dune(), &out, &ExportOptions::default()).unwrap();

        assert_eq!(path, out.join("Dune.pdf"));
        let written = fs::read(&path).unwrap();
        assert!(written.starts_with(b"%PDF"));
    }
}
