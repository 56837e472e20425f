//! LaCa Core Library
//!
//! This crate provides the core functionality for LaCa (Lembar Baca), a
//! personal reading journal: books, the reading sessions logged against
//! them, and a PDF "reading sheet" per book.
//!
//! # Architecture
//!
//! - **SQLite**: every book is one JSON record keyed by id
//! - **Debounced writes**: edits are coalesced before they reach the store
//!
//! # Quick Start
//!
//! ```text
//! let store = Arc::new(SqliteStore::open(&config)?);
//! migrate_legacy(&FileLegacyStorage::new(config.legacy_dir()), &store).await?;
//!
//! let persist = DebouncedPersist::spawn(Arc::clone(&store), PersistOptions::from(&config));
//! let mut book = Book::new("Dune", "Frank Herbert");
//! book.add_session(ReadingSession::new(1, 50, "Intro"));
//! persist.save(&book);
//! persist.close().await;
//!
//! export_book_pdf(&book, &config.export_dir(), &ExportOptions::default())?;
//! ```
//!
//! # Modules
//!
//! - `models`: Book and reading session records
//! - `store`: Record store trait and backends
//! - `migrate`: One-time import from the legacy flat blob
//! - `persist`: Debounced persistence controller
//! - `export`: PDF reading sheet
//! - `config`: Application configuration

pub mod config;
pub mod export;
pub mod migrate;
pub mod models;
pub mod persist;
pub mod store;

pub use config::Config;
pub use export::{export_book_pdf, export_filename, render_book_pdf, ExportError, ExportOptions};
pub use migrate::{migrate_legacy, FileLegacyStorage, LegacyStorage, MigrationError, MigrationOutcome};
pub use models::{Book, ReadingSession};
pub use persist::{DebouncedPersist, PersistOptions, SaveStatus};
pub use store::{MemoryStore, RecordStore, SqliteStore, StoreError, StoreResult};
