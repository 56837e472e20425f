//! One-time import from legacy flat storage
//!
//! Older releases kept every book in a single JSON array under one key.
//! [`migrate_legacy`] copies that array into the record store and removes
//! the blob once every record has been written.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, info};

use crate::models::Book;
use crate::store::{RecordStore, StoreError};

/// Key the legacy blob was stored under
pub const LEGACY_KEY: &str = "laca-books";

/// Flat key/value storage the legacy blob lives in
pub trait LegacyStorage {
    /// Raw value under `key`, if present
    fn get_item(&self, key: &str) -> io::Result<Option<String>>;

    /// Remove `key`. Absent keys are not an error.
    fn remove_item(&self, key: &str) -> io::Result<()>;
}

/// Legacy storage backed by one file per key: `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileLegacyStorage {
    dir: PathBuf,
}

impl FileLegacyStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl LegacyStorage for FileLegacyStorage {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn remove_item(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Legacy storage held in memory (for testing)
#[derive(Debug, Default)]
pub struct MemoryLegacyStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryLegacyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage with a single item set
    pub fn with_item(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.set_item(key, value);
        storage
    }

    pub fn set_item(&self, key: impl Into<String>, value: impl Into<String>) {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }
}

impl LegacyStorage for MemoryLegacyStorage {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }

    fn remove_item(&self, key: &str) -> io::Result<()> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

/// Errors that abort a migration
#[derive(Error, Debug)]
pub enum MigrationError {
    /// The blob is not a JSON array of books; nothing was written
    #[error("Legacy data under '{key}' is not valid: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or removing the blob failed
    #[error("Failed to access legacy storage: {0}")]
    Legacy(#[from] io::Error),

    /// A record could not be written; earlier records stay imported and
    /// the blob is kept
    #[error("Failed to import book '{id}' ({imported} imported before it): {source}")]
    Store {
        id: String,
        imported: usize,
        #[source]
        source: StoreError,
    },
}

/// What a migration run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No legacy data to import
    Skipped,
    /// This many books were copied and the blob removed
    Imported(usize),
}

/// Copy the legacy blob into the record store, then remove it
///
/// - Absent, blank, or empty-array blob: nothing happens.
/// - Unparseable blob: [`MigrationError::Parse`] before any write.
/// - A failed write stops the import and leaves the blob in place. Since
///   `put` upserts by id, re-running afterwards simply overwrites the
///   records already copied.
pub async fn migrate_legacy<L, S>(legacy: &L, store: &S) -> Result<MigrationOutcome, MigrationError>
where
    L: LegacyStorage + ?Sized,
    S: RecordStore + ?Sized,
{
    let Some(raw) = legacy.get_item(LEGACY_KEY)? else {
        debug!("No legacy data found");
        return Ok(MigrationOutcome::Skipped);
    };
    if raw.trim().is_empty() {
        return Ok(MigrationOutcome::Skipped);
    }

    let books: Vec<Book> = serde_json::from_str(&raw).map_err(|source| MigrationError::Parse {
        key: LEGACY_KEY.to_string(),
        source,
    })?;
    if books.is_empty() {
        return Ok(MigrationOutcome::Skipped);
    }

    for (imported, book) in books.iter().enumerate() {
        store
            .put(book)
            .await
            .map_err(|source| MigrationError::Store {
                id: book.id.clone(),
                imported,
                source,
            })?;
    }

    legacy.remove_item(LEGACY_KEY)?;
    info!("Imported {} book(s) from legacy storage", books.len());
    Ok(MigrationOutcome::Imported(books.len()))
}
