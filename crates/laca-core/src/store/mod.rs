//! Record store
//!
//! Durable mapping from book id to book value.
//!
//! ## Backends
//!
//! - [`SqliteStore`]: SQLite database on disk, the production store
//! - [`MemoryStore`]: `HashMap` in memory, for tests and dry runs
//!
//! Store handles are constructed explicitly and passed to whatever needs
//! them; there is no process-wide connection.

mod error;
mod memory;
pub mod schema;
mod sqlite;

use async_trait::async_trait;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::models::Book;

/// Key-value store for books.
///
/// `put` is an upsert: the store does not distinguish creating a record
/// from updating one. A book is either fully present or fully absent.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every stored book. No ordering guarantee.
    async fn get_all(&self) -> StoreResult<Vec<Book>>;

    /// A single book by id.
    async fn get(&self, id: &str) -> StoreResult<Option<Book>>;

    /// Insert or fully overwrite the record at `book.id`.
    async fn put(&self, book: &Book) -> StoreResult<()>;

    /// Remove the record at `id`. Absent ids are not an error.
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Remove every record.
    async fn clear(&self) -> StoreResult<()>;

    /// Number of stored books.
    async fn count(&self) -> StoreResult<usize> {
        Ok(self.get_all().await?.len())
    }
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    async fn get_all(&self) -> StoreResult<Vec<Book>> {
        (**self).get_all().await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Book>> {
        (**self).get(id).await
    }

    async fn put(&self, book: &Book) -> StoreResult<()> {
        (**self).put(book).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        (**self).delete(id).await
    }

    async fn clear(&self) -> StoreResult<()> {
        (**self).clear().await
    }

    async fn count(&self) -> StoreResult<usize> {
        (**self).count().await
    }
}
