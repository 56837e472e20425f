//! In-memory record store for testing.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::{StoreError, StoreResult};
use super::RecordStore;
use crate::models::Book;

/// In-memory record store.
///
/// Books live in a `HashMap` behind a [`RwLock`], so every trait method
/// works on `&self`. Each successful `put` is also appended to a write log,
/// which lets tests count how many writes actually reached the store.
/// Failures can be queued with [`fail_next_puts`](Self::fail_next_puts).
#[derive(Default)]
pub struct MemoryStore {
    books: RwLock<HashMap<String, Book>>,
    puts: RwLock<Vec<Book>>,
    failures: RwLock<VecDeque<StoreError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with books
    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let map = books.into_iter().map(|b| (b.id.clone(), b)).collect();
        Self {
            books: RwLock::new(map),
            ..Self::default()
        }
    }

    /// Make the next `put` calls fail with the given errors, in order
    pub async fn fail_next_puts(&self, errors: impl IntoIterator<Item = StoreError>) {
        self.failures.write().await.extend(errors);
    }

    /// Every book successfully written with `put`, in write order
    pub async fn puts(&self) -> Vec<Book> {
        self.puts.read().await.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_all(&self) -> StoreResult<Vec<Book>> {
        Ok(self.books.read().await.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Book>> {
        Ok(self.books.read().await.get(id).cloned())
    }

    async fn put(&self, book: &Book) -> StoreResult<()> {
        if let Some(error) = self.failures.write().await.pop_front() {
            return Err(error);
        }
        self.books
            .write()
            .await
            .insert(book.id.clone(), book.clone());
        self.puts.write().await.push(book.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.books.write().await.remove(id);
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.books.write().await.clear();
        Ok(())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.books.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::dune;

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryStore::new();
        store.put(&dune()).await.unwrap();
        assert_eq!(store.get_all().await.unwrap(), vec![dune()]);
    }

    #[tokio::test]
    async fn test_delete_absent_leaves_collection_unchanged() {
        let store = MemoryStore::with_books([dune()]);
        store.delete("nope").await.unwrap();
        assert_eq!(store.get_all().await.unwrap(), vec![dune()]);
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let store = MemoryStore::new();
        store
            .fail_next_puts([StoreError::quota_exceeded("test quota")])
            .await;

        let err = store.put(&dune()).await.unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        assert_eq!(store.count().await.unwrap(), 0);

        store.put(&dune()).await.unwrap();
        assert_eq!(store.puts().await.len(), 1);
    }
}
