//! SQLite-backed record store

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::{StoreError, StoreResult};
use super::schema::{init_schema, needs_init};
use super::RecordStore;
use crate::config::Config;
use crate::models::Book;

/// Record store persisted in a SQLite database
///
/// The connection lives behind an async mutex so the handle can be shared
/// between the CLI and the debounced persistence task. After [`close`]
/// every operation fails with [`StoreError::Unavailable`].
///
/// [`close`]: SqliteStore::close
pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    /// Open or create the database described by the configuration
    pub fn open(config: &Config) -> StoreResult<Self> {
        Self::open_at(&config.database_path())
    }

    /// Open or create the database at a specific path
    pub fn open_at(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        debug!("Opened record store at {:?}", path);
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }

    /// Close the underlying connection
    ///
    /// Closing twice is a no-op.
    pub async fn close(&self) -> StoreResult<()> {
        let Some(conn) = self.conn.lock().await.take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, e)| StoreError::from(e))?;
        debug!("Closed record store");
        Ok(())
    }

    /// Whether the store is still open
    pub async fn is_open(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Run a closure against the open connection
    async fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or_else(|| StoreError::unavailable("record store is closed"))?;
        f(conn)
    }
}

fn decode(id: String, data: String) -> StoreResult<Book> {
    serde_json::from_str(&data).map_err(|source| StoreError::CorruptRecord { id, source })
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get_all(&self) -> StoreResult<Vec<Book>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, data FROM books")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            // One unreadable row must not hide the rest of the library
            let mut books = Vec::new();
            for row in rows {
                let (id, data) = row?;
                match decode(id, data) {
                    Ok(book) => books.push(book),
                    Err(e) => warn!("Skipping stored book: {}", e),
                }
            }
            Ok(books)
        })
        .await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Book>> {
        self.with_conn(|conn| {
            let data: Option<String> = conn
                .query_row("SELECT data FROM books WHERE id = ?", params![id], |row| {
                    row.get(0)
                })
                .optional()?;
            data.map(|data| decode(id.to_string(), data)).transpose()
        })
        .await
    }

    async fn put(&self, book: &Book) -> StoreResult<()> {
        let data = serde_json::to_string(book)?;
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO books (id, data, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
                "#,
                params![book.id, data, Utc::now().timestamp_millis()],
            )?;
            debug!("Stored book {}", book.id);
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM books WHERE id = ?", params![id])?;
            debug!("Deleted book {} ({} row(s))", id, removed);
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM books", [])?;
            debug!("Cleared record store");
            Ok(())
        })
        .await
    }

    async fn count(&self) -> StoreResult<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::dune;
    use crate::models::ReadingSession;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_then_get_all_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        let book = dune();

        store.put(&book).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all, vec![book]);
    }

    #[tokio::test]
    async fn test_book_without_sessions_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut book = Book::new("Empty", "Nobody");
        book.set_cover(Some("data:image/png;base64,AAAA".to_string()));

        store.put(&book).await.unwrap();
        assert_eq!(store.get(&book.id).await.unwrap(), Some(book));
    }

    #[tokio::test]
    async fn test_put_overwrites_existing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut book = dune();
        store.put(&book).await.unwrap();

        book.set_review("Even better the second time");
        book.add_session(ReadingSession::new(51, 90, "Arrakis").on("2024-01-03"));
        store.put(&book).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], book);
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put(&dune()).await.unwrap();

        store.delete("missing").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        store.delete("b1").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put(&dune()).await.unwrap();
        store.put(&Book::new("Other", "Someone")).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_store_is_unavailable() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.close().await.unwrap();
        assert!(!store.is_open().await);

        let err = store.put(&dune()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));

        // Second close is fine
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("laca.db");

        {
            let store = SqliteStore::open_at(&path).unwrap();
            store.put(&dune()).await.unwrap();
            store.close().await.unwrap();
        }

        let store = SqliteStore::open_at(&path).unwrap();
        assert_eq!(store.get("b1").await.unwrap(), Some(dune()));
    }

    #[tokio::test]
    async fn test_corrupt_record_is_reported_and_skipped() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put(&dune()).await.unwrap();
        store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO books (id, data, updated_at) VALUES ('bad', '{not json', 0)",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let err = store.get("bad").await.unwrap_err();
        assert!(matches!(err, StoreError::CorruptRecord { ref id, .. } if id == "bad"));

        assert_eq!(store.get_all().await.unwrap(), vec![dune()]);
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
