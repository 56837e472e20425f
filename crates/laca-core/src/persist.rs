//! Debounced persistence
//!
//! Coalesces bursts of "this book changed" signals into a single store
//! write per quiescence window, and exposes a status for UI feedback.
//!
//! ## State machine
//!
//! ```text
//! Idle ──save──▶ Saving ──write ok──▶ Saved ──display delay──▶ Idle
//!                  │  ▲                  │
//!                  │  └──────save────────┘
//!                  └──write failed──▶ Error ──save──▶ Saving
//! ```
//!
//! Every `save` restarts the quiescence timer and replaces the pending
//! snapshot (last write wins; intermediate states are never written).
//! Once the timer fires the write is dispatched and cannot be cancelled.
//!
//! Only one write is ever in flight per controller. Nothing stops two
//! controllers from writing the same book id, so keep one controller per
//! application (or per editable book).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::config::{Config, DEFAULT_SAVED_DISPLAY_MS, DEFAULT_SAVE_DELAY_MS};
use crate::models::Book;
use crate::store::RecordStore;

/// Save status shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    /// Nothing pending, nothing to show
    #[default]
    Idle,
    /// A change is waiting for the quiescence window or being written
    Saving,
    /// The latest change reached the store
    Saved,
    /// The last write failed; the message says why
    Error(String),
}

impl SaveStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, SaveStatus::Error(_))
    }
}

impl std::fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveStatus::Idle => write!(f, "idle"),
            SaveStatus::Saving => write!(f, "saving"),
            SaveStatus::Saved => write!(f, "saved"),
            SaveStatus::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}

/// Timing for the debounced controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistOptions {
    /// Quiet time after the last `save` before writing
    pub save_delay: Duration,
    /// How long `Saved` is shown before returning to `Idle`
    pub saved_display: Duration,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self {
            save_delay: Duration::from_millis(DEFAULT_SAVE_DELAY_MS),
            saved_display: Duration::from_millis(DEFAULT_SAVED_DISPLAY_MS),
        }
    }
}

impl From<&Config> for PersistOptions {
    fn from(config: &Config) -> Self {
        Self {
            save_delay: config.save_delay(),
            saved_display: config.saved_display(),
        }
    }
}

/// Commands sent to the persistence task
enum PersistCommand {
    /// A new snapshot and its submission number
    Save(Book, u64),
    /// Write whatever is pending now, then acknowledge
    Flush(oneshot::Sender<()>),
}

/// Handle to a debounced persistence task
///
/// Dropping the handle closes the command channel; the task still writes
/// a pending snapshot before it exits. Use [`close`](Self::close) to wait
/// for that write.
pub struct DebouncedPersist {
    command_tx: mpsc::UnboundedSender<PersistCommand>,
    status_tx: Arc<watch::Sender<SaveStatus>>,
    submitted: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl DebouncedPersist {
    /// Spawn the persistence task on the current tokio runtime
    pub fn spawn<S>(store: S, options: PersistOptions) -> Self
    where
        S: RecordStore + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(SaveStatus::Idle);
        let status_tx = Arc::new(status_tx);
        let submitted = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(persist_loop(
            store,
            options,
            command_rx,
            Arc::clone(&status_tx),
            Arc::clone(&submitted),
        ));

        Self {
            command_tx,
            status_tx,
            submitted,
            task,
        }
    }

    /// Schedule a write of `book`
    ///
    /// The book is deep-cloned here, so the caller may keep editing its own
    /// copy. Any snapshot still waiting for the quiescence window is
    /// discarded in favour of this one.
    pub fn save(&self, book: &Book) {
        let generation = self.submitted.fetch_add(1, Ordering::SeqCst) + 1;
        self.status_tx.send_replace(SaveStatus::Saving);

        if self
            .command_tx
            .send(PersistCommand::Save(book.clone(), generation))
            .is_err()
        {
            self.status_tx.send_replace(SaveStatus::Error(
                "persistence task is not running".to_string(),
            ));
        }
    }

    /// Current status
    pub fn status(&self) -> SaveStatus {
        self.status_tx.borrow().clone()
    }

    /// Watch status changes
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status_tx.subscribe()
    }

    /// Write any pending snapshot now and wait for it
    ///
    /// Returns the status once the write (if any) has finished.
    pub async fn flush(&self) -> SaveStatus {
        let (done_tx, done_rx) = oneshot::channel();
        if self.command_tx.send(PersistCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
        self.status()
    }

    /// Flush, stop the task, and return the final status
    pub async fn close(self) -> SaveStatus {
        let Self {
            command_tx,
            status_tx,
            task,
            ..
        } = self;
        drop(command_tx);

        if let Err(e) = task.await {
            warn!("Persistence task ended abnormally: {}", e);
        }
        let status = status_tx.borrow().clone();
        status
    }
}

/// Main task loop: one pending snapshot, one write deadline, one reset deadline
async fn persist_loop<S: RecordStore>(
    store: S,
    options: PersistOptions,
    mut command_rx: mpsc::UnboundedReceiver<PersistCommand>,
    status_tx: Arc<watch::Sender<SaveStatus>>,
    submitted: Arc<AtomicU64>,
) {
    let mut pending: Option<(Book, u64)> = None;
    let mut write_at = Instant::now();
    let mut reset_at: Option<Instant> = None;

    loop {
        tokio::select! {
            command = command_rx.recv() => match command {
                Some(PersistCommand::Save(book, generation)) => {
                    if pending.replace((book, generation)).is_some() {
                        debug!("Replaced pending snapshot (submission {})", generation);
                    }
                    write_at = Instant::now() + options.save_delay;
                }
                Some(PersistCommand::Flush(done)) => {
                    if let Some((book, generation)) = pending.take() {
                        if write_snapshot(&store, &book, generation, &status_tx, &submitted).await {
                            reset_at = Some(Instant::now() + options.saved_display);
                        }
                    }
                    let _ = done.send(());
                }
                None => {
                    if let Some((book, generation)) = pending.take() {
                        write_snapshot(&store, &book, generation, &status_tx, &submitted).await;
                    }
                    break;
                }
            },
            _ = sleep_until(write_at), if pending.is_some() => {
                if let Some((book, generation)) = pending.take() {
                    if write_snapshot(&store, &book, generation, &status_tx, &submitted).await {
                        reset_at = Some(Instant::now() + options.saved_display);
                    }
                }
            }
            _ = sleep_until(reset_at.unwrap_or(write_at)), if reset_at.is_some() => {
                reset_at = None;
                status_tx.send_if_modified(|status| {
                    if *status == SaveStatus::Saved {
                        *status = SaveStatus::Idle;
                        true
                    } else {
                        false
                    }
                });
            }
        }
    }

    debug!("Persistence task stopped");
}

/// Write one snapshot and update the status. Returns whether it succeeded.
///
/// `Saved` is only reported when no newer snapshot was submitted while the
/// write was in flight; otherwise the status stays `Saving`.
async fn write_snapshot<S: RecordStore>(
    store: &S,
    book: &Book,
    generation: u64,
    status_tx: &watch::Sender<SaveStatus>,
    submitted: &AtomicU64,
) -> bool {
    match store.put(book).await {
        Ok(()) => {
            debug!("Persisted book {} (submission {})", book.id, generation);
            if submitted.load(Ordering::SeqCst) == generation {
                status_tx.send_replace(SaveStatus::Saved);
            }
            true
        }
        Err(e) => {
            warn!("Failed to persist book {}: {}", book.id, e);
            status_tx.send_replace(SaveStatus::Error(e.to_string()));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::dune;
    use crate::models::ReadingSession;
    use crate::store::{MemoryStore, StoreError};
    use tokio::time::sleep;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn version(n: u32) -> Book {
        let mut book = dune();
        book.set_review(format!("draft {}", n));
        book
    }

    fn spawn(store: &Arc<MemoryStore>) -> DebouncedPersist {
        DebouncedPersist::spawn(Arc::clone(store), PersistOptions::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_writes_last_value_once() {
        let store = Arc::new(MemoryStore::new());
        let persist = spawn(&store);

        for n in 1..=5 {
            persist.save(&version(n));
            sleep(ms(100)).await;
        }
        sleep(ms(1000)).await;

        assert_eq!(store.puts().await, vec![version(5)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_saves_write_each_value() {
        let store = Arc::new(MemoryStore::new());
        let persist = spawn(&store);

        persist.save(&version(1));
        sleep(ms(600)).await;
        persist.save(&version(2));
        sleep(ms(600)).await;
        persist.save(&version(3));
        sleep(ms(600)).await;

        assert_eq!(store.puts().await, vec![version(1), version(2), version(3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_transitions() {
        let store = Arc::new(MemoryStore::new());
        let persist = spawn(&store);
        assert_eq!(persist.status(), SaveStatus::Idle);

        persist.save(&dune());
        assert_eq!(persist.status(), SaveStatus::Saving);

        sleep(ms(400)).await;
        assert_eq!(persist.status(), SaveStatus::Saving);
        assert!(store.puts().await.is_empty());

        sleep(ms(200)).await;
        assert_eq!(persist.status(), SaveStatus::Saved);

        sleep(ms(1300)).await;
        assert_eq!(persist.status(), SaveStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_surfaces_error() {
        let store = Arc::new(MemoryStore::new());
        store
            .fail_next_puts([StoreError::quota_exceeded("disk is full")])
            .await;
        let persist = spawn(&store);

        persist.save(&dune());
        sleep(ms(600)).await;
        assert!(persist.status().is_error());

        // Errors do not fade back to idle
        sleep(ms(2000)).await;
        assert!(persist.status().is_error());
        assert!(store.puts().await.is_empty());

        // The next save recovers
        persist.save(&dune());
        assert_eq!(persist.status(), SaveStatus::Saving);
        sleep(ms(600)).await;
        assert_eq!(persist.status(), SaveStatus::Saved);
        assert_eq!(store.puts().await, vec![dune()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_is_detached_from_caller() {
        let store = Arc::new(MemoryStore::new());
        let persist = spawn(&store);

        let mut book = dune();
        persist.save(&book);
        book.sessions[0].summary = "edited after save".to_string();
        book.add_session(ReadingSession::new(51, 80, "not submitted"));
        sleep(ms(600)).await;

        assert_eq!(store.puts().await, vec![dune()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately() {
        let store = Arc::new(MemoryStore::new());
        let persist = spawn(&store);

        persist.save(&version(1));
        persist.save(&version(2));
        let status = persist.flush().await;

        assert_eq!(status, SaveStatus::Saved);
        assert_eq!(store.puts().await, vec![version(2)]);

        // Nothing left for the timer to write
        sleep(ms(1000)).await;
        assert_eq!(store.puts().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_with_nothing_pending() {
        let store = Arc::new(MemoryStore::new());
        let persist = spawn(&store);

        assert_eq!(persist.flush().await, SaveStatus::Idle);
        assert!(store.puts().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_writes_pending_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let persist = spawn(&store);

        persist.save(&version(7));
        let status = persist.close().await;

        assert_eq!(status, SaveStatus::Saved);
        assert_eq!(store.puts().await, vec![version(7)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_transitions() {
        let store = Arc::new(MemoryStore::new());
        let persist = spawn(&store);
        let mut status_rx = persist.subscribe();

        persist.save(&dune());
        status_rx.changed().await.unwrap();
        assert_eq!(*status_rx.borrow_and_update(), SaveStatus::Saving);

        status_rx.changed().await.unwrap();
        assert_eq!(*status_rx.borrow_and_update(), SaveStatus::Saved);

        status_rx.changed().await.unwrap();
        assert_eq!(*status_rx.borrow_and_update(), SaveStatus::Idle);
    }
}
