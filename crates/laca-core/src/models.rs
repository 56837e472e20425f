//! Data models for LaCa
//!
//! Defines the core data structures: Book and ReadingSession.
//! Field names serialize in camelCase so stored records and the legacy
//! blob share one JSON shape.

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Highest rating a book can carry
pub const MAX_RATING: f64 = 5.0;

/// A book in the reading journal
///
/// `Clone` produces a fully detached copy (every field is owned), which is
/// what the debounced persistence controller snapshots on `save`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier (primary key in the record store)
    pub id: String,
    /// Display title
    pub title: String,
    /// Display author
    pub author: String,
    /// Embedded cover image, usually a base64 data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    /// Final review text
    #[serde(default)]
    pub review: String,
    /// Rating on a 0..=5 scale
    #[serde(default)]
    pub rating: f64,
    /// When the book was added (date string)
    pub date: String,
    /// Reading history, in insertion order
    #[serde(default)]
    pub sessions: Vec<ReadingSession>,
}

impl Book {
    /// Create a new book with a fresh id, dated today
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), title, author)
    }

    /// Create a book with a specific ID
    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            cover: None,
            review: String::new(),
            rating: 0.0,
            date: today(),
            sessions: Vec::new(),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }

    pub fn set_review(&mut self, review: impl Into<String>) {
        self.review = review.into();
    }

    /// Set the rating, clamped to 0..=5
    pub fn set_rating(&mut self, rating: f64) {
        self.rating = if rating.is_nan() {
            0.0
        } else {
            rating.clamp(0.0, MAX_RATING)
        };
    }

    pub fn set_cover(&mut self, cover: Option<String>) {
        self.cover = cover;
    }

    /// Append a session to the end of the reading history
    pub fn add_session(&mut self, session: ReadingSession) {
        self.sessions.push(session);
    }

    /// Remove a session by id, returning whether one was removed
    pub fn remove_session(&mut self, id: &str) -> bool {
        match self.sessions.iter().position(|s| s.id == id) {
            Some(pos) => {
                self.sessions.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Look up a session by id
    pub fn session(&self, id: &str) -> Option<&ReadingSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Total pages covered by all sessions
    pub fn pages_read(&self) -> u64 {
        self.sessions.iter().map(ReadingSession::page_count).sum()
    }
}

/// One sitting of reading a book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingSession {
    /// Identifier, unique within its book
    pub id: String,
    /// First page read
    pub from_page: u32,
    /// Last page read
    pub to_page: u32,
    /// What happened in this stretch
    #[serde(default)]
    pub summary: String,
    /// When the session took place (date string)
    pub date: String,
}

impl ReadingSession {
    /// Create a new session dated today
    pub fn new(from_page: u32, to_page: u32, summary: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from_page,
            to_page,
            summary: summary.into(),
            date: today(),
        }
    }

    /// Override the session date
    pub fn on(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// Pages covered, inclusive. Zero when the range is inverted.
    pub fn page_count(&self) -> u64 {
        if self.from_page <= self.to_page {
            u64::from(self.to_page) - u64::from(self.from_page) + 1
        } else {
            0
        }
    }
}

/// Today's local date as `YYYY-MM-DD`
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_new() {
        let book = Book::new("Dune", "Herbert");
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Herbert");
        assert!(book.sessions.is_empty());
        assert!(book.cover.is_none());
        assert_eq!(book.date.len(), 10);
        assert!(Uuid::parse_str(&book.id).is_ok());
    }

    #[test]
    fn test_rating_is_clamped() {
        let mut book = Book::new("Dune", "Herbert");
        book.set_rating(7.0);
        assert_eq!(book.rating, 5.0);
        book.set_rating(-1.0);
        assert_eq!(book.rating, 0.0);
        book.set_rating(3.5);
        assert_eq!(book.rating, 3.5);
    }

    #[test]
    fn test_sessions_keep_insertion_order() {
        let mut book = Book::new("Dune", "Herbert");
        let first = ReadingSession::new(1, 10, "one");
        let second = ReadingSession::new(11, 20, "two");
        let first_id = first.id.clone();
        book.add_session(first);
        book.add_session(second);

        assert_eq!(book.sessions[0].summary, "one");
        assert_eq!(book.sessions[1].summary, "two");
        assert_eq!(book.pages_read(), 20);

        assert!(book.remove_session(&first_id));
        assert!(!book.remove_session(&first_id));
        assert_eq!(book.sessions.len(), 1);
    }

    #[test]
    fn test_inverted_range_counts_zero() {
        let session = ReadingSession::new(30, 10, "");
        assert_eq!(session.page_count(), 0);
    }

    #[test]
    fn test_full_page_range_does_not_overflow() {
        let mut book = Book::new("Dune", "Herbert");
        book.add_session(ReadingSession::new(0, u32::MAX, ""));
        book.add_session(ReadingSession::new(0, u32::MAX, ""));

        assert_eq!(book.sessions[0].page_count(), 1 << 32);
        assert_eq!(book.pages_read(), 1 << 33);
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = serde_json::to_value(fixtures::dune()).unwrap();
        assert_eq!(json["sessions"][0]["fromPage"], 1);
        assert_eq!(json["sessions"][0]["toPage"], 50);
        assert!(json.get("cover").is_none());
    }

    #[test]
    fn test_parses_web_app_record() {
        let json = r#"{
            "id": "b9",
            "title": "Laskar Pelangi",
            "author": "Andrea Hirata",
            "cover": "data:image/png;base64,AAAA",
            "review": "",
            "rating": 4,
            "date": "2023-05-01",
            "sessions": [
                {"id": "s1", "fromPage": 1, "toPage": 12, "summary": "Awal", "date": "2023-05-02"}
            ]
        }"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.rating, 4.0);
        assert_eq!(book.sessions[0].to_page, 12);
        assert_eq!(book.cover.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_clone_is_detached() {
        let original = fixtures::dune();
        let mut copy = original.clone();
        copy.sessions[0].summary.push_str(" changed");
        copy.add_session(ReadingSession::new(51, 60, "more"));
        assert_eq!(original.sessions.len(), 1);
        assert_eq!(original.sessions[0].summary, "Intro");
    }
}
