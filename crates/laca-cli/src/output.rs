//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use laca_core::{Book, ReadingSession, SaveStatus};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single book with its reading timeline
    pub fn print_book(&self, book: &Book) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", book.id);
                println!("Title:    {}", book.title);
                println!("Author:   {}", book.author);
                println!("Rating:   {}", stars(book.rating));
                println!("Added:    {}", book.date);
                println!("Cover:    {}", if book.cover.is_some() { "yes" } else { "no" });
                println!("Pages:    {}", book.pages_read());

                if !book.review.is_empty() {
                    println!();
                    println!("── Review ──");
                    println!("{}", book.review);
                }

                if !book.sessions.is_empty() {
                    println!();
                    println!("── Sessions ({}) ──", book.sessions.len());
                    for session in &book.sessions {
                        println!(
                            "[{}] p. {}-{}  {}",
                            session.date,
                            session.from_page,
                            session.to_page,
                            truncate_line(&session.summary, 60)
                        );
                    }
                }
            }
            OutputFormat::Json => print_json(book),
            OutputFormat::Quiet => {
                println!("{}", book.id);
            }
        }
    }

    /// Print a list of books
    pub fn print_books(&self, books: &[Book]) {
        match self.format {
            OutputFormat::Human => {
                if books.is_empty() {
                    println!("No books yet.");
                    return;
                }
                for book in books {
                    let sessions_indicator = if book.sessions.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", book.sessions.len())
                    };
                    println!(
                        "{} | {}{} | {} | {}",
                        short_id(&book.id),
                        truncate(&book.title, 35),
                        sessions_indicator,
                        truncate(&book.author, 25),
                        stars(book.rating)
                    );
                }
                println!("\n{} book(s)", books.len());
            }
            OutputFormat::Json => print_json(&books),
            OutputFormat::Quiet => {
                for book in books {
                    println!("{}", book.id);
                }
            }
        }
    }

    /// Print the sessions logged against a book
    pub fn print_sessions(&self, book: &Book) {
        match self.format {
            OutputFormat::Human => {
                println!("Sessions for: {} - {}", short_id(&book.id), book.title);
                println!();

                if book.sessions.is_empty() {
                    println!("No sessions logged.");
                    return;
                }

                for session in &book.sessions {
                    print_session(session);
                }
                println!(
                    "{} session(s), {} page(s)",
                    book.sessions.len(),
                    book.pages_read()
                );
            }
            OutputFormat::Json => print_json(&book.sessions),
            OutputFormat::Quiet => {
                for session in &book.sessions {
                    println!("{}", session.id);
                }
            }
        }
    }

    /// Print the debounced controller's status
    pub fn save_status(&self, status: &SaveStatus) {
        match self.format {
            OutputFormat::Human => match status {
                SaveStatus::Idle => {}
                SaveStatus::Saving => println!("… saving"),
                SaveStatus::Saved => println!("✓ saved"),
                SaveStatus::Error(msg) => eprintln!("✗ save failed: {}", msg),
            },
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"save_status": status.to_string()}));
            }
            OutputFormat::Quiet => {
                if let SaveStatus::Error(msg) = status {
                    eprintln!("{}", msg);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr unless quiet
    pub fn warn(&self, msg: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", msg);
        }
    }
}

fn print_session(session: &ReadingSession) {
    println!("────────────────────────────────────────");
    println!(
        "ID: {}  Date: {}  Pages: {}-{}",
        short_id(&session.id),
        session.date,
        session.from_page,
        session.to_page
    );
    if !session.summary.is_empty() {
        println!();
        println!("{}", session.summary);
    }
    println!();
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// First 8 characters of an id
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Rating as filled and empty stars, e.g. "★★★☆☆"
fn stars(rating: f64) -> String {
    let filled = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        // Multi-byte characters are never split
        assert_eq!(truncate("Laskar Pelangi — Andrea Hirata", 19), "Laskar Pelangi —...");
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("single line", 20), "single line");
        assert_eq!(truncate_line("line one\nline two", 20), "line one");
        assert_eq!(
            truncate_line("very long single line here", 10),
            "very lo..."
        );
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("b1"), "b1");
        assert_eq!(short_id("0f8e2c1a-1111-2222"), "0f8e2c1a");
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(0.0), "☆☆☆☆☆");
        assert_eq!(stars(3.4), "★★★☆☆");
        assert_eq!(stars(5.0), "★★★★★");
    }
}
