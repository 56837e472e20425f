//! Book page layout
//!
//! Lays a book out top to bottom, breaking pages whenever the next line
//! would run past the bottom margin. Footers are stamped in a second pass
//! because the total page count is only known once layout is done.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::warn;

use super::canvas::{Canvas, CoverImage, ImageFormat, TextStyle};
use super::metrics::{fit_to_width, line_height, text_width, wrap_text};
use super::{ExportError, ExportOptions};
use crate::models::{Book, ReadingSession};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;

const MARGIN_LEFT: f32 = 20.0;
const MARGIN_RIGHT: f32 = 190.0;
const CONTENT_WIDTH: f32 = MARGIN_RIGHT - MARGIN_LEFT;
const CENTER_X: f32 = PAGE_WIDTH / 2.0;

const HEADER_Y: f32 = 10.0;
const FOOTER_Y: f32 = 290.0;
const CONTENT_TOP: f32 = 30.0;
const CONTENT_BOTTOM: f32 = 280.0;
/// Past this point the timeline starts on a fresh page
const SECTION_BREAK_Y: f32 = 260.0;

const COVER_WIDTH: f32 = 60.0;
const COVER_HEIGHT: f32 = 90.0;

const SUMMARY_INDENT: f32 = 5.0;

/// Header and footer text
const CHROME: TextStyle = TextStyle::regular(9.0).with_gray(120);
const TITLE: TextStyle = TextStyle::bold(18.0);
const AUTHOR: TextStyle = TextStyle::regular(11.0);
const META: TextStyle = TextStyle::regular(10.0);
const HEADING: TextStyle = TextStyle::bold(13.0);
const BODY: TextStyle = TextStyle::regular(11.0);
const SESSION_HEADER: TextStyle = TextStyle::bold(11.0);

const REVIEW_HEADING: &str = "Reviu Akhir";
const TIMELINE_HEADING: &str = "Timeline Bacaan";
const EMPTY_REVIEW: &str = "—";

/// Lay `book` out on `canvas` and stamp footers. Returns the page count.
pub fn layout_book<C: Canvas + ?Sized>(canvas: &mut C, book: &Book, options: &ExportOptions) -> usize {
    let mut layout = Layout {
        canvas,
        title: &book.title,
        app_name: &options.app_name,
        y: CONTENT_TOP,
    };

    layout.draw_header();
    if let Some(cover) = &book.cover {
        layout.cover(cover);
    }
    layout.title_block(book);
    layout.review(&book.review);
    layout.timeline(&book.sessions);
    layout.stamp_footers(&options.printed_on)
}

/// The text shown as a session's header line
pub fn session_header(session: &ReadingSession) -> String {
    format!(
        "{} — Hal. {}–{}",
        session.date, session.from_page, session.to_page
    )
}

/// Decode a cover data URL (or bare base64) into raw image bytes
///
/// `data:image/png...` is treated as PNG, anything else as JPEG.
pub fn decode_cover(cover: &str) -> Result<CoverImage, ExportError> {
    let format = if cover.starts_with("data:image/png") {
        ImageFormat::Png
    } else {
        ImageFormat::Jpeg
    };

    let payload = match cover.split_once(',') {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => cover,
    };
    let payload: String = payload.split_whitespace().collect();

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| ExportError::render("cover", e.to_string()))?;
    if bytes.is_empty() {
        return Err(ExportError::render("cover", "empty image data"));
    }

    Ok(CoverImage { format, bytes })
}

struct Layout<'a, C: Canvas + ?Sized> {
    canvas: &'a mut C,
    title: &'a str,
    app_name: &'a str,
    /// Baseline of the next line on the current page
    y: f32,
}

impl<C: Canvas + ?Sized> Layout<'_, C> {
    fn draw_header(&mut self) {
        let app_width = text_width(self.app_name, CHROME.size, CHROME.bold);
        let title_room = CONTENT_WIDTH - app_width - 10.0;
        let title = fit_to_width(self.title, title_room, CHROME.size, CHROME.bold);

        self.canvas.text(&title, MARGIN_LEFT, HEADER_Y, CHROME);
        self.text_right(self.app_name, MARGIN_RIGHT, HEADER_Y, CHROME);
    }

    fn new_page(&mut self) {
        self.canvas.add_page();
        self.y = CONTENT_TOP;
        self.draw_header();
    }

    /// Start a new page unless `height` more millimetres fit on this one
    fn reserve(&mut self, height: f32) {
        if self.y + height > CONTENT_BOTTOM {
            self.new_page();
        }
    }

    fn text_right(&mut self, text: &str, right: f32, y: f32, style: TextStyle) {
        let x = right - text_width(text, style.size, style.bold);
        self.canvas.text(text, x, y, style);
    }

    fn text_centered(&mut self, text: &str, y: f32, style: TextStyle) {
        let x = CENTER_X - text_width(text, style.size, style.bold) / 2.0;
        self.canvas.text(text, x, y, style);
    }

    /// Wrapped text flowing across pages
    fn paragraph(&mut self, text: &str, x: f32, width: f32, style: TextStyle) {
        let step = line_height(style.size);
        for line in wrap_text(text, width, style.size, style.bold) {
            self.reserve(step);
            self.canvas.text(&line, x, self.y, style);
            self.y += step;
        }
    }

    fn cover(&mut self, cover: &str) {
        let x = (PAGE_WIDTH - COVER_WIDTH) / 2.0;
        let placed = decode_cover(cover).and_then(|image| {
            self.canvas
                .image(&image, x, self.y, COVER_WIDTH, COVER_HEIGHT)
        });

        match placed {
            Ok(()) => self.y += COVER_HEIGHT + 10.0,
            Err(e) => warn!("Skipping cover for '{}': {}", self.title, e),
        }
    }

    /// Wrapped text centred on the page, flowing across pages
    fn centered_paragraph(&mut self, text: &str, style: TextStyle, step: f32) {
        for line in wrap_text(text, CONTENT_WIDTH, style.size, style.bold) {
            self.reserve(step);
            self.text_centered(&line, self.y, style);
            self.y += step;
        }
    }

    fn title_block(&mut self, book: &Book) {
        self.centered_paragraph(&book.title, TITLE, line_height(TITLE.size));
        self.y += 10.0 - line_height(TITLE.size);

        self.centered_paragraph(&format!("Penulis: {}", book.author), AUTHOR, 6.0);

        let meta = format!("Rating: {}/5 • Ditambahkan: {}", book.rating, book.date);
        self.centered_paragraph(&meta, META, 10.0);

        self.canvas
            .line(MARGIN_LEFT, self.y, MARGIN_RIGHT, self.y, 200);
        self.y += 10.0;
    }

    fn review(&mut self, review: &str) {
        self.reserve(8.0 + line_height(BODY.size));
        self.canvas.text(REVIEW_HEADING, MARGIN_LEFT, self.y, HEADING);
        self.y += 8.0;

        let review = if review.trim().is_empty() {
            EMPTY_REVIEW
        } else {
            review
        };
        self.paragraph(review, MARGIN_LEFT, CONTENT_WIDTH, BODY);
        self.y += 10.0;
    }

    fn timeline(&mut self, sessions: &[ReadingSession]) {
        if self.y > SECTION_BREAK_Y {
            self.new_page();
        }
        self.canvas
            .text(TIMELINE_HEADING, MARGIN_LEFT, self.y, HEADING);
        self.y += 8.0;

        let body_step = line_height(BODY.size);
        let header_step = line_height(SESSION_HEADER.size);
        for session in sessions {
            self.y += 2.0;
            // Keep a header together with the first line of its summary
            self.reserve(header_step + body_step);
            self.paragraph(
                &session_header(session),
                MARGIN_LEFT,
                CONTENT_WIDTH,
                SESSION_HEADER,
            );
            if !session.summary.trim().is_empty() {
                self.paragraph(
                    &session.summary,
                    MARGIN_LEFT + SUMMARY_INDENT,
                    CONTENT_WIDTH - SUMMARY_INDENT,
                    BODY,
                );
            }
            self.y += 5.0;
        }
    }

    /// Second pass: revisit every page and draw its footer
    fn stamp_footers(&mut self, printed_on: &str) -> usize {
        let total = self.canvas.page_count();
        for index in 0..total {
            self.canvas.set_page(index);
            self.canvas.text(printed_on, MARGIN_LEFT, FOOTER_Y, CHROME);
            self.text_right(
                &format!("{} / {}", index + 1, total),
                MARGIN_RIGHT,
                FOOTER_Y,
                CHROME,
            );
        }
        total
    }
}
