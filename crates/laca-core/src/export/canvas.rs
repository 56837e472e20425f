//! Drawing surface used by the layout
//!
//! Coordinates are millimetres from the top-left corner of an A4 page.
//! Pages form an indexable sequence so the layout can go back and stamp
//! footers once the total page count is known.

use super::ExportError;

/// Raster formats accepted for the cover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

/// Decoded cover payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

/// Font and colour for a run of text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Size in points
    pub size: f32,
    pub bold: bool,
    /// 0 = black, 255 = white
    pub gray: u8,
}

impl TextStyle {
    pub const fn regular(size: f32) -> Self {
        Self {
            size,
            bold: false,
            gray: 0,
        }
    }

    pub const fn bold(size: f32) -> Self {
        Self {
            size,
            bold: true,
            gray: 0,
        }
    }

    pub const fn with_gray(self, gray: u8) -> Self {
        Self { gray, ..self }
    }
}

/// A paginated drawing surface
///
/// A canvas always has at least one page, and drawing goes to the current
/// page. `add_page` appends a page and makes it current.
pub trait Canvas {
    fn add_page(&mut self);

    /// Make page `index` (zero-based) current
    fn set_page(&mut self, index: usize);

    fn page_count(&self) -> usize;

    fn current_page(&self) -> usize;

    /// Draw `text` with its left edge at `x` and its baseline at `y`
    fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle);

    /// Draw a hairline from (`x1`, `y1`) to (`x2`, `y2`)
    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, gray: u8);

    /// Place an image in the given box (top-left corner at `x`, `y`)
    fn image(
        &mut self,
        image: &CoverImage,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), ExportError>;
}

/// One recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        text: String,
        x: f32,
        y: f32,
        style: TextStyle,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    Image {
        format: ImageFormat,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// Canvas that records drawing calls per page instead of rendering
///
/// Used to inspect layouts. Images can be made to fail to exercise the
/// skip-and-continue path.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    pages: Vec<Vec<DrawOp>>,
    current: usize,
    reject_images: bool,
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self {
            pages: vec![Vec::new()],
            current: 0,
            reject_images: false,
        }
    }
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `image` call fail
    pub fn rejecting_images(mut self) -> Self {
        self.reject_images = true;
        self
    }

    /// Calls recorded on page `index`
    pub fn ops(&self, index: usize) -> &[DrawOp] {
        self.pages.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Text drawn on page `index`, in drawing order
    pub fn texts(&self, index: usize) -> Vec<&str> {
        self.ops(index)
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether page `index` has a text run equal to `needle`
    pub fn has_text(&self, index: usize, needle: &str) -> bool {
        self.texts(index).contains(&needle)
    }

    /// Number of images placed anywhere
    pub fn image_count(&self) -> usize {
        self.pages
            .iter()
            .flatten()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }
}

impl Canvas for RecordingCanvas {
    fn add_page(&mut self) {
        self.pages.push(Vec::new());
        self.current = self.pages.len() - 1;
    }

    fn set_page(&mut self, index: usize) {
        if index < self.pages.len() {
            self.current = index;
        }
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn current_page(&self) -> usize {
        self.current
    }

    fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
        self.pages[self.current].push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            style,
        });
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, _gray: u8) {
        self.pages[self.current].push(DrawOp::Line { x1, y1, x2, y2 });
    }

    fn image(
        &mut self,
        image: &CoverImage,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), ExportError> {
        if self.reject_images {
            return Err(ExportError::render("cover", "image rejected by canvas"));
        }
        self.pages[self.current].push(DrawOp::Image {
            format: image.format,
            x,
            y,
            width,
            height,
        });
        Ok(())
    }
}
