//! [`Canvas`] backed by a printpdf document

use printpdf::image_crate::{self, DynamicImage, GenericImageView};
use printpdf::{
    BuiltinFont, Color, Greyscale, Image, ImageTransform, IndirectFontRef, Line, Mm,
    PdfDocument, PdfDocumentReference, PdfLayerIndex, PdfLayerReference, PdfPageIndex, Point,
};

use super::canvas::{Canvas, CoverImage, ImageFormat, TextStyle};
use super::layout::{PAGE_HEIGHT, PAGE_WIDTH};
use super::ExportError;

const LAYER_NAME: &str = "Layer 1";
const IMAGE_DPI: f32 = 300.0;
const LINE_THICKNESS: f32 = 0.5;

pub struct PdfCanvas {
    doc: PdfDocumentReference,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    current: usize,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl PdfCanvas {
    /// Start an A4 document with one empty page
    pub fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);

        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;

        Ok(Self {
            doc,
            pages: vec![(page, layer)],
            current: 0,
            regular,
            bold,
        })
    }

    /// Serialize the finished document
    pub fn into_bytes(self) -> Result<Vec<u8>, ExportError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ExportError::Pdf(e.to_string()))
    }

    fn layer(&self) -> PdfLayerReference {
        let (page, layer) = self.pages[self.current];
        self.doc.get_page(page).get_layer(layer)
    }
}

/// PDF user space runs bottom-up
fn flip(y: f32) -> Mm {
    Mm(PAGE_HEIGHT - y)
}

fn gray(level: u8) -> Color {
    Color::Greyscale(Greyscale::new(f32::from(level) / 255.0, None))
}

impl Canvas for PdfCanvas {
    fn add_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
        self.pages.push((page, layer));
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
        let font = if style.bold { &self.bold } else { &self.regular };
        let layer = self.layer();
        layer.set_fill_color(gray(style.gray));
        layer.use_text(text, style.size, Mm(x), flip(y), font);
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, level: u8) {
        let layer = self.layer();
        layer.set_outline_color(gray(level));
        layer.set_outline_thickness(LINE_THICKNESS);
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), flip(y1)), false),
                (Point::new(Mm(x2), flip(y2)), false),
            ],
            is_closed: false,
        });
    }

    fn image(
        &mut self,
        image: &CoverImage,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), ExportError> {
        let format = match image.format {
            ImageFormat::Png => image_crate::ImageFormat::Png,
            ImageFormat::Jpeg => image_crate::ImageFormat::Jpeg,
        };
        let decoded = image_crate::load_from_memory_with_format(&image.bytes, format)
            .map_err(|e| ExportError::render("cover", e.to_string()))?;

        let (px_width, px_height) = decoded.dimensions();
        if px_width == 0 || px_height == 0 {
            return Err(ExportError::render("cover", "image has no pixels"));
        }

        // Alpha channels are dropped; printpdf embeds plain RGB reliably
        let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
        let natural_width = px_width as f32 / IMAGE_DPI * 25.4;
        let natural_height = px_height as f32 / IMAGE_DPI * 25.4;

        Image::from_dynamic_image(&rgb).add_to_layer(
            self.layer(),
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(flip(y + height)),
                scale_x: Some(width / natural_width),
                scale_y: Some(height / natural_height),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        Ok(())
    }
}
