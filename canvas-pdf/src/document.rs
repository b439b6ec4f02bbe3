//! Single-page PDF output.
//!
//! [`PdfPage`] builds a `lopdf` document holding exactly one page sized to the
//! scene. Callers work in page pixels with a top-left origin; conversion to
//! PDF space (points, bottom-left origin) happens here.
//!
//! Raster layers are written as DeviceRGB image XObjects. A layer with any
//! translucent pixel carries its alpha channel as a separate DeviceGray
//! `/SMask` image object of the same size.

use std::collections::HashMap;

use canvas_scene::Transform;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tiny_skia::Pixmap;

use crate::error::{ExportError, ExportResult};
use crate::text::FontStyle;

const PT_PER_INCH: f32 = 72.0;

/// A line of text ready to be written into the page.
#[derive(Debug, Clone, Copy)]
pub struct TextRun<'a> {
    /// Text content.
    pub text: &'a str,
    /// Left edge in page pixels.
    pub x: f32,
    /// Baseline in page pixels from the top.
    pub baseline: f32,
    /// Font size in page pixels.
    pub font_size: f32,
    /// Helvetica face.
    pub style: FontStyle,
    /// Fill color.
    pub color: [u8; 3],
    /// Opacity factor `0.0..=1.0`.
    pub opacity: f32,
}

/// The one page of an export and its document.
pub struct PdfPage {
    doc: Document,
    pages_id: ObjectId,
    title: String,
    width: u32,
    height: u32,
    dpi: f32,
    operations: Vec<Operation>,
    fonts: HashMap<FontStyle, String>,
    font_resources: Dictionary,
    xobjects: Dictionary,
    graphics_states: HashMap<u16, String>,
    gs_resources: Dictionary,
    alpha: f32,
    saved_alpha: Vec<f32>,
    raster_layers: usize,
}

impl PdfPage {
    /// Create a document with one `width` x `height` pixel page.
    ///
    /// # Errors
    ///
    /// Returns an error if the page has no area or `dpi` is not positive.
    pub fn new(title: &str, width: u32, height: u32, dpi: f32) -> ExportResult<Self> {
        if width == 0 || height == 0 {
            return Err(ExportError::Document(format!(
                "page must have a positive size, got {width}x{height}"
            )));
        }
        if !(dpi.is_finite() && dpi > 0.0) {
            return Err(ExportError::Document(format!("invalid dpi: {dpi}")));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        Ok(Self {
            doc,
            pages_id,
            title: title.to_string(),
            width,
            height,
            dpi,
            operations: Vec::new(),
            fonts: HashMap::new(),
            font_resources: Dictionary::new(),
            xobjects: Dictionary::new(),
            graphics_states: HashMap::new(),
            gs_resources: Dictionary::new(),
            alpha: 1.0,
            saved_alpha: Vec::new(),
            raster_layers: 0,
        })
    }

    /// Page width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Page height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of full-page raster layers stacked so far.
    #[must_use]
    pub fn raster_layers(&self) -> usize {
        self.raster_layers
    }

    fn pt(&self, px: f32) -> f32 {
        px / self.dpi * PT_PER_INCH
    }

    /// Distance from the page bottom, in points, of a top-left pixel row.
    #[allow(clippy::cast_precision_loss)]
    fn flip_y(&self, y: f32) -> f32 {
        self.pt(self.height as f32 - y)
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    fn rgb_operands(color: [u8; 3]) -> Vec<Object> {
        color
            .iter()
            .map(|c| Object::Real(f32::from(*c) / 255.0))
            .collect()
    }

    /// Select the `/ExtGState` carrying this fill and stroke alpha.
    fn set_opacity(&mut self, opacity: f32) {
        let alpha = opacity.clamp(0.0, 1.0);
        if (alpha - self.alpha).abs() < f32::EPSILON {
            return;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let key = (alpha * 1000.0).round() as u16;
        let name = match self.graphics_states.get(&key) {
            Some(name) => name.clone(),
            None => {
                let name = format!("GS{}", self.graphics_states.len() + 1);
                let state = self.doc.add_object(dictionary! {
                    "Type" => "ExtGState",
                    "ca" => alpha,
                    "CA" => alpha,
                });
                self.gs_resources.set(name.as_str(), state);
                self.graphics_states.insert(key, name.clone());
                name
            }
        };
        self.push("gs", vec![name.as_str().into()]);
        self.alpha = alpha;
    }

    fn rect_operands(&self, rect: &Transform) -> Vec<Object> {
        vec![
            self.pt(rect.x).into(),
            self.flip_y(rect.y + rect.height).into(),
            self.pt(rect.width).into(),
            self.pt(rect.height).into(),
        ]
    }

    /// Open a graphics-state scope; colors and opacity set inside it are
    /// discarded by [`PdfPage::end_group`].
    pub fn begin_group(&mut self) {
        self.saved_alpha.push(self.alpha);
        self.push("q", vec![]);
    }

    /// Close the scope opened by [`PdfPage::begin_group`].
    pub fn end_group(&mut self) {
        if let Some(alpha) = self.saved_alpha.pop() {
            self.alpha = alpha;
            self.push("Q", vec![]);
        }
    }

    /// Fill a box with a solid color.
    pub fn fill_rect(&mut self, rect: &Transform, color: [u8; 3], opacity: f32) {
        self.set_opacity(opacity);
        self.push("rg", Self::rgb_operands(color));
        let operands = self.rect_operands(rect);
        self.push("re", operands);
        self.push("f", vec![]);
    }

    /// Stroke the outline of a box.
    pub fn stroke_rect(&mut self, rect: &Transform, color: [u8; 3], line_width: f32, opacity: f32) {
        self.set_opacity(opacity);
        self.push("RG", Self::rgb_operands(color));
        let width = self.pt(line_width);
        self.push("w", vec![width.into()]);
        let operands = self.rect_operands(rect);
        self.push("re", operands);
        self.push("S", vec![]);
    }

    fn font(&mut self, style: FontStyle) -> String {
        if let Some(name) = self.fonts.get(&style) {
            return name.clone();
        }
        let base_font = match style {
            FontStyle::Normal => "Helvetica",
            FontStyle::Bold => "Helvetica-Bold",
            FontStyle::Italic => "Helvetica-Oblique",
            FontStyle::BoldItalic => "Helvetica-BoldOblique",
        };
        let font = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base_font,
            "Encoding" => "WinAnsiEncoding",
        });
        let name = format!("F{}", self.fonts.len() + 1);
        self.font_resources.set(name.as_str(), font);
        self.fonts.insert(style, name.clone());
        name
    }

    /// Write one line of vector text.
    pub fn draw_text(&mut self, run: &TextRun<'_>) {
        let font = self.font(run.style);
        self.set_opacity(run.opacity);
        self.push("rg", Self::rgb_operands(run.color));

        let size = self.pt(run.font_size);
        let x = self.pt(run.x);
        let y = self.flip_y(run.baseline);
        self.push("BT", vec![]);
        self.push("Tf", vec![font.as_str().into(), size.into()]);
        self.push("Td", vec![x.into(), y.into()]);
        self.push("Tj", vec![Object::string_literal(win_ansi(run.text))]);
        self.push("ET", vec![]);
    }

    /// Stack a page-sized raster over everything drawn so far.
    ///
    /// A fully opaque raster is written without a soft mask.
    ///
    /// # Errors
    ///
    /// Returns an error if the raster does not match the page size.
    pub fn add_raster_layer(&mut self, pixmap: &Pixmap) -> ExportResult<()> {
        if pixmap.width() != self.width || pixmap.height() != self.height {
            return Err(ExportError::Document(format!(
                "raster layer is {}x{}, page is {}x{}",
                pixmap.width(),
                pixmap.height(),
                self.width,
                self.height
            )));
        }

        let pixel_count = pixmap.pixels().len();
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in pixmap.pixels() {
            let c = pixel.demultiply();
            rgb.extend_from_slice(&[c.red(), c.green(), c.blue()]);
            alpha.push(c.alpha());
        }

        let mut image = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width,
            "Height" => self.height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };
        if alpha.iter().any(|a| *a < u8::MAX) {
            let mask = self.doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => self.width,
                    "Height" => self.height,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            ));
            image.set("SMask", mask);
        }
        let image_id = self.doc.add_object(Stream::new(image, rgb));

        self.raster_layers += 1;
        let name = format!("Im{}", self.raster_layers);
        self.xobjects.set(name.as_str(), image_id);

        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (self.pt(self.width as f32), self.pt(self.height as f32));
        self.push("q", vec![]);
        self.push(
            "cm",
            vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()],
        );
        self.push("Do", vec![name.as_str().into()]);
        self.push("Q", vec![]);
        Ok(())
    }

    /// Serialize the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the content stream cannot be encoded or the
    /// document cannot be written.
    pub fn finish(mut self) -> ExportResult<Vec<u8>> {
        let content = Content {
            operations: std::mem::take(&mut self.operations),
        }
        .encode()
        .map_err(|e| ExportError::Document(format!("content encoding failed: {e}")))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));

        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (self.pt(self.width as f32), self.pt(self.height as f32));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => std::mem::take(&mut self.font_resources),
                "XObject" => std::mem::take(&mut self.xobjects),
                "ExtGState" => std::mem::take(&mut self.gs_resources),
            },
            "MediaBox" => Object::Array(vec![0.into(), 0.into(), w.into(), h.into()]),
        });
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Object::Array(vec![page_id.into()]),
                "Count" => 1,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(win_ansi(&self.title)),
            "Producer" => Object::string_literal(format!("canvas-pdf {}", crate::VERSION)),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| ExportError::Document(format!("PDF save failed: {e}")))?;
        Ok(bytes)
    }
}

/// Encode text for the builtin fonts' `WinAnsiEncoding`.
///
/// Latin-1 code points map to the same byte; anything else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => u8::try_from(code).unwrap_or(b'?'),
            _ => b'?',
        })
        .collect()
}
