//! Page background resolution.
//!
//! The scene background string is resolved once per export into a page-sized
//! opaque raster, which becomes the bottom layer of the page.

use std::time::Duration;

use canvas_scene::Transform;
use tiny_skia::Pixmap;

use crate::color::Rgba;
use crate::error::{ExportError, ExportResult};
use crate::image::{composite_image, load_with_timeout, ImageLoader};
use crate::shape::ShapeStyle;

/// How a background string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundSource<'a> {
    /// No background set.
    None,
    /// A `#...` or `rgb...` color.
    Color(&'a str),
    /// A `data:` URI or `http...` URL.
    Image(&'a str),
    /// Anything else; rendered as white.
    Unsupported(&'a str),
}

impl<'a> BackgroundSource<'a> {
    /// Classify a scene background by its prefix.
    #[must_use]
    pub fn classify(background: Option<&'a str>) -> Self {
        match background.map(str::trim) {
            None | Some("") => Self::None,
            Some(s) if s.starts_with('#') || s.starts_with("rgb") => Self::Color(s),
            Some(s) if s.starts_with("data:") || s.starts_with("http") => Self::Image(s),
            Some(s) => Self::Unsupported(s),
        }
    }
}

/// Allocate a transparent page-sized raster.
///
/// # Errors
///
/// Returns [`ExportError::RasterAllocation`] if the size is zero or too large.
pub fn page_raster(width: u32, height: u32) -> ExportResult<Pixmap> {
    Pixmap::new(width, height).ok_or(ExportError::RasterAllocation { width, height })
}

/// Resolve the scene background into an opaque page raster.
///
/// The page starts white; colors and images are painted over it. Any failure
/// other than allocation leaves the page white.
///
/// # Errors
///
/// Returns [`ExportError::RasterAllocation`] if the raster cannot be created.
pub async fn resolve_background(
    background: Option<&str>,
    width: u32,
    height: u32,
    loader: &dyn ImageLoader,
    timeout: Duration,
) -> ExportResult<Pixmap> {
    let mut pixmap = page_raster(width, height)?;
    pixmap.fill(Rgba::WHITE.to_skia(1.0));

    match BackgroundSource::classify(background) {
        BackgroundSource::None => {}
        BackgroundSource::Color(color) => match Rgba::parse(color) {
            Some(rgba) => pixmap.fill(blend_over_white(rgba)),
            None => tracing::warn!(color, "Unparseable background color, using white"),
        },
        BackgroundSource::Image(src) => match load_with_timeout(loader, src, timeout).await {
            Ok(image) => {
                #[allow(clippy::cast_precision_loss)]
                let page = Transform::new(0.0, 0.0, width as f32, height as f32);
                let style = ShapeStyle {
                    opacity: 1.0,
                    fill: None,
                    stroke: None,
                };
                composite_image(&mut pixmap, &image, &page, &style);
            }
            Err(e) => tracing::warn!(error = %e, "Background image failed, using white"),
        },
        BackgroundSource::Unsupported(value) => {
            tracing::warn!(background = value, "Unsupported background, using white");
        }
    }

    Ok(pixmap)
}

/// A color composited over white, so the page stays opaque.
fn blend_over_white(color: Rgba) -> tiny_skia::Color {
    let a = f32::from(color.a) / 255.0;
    let over = |c: u8| f32::from(c) / 255.0 * a + (1.0 - a);
    tiny_skia::Color::from_rgba(over(color.r), over(color.g), over(color.b), 1.0)
        .unwrap_or(tiny_skia::Color::WHITE)
}
