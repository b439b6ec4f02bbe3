//! Scene export to a single-page PDF.
//!
//! The page is assembled bottom-up: the resolved background raster, then each
//! visible element in stacking order. Text is written as vector PDF text;
//! every other element is painted onto its own page-sized scratch raster,
//! which is stacked as a full-page image layer.

use std::sync::Arc;
use std::time::Duration;

use canvas_scene::{Element, ElementKind, Orientation, Scene};
use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;

use crate::background::{page_raster, resolve_background};
use crate::document::PdfPage;
use crate::error::ExportResult;
use crate::image::{composite_image, load_with_timeout, ImageLoader, SourceLoader};
use crate::shape::{self, ShapeStyle};
use crate::text::{emit_text, TextLayoutConfig};

/// Configuration for scene export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Page pixels per inch (default: 96.0).
    pub dpi: f32,
    /// Budget for each image load (default: 10 s).
    #[serde(rename = "image_timeout_ms", with = "duration_ms")]
    pub image_timeout: Duration,
    /// Document title (default: "Canvas Export").
    pub title: String,
    /// Padding between a text box edge and its text, in pixels (default: 8).
    pub text_inset: f32,
    /// Line advance as a multiple of the font size (default: 1.2).
    pub line_height: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dpi: 96.0,
            image_timeout: Duration::from_secs(10),
            title: "Canvas Export".to_string(),
            text_inset: 8.0,
            line_height: 1.2,
        }
    }
}

impl ExportConfig {
    fn text_layout(&self) -> TextLayoutConfig {
        TextLayoutConfig {
            inset: self.text_inset,
            line_height: self.line_height,
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// A page-sized raster owned by one element for the duration of its draw.
pub struct ScratchRaster {
    pixmap: Pixmap,
}

impl ScratchRaster {
    /// Allocate a transparent raster.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExportError::RasterAllocation`] if it cannot be created.
    pub fn acquire(width: u32, height: u32) -> ExportResult<Self> {
        Ok(Self {
            pixmap: page_raster(width, height)?,
        })
    }

    /// Drawing surface.
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Consume the raster, returning it only if anything was painted.
    #[must_use]
    pub fn into_layer(self) -> Option<Pixmap> {
        self.pixmap
            .pixels()
            .iter()
            .any(|p| p.alpha() > 0)
            .then_some(self.pixmap)
    }
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    /// Serialized PDF.
    pub bytes: Vec<u8>,
    /// Page width in pixels.
    pub width: u32,
    /// Page height in pixels.
    pub height: u32,
    /// Page orientation.
    pub orientation: Orientation,
    /// Full-page raster layers on the page, background included.
    pub raster_layers: usize,
}

/// Exports a [`Scene`] to a one-page PDF.
pub struct SceneExporter {
    config: ExportConfig,
    loader: Arc<dyn ImageLoader>,
}

impl SceneExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            loader: Arc::new(SourceLoader::new()),
        }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Replace the image loader.
    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export a scene.
    ///
    /// Image failures degrade in place and never fail the export.
    ///
    /// # Errors
    ///
    /// Returns an error if a raster cannot be allocated or the document cannot
    /// be built or serialized.
    #[tracing::instrument(
        skip_all,
        fields(
            width = scene.canvas_width,
            height = scene.canvas_height,
            elements = scene.element_count()
        )
    )]
    pub async fn export(&self, scene: &Scene) -> ExportResult<ExportedDocument> {
        let (width, height) = (scene.canvas_width, scene.canvas_height);
        let mut page = PdfPage::new(&self.config.title, width, height, self.config.dpi)?;

        let background = resolve_background(
            scene.background.as_deref(),
            width,
            height,
            self.loader.as_ref(),
            self.config.image_timeout,
        )
        .await?;
        page.add_raster_layer(&background)?;
        drop(background);

        let text_config = self.config.text_layout();

        for element in scene.stacking_order() {
            tracing::debug!(
                id = %element.id,
                kind = element.kind.name(),
                z_index = element.transform.z_index,
                "Exporting element"
            );

            if element.transform.is_degenerate() {
                tracing::debug!(id = %element.id, "Skipping element with empty box");
                continue;
            }

            match &element.kind {
                ElementKind::Text(content) => {
                    emit_text(&mut page, element, content, &text_config);
                }
                ElementKind::Rectangle { .. }
                | ElementKind::Circle
                | ElementKind::Triangle
                | ElementKind::Hexagon
                | ElementKind::Star
                | ElementKind::Image { .. } => {
                    let mut scratch = ScratchRaster::acquire(width, height)?;
                    self.rasterize_element(scratch.pixmap_mut(), element).await;
                    if let Some(layer) = scratch.into_layer() {
                        page.add_raster_layer(&layer)?;
                    }
                }
            }
        }

        let raster_layers = page.raster_layers();
        let bytes = page.finish()?;

        tracing::info!(
            width,
            height,
            raster_layers,
            size = bytes.len(),
            "Exported scene"
        );

        Ok(ExportedDocument {
            bytes,
            width,
            height,
            orientation: scene.orientation(),
            raster_layers,
        })
    }

    /// Paint a non-text element onto `pixmap`.
    ///
    /// Returns `false` if nothing was drawn. Text elements are never
    /// rasterized.
    pub async fn rasterize_element(&self, pixmap: &mut Pixmap, element: &Element) -> bool {
        match &element.kind {
            ElementKind::Text(_) => false,
            ElementKind::Rectangle { .. }
            | ElementKind::Circle
            | ElementKind::Triangle
            | ElementKind::Hexagon
            | ElementKind::Star => shape::rasterize_shape(pixmap, element),
            ElementKind::Image { image: None } => {
                tracing::debug!(id = %element.id, "Image element without source");
                false
            }
            ElementKind::Image { image: Some(src) } => {
                let style = ShapeStyle::from_style(&element.style);
                if style.opacity <= 0.0 {
                    return false;
                }
                match load_with_timeout(self.loader.as_ref(), src, self.config.image_timeout).await
                {
                    Ok(image) => {
                        composite_image(pixmap, &image, &element.transform, &style);
                        true
                    }
                    Err(e) => {
                        tracing::warn!(id = %element.id, error = %e, "Skipping image element");
                        false
                    }
                }
            }
        }
    }
}
