//! # Canvas PDF
//!
//! Turns a [`canvas_scene::Scene`] snapshot into a single-page PDF whose page
//! matches the canvas size.
//!
//! ## Page Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  element N    vector text | full-page image │
//! ├─────────────────────────────────────────────┤
//! │  ...          (stacking order, zIndex asc)  │
//! ├─────────────────────────────────────────────┤
//! │  element 0    vector text | full-page image │
//! ├─────────────────────────────────────────────┤
//! │  background   opaque full-page image        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Text stays selectable vector text. Shapes and images are rasterized with
//! `tiny-skia`, one scratch raster per element, so opacity and rounded
//! corners match the editor canvas.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod background;
pub mod color;
pub mod document;
pub mod error;
pub mod export;
pub mod image;
pub mod metrics;
pub mod shape;
pub mod text;

pub use color::{hex_to_rgb, ColorError, Rgba};
pub use error::{ExportError, ExportResult};
pub use export::{ExportConfig, ExportedDocument, SceneExporter, ScratchRaster};
pub use crate::image::{DecodedImage, ImageLoader, SourceLoader};
pub use shape::ShapeStyle;
pub use text::{FontStyle, TextMeasure};

/// Canvas PDF version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
