//! # Canvas Scene
//!
//! Snapshot model of a layered 2D canvas as written by the post editor:
//! positioned, styled elements plus the page background and page size.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   Scene                     │
//! ├─────────────────────────────────────────────┤
//! │  canvasWidth x canvasHeight   background    │
//! ├─────────────────────────────────────────────┤
//! │  Element                                    │
//! │  - Transform (x, y, width, height, zIndex)  │
//! │  - ElementStyle (opacity, fill, border)     │
//! │  - ElementKind (text, shapes, image)        │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod element;
pub mod error;
pub mod scene;

pub use element::{
    Element, ElementId, ElementKind, ElementStyle, TextAlign, TextContent, Transform,
};
pub use error::{SceneError, SceneResult};
pub use scene::{Orientation, Scene};

/// Canvas scene version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
