//! Canvas elements - the building blocks of scenes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default font size for text elements, in page pixels.
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Default text color for text elements.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";

/// Unique identifier for an element.
///
/// Identifiers written by the editor are kept verbatim; identifiers minted
/// here are UUID v4 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Horizontal alignment of text inside its box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Anchored at the left inset.
    #[default]
    Left,
    /// Anchored at the horizontal midpoint.
    Center,
    /// Anchored at the right inset.
    Right,
}

/// Text content and typography of a text element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    /// Markup string as written by the rich-text editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Font size in page pixels (default 16).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// `"bold"` selects a bold face.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    /// `"italic"` selects an italic face.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    /// Text color (default black).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Horizontal alignment.
    #[serde(default)]
    pub text_align: TextAlign,
}

impl TextContent {
    /// Create text content with default typography.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Resolved font size.
    #[must_use]
    pub fn font_size(&self) -> f32 {
        self.font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }

    /// Resolved text color.
    #[must_use]
    pub fn color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_TEXT_COLOR)
    }

    /// Whether the bold face is requested.
    #[must_use]
    pub fn is_bold(&self) -> bool {
        self.font_weight.as_deref() == Some("bold")
    }

    /// Whether the italic face is requested.
    #[must_use]
    pub fn is_italic(&self) -> bool {
        self.font_style.as_deref() == Some("italic")
    }

    /// Whether there is any text to draw.
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// The type of content an element contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A block of text, rendered as native document text.
    Text(TextContent),

    /// An axis-aligned rectangle, optionally with rounded corners.
    #[serde(rename_all = "camelCase")]
    Rectangle {
        /// Corner radius in pixels.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        border_radius: Option<f32>,
    },

    /// An ellipse inscribed in the element box.
    Circle,

    /// A triangle with its apex at the top middle of the box.
    Triangle,

    /// A six-point hexagon inscribed in the box.
    Hexagon,

    /// A five-armed star inscribed in the box.
    Star,

    /// A raster image stretched into the box.
    Image {
        /// Image source URL or data URI.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<String>,
    },
}

impl ElementKind {
    /// Short lowercase name of the kind, matching the JSON tag.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Rectangle { .. } => "rectangle",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Hexagon => "hexagon",
            Self::Star => "star",
            Self::Image { .. } => "image",
        }
    }
}

/// Position, size and stacking of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    /// X position (pixels from left).
    pub x: f32,
    /// Y position (pixels from top).
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Z-index for layering.
    #[serde(default)]
    pub z_index: i32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            z_index: 0,
        }
    }
}

impl Transform {
    /// Create a transform for the given box at z-index 0.
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            z_index: 0,
        }
    }

    /// Set the z-index.
    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Whether the box has no drawable area.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Fill, border and opacity shared by every element kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    /// Opacity 0-100 (default 100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<u8>,
    /// Fill color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Border color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    /// Border width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f32>,
}

impl ElementStyle {
    /// Opacity as a factor in `0.0..=1.0`.
    #[must_use]
    pub fn opacity_factor(&self) -> f32 {
        f32::from(self.opacity.unwrap_or(100).min(100)) / 100.0
    }

    /// Border color and width, present only when both are set.
    #[must_use]
    pub fn border(&self) -> Option<(&str, f32)> {
        match (self.border_color.as_deref(), self.border_width) {
            (Some(color), Some(width)) if width > 0.0 => Some((color, width)),
            _ => None,
        }
    }
}

/// A canvas element with content, transform and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier.
    #[serde(default)]
    pub id: ElementId,
    /// Element content type.
    #[serde(flatten)]
    pub kind: ElementKind,
    /// Position, size and stacking.
    #[serde(flatten)]
    pub transform: Transform,
    /// Fill, border and opacity.
    #[serde(flatten)]
    pub style: ElementStyle,
    /// Whether this element is exported at all.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Element {
    /// Create a new visible element with the given kind.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: ElementId::new(),
            kind,
            transform: Transform::default(),
            style: ElementStyle::default(),
            visible: true,
        }
    }

    /// Set the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the style.
    #[must_use]
    pub fn with_style(mut self, style: ElementStyle) -> Self {
        self.style = style;
        self
    }

    /// Set whether the element is visible.
    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Check if a point (in page coordinates) is within this element.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        let t = &self.transform;
        x >= t.x && x <= t.x + t.width && y >= t.y && y <= t.y + t.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_editor_text_element() {
        let json = r##"{
            "id": "1712345678901",
            "type": "text",
            "x": 10, "y": 20, "width": 200, "height": 100,
            "text": "<div>Hello</div>",
            "fontSize": 24,
            "fontWeight": "bold",
            "textAlign": "center",
            "backgroundColor": "transparent",
            "visible": true,
            "opacity": 80,
            "zIndex": 3,
            "locked": false,
            "fontFamily": "Arial"
        }"##;

        let element: Element = serde_json::from_str(json).expect("parse");
        assert_eq!(element.id.as_str(), "1712345678901");
        assert_eq!(element.transform.z_index, 3);
        assert_eq!(element.style.opacity, Some(80));
        let ElementKind::Text(content) = &element.kind else {
            panic!("expected text element");
        };
        assert!(content.is_bold());
        assert!(!content.is_italic());
        assert_eq!(content.text_align, TextAlign::Center);
        assert!((content.font_size() - 24.0).abs() < f32::EPSILON);
        assert_eq!(content.color(), DEFAULT_TEXT_COLOR);
    }

    #[test]
    fn test_parse_rectangle_with_radius() {
        let json = r##"{"id":"r","type":"rectangle","x":0,"y":0,"width":50,"height":40,
            "backgroundColor":"#3b82f6","borderRadius":8}"##;
        let element: Element = serde_json::from_str(json).expect("parse");
        assert_eq!(
            element.kind,
            ElementKind::Rectangle {
                border_radius: Some(8.0)
            }
        );
        assert!(element.visible, "visible defaults to true");
        assert_eq!(element.transform.z_index, 0);
    }

    #[test]
    fn test_opacity_defaults_and_clamps() {
        let mut style = ElementStyle::default();
        assert!((style.opacity_factor() - 1.0).abs() < f32::EPSILON);

        style.opacity = Some(0);
        assert!(style.opacity_factor().abs() < f32::EPSILON);

        style.opacity = Some(50);
        assert!((style.opacity_factor() - 0.5).abs() < f32::EPSILON);

        style.opacity = Some(250);
        assert!((style.opacity_factor() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_border_requires_color_and_width() {
        let mut style = ElementStyle {
            border_color: Some("#000".to_string()),
            ..ElementStyle::default()
        };
        assert!(style.border().is_none());

        style.border_width = Some(2.0);
        assert_eq!(style.border(), Some(("#000", 2.0)));

        style.border_color = None;
        assert!(style.border().is_none());
    }

    #[test]
    fn test_empty_text_is_not_drawable() {
        assert!(!TextContent::default().has_text());
        assert!(!TextContent::new("").has_text());
        assert!(TextContent::new("x").has_text());
    }

    #[test]
    fn test_kind_name_matches_tag() {
        let element = Element::new(ElementKind::Star);
        let value = serde_json::to_value(&element).expect("serialize");
        assert_eq!(value["type"], element.kind.name());
    }
}
