//! Text layout and vector text emission.
//!
//! Text elements are never rasterized: the markup written by the editor is
//! reduced to plain lines, wrapped against Helvetica metrics and written into
//! the page as native PDF text.

use std::sync::OnceLock;

use canvas_scene::{Element, TextAlign, TextContent, Transform};
use regex::Regex;

use crate::color::hex_to_rgb;
use crate::document::{PdfPage, TextRun};
use crate::metrics;

/// One of the four faces of the base-14 Helvetica family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    /// Helvetica.
    Normal,
    /// Helvetica-Bold.
    Bold,
    /// Helvetica-Oblique.
    Italic,
    /// Helvetica-BoldOblique.
    BoldItalic,
}

impl FontStyle {
    /// Pick the face for a weight/style combination.
    #[must_use]
    pub fn resolve(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => Self::BoldItalic,
            (true, false) => Self::Bold,
            (false, true) => Self::Italic,
            (false, false) => Self::Normal,
        }
    }

    /// Face for a text element.
    #[must_use]
    pub fn for_content(content: &TextContent) -> Self {
        Self::resolve(content.is_bold(), content.is_italic())
    }

    /// Whether the face uses bold advance widths.
    #[must_use]
    pub fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }
}

/// Measures rendered text width in page pixels.
pub trait TextMeasure {
    /// Width of `text` when drawn on one line.
    fn width(&self, text: &str) -> f32;
}

/// Helvetica metrics at a fixed size.
#[derive(Debug, Clone, Copy)]
pub struct HelveticaMeasure {
    /// Font size in page pixels.
    pub font_size: f32,
    /// Face being measured.
    pub style: FontStyle,
}

impl TextMeasure for HelveticaMeasure {
    fn width(&self, text: &str) -> f32 {
        metrics::text_width(text, self.font_size, self.style.is_bold())
    }
}

/// Layout constants for text boxes.
#[derive(Debug, Clone, Copy)]
pub struct TextLayoutConfig {
    /// Padding between the box edge and the text, in pixels.
    pub inset: f32,
    /// Line advance as a multiple of the font size.
    pub line_height: f32,
}

impl Default for TextLayoutConfig {
    fn default() -> Self {
        Self {
            inset: 8.0,
            line_height: 1.2,
        }
    }
}

/// A wrapped line with its pen position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Line content (may be empty for blank lines).
    pub text: String,
    /// Left edge of the line in page pixels, alignment already applied.
    pub x: f32,
    /// Baseline in page pixels, measured from the top of the page.
    pub baseline: f32,
    /// Measured width in page pixels.
    pub width: f32,
}

/// Positioned lines of a text element.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    /// Lines in reading order.
    pub lines: Vec<TextLine>,
    /// Face used for every line.
    pub style: FontStyle,
    /// Font size in page pixels.
    pub font_size: f32,
}

fn markup_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"(?i)</div><div>", "\n"),
            (r"(?i)<br\s*/?>", "\n"),
            (r"(?i)<div>", ""),
            (r"(?i)</div>", "\n"),
            (r"(?i)</p>", "\n"),
            (r"(?i)<p[^>]*>", ""),
            (r"<[^>]*>", ""),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|re| (re, replacement))
        })
        .collect()
    })
}

/// Reduce editor markup to plain text with `\n` line breaks.
///
/// Block boundaries and `<br>` become line breaks, every other tag is
/// dropped, and leading/trailing line breaks are trimmed.
#[must_use]
pub fn clean_markup(markup: &str) -> String {
    let mut text = markup.to_string();
    for (re, replacement) in markup_rules() {
        text = re.replace_all(&text, *replacement).into_owned();
    }
    text.trim_matches('\n').to_string()
}

/// Greedily wrap `text` so each line measures at most `max_width`.
///
/// Existing line breaks are kept; an empty logical line stays an empty
/// wrapped line. A single word wider than `max_width` gets a line of its own.
pub fn wrap_lines(text: &str, max_width: f32, measure: &impl TextMeasure) -> Vec<String> {
    let mut wrapped = Vec::new();

    for line in text.split('\n') {
        if line.is_empty() {
            wrapped.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in line.split(' ') {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if measure.width(&candidate) > max_width && !current.is_empty() {
                wrapped.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        wrapped.push(current);
    }

    wrapped
}

/// Lay out a text element, or `None` when it has no text.
#[must_use]
pub fn layout_text(
    transform: &Transform,
    content: &TextContent,
    config: &TextLayoutConfig,
) -> Option<TextLayout> {
    let markup = content.text.as_deref().filter(|t| !t.is_empty())?;

    let font_size = content.font_size();
    let style = FontStyle::for_content(content);
    let measure = HelveticaMeasure { font_size, style };

    let cleaned = clean_markup(markup);
    let max_width = transform.width - 2.0 * config.inset;
    let advance = font_size * config.line_height;
    let first_baseline = transform.y + font_size + config.inset;

    let anchor = match content.text_align {
        TextAlign::Left => transform.x + config.inset,
        TextAlign::Center => transform.x + transform.width / 2.0,
        TextAlign::Right => transform.x + transform.width - config.inset,
    };

    let lines = wrap_lines(&cleaned, max_width, &measure)
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let width = measure.width(&text);
            let x = match content.text_align {
                TextAlign::Left => anchor,
                TextAlign::Center => anchor - width / 2.0,
                TextAlign::Right => anchor - width,
            };
            #[allow(clippy::cast_precision_loss)]
            let baseline = first_baseline + index as f32 * advance;
            TextLine {
                text,
                x,
                baseline,
                width,
            }
        })
        .collect();

    Some(TextLayout {
        lines,
        style,
        font_size,
    })
}

/// Write a text element into the page as vector content.
///
/// Elements without text are skipped entirely, including their box.
pub fn emit_text(
    page: &mut PdfPage,
    element: &Element,
    content: &TextContent,
    config: &TextLayoutConfig,
) {
    let Some(layout) = layout_text(&element.transform, content, config) else {
        tracing::debug!(id = %element.id, "Skipping text element without text");
        return;
    };

    let opacity = element.style.opacity_factor();
    let t = &element.transform;

    page.begin_group();

    if let Some(background) = element
        .style
        .background_color
        .as_deref()
        .filter(|c| *c != "transparent")
    {
        match hex_to_rgb(background) {
            Ok(rgb) => page.fill_rect(t, rgb, opacity),
            Err(e) => tracing::warn!(id = %element.id, error = %e, "Skipping text background"),
        }
    }

    if let Some((border, width)) = element.style.border() {
        match hex_to_rgb(border) {
            Ok(rgb) => page.stroke_rect(t, rgb, width, opacity),
            Err(e) => tracing::warn!(id = %element.id, error = %e, "Skipping text border"),
        }
    }

    let color = hex_to_rgb(content.color()).unwrap_or_else(|e| {
        tracing::warn!(id = %element.id, error = %e, "Falling back to black text");
        [0, 0, 0]
    });

    for line in layout.lines.iter().filter(|l| !l.text.is_empty()) {
        page.draw_text(&TextRun {
            text: &line.text,
            x: line.x,
            baseline: line.baseline,
            font_size: layout.font_size,
            style: layout.style,
            color,
            opacity,
        });
    }

    page.end_group();
}
