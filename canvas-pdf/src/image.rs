//! Image loading and compositing.
//!
//! Sources are `data:` URIs (base64 or percent-encoded) and `http(s)` URLs.
//! Loading sits behind the [`ImageLoader`] trait so exports can be driven
//! without a network.

use std::time::Duration;

use async_trait::async_trait;
use canvas_scene::Transform;
use tiny_skia::{FilterQuality, IntSize, Pixmap, PixmapPaint};

use crate::error::{ExportError, ExportResult};
use crate::shape::{self, ShapeStyle};

/// A decoded image held as a premultiplied raster.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixmap: Pixmap,
}

impl DecodedImage {
    /// Wrap an existing raster.
    #[must_use]
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self { pixmap }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// The underlying raster.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

/// Resolves an image source string into pixels.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Load and decode the image at `src`.
    async fn load(&self, src: &str) -> ExportResult<DecodedImage>;
}

/// Default loader for `data:` URIs and `http(s)` URLs.
#[derive(Debug, Clone, Default)]
pub struct SourceLoader {
    client: reqwest::Client,
}

impl SourceLoader {
    /// Create a loader with a fresh HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &str) -> ExportResult<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ImageLoader for SourceLoader {
    async fn load(&self, src: &str) -> ExportResult<DecodedImage> {
        let bytes = if src.starts_with("data:") {
            data_uri_bytes(src)?
        } else if src.starts_with("http://") || src.starts_with("https://") {
            self.fetch(src).await?
        } else {
            return Err(ExportError::ImageLoad(format!(
                "unsupported image source: {}",
                truncate(src)
            )));
        };
        decode_image_bytes(&bytes)
    }
}

fn truncate(src: &str) -> &str {
    src.char_indices().nth(64).map_or(src, |(i, _)| &src[..i])
}

/// Extract the payload of a `data:` URI.
///
/// # Errors
///
/// Returns [`ExportError::ImageLoad`] if the URI is malformed.
pub fn data_uri_bytes(uri: &str) -> ExportResult<Vec<u8>> {
    let body = uri
        .strip_prefix("data:")
        .ok_or_else(|| ExportError::ImageLoad("not a data URI".to_string()))?;
    let (metadata, payload) = body
        .split_once(',')
        .ok_or_else(|| ExportError::ImageLoad("invalid data URI: missing comma".to_string()))?;

    if metadata.ends_with(";base64") {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ExportError::ImageLoad(format!("invalid base64 payload: {e}")))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(input: &str) -> ExportResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| ExportError::ImageLoad("invalid percent-encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

/// Decode encoded image bytes into a premultiplied raster.
///
/// # Errors
///
/// Returns an error if the format is unknown or the data is corrupt.
pub fn decode_image_bytes(bytes: &[u8]) -> ExportResult<DecodedImage> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            #[allow(clippy::cast_possible_truncation)]
            let premultiplied = ((u16::from(*c) * a + 127) / 255) as u8;
            *c = premultiplied;
        }
    }

    let size = IntSize::from_wh(width, height)
        .ok_or_else(|| ExportError::ImageLoad(format!("empty image: {width}x{height}")))?;
    let pixmap = Pixmap::from_vec(data, size)
        .ok_or_else(|| ExportError::ImageLoad("image buffer size mismatch".to_string()))?;
    Ok(DecodedImage { pixmap })
}

/// Load `src`, treating a load that outlives `timeout` as failed.
///
/// # Errors
///
/// Returns the loader's error, or [`ExportError::ImageTimeout`].
pub async fn load_with_timeout(
    loader: &dyn ImageLoader,
    src: &str,
    timeout: Duration,
) -> ExportResult<DecodedImage> {
    tokio::time::timeout(timeout, loader.load(src))
        .await
        .map_err(|_| ExportError::ImageTimeout(timeout))?
}

/// Draw `image` stretched into `target`, then its border.
///
/// Only the opacity and stroke of `style` are used; images have no fill.
pub fn composite_image(
    pixmap: &mut Pixmap,
    image: &DecodedImage,
    target: &Transform,
    style: &ShapeStyle,
) {
    if style.opacity <= 0.0 || target.is_degenerate() {
        return;
    }

    #[allow(clippy::cast_precision_loss)]
    let (sx, sy) = (
        target.width / image.width() as f32,
        target.height / image.height() as f32,
    );
    let paint = PixmapPaint {
        opacity: style.opacity,
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(
        0,
        0,
        image.pixmap().as_ref(),
        &paint,
        tiny_skia::Transform::from_row(sx, 0.0, 0.0, sy, target.x, target.y),
        None,
    );

    let border = style.stroke_only();
    if border.is_visible() {
        if let Some(path) = shape::rect_path(target) {
            shape::draw_shape(pixmap, &path, &border);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    // 1x1 PNG
    const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    struct SlowLoader;

    #[async_trait]
    impl ImageLoader for SlowLoader {
        async fn load(&self, _src: &str) -> ExportResult<DecodedImage> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(ExportError::ImageLoad("unreachable".to_string()))
        }
    }

    fn solid(width: u32, height: u32, color: tiny_skia::Color) -> DecodedImage {
        let mut pixmap = Pixmap::new(width, height).expect("pixmap");
        pixmap.fill(color);
        DecodedImage::from_pixmap(pixmap)
    }

    #[tokio::test]
    async fn test_data_uri_base64() {
        let loader = SourceLoader::new();
        let image = loader
            .load(&format!("data:image/png;base64,{PNG_BASE64}"))
            .await
            .expect("decoded");
        assert_eq!((image.width(), image.height()), (1, 1));
    }

    #[test]
    fn test_data_uri_percent_encoded() {
        let bytes = data_uri_bytes("data:text/plain,a%20b%2Cc").expect("payload");
        assert_eq!(bytes, b"a b,c");
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(data_uri_bytes("not a data uri").is_err());
        assert!(data_uri_bytes("data:image/png").is_err());
        assert!(data_uri_bytes("data:,%zz").is_err());
        assert!(data_uri_bytes("data:,%4").is_err());
    }

    #[tokio::test]
    async fn test_unsupported_source_is_recoverable() {
        let err = SourceLoader::new()
            .load("ftp://example.com/a.png")
            .await
            .expect_err("unsupported");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_image_bytes(b"definitely not an image").expect_err("garbage");
        assert!(matches!(err, ExportError::ImageDecode(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_a_load_failure() {
        let err = load_with_timeout(&SlowLoader, "anything", Duration::from_millis(20))
            .await
            .expect_err("timed out");
        assert!(matches!(err, ExportError::ImageTimeout(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_composite_stretches_into_box() {
        let mut page = Pixmap::new(100, 100).expect("pixmap");
        let image = solid(2, 2, tiny_skia::Color::from_rgba8(0, 128, 0, 255));
        let style = ShapeStyle {
            opacity: 1.0,
            fill: None,
            stroke: None,
        };
        composite_image(&mut page, &image, &Transform::new(20.0, 20.0, 60.0, 40.0), &style);

        let inside = page.pixel(50, 40).expect("pixel");
        assert_eq!(inside.alpha(), 255);
        assert!((127..=129).contains(&inside.green()));
        assert_eq!(page.pixel(10, 10).expect("pixel").alpha(), 0);
        assert_eq!(page.pixel(50, 70).expect("pixel").alpha(), 0);
    }

    #[test]
    fn test_composite_applies_opacity_and_border() {
        let mut page = Pixmap::new(100, 100).expect("pixmap");
        let image = solid(4, 4, tiny_skia::Color::WHITE);
        let style = ShapeStyle {
            opacity: 0.5,
            fill: Some(Rgba::opaque(255, 0, 0)),
            stroke: Some((Rgba::opaque(0, 0, 0), 4.0)),
        };
        composite_image(&mut page, &image, &Transform::new(10.0, 10.0, 80.0, 80.0), &style);

        let center = page.pixel(50, 50).expect("pixel").demultiply();
        assert!((126..=129).contains(&center.alpha()));
        assert_eq!(center.red(), 255, "fill color is not used for images");
        assert_eq!(center.green(), 255);

        let edge = page.pixel(10, 50).expect("pixel").demultiply();
        assert!(edge.red() < 128, "border drawn over the image edge");
    }

    #[test]
    fn test_composite_skips_zero_opacity() {
        let mut page = Pixmap::new(10, 10).expect("pixmap");
        let image = solid(1, 1, tiny_skia::Color::BLACK);
        let style = ShapeStyle {
            opacity: 0.0,
            fill: None,
            stroke: Some((Rgba::opaque(0, 0, 0), 2.0)),
        };
        composite_image(&mut page, &image, &Transform::new(0.0, 0.0, 10.0, 10.0), &style);
        assert!(page.pixels().iter().all(|p| p.alpha() == 0));
    }
}
