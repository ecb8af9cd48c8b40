//! Image resize-and-send
//!
//! SVG output rewrites the root element's `width`/`height` to the requested
//! width, keeping the aspect ratio. PNG output rasterises the SVG with resvg.

use once_cell::sync::Lazy;
use regex::Regex;
use resvg::{tiny_skia, usvg};
use std::sync::Arc;
use thiserror::Error;

use super::map::fill_map_template;
use super::{ImageRequest, ImageSource};
use crate::pipeline::ImageFormat;

static ROOT_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<svg\b[^>]*>").unwrap());
static SIZE_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s(width|height)\s*=\s*"([^"]*)""#).unwrap());
static VIEW_BOX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\sviewBox\s*=\s*"([^"]*)""#).unwrap());

/// System fonts, scanned once and shared by every PNG render
static FONTS: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut fonts = usvg::fontdb::Database::new();
    fonts.load_system_fonts();
    Arc::new(fonts)
});

/// Upper bound for `?width=`, keeps PNG rasterisation bounded
pub const MAX_WIDTH: u32 = 4096;

#[derive(Debug, Error)]
pub enum ScaleError {
    #[error("Read {0} failed: {1}")]
    Read(String, std::io::Error),

    #[error("Invalid SVG: {0}")]
    InvalidSvg(String),

    #[error("Render failed: {0}")]
    Render(String),
}

/// Encoded image ready to send
#[derive(Debug, Clone)]
pub struct ScaledImage {
    pub format: ImageFormat,
    pub body: Vec<u8>,
}

impl ScaledImage {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Load, resize and encode an extended badge
pub async fn render_image(request: &ImageRequest) -> Result<ScaledImage, ScaleError> {
    let svg = load_source(&request.source).await?;
    let width = request.options.width.map(|w| w.clamp(1, MAX_WIDTH));

    match request.options.format {
        ImageFormat::Svg => {
            let svg = match width {
                Some(width) => resize_svg(&svg, width)?,
                None => svg,
            };
            Ok(ScaledImage {
                format: ImageFormat::Svg,
                body: svg.into_bytes(),
            })
        }
        ImageFormat::Png => {
            let body = tokio::task::spawn_blocking(move || rasterize(&svg, width))
                .await
                .map_err(|e| ScaleError::Render(e.to_string()))??;
            Ok(ScaledImage {
                format: ImageFormat::Png,
                body,
            })
        }
    }
}

async fn load_source(source: &ImageSource) -> Result<String, ScaleError> {
    match source {
        ImageSource::File(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ScaleError::Read(path.display().to_string(), e)),
        ImageSource::Map { template, bbox } => {
            let template_svg = tokio::fs::read_to_string(template)
                .await
                .map_err(|e| ScaleError::Read(template.display().to_string(), e))?;
            Ok(fill_map_template(&template_svg, bbox))
        }
    }
}

/// Intrinsic size from `width`/`height`, falling back to the viewBox
fn intrinsic_size(tag: &str) -> Option<(f64, f64)> {
    let mut width = None;
    let mut height = None;
    for caps in SIZE_ATTR.captures_iter(tag) {
        let value = parse_length(&caps[2]);
        match &caps[1] {
            "width" => width = value,
            _ => height = value,
        }
    }
    if let (Some(w), Some(h)) = (width, height) {
        return Some((w, h));
    }

    let view_box = VIEW_BOX.captures(tag)?;
    let parts: Vec<f64> = view_box[1]
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .filter_map(|p| p.parse().ok())
        .collect();
    match parts.as_slice() {
        [_, _, w, h] => Some((*w, *h)),
        _ => None,
    }
}

/// Numeric part of an SVG length; percentages have no intrinsic size
fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.ends_with('%') {
        return None;
    }
    value
        .trim_end_matches("px")
        .parse::<f64>()
        .ok()
        .filter(|v| *v > 0.0)
}

fn format_length(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Set the root element's size to `width`, keeping the aspect ratio
pub fn resize_svg(svg: &str, width: u32) -> Result<String, ScaleError> {
    let root = ROOT_TAG
        .find(svg)
        .ok_or_else(|| ScaleError::InvalidSvg("no <svg> element".to_string()))?;
    let tag = root.as_str();

    let (intrinsic_w, intrinsic_h) = intrinsic_size(tag)
        .ok_or_else(|| ScaleError::InvalidSvg("no intrinsic size".to_string()))?;
    let height = f64::from(width) * intrinsic_h / intrinsic_w;

    let mut attributes = format!(
        " width=\"{}\" height=\"{}\"",
        width,
        format_length(height)
    );
    if !VIEW_BOX.is_match(tag) {
        attributes.push_str(&format!(
            " viewBox=\"0 0 {} {}\"",
            format_length(intrinsic_w),
            format_length(intrinsic_h)
        ));
    }

    let stripped = SIZE_ATTR.replace_all(tag, "");
    let new_tag = format!("<svg{}{}", attributes, &stripped["<svg".len()..]);

    let mut out = String::with_capacity(svg.len() + attributes.len());
    out.push_str(&svg[..root.start()]);
    out.push_str(&new_tag);
    out.push_str(&svg[root.end()..]);
    Ok(out)
}

fn rasterize(svg: &str, width: Option<u32>) -> Result<Vec<u8>, ScaleError> {
    let options = usvg::Options {
        fontdb: Arc::clone(&FONTS),
        ..usvg::Options::default()
    };

    let tree =
        usvg::Tree::from_str(svg, &options).map_err(|e| ScaleError::InvalidSvg(e.to_string()))?;
    let size = tree.size();

    let target_width = width.unwrap_or_else(|| size.width().ceil() as u32).max(1);
    let scale = target_width as f32 / size.width();
    let target_height = ((size.height() * scale).ceil() as u32).max(1);

    let mut pixmap = tiny_skia::Pixmap::new(target_width, target_height)
        .ok_or_else(|| ScaleError::Render("could not allocate pixmap".to_string()))?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    pixmap
        .encode_png()
        .map_err(|e| ScaleError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RenderOptions;
    use crate::render::default_assets_dir;

    #[test]
    fn test_resize_keeps_aspect_ratio() {
        let svg = r#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" width="120" height="20"><rect stroke-width="2"/></svg>"#;
        let resized = resize_svg(svg, 240).unwrap();

        assert!(resized.starts_with(r#"<?xml version="1.0"?><svg width="240" height="40" viewBox="0 0 120 20" xmlns="#));
        // Child attributes are left alone
        assert!(resized.contains(r#"<rect stroke-width="2"/>"#));
    }

    #[test]
    fn test_resize_uses_view_box_when_size_missing() {
        let svg = r#"<svg viewBox="0 0 300 100"><g/></svg>"#;
        let resized = resize_svg(svg, 150).unwrap();
        assert_eq!(resized, r#"<svg width="150" height="50" viewBox="0 0 300 100"><g/></svg>"#);
    }

    #[test]
    fn test_resize_fractional_height() {
        let svg = r#"<svg width="3px" height="1px"></svg>"#;
        let resized = resize_svg(svg, 100).unwrap();
        assert!(resized.contains(r#"height="33.33""#));
    }

    #[test]
    fn test_resize_rejects_non_svg() {
        assert!(matches!(
            resize_svg("<html></html>", 100),
            Err(ScaleError::InvalidSvg(_))
        ));
        assert!(matches!(
            resize_svg(r#"<svg width="100%"></svg>"#, 100),
            Err(ScaleError::InvalidSvg(_))
        ));
    }

    #[tokio::test]
    async fn test_render_missing_file_is_read_error() {
        let request = ImageRequest {
            source: ImageSource::File(default_assets_dir().join("missing.svg")),
            options: RenderOptions::default(),
        };
        assert!(matches!(render_image(&request).await, Err(ScaleError::Read(..))));
    }

    #[tokio::test]
    async fn test_render_png_has_png_signature() {
        let request = ImageRequest {
            source: ImageSource::File(default_assets_dir().join("executable_success.svg")),
            options: RenderOptions {
                width: Some(100),
                format: ImageFormat::Png,
            },
        };
        let image = render_image(&request).await.unwrap();
        assert_eq!(image.content_type(), "image/png");
        assert_eq!(&image.body[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_rasterize_shares_font_database() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"><text x="2" y="15">ok</text></svg>"#;
        let first = rasterize(svg, Some(80)).unwrap();
        let second = rasterize(svg, Some(80)).unwrap();

        assert_eq!(first, second);
        assert_eq!(&first[..8], b"\x89PNG\r\n\x1a\n");
    }
}
