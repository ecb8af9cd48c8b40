//! Render dispatch targets and badge URL construction
//!
//! Compact badges are redirects to an external renderer (shields.io by
//! default). Extended badges are local SVG assets, resized by [`scaling`].

pub mod map;
pub mod scaling;

use badger_common::config::BadgeConfig;
use std::path::PathBuf;

use crate::badges::spatial::BoundingBox;
use crate::pipeline::RenderOptions;

/// What the final pipeline step decided to send
#[derive(Debug, Clone, PartialEq)]
pub enum RenderTarget {
    /// 302 to an external badge image
    Redirect(String),
    /// Local image, resized before sending
    Image(ImageRequest),
}

/// Local image plus resize options
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub source: ImageSource,
    pub options: RenderOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// SVG file served as is
    File(PathBuf),
    /// Map template with the bounding box drawn in
    Map { template: PathBuf, bbox: BoundingBox },
}

/// Encode one free-text badge URL segment
///
/// The renderer uses `-` as its field separator, so hyphens in free text
/// become spaces before percent-encoding.
pub fn encode_segment(text: &str) -> String {
    urlencoding::encode(&text.replace('-', " ")).into_owned()
}

/// Builds compact badge URLs and locates the local badge assets
#[derive(Debug, Clone)]
pub struct BadgeRenderer {
    base_url: String,
    options: String,
    assets_dir: PathBuf,
}

impl BadgeRenderer {
    pub fn new(
        base_url: impl Into<String>,
        options: impl Into<String>,
        assets_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            options: options.into(),
            assets_dir: assets_dir.into(),
        }
    }

    /// Assets default to the ones shipped in this crate
    pub fn from_config(config: &BadgeConfig) -> Self {
        let assets_dir = config
            .assets_dir
            .clone()
            .unwrap_or_else(default_assets_dir);
        Self::new(&config.base_url, &config.options, assets_dir)
    }

    /// `{base}{label}-{message}-{color}.svg{options}`
    pub fn badge_url(&self, label: &str, message: &str, color: &str) -> String {
        format!(
            "{}{}-{}-{}.svg{}",
            self.base_url,
            encode_segment(label),
            encode_segment(message),
            color,
            self.options
        )
    }

    pub fn redirect(&self, label: &str, message: &str, color: &str) -> RenderTarget {
        RenderTarget::Redirect(self.badge_url(label, message, color))
    }

    pub fn asset(&self, file_name: &str) -> PathBuf {
        self.assets_dir.join(file_name)
    }

    /// Local asset as an extended badge
    pub fn image(&self, file_name: &str, options: RenderOptions) -> RenderTarget {
        RenderTarget::Image(ImageRequest {
            source: ImageSource::File(self.asset(file_name)),
            options,
        })
    }
}

pub fn default_assets_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join("badges")
}
