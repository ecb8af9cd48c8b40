//! Badge families
//!
//! Each family wires its own steps into a [`Pipeline`] and supplies the
//! render dispatch for its status values:
//! - `executable`: o2r job status of a compendium
//! - `spatial`: place name (compact) or map (extended) of the compendium's bounding box
//! - `peerreview`: DOAJ editorial review process of the article's journal
//! - `licence`: openness of the compendium's code, data and text licences

pub mod common;
pub mod executable;
pub mod legacy_ids;
pub mod licence;
pub mod peer_review;
pub mod spatial;

use badger_common::TomlConfig;
use serde_json::Value;
use std::sync::Arc;

use crate::pipeline::{Mode, Pipeline, RenderOptions};
use crate::render::{BadgeRenderer, RenderTarget};
use crate::services::Upstream;
use licence::LicenceLists;

/// Badge type from the `:type` route segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeKind {
    Executable,
    Spatial,
    PeerReview,
    Licence,
}

impl BadgeKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "executable" => Some(BadgeKind::Executable),
            "spatial" | "location" => Some(BadgeKind::Spatial),
            "peerreview" => Some(BadgeKind::PeerReview),
            "licence" | "license" => Some(BadgeKind::Licence),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeKind::Executable => "executable",
            BadgeKind::Spatial => "spatial",
            BadgeKind::PeerReview => "peerreview",
            BadgeKind::Licence => "licence",
        }
    }

    /// Left-hand text of the compact badge
    pub fn label(&self) -> &'static str {
        match self {
            BadgeKind::Executable => "executable",
            BadgeKind::Spatial => "location",
            BadgeKind::PeerReview => "peer review",
            BadgeKind::Licence => "licence",
        }
    }

    fn default_service(&self) -> &'static str {
        match self {
            BadgeKind::Executable | BadgeKind::Licence => "o2r",
            BadgeKind::Spatial => "geonames",
            BadgeKind::PeerReview => "doaj",
        }
    }

    fn default_na_big(&self) -> &'static str {
        match self {
            BadgeKind::Executable => "executable_noInfo.svg",
            BadgeKind::Spatial => "location_noInfo.svg",
            BadgeKind::PeerReview => "peerreview_noInfo.svg",
            BadgeKind::Licence => "licence_noInfo.svg",
        }
    }
}

/// Family settings with defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilySettings {
    pub services: Vec<String>,
    /// URL of the compact "not available" badge
    pub na_small: String,
    /// Asset file name of the extended "not available" badge
    pub na_big: String,
}

impl FamilySettings {
    pub fn resolve(kind: BadgeKind, config: &TomlConfig, renderer: &BadgeRenderer) -> Self {
        let family = match kind {
            BadgeKind::Executable => &config.executable,
            BadgeKind::Spatial => &config.spatial,
            BadgeKind::PeerReview => &config.peerreview,
            BadgeKind::Licence => &config.licence.family,
        };

        Self {
            services: family
                .services
                .clone()
                .unwrap_or_else(|| vec![kind.default_service().to_string()]),
            na_small: family
                .badge_na_small
                .clone()
                .unwrap_or_else(|| renderer.badge_url(kind.label(), "n/a", "9f9f9f")),
            na_big: family
                .badge_na_big
                .clone()
                .unwrap_or_else(|| kind.default_na_big().to_string()),
        }
    }

    /// A family without any backing service cannot produce badges
    pub fn has_supported_service(&self) -> bool {
        !self.services.is_empty()
    }

    pub fn primary_service(&self) -> Option<&str> {
        self.services.first().map(String::as_str)
    }

    /// "Not available" badge for the given mode
    pub fn not_available(
        &self,
        mode: Mode,
        renderer: &BadgeRenderer,
        options: RenderOptions,
    ) -> RenderTarget {
        match mode {
            Mode::Full => renderer.image(&self.na_big, options),
            _ => RenderTarget::Redirect(self.na_small.clone()),
        }
    }
}

/// How the request supplies its data
#[derive(Debug, Clone, PartialEq)]
pub enum BadgeInput {
    /// DOI or compendium id from the route
    Reference(String),
    /// Metadata document posted by the client
    Document(Value),
}

/// Everything the family steps need, cloned into the step closures
#[derive(Debug, Clone)]
pub struct BadgeDeps {
    pub upstream: Upstream,
    pub renderer: BadgeRenderer,
    pub licences: Arc<LicenceLists>,
}

/// Assemble the pipeline for one request
pub fn build_pipeline(
    kind: BadgeKind,
    mode: Mode,
    input: &BadgeInput,
    deps: &BadgeDeps,
) -> Pipeline {
    let by_reference = matches!(input, BadgeInput::Reference(_));
    match kind {
        BadgeKind::Executable => executable::pipeline(by_reference, deps),
        BadgeKind::Spatial => spatial::pipeline(mode, by_reference, deps),
        BadgeKind::PeerReview => peer_review::pipeline(by_reference, deps),
        BadgeKind::Licence => licence::pipeline(by_reference, deps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> BadgeRenderer {
        BadgeRenderer::new("https://img.shields.io/badge/", "", "/srv/badges")
    }

    #[test]
    fn test_parse_kind_with_aliases() {
        assert_eq!(BadgeKind::parse("executable"), Some(BadgeKind::Executable));
        assert_eq!(BadgeKind::parse("location"), Some(BadgeKind::Spatial));
        assert_eq!(BadgeKind::parse("spatial"), Some(BadgeKind::Spatial));
        assert_eq!(BadgeKind::parse("license"), Some(BadgeKind::Licence));
        assert_eq!(BadgeKind::parse("peerreview"), Some(BadgeKind::PeerReview));
        assert_eq!(BadgeKind::parse("releasetime"), None);
    }

    #[test]
    fn test_family_defaults() {
        let settings =
            FamilySettings::resolve(BadgeKind::Executable, &TomlConfig::default(), &renderer());
        assert_eq!(settings.services, vec!["o2r".to_string()]);
        assert_eq!(
            settings.na_small,
            "https://img.shields.io/badge/executable-n%2Fa-9f9f9f.svg"
        );
        assert_eq!(settings.na_big, "executable_noInfo.svg");
    }

    #[test]
    fn test_empty_services_disable_family() {
        let mut config = TomlConfig::default();
        config.peerreview.services = Some(vec![]);
        let settings = FamilySettings::resolve(BadgeKind::PeerReview, &config, &renderer());
        assert!(!settings.has_supported_service());
        assert_eq!(settings.primary_service(), None);
    }

    #[test]
    fn test_not_available_per_mode() {
        let settings =
            FamilySettings::resolve(BadgeKind::Spatial, &TomlConfig::default(), &renderer());
        let options = RenderOptions::default();

        assert_eq!(
            settings.not_available(Mode::Compact, &renderer(), options),
            RenderTarget::Redirect(
                "https://img.shields.io/badge/location-n%2Fa-9f9f9f.svg".to_string()
            )
        );
        assert_eq!(
            settings.not_available(Mode::Full, &renderer(), options),
            renderer().image("location_noInfo.svg", options)
        );
    }
}
