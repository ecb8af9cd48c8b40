//! Per-request pipeline context

use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::Halt;
use crate::badges::BadgeKind;

/// Rendering mode, decided once from the `extended` route parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Parameter absent: redirect to the external badge renderer
    Compact,
    /// Parameter is `extended`: serve a local, resized image
    Full,
    /// Any other value; always answered with 404 "not allowed"
    Invalid,
}

impl Mode {
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            None => Mode::Compact,
            Some("extended") => Mode::Full,
            Some(_) => Mode::Invalid,
        }
    }

    pub fn is_extended(&self) -> bool {
        matches!(self, Mode::Full)
    }
}

/// Image format requested with `?format=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Svg,
    Png,
}

impl ImageFormat {
    /// Parse the query value; `None` means the default (svg)
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value.map(|v| v.to_ascii_lowercase()) {
            None => Some(ImageFormat::Svg),
            Some(v) if v == "svg" => Some(ImageFormat::Svg),
            Some(v) if v == "png" => Some(ImageFormat::Png),
            Some(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "image/svg+xml",
            ImageFormat::Png => "image/png",
        }
    }
}

/// Resize options for the large badge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub width: Option<u32>,
    pub format: ImageFormat,
}

/// Values derived by pipeline steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    CompendiumId,
    JobId,
    JobStatus,
    Issn,
    BoundingBox,
    Latitude,
    Longitude,
    GeoName,
    ReviewStatus,
    Licence,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::CompendiumId => "compendiumId",
            Field::JobId => "jobId",
            Field::JobStatus => "jobStatus",
            Field::Issn => "issn",
            Field::BoundingBox => "bbox",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::GeoName => "geoName",
            Field::ReviewStatus => "reviewStatus",
            Field::Licence => "licence",
        }
    }
}

/// Tracking record for one badge request, logged when the request completes
#[derive(Debug, Clone)]
pub struct Tracking {
    pub request_id: Uuid,
    pub badge_type: &'static str,
    pub id: Option<String>,
    pub extended: bool,
    pub size: Option<u32>,
    pub format: ImageFormat,
    pub service: Option<String>,
    pub na: bool,
}

/// Context threaded through one pipeline run
///
/// Owned by a single request. Steps take it by value and return the updated
/// context, so a step never observes a half-written record.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub kind: BadgeKind,
    pub mode: Mode,
    /// Identifier from the route (DOI or compendium id)
    pub identifier: Option<String>,
    /// Metadata document, either posted by the client or fetched upstream
    pub metadata: Option<Value>,
    pub options: RenderOptions,
    pub tracking: Tracking,
    derived: BTreeMap<Field, Value>,
}

impl RequestContext {
    pub fn new(kind: BadgeKind, mode: Mode, options: RenderOptions) -> Self {
        Self {
            kind,
            mode,
            identifier: None,
            metadata: None,
            options,
            tracking: Tracking {
                request_id: Uuid::new_v4(),
                badge_type: kind.as_str(),
                id: None,
                extended: mode.is_extended(),
                size: options.width,
                format: options.format,
                service: None,
                na: false,
            },
            derived: BTreeMap::new(),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        self.tracking.id = Some(identifier.clone());
        self.identifier = Some(identifier);
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.tracking.service = Some(service.into());
        self
    }

    pub fn with_field(mut self, field: Field, value: impl Into<Value>) -> Self {
        self.derived.insert(field, value.into());
        self
    }

    pub fn field(&self, field: Field) -> Option<&Value> {
        self.derived.get(&field)
    }

    pub fn field_str(&self, field: Field) -> Option<&str> {
        self.field(field).and_then(Value::as_str)
    }

    pub fn field_f64(&self, field: Field) -> Option<f64> {
        self.field(field).and_then(Value::as_f64)
    }

    /// A field an earlier step must have written; its absence is a bug in
    /// the pipeline wiring, reported as an internal error
    pub fn require_str(&self, field: Field) -> Result<&str, Halt> {
        self.field_str(field).ok_or_else(|| {
            tracing::error!(
                request_id = %self.tracking.request_id,
                field = field.as_str(),
                "Pipeline step ran without required field"
            );
            Halt::internal()
        })
    }

    pub fn require_f64(&self, field: Field) -> Result<f64, Halt> {
        self.field_f64(field).ok_or_else(|| {
            tracing::error!(
                request_id = %self.tracking.request_id,
                field = field.as_str(),
                "Pipeline step ran without required field"
            );
            Halt::internal()
        })
    }

    pub fn require_identifier(&self) -> Result<&str, Halt> {
        self.identifier
            .as_deref()
            .ok_or_else(|| Halt::unavailable("no identifier provided"))
    }

    pub fn require_metadata(&self) -> Result<&Value, Halt> {
        self.metadata
            .as_ref()
            .ok_or_else(|| Halt::unavailable("no metadata provided"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_param() {
        assert_eq!(Mode::from_param(None), Mode::Compact);
        assert_eq!(Mode::from_param(Some("extended")), Mode::Full);
        assert_eq!(Mode::from_param(Some("Extended")), Mode::Invalid);
        assert_eq!(Mode::from_param(Some("big")), Mode::Invalid);
        assert_eq!(Mode::from_param(Some("")), Mode::Invalid);
    }

    #[test]
    fn test_image_format_parse() {
        assert_eq!(ImageFormat::parse(None), Some(ImageFormat::Svg));
        assert_eq!(ImageFormat::parse(Some("PNG")), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::parse(Some("gif")), None);
    }

    #[test]
    fn test_fields_are_updated_by_value() {
        let ctx = RequestContext::new(BadgeKind::Spatial, Mode::Compact, RenderOptions::default())
            .with_field(Field::Latitude, 51.5)
            .with_field(Field::GeoName, "Germany");

        assert_eq!(ctx.field_f64(Field::Latitude), Some(51.5));
        assert_eq!(ctx.field_str(Field::GeoName), Some("Germany"));
        assert!(ctx.field(Field::Issn).is_none());
        assert_eq!(ctx.require_str(Field::Issn), Err(Halt::internal()));
    }

    #[test]
    fn test_tracking_follows_request() {
        let options = RenderOptions {
            width: Some(120),
            format: ImageFormat::Png,
        };
        let ctx = RequestContext::new(BadgeKind::Executable, Mode::Full, options)
            .with_identifier("yxsYu")
            .with_service("o2r");

        assert_eq!(ctx.tracking.badge_type, "executable");
        assert_eq!(ctx.tracking.id.as_deref(), Some("yxsYu"));
        assert!(ctx.tracking.extended);
        assert_eq!(ctx.tracking.size, Some(120));
        assert_eq!(ctx.tracking.service.as_deref(), Some("o2r"));
        assert!(!ctx.tracking.na);
    }

    #[test]
    fn test_missing_inputs_are_unavailable() {
        let ctx = RequestContext::new(BadgeKind::Licence, Mode::Compact, RenderOptions::default());
        assert!(matches!(ctx.require_identifier(), Err(Halt::Unavailable { .. })));
        assert!(matches!(ctx.require_metadata(), Err(Halt::Unavailable { .. })));
    }
}
