//! Location badge
//!
//! Compact: bounding box → center point → GeoNames place name.
//! Extended: the bounding box drawn onto a world map.

use axum::http::StatusCode;
use serde_json::{json, Value};

use super::common::{fetch_compendium, translate_identifier};
use super::BadgeDeps;
use crate::pipeline::{Field, Halt, Mode, Pipeline, RequestContext, Stage, StepResult};
use crate::render::{BadgeRenderer, ImageRequest, ImageSource, RenderTarget};
use crate::services::{GeoNamesClient, GeoNamesError};

/// Location of the bounding box in a compendium document
const BBOX_POINTER: &str = "/metadata/o2r/spatial/union/geojson/bbox";

const MAP_TEMPLATE: &str = "location_map.svg";

/// GeoJSON bounding box `[min_lon, min_lat, max_lon, max_lat]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Accepts numbers or numeric strings; anything else is rejected
    pub fn from_values(values: &[Value]) -> Option<Self> {
        let coords: Vec<f64> = values.iter().map(coordinate).collect::<Option<_>>()?;
        match coords[..] {
            [min_lon, min_lat, max_lon, max_lat] => Some(Self {
                min_lon,
                min_lat,
                max_lon,
                max_lat,
            }),
            _ => None,
        }
    }

    /// `(latitude, longitude)` of the box center
    pub fn center(&self) -> (f64, f64) {
        (
            self.min_lat + (self.max_lat - self.min_lat) / 2.0,
            self.min_lon + (self.max_lon - self.min_lon) / 2.0,
        )
    }

    fn to_value(self) -> Value {
        json!([self.min_lon, self.min_lat, self.max_lon, self.max_lat])
    }
}

fn coordinate(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Center of a raw bbox array as `(latitude, longitude)`
pub fn calculate_center(bbox: &[Value]) -> Option<(f64, f64)> {
    BoundingBox::from_values(bbox).map(|b| b.center())
}

pub fn pipeline(mode: Mode, by_reference: bool, deps: &BadgeDeps) -> Pipeline {
    let mut pipeline = Pipeline::new("spatial");

    if by_reference {
        let o2r = deps.upstream.o2r.clone();
        pipeline = pipeline
            .step(Stage::Resolving, "translate_identifier", translate_identifier)
            .step(Stage::Resolving, "fetch_compendium", move |ctx| {
                fetch_compendium(o2r.clone(), ctx)
            });
    }

    pipeline = pipeline.step(Stage::Enriching, "read_bbox", read_bbox);

    // The map only needs the box itself
    if !mode.is_extended() {
        let geonames = deps.upstream.geonames.clone();
        pipeline = pipeline
            .step(Stage::Enriching, "compute_center", compute_center)
            .step(Stage::Classifying, "reverse_geocode", move |ctx| {
                reverse_geocode(geonames.clone(), ctx)
            });
    }

    let renderer = deps.renderer.clone();
    pipeline.render(move |ctx| render(&renderer, ctx))
}

async fn read_bbox(ctx: RequestContext) -> StepResult {
    let raw = ctx
        .require_metadata()?
        .pointer(BBOX_POINTER)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            Halt::unavailable("o2r compendium does not contain spatial information (bbox)")
        })?;

    let bbox = BoundingBox::from_values(raw)
        .ok_or_else(|| Halt::unavailable("invalid bounding box"))?;

    Ok(ctx.with_field(Field::BoundingBox, bbox.to_value()))
}

fn bbox_field(ctx: &RequestContext) -> Result<BoundingBox, Halt> {
    ctx.field(Field::BoundingBox)
        .and_then(Value::as_array)
        .and_then(|values| BoundingBox::from_values(values))
        .ok_or_else(Halt::internal)
}

async fn compute_center(ctx: RequestContext) -> StepResult {
    let (lat, lon) = bbox_field(&ctx)?.center();
    Ok(ctx
        .with_field(Field::Latitude, lat)
        .with_field(Field::Longitude, lon))
}

async fn reverse_geocode(geonames: GeoNamesClient, ctx: RequestContext) -> StepResult {
    let lat = ctx.require_f64(Field::Latitude)?;
    let lon = ctx.require_f64(Field::Longitude)?;

    let subdivision = geonames
        .country_subdivision(lat, lon)
        .await
        .map_err(|e| geonames_halt(e, "could not get geoname"))?;

    // Points at sea have no country; GeoNames answers with a status member
    let geo_name = if subdivision.get("status").is_some() {
        let ocean = geonames
            .ocean(lat, lon)
            .await
            .map_err(|e| geonames_halt(e, "could not get geoname ocean"))?;
        ocean_name(&ocean).ok_or_else(|| Halt::unavailable("no ocean name found"))?
    } else {
        place_name(&subdivision).ok_or_else(|| Halt::unavailable("no geoname found"))?
    };

    tracing::debug!(lat = lat, lon = lon, geo_name = %geo_name, "Resolved place name");
    Ok(ctx.with_field(Field::GeoName, geo_name))
}

fn geonames_halt(error: GeoNamesError, status_reason: &str) -> Halt {
    tracing::debug!(error = %error, "GeoNames lookup failed");

    match error {
        GeoNamesError::NetworkError(_) => Halt::failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Could not access geonames.org",
        ),
        GeoNamesError::Status(_) => Halt::unavailable(status_reason),
        GeoNamesError::ParseError(_) => Halt::unavailable("error parsing geonames response"),
    }
}

/// `adminName1, countryName`, or just the country when there is no subdivision
pub fn place_name(subdivision: &Value) -> Option<String> {
    let country = non_empty(subdivision.get("countryName"))?;
    match non_empty(subdivision.get("adminName1")) {
        Some(admin) => Some(format!("{}, {}", admin, country)),
        None => Some(country.to_string()),
    }
}

pub fn ocean_name(ocean: &Value) -> Option<String> {
    non_empty(ocean.pointer("/ocean/name")).map(str::to_string)
}

fn non_empty(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn render(renderer: &BadgeRenderer, ctx: &RequestContext) -> Result<RenderTarget, Halt> {
    match ctx.mode {
        Mode::Full => Ok(RenderTarget::Image(ImageRequest {
            source: ImageSource::Map {
                template: renderer.asset(MAP_TEMPLATE),
                bbox: bbox_field(ctx)?,
            },
            options: ctx.options,
        })),
        _ => {
            let geo_name = ctx.require_str(Field::GeoName)?;
            Ok(renderer.redirect("location", geo_name, "blue"))
        }
    }
}
