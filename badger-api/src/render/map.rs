//! Location map for the extended spatial badge
//!
//! The template is an equirectangular world frame (viewBox `-180 -90 360
//! 180`, y grows southwards). Placeholders are replaced with the bounding
//! box rectangle and its center point.

use crate::badges::spatial::BoundingBox;

/// Smallest drawn extent in degrees, so point-like boxes stay visible
const MIN_EXTENT: f64 = 1.0;

pub fn fill_map_template(template: &str, bbox: &BoundingBox) -> String {
    let (center_lat, center_lon) = bbox.center();
    let width = (bbox.max_lon - bbox.min_lon).abs().max(MIN_EXTENT);
    let height = (bbox.max_lat - bbox.min_lat).abs().max(MIN_EXTENT);
    let x = center_lon - width / 2.0;
    let y = -center_lat - height / 2.0;

    template
        .replace("{{x}}", &coordinate(x))
        .replace("{{y}}", &coordinate(y))
        .replace("{{width}}", &coordinate(width))
        .replace("{{height}}", &coordinate(height))
        .replace("{{cx}}", &coordinate(center_lon))
        .replace("{{cy}}", &coordinate(-center_lat))
}

fn coordinate(value: f64) -> String {
    let text = format!("{:.4}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
