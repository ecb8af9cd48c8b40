//! Test helpers: a fake upstream server standing in for o2r, DOAJ and GeoNames

#![allow(dead_code)]

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Path, Query};
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get as route_get;
use axum::{Json, Router};
use badger_api::{build_router, AppState};
use badger_common::TomlConfig;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Compendium with spatial and licence metadata, served as `yxsYu`
pub fn compendium_document() -> Value {
    json!({
        "id": "yxsYu",
        "metadata": {
            "o2r": {
                "title": "Environmental economics compendium",
                "spatial": {
                    "union": {
                        "geojson": {
                            "type": "Feature",
                            "bbox": ["7.0", "51.0", "8.0", "52.0"]
                        }
                    }
                },
                "license": {
                    "code": "Apache-2.0",
                    "data": "ODbL-1.0",
                    "text": "CC-BY-4.0"
                }
            }
        }
    })
}

/// Compendium document whose bounding box lies in the Atlantic
pub fn ocean_compendium_document() -> Value {
    json!({
        "metadata": {
            "o2r": {
                "spatial": {
                    "union": { "geojson": { "bbox": [-40.0, -10.0, -30.0, -5.0] } }
                }
            }
        }
    })
}

async fn jobs(Query(params): Query<HashMap<String, String>>) -> Response<Body> {
    match params.get("compendium_id").map(String::as_str) {
        Some("yxsYu") => Json(json!({ "results": ["job-success", "job-old"] })).into_response(),
        Some("HcEeP") => Json(json!({ "results": ["job-running"] })).into_response(),
        Some("vAsoV") => Json(json!({ "results": ["job-queued"] })).into_response(),
        Some("broken") => StatusCode::BAD_GATEWAY.into_response(),
        _ => Json(json!({ "error": "no jobs found for compendium" })).into_response(),
    }
}

async fn job(Path(id): Path<String>) -> Response<Body> {
    let status = match id.as_str() {
        "job-success" => "success",
        "job-running" => "running",
        "job-queued" => "queued",
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    Json(json!({ "id": id, "status": status })).into_response()
}

async fn compendium(Path(id): Path<String>) -> Response<Body> {
    match id.as_str() {
        "yxsYu" => Json(compendium_document()).into_response(),
        "Xa9Ir" => Json(json!({ "id": "Xa9Ir", "metadata": { "o2r": {} } })).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "no compendium" }))).into_response(),
    }
}

async fn doaj_articles(Path(query): Path<String>) -> Response<Body> {
    match query.as_str() {
        "doi:10.3389/fpsyg.2013.00479" => Json(json!({
            "total": 1,
            "results": [{ "bibjson": { "journal": { "issns": ["1664-1078"] } } }]
        }))
        .into_response(),
        "doi:10.1000/down" => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        _ => Json(json!({ "total": 0, "results": [] })).into_response(),
    }
}

async fn doaj_journals(Path(query): Path<String>) -> Response<Body> {
    match query.as_str() {
        "issn:1664-1078" => Json(json!({
            "results": [{
                "bibjson": { "editorial_review": { "process": "Double blind peer review" } }
            }]
        }))
        .into_response(),
        _ => Json(json!({ "results": [] })).into_response(),
    }
}

async fn country_subdivision(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let lat: f64 = params
        .get("lat")
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();

    if lat > 0.0 {
        Json(json!({
            "countryCode": "DE",
            "countryName": "Germany",
            "adminName1": "Nordrhein-Westfalen",
            "distance": 0
        }))
    } else {
        Json(json!({
            "status": { "message": "we are afraid we could not find a country subdivision", "value": 15 }
        }))
    }
}

async fn ocean() -> Json<Value> {
    Json(json!({ "ocean": { "distance": "0", "name": "North Atlantic Ocean" } }))
}

/// Start the fake upstream on an ephemeral port and return its base URL
pub async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/api/v1/job", route_get(jobs))
        .route("/api/v1/job/:id", route_get(job))
        .route("/api/v1/compendium/:id", route_get(compendium))
        .route("/doaj/articles/:query", route_get(doaj_articles))
        .route("/doaj/journals/:query", route_get(doaj_journals))
        .route("/geonames/countrySubdivisionJSON", route_get(country_subdivision))
        .route("/geonames/oceanJSON", route_get(ocean));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Base URL of a port nothing listens on
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Configuration pointing every upstream at `base`
pub fn test_config(base: &str) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.ext.o2r = base.to_string();
    config.ext.doaj_articles = format!("{}/doaj/articles/", base);
    config.ext.doaj_journals = format!("{}/doaj/journals/", base);
    config.ext.geonames = format!("{}/geonames/countrySubdivisionJSON", base);
    config.ext.geonames_ocean = format!("{}/geonames/oceanJSON", base);
    config
}

pub fn test_app(config: TomlConfig) -> Router {
    build_router(AppState::from_config(config).unwrap())
}

/// App backed by a fresh fake upstream
pub async fn app_with_upstream() -> Router {
    let base = spawn_upstream().await;
    test_app(test_config(&base))
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: &Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get("location")
        .expect("response should carry a Location header")
        .to_str()
        .unwrap()
}

pub fn content_type(response: &Response<Body>) -> &str {
    response
        .headers()
        .get("content-type")
        .expect("response should carry a Content-Type header")
        .to_str()
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
