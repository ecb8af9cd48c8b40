//! badger-api library - research compendium badge service
//!
//! Resolves a DOI, compendium id or posted metadata document through the
//! upstream research-infrastructure APIs and answers with a badge: a redirect
//! to an external badge renderer, or a resized local image for the extended
//! variant.

use axum::Router;
use badger_common::TomlConfig;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod badges;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod services;

use badges::licence::LicenceLists;
use badges::BadgeDeps;
use render::BadgeRenderer;
use services::Upstream;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TomlConfig>,
    pub deps: BadgeDeps,
    pub startup_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build upstream clients and the badge renderer from the configuration
    pub fn from_config(config: TomlConfig) -> Result<Self, reqwest::Error> {
        let deps = BadgeDeps {
            upstream: Upstream::from_config(&config)?,
            renderer: BadgeRenderer::from_config(&config.badge),
            licences: Arc::new(LicenceLists::from_config(&config.licence)),
        };

        Ok(Self {
            config: Arc::new(config),
            deps,
            startup_time: Instant::now(),
            started_at: Utc::now(),
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let badges = Router::new()
        .route(
            "/api/1.0/badge/:kind/:id",
            get(api::badge_by_reference).post(api::badge_from_document),
        )
        .route(
            "/api/1.0/badge/:kind/:id/:extended",
            get(api::extended_badge_by_reference).post(api::extended_badge_from_document),
        );

    Router::new()
        .merge(badges)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
