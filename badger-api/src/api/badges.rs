//! Badge endpoints
//!
//! GET  /api/1.0/badge/:kind/:id[/:extended]      badge by DOI or compendium id
//! POST /api/1.0/badge/:kind/:source[/:extended]  badge from a posted metadata document

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::badges::{build_pipeline, BadgeInput, BadgeKind, FamilySettings};
use crate::error::{ApiError, ApiResult};
use crate::pipeline::{ImageFormat, Mode, Outcome, RenderOptions, RequestContext, Tracking};
use crate::render::scaling::render_image;
use crate::render::RenderTarget;
use crate::AppState;

/// Metadata dialects accepted in POST bodies
const SUPPORTED_SOURCES: &[&str] = &["o2r"];

/// Query parameters for extended badges
#[derive(Debug, Default, Deserialize)]
pub struct BadgeQuery {
    pub width: Option<String>,
    pub format: Option<String>,
}

impl BadgeQuery {
    fn render_options(&self) -> ApiResult<RenderOptions> {
        let width = match self.width.as_deref() {
            None => None,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(w) if w > 0 => Some(w),
                _ => {
                    return Err(ApiError::BadRequest(format!("invalid width: {}", raw)));
                }
            },
        };

        let format = ImageFormat::parse(self.format.as_deref()).ok_or_else(|| {
            ApiError::BadRequest(format!(
                "unsupported format: {}",
                self.format.as_deref().unwrap_or_default()
            ))
        })?;

        Ok(RenderOptions { width, format })
    }
}

/// GET /api/1.0/badge/:kind/:id
pub async fn badge_by_reference(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<BadgeQuery>,
) -> ApiResult<Response> {
    let request = BadgeRequest::accept(&state, &kind, None, &query)?;
    request.serve(&state, BadgeInput::Reference(id)).await
}

/// GET /api/1.0/badge/:kind/:id/:extended
pub async fn extended_badge_by_reference(
    State(state): State<AppState>,
    Path((kind, id, extended)): Path<(String, String, String)>,
    Query(query): Query<BadgeQuery>,
) -> ApiResult<Response> {
    let request = BadgeRequest::accept(&state, &kind, Some(&extended), &query)?;
    request.serve(&state, BadgeInput::Reference(id)).await
}

/// POST /api/1.0/badge/:kind/:source
pub async fn badge_from_document(
    State(state): State<AppState>,
    Path((kind, source)): Path<(String, String)>,
    Query(query): Query<BadgeQuery>,
    body: Bytes,
) -> ApiResult<Response> {
    let request = BadgeRequest::accept(&state, &kind, None, &query)?;
    let document = parse_document(&source, &body)?;
    request.serve(&state, BadgeInput::Document(document)).await
}

/// POST /api/1.0/badge/:kind/:source/:extended
pub async fn extended_badge_from_document(
    State(state): State<AppState>,
    Path((kind, source, extended)): Path<(String, String, String)>,
    Query(query): Query<BadgeQuery>,
    body: Bytes,
) -> ApiResult<Response> {
    let request = BadgeRequest::accept(&state, &kind, Some(&extended), &query)?;
    let document = parse_document(&source, &body)?;
    request.serve(&state, BadgeInput::Document(document)).await
}

fn parse_document(source: &str, body: &[u8]) -> ApiResult<Value> {
    if !SUPPORTED_SOURCES.contains(&source) {
        return Err(ApiError::NotFound("metadata source not supported".to_string()));
    }

    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid metadata document: {}", e)))
}

/// A request that passed the boundary checks
///
/// Type, mode and service availability are checked here, before any
/// upstream call is made.
struct BadgeRequest {
    kind: BadgeKind,
    mode: Mode,
    options: RenderOptions,
    settings: FamilySettings,
}

impl BadgeRequest {
    fn accept(
        state: &AppState,
        kind: &str,
        extended: Option<&str>,
        query: &BadgeQuery,
    ) -> ApiResult<Self> {
        let kind = BadgeKind::parse(kind)
            .ok_or_else(|| ApiError::NotFound("badge type not supported".to_string()))?;

        let mode = Mode::from_param(extended);
        if mode == Mode::Invalid {
            debug!(badge_type = kind.as_str(), extended = ?extended, "Rejected extended value");
            return Err(ApiError::NotAllowed);
        }

        let settings = FamilySettings::resolve(kind, &state.config, &state.deps.renderer);
        if !settings.has_supported_service() {
            return Err(ApiError::NotFound("no service for this type found".to_string()));
        }

        // Redirects never carry resize options
        let options = if mode.is_extended() {
            query.render_options()?
        } else {
            RenderOptions::default()
        };

        Ok(Self {
            kind,
            mode,
            options,
            settings,
        })
    }

    async fn serve(self, state: &AppState, input: BadgeInput) -> ApiResult<Response> {
        let pipeline = build_pipeline(self.kind, self.mode, &input, &state.deps);

        let mut ctx = RequestContext::new(self.kind, self.mode, self.options);
        if let Some(service) = self.settings.primary_service() {
            ctx = ctx.with_service(service);
        }
        let ctx = match input {
            BadgeInput::Reference(id) => ctx.with_identifier(id),
            BadgeInput::Document(document) => ctx.with_metadata(document),
        };

        let run = pipeline.run(ctx).await;
        let mut tracking = run.tracking;

        let result = match run.outcome {
            Outcome::Success(target) => send(target).await,
            Outcome::Unavailable(reason) => {
                debug!(
                    request_id = %tracking.request_id,
                    reason = %reason,
                    "Badge not available"
                );
                tracking.na = true;
                let target =
                    self.settings
                        .not_available(self.mode, &state.deps.renderer, self.options);
                send(target).await
            }
            Outcome::Failure { status, message } => Err(ApiError::Upstream { status, message }),
        };

        log_tracking(&tracking, &result);
        result
    }
}

async fn send(target: RenderTarget) -> ApiResult<Response> {
    match target {
        RenderTarget::Redirect(url) => {
            Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
        }
        RenderTarget::Image(request) => {
            let image = render_image(&request)
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            Ok(([(header::CONTENT_TYPE, image.content_type())], image.body).into_response())
        }
    }
}

fn log_tracking(tracking: &Tracking, result: &ApiResult<Response>) {
    let status = match result {
        Ok(response) => response.status().as_u16(),
        Err(ApiError::Upstream { status, .. }) => status.as_u16(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
    };

    info!(
        request_id = %tracking.request_id,
        badge_type = tracking.badge_type,
        id = tracking.id.as_deref().unwrap_or("-"),
        extended = tracking.extended,
        size = ?tracking.size,
        format = tracking.format.as_str(),
        service = tracking.service.as_deref().unwrap_or("-"),
        na = tracking.na,
        status = status,
        "Badge request completed"
    );
}
