//! Peer review badge
//!
//! DOI → DOAJ article → journal ISSN → DOAJ journal → editorial review process.

use axum::http::StatusCode;
use serde_json::Value;

use super::BadgeDeps;
use crate::pipeline::{Field, Halt, Mode, Pipeline, RequestContext, Stage, StepResult};
use crate::render::{BadgeRenderer, RenderTarget};
use crate::services::doaj_client::{first_issn, review_process};
use crate::services::{DoajClient, DoajError};

/// Review category of a journal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    DoubleBlind,
    Blind,
    Yes,
}

impl ReviewStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "double blind" => Some(ReviewStatus::DoubleBlind),
            "blind" => Some(ReviewStatus::Blind),
            "yes" => Some(ReviewStatus::Yes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::DoubleBlind => "double blind",
            ReviewStatus::Blind => "blind",
            ReviewStatus::Yes => "yes",
        }
    }

    fn image_file(&self) -> &'static str {
        match self {
            ReviewStatus::DoubleBlind => "peerreview_double_blind.svg",
            ReviewStatus::Blind => "peerreview_blind.svg",
            ReviewStatus::Yes => "peerreview_yes.svg",
        }
    }
}

/// Classify a DOAJ editorial review process text
///
/// "double blind" is checked before "blind", which it contains.
pub fn classify_review_process(process: &str) -> ReviewStatus {
    let process = process.trim().to_lowercase();
    if process.starts_with("double blind") {
        ReviewStatus::DoubleBlind
    } else if process.starts_with("blind") {
        ReviewStatus::Blind
    } else {
        ReviewStatus::Yes
    }
}

pub fn pipeline(by_reference: bool, deps: &BadgeDeps) -> Pipeline {
    let mut pipeline = Pipeline::new("peerreview");

    if by_reference {
        let articles = deps.upstream.doaj.clone();
        let journals = deps.upstream.doaj.clone();
        pipeline = pipeline
            .step(Stage::Resolving, "lookup_issn", move |ctx| {
                lookup_issn(articles.clone(), ctx)
            })
            .step(Stage::Enriching, "fetch_journal", move |ctx| {
                fetch_journal(journals.clone(), ctx)
            });
    }

    let renderer = deps.renderer.clone();
    pipeline
        .step(Stage::Classifying, "classify_review", classify_review)
        .render(move |ctx| render(&renderer, ctx))
}

async fn lookup_issn(doaj: DoajClient, ctx: RequestContext) -> StepResult {
    let identifier = ctx.require_identifier()?;
    let doi = identifier.strip_prefix("doi:").unwrap_or(identifier).to_string();

    let articles = doaj.search_articles_by_doi(&doi).await.map_err(doaj_halt)?;
    ensure_results(&articles)?;

    let issn = first_issn(&articles)
        .ok_or_else(|| Halt::unavailable("no issn found"))?
        .to_string();

    tracing::debug!(doi = %doi, issn = %issn, "Found journal ISSN");
    Ok(ctx.with_field(Field::Issn, issn))
}

async fn fetch_journal(doaj: DoajClient, ctx: RequestContext) -> StepResult {
    let issn = ctx.require_str(Field::Issn)?.to_string();
    let journals = doaj.search_journals_by_issn(&issn).await.map_err(doaj_halt)?;
    Ok(ctx.with_metadata(journals))
}

async fn classify_review(ctx: RequestContext) -> StepResult {
    let journals = ctx.require_metadata()?;
    ensure_results(journals)?;

    let process = review_process(journals)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Halt::unavailable("no review status found"))?;

    let status = classify_review_process(process);
    Ok(ctx.with_field(Field::ReviewStatus, status.as_str()))
}

/// DOAJ search responses must carry a non-empty `results` array
fn ensure_results(response: &Value) -> Result<(), Halt> {
    match response.get("results").and_then(Value::as_array) {
        None => Err(Halt::unavailable("error accessing doaj")),
        Some(results) if results.is_empty() => Err(Halt::unavailable("no results found")),
        Some(_) => Ok(()),
    }
}

fn doaj_halt(error: DoajError) -> Halt {
    tracing::debug!(error = %error, "DOAJ lookup failed");

    match error {
        DoajError::NetworkError(_) | DoajError::ServerError(_) => {
            Halt::failure(StatusCode::NOT_FOUND, "error accessing doaj")
        }
        DoajError::NotFound(_) => Halt::unavailable("no doaj data found"),
        DoajError::ParseError(_) => Halt::unavailable("error parsing doaj response"),
    }
}

fn render(renderer: &BadgeRenderer, ctx: &RequestContext) -> Result<RenderTarget, Halt> {
    let status =
        ReviewStatus::parse(ctx.require_str(Field::ReviewStatus)?).ok_or_else(Halt::internal)?;

    match ctx.mode {
        Mode::Full => Ok(renderer.image(status.image_file(), ctx.options)),
        _ => Ok(renderer.redirect("peer review", status.as_str(), "green")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badges::BadgeKind;
    use crate::pipeline::RenderOptions;
    use serde_json::json;

    fn journals(process: &str) -> Value {
        json!({
            "results": [{ "bibjson": { "editorial_review": { "process": process } } }]
        })
    }

    #[test]
    fn test_classify_review_process() {
        assert_eq!(
            classify_review_process("Double blind peer review"),
            ReviewStatus::DoubleBlind
        );
        assert_eq!(classify_review_process("Blind peer review"), ReviewStatus::Blind);
        assert_eq!(classify_review_process("Peer review"), ReviewStatus::Yes);
        assert_eq!(classify_review_process("Editorial review"), ReviewStatus::Yes);
    }

    #[tokio::test]
    async fn test_classify_step() {
        let ctx = RequestContext::new(BadgeKind::PeerReview, Mode::Compact, RenderOptions::default())
            .with_metadata(journals("Double blind peer review"));
        let ctx = classify_review(ctx).await.unwrap();
        assert_eq!(ctx.field_str(Field::ReviewStatus), Some("double blind"));
    }

    #[tokio::test]
    async fn test_missing_process_is_unavailable() {
        let ctx = RequestContext::new(BadgeKind::PeerReview, Mode::Compact, RenderOptions::default())
            .with_metadata(json!({ "results": [{ "bibjson": {} }] }));
        assert_eq!(
            classify_review(ctx).await.unwrap_err(),
            Halt::unavailable("no review status found")
        );
    }

    #[test]
    fn test_results_checks() {
        assert_eq!(
            ensure_results(&json!({})),
            Err(Halt::unavailable("error accessing doaj"))
        );
        assert_eq!(
            ensure_results(&json!({ "results": [] })),
            Err(Halt::unavailable("no results found"))
        );
        assert_eq!(ensure_results(&journals("Blind")), Ok(()));
    }

    #[test]
    fn test_doaj_error_mapping() {
        assert_eq!(
            doaj_halt(DoajError::ServerError(503)),
            Halt::failure(StatusCode::NOT_FOUND, "error accessing doaj")
        );
        assert_eq!(
            doaj_halt(DoajError::NotFound(404)),
            Halt::unavailable("no doaj data found")
        );
    }

    #[test]
    fn test_render() {
        let renderer = BadgeRenderer::new("https://img.shields.io/badge/", "", "/srv/badges");
        let ctx = RequestContext::new(BadgeKind::PeerReview, Mode::Compact, RenderOptions::default())
            .with_field(Field::ReviewStatus, "double blind");
        assert_eq!(
            render(&renderer, &ctx),
            Ok(RenderTarget::Redirect(
                "https://img.shields.io/badge/peer%20review-double%20blind-green.svg".to_string()
            ))
        );

        let ctx = RequestContext::new(BadgeKind::PeerReview, Mode::Full, RenderOptions::default())
            .with_field(Field::ReviewStatus, "blind");
        assert_eq!(
            render(&renderer, &ctx),
            Ok(renderer.image("peerreview_blind.svg", ctx.options))
        );
    }
}
