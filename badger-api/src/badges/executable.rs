//! Executability badge
//!
//! By reference: compendium id → newest job → job status.
//! By document: the posted body is a job record with a `status` member.

use axum::http::StatusCode;

use super::common::translate_identifier;
use super::BadgeDeps;
use crate::pipeline::{Field, Halt, Mode, Pipeline, RequestContext, Stage, StepResult};
use crate::render::{BadgeRenderer, RenderTarget};
use crate::services::{O2rClient, O2rError};

/// Execution state of the newest job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Success,
    Failure,
    Running,
    Unknown,
}

impl JobStatus {
    pub fn classify(status: Option<&str>) -> Self {
        match status {
            Some("success") => JobStatus::Success,
            Some("failure") => JobStatus::Failure,
            Some("running") => JobStatus::Running,
            _ => JobStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Success => "success",
            JobStatus::Failure => "failure",
            JobStatus::Running => "running",
            JobStatus::Unknown => "unknown",
        }
    }

    fn image_file(&self) -> &'static str {
        match self {
            JobStatus::Success => "executable_success.svg",
            JobStatus::Failure => "executable_failure.svg",
            JobStatus::Running => "executable_running.svg",
            JobStatus::Unknown => "executable_noInfo.svg",
        }
    }

    /// Message and color of the compact badge
    fn compact(&self) -> Option<(&'static str, &'static str)> {
        match self {
            JobStatus::Success => Some(("yes", "44cc11")),
            JobStatus::Failure => Some(("no", "ff0000")),
            JobStatus::Running => Some(("running", "yellow")),
            JobStatus::Unknown => None,
        }
    }
}

pub fn pipeline(by_reference: bool, deps: &BadgeDeps) -> Pipeline {
    let mut pipeline = Pipeline::new("executable");

    if by_reference {
        let jobs = deps.upstream.o2r.clone();
        let job = deps.upstream.o2r.clone();
        pipeline = pipeline
            .step(Stage::Resolving, "translate_identifier", translate_identifier)
            .step(Stage::Resolving, "find_job", move |ctx| {
                find_newest_job(jobs.clone(), ctx)
            })
            .step(Stage::Enriching, "fetch_job", move |ctx| {
                fetch_job_status(job.clone(), ctx)
            });
    } else {
        pipeline = pipeline.step(Stage::Resolving, "read_job_document", read_job_document);
    }

    let renderer = deps.renderer.clone();
    pipeline
        .step(Stage::Classifying, "classify_job", classify_job)
        .render(move |ctx| render(&renderer, ctx))
}

async fn find_newest_job(o2r: O2rClient, ctx: RequestContext) -> StepResult {
    let compendium_id = ctx.require_str(Field::CompendiumId)?.to_string();

    let jobs = o2r
        .jobs_for_compendium(&compendium_id)
        .await
        .map_err(job_halt)?;

    if let Some(error) = jobs.error {
        tracing::debug!(compendium_id = %compendium_id, error = %error, "o2r reported no jobs");
        return Err(Halt::unavailable("no job found for compendium"));
    }

    match jobs.results.into_iter().next() {
        Some(job_id) => Ok(ctx.with_field(Field::JobId, job_id)),
        None => Err(Halt::unavailable("no job found for compendium")),
    }
}

async fn fetch_job_status(o2r: O2rClient, ctx: RequestContext) -> StepResult {
    let job_id = ctx.require_str(Field::JobId)?.to_string();
    let job = o2r.job(&job_id).await.map_err(job_halt)?;

    Ok(match job.status {
        Some(status) => ctx.with_field(Field::JobStatus, status),
        None => ctx,
    })
}

async fn read_job_document(ctx: RequestContext) -> StepResult {
    let status = ctx
        .require_metadata()?
        .get("status")
        .and_then(|s| s.as_str())
        .map(str::to_string);

    Ok(match status {
        Some(status) => ctx.with_field(Field::JobStatus, status),
        None => ctx,
    })
}

async fn classify_job(ctx: RequestContext) -> StepResult {
    let status = JobStatus::classify(ctx.field_str(Field::JobStatus));
    Ok(ctx.with_field(Field::JobStatus, status.as_str()))
}

fn job_halt(error: O2rError) -> Halt {
    tracing::debug!(error = %error, "o2r job lookup failed");

    match error {
        O2rError::NotFound(_) => Halt::unavailable("no job found for compendium"),
        O2rError::ParseError(_) => Halt::unavailable("error parsing job response"),
        e if e.is_server_error() => {
            Halt::failure(StatusCode::INTERNAL_SERVER_ERROR, "Unable to find data on server")
        }
        O2rError::ApiError(..) => Halt::unavailable("job not accessible"),
        O2rError::NetworkError(_) => {
            Halt::failure(StatusCode::INTERNAL_SERVER_ERROR, "Unable to find data on server")
        }
    }
}

fn render(renderer: &BadgeRenderer, ctx: &RequestContext) -> Result<RenderTarget, Halt> {
    let status = JobStatus::classify(Some(ctx.require_str(Field::JobStatus)?));

    match ctx.mode {
        Mode::Full => Ok(renderer.image(status.image_file(), ctx.options)),
        _ => match status.compact() {
            Some((message, color)) => Ok(renderer.redirect("executable", message, color)),
            None => Err(Halt::unavailable("job status unknown")),
        },
    }
}
