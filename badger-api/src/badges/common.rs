//! Steps shared by the compendium-based families

use axum::http::StatusCode;

use super::legacy_ids::resolve_compendium_id;
use crate::pipeline::{Field, Halt, RequestContext, StepResult};
use crate::services::{O2rClient, O2rError};

/// Identifier → compendium id
pub async fn translate_identifier(ctx: RequestContext) -> StepResult {
    let compendium_id = resolve_compendium_id(ctx.require_identifier()?)?;
    Ok(ctx.with_field(Field::CompendiumId, compendium_id))
}

/// Replace the context metadata with the compendium document
pub async fn fetch_compendium(o2r: O2rClient, ctx: RequestContext) -> StepResult {
    let compendium_id = ctx.require_str(Field::CompendiumId)?.to_string();

    match o2r.compendium(&compendium_id).await {
        Ok(compendium) => Ok(ctx.with_metadata(compendium)),
        Err(e) => Err(compendium_halt(&compendium_id, e)),
    }
}

fn compendium_halt(compendium_id: &str, error: O2rError) -> Halt {
    tracing::debug!(compendium_id = %compendium_id, error = %error, "Compendium lookup failed");

    match error {
        O2rError::NotFound(_) => Halt::unavailable("compendium not found"),
        O2rError::ParseError(_) => Halt::unavailable("error parsing compendium"),
        e if e.is_server_error() => {
            Halt::failure(StatusCode::INTERNAL_SERVER_ERROR, "Unable to find data on server")
        }
        O2rError::ApiError(..) => Halt::unavailable("compendium not accessible"),
        O2rError::NetworkError(_) => {
            Halt::failure(StatusCode::INTERNAL_SERVER_ERROR, "Unable to find data on server")
        }
    }
}
