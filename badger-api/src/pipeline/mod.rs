//! Badge resolution pipeline
//!
//! Every badge family is an ordered list of asynchronous steps:
//! - **Resolving**: map the identifier to the upstream record
//! - **Enriching**: derive values from that record (center point, place name, ...)
//! - **Classifying**: reduce the record to the family's status value
//!
//! Steps consume the [`RequestContext`] and hand back a new one, or halt the
//! run with [`Halt`]. The first halt ends the run; nothing after it executes.
//! A run that passes every step is rendered into a [`RenderTarget`].
//!
//! [`RenderTarget`]: crate::render::RenderTarget

pub mod context;
pub mod runner;

pub use context::{Field, ImageFormat, Mode, RenderOptions, RequestContext, Tracking};
pub use runner::{Pipeline, PipelineRun, Stage};

use axum::http::StatusCode;
use std::fmt;

use crate::render::RenderTarget;

/// Why a pipeline run stopped early
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    /// Upstream data is absent or unrecognised; answered with the NA badge
    Unavailable { reason: String },

    /// Infrastructure problem; answered with a JSON error
    Failure { status: StatusCode, message: String },
}

impl Halt {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Halt::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Halt::Failure {
            status,
            message: message.into(),
        }
    }

    /// Default failure: 500 "Internal error"
    pub fn internal() -> Self {
        Halt::failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    }
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Halt::Unavailable { reason } => write!(f, "badge not available: {}", reason),
            Halt::Failure { status, message } => write!(f, "{} ({})", message, status.as_u16()),
        }
    }
}

/// Result of a single step
pub type StepResult = Result<RequestContext, Halt>;

/// Terminal outcome of a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(RenderTarget),
    Unavailable(String),
    Failure { status: StatusCode, message: String },
}

impl From<Halt> for Outcome {
    fn from(halt: Halt) -> Self {
        match halt {
            Halt::Unavailable { reason } => Outcome::Unavailable(reason),
            Halt::Failure { status, message } => Outcome::Failure { status, message },
        }
    }
}
