//! Sequential step runner

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use tracing::{debug, error};

use super::{Halt, Outcome, RequestContext, StepResult, Tracking};
use crate::render::RenderTarget;

/// Pipeline stage a step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    Enriching,
    Classifying,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Resolving => "resolving",
            Stage::Enriching => "enriching",
            Stage::Classifying => "classifying",
        }
    }
}

type StepFn = Box<dyn Fn(RequestContext) -> BoxFuture<'static, StepResult> + Send + Sync>;
type RenderFn = Box<dyn Fn(&RequestContext) -> Result<RenderTarget, Halt> + Send + Sync>;

struct Step {
    name: &'static str,
    stage: Stage,
    run: StepFn,
}

/// Result of a pipeline run: the outcome plus the tracking record of the
/// last context that existed
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub outcome: Outcome,
    pub tracking: Tracking,
}

/// Ordered list of steps followed by a render dispatch
pub struct Pipeline {
    name: &'static str,
    steps: Vec<Step>,
    render: Option<RenderFn>,
}

impl Pipeline {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
            render: None,
        }
    }

    /// Append a step
    pub fn step<F, Fut>(mut self, stage: Stage, name: &'static str, run: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult> + Send + 'static,
    {
        self.steps.push(Step {
            name,
            stage,
            run: Box::new(move |ctx| run(ctx).boxed()),
        });
        self
    }

    /// Set the render dispatch applied to the final context
    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&RequestContext) -> Result<RenderTarget, Halt> + Send + Sync + 'static,
    {
        self.render = Some(Box::new(render));
        self
    }

    /// Step names in execution order
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name).collect()
    }

    /// Run all steps strictly in sequence, stopping at the first halt
    pub async fn run(&self, ctx: RequestContext) -> PipelineRun {
        let request_id = ctx.tracking.request_id;
        let mut tracking = ctx.tracking.clone();
        let mut ctx = ctx;

        for step in &self.steps {
            debug!(
                request_id = %request_id,
                pipeline = self.name,
                stage = step.stage.as_str(),
                step = step.name,
                "Running step"
            );

            match (step.run)(ctx).await {
                Ok(next) => {
                    tracking = next.tracking.clone();
                    ctx = next;
                }
                Err(halt) => {
                    debug!(
                        request_id = %request_id,
                        pipeline = self.name,
                        step = step.name,
                        halt = %halt,
                        "Pipeline halted"
                    );
                    return PipelineRun {
                        outcome: halt.into(),
                        tracking,
                    };
                }
            }
        }

        let outcome = match &self.render {
            Some(render) => match render(&ctx) {
                Ok(target) => Outcome::Success(target),
                Err(halt) => halt.into(),
            },
            None => {
                error!(pipeline = self.name, "Pipeline has no render dispatch");
                Halt::internal().into()
            }
        };

        PipelineRun {
            outcome,
            tracking: ctx.tracking,
        }
    }
}
