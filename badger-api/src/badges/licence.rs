//! Licence badge
//!
//! Rates the compendium's `code`, `data` and `text` licences against the
//! configured lists of open licences.

use badger_common::config::LicenceConfig;
use serde_json::Value;

use super::common::{fetch_compendium, translate_identifier};
use super::BadgeDeps;
use crate::pipeline::{Field, Halt, Mode, Pipeline, RequestContext, Stage, StepResult};
use crate::render::{BadgeRenderer, RenderTarget};

const LICENCE_POINTERS: [&str; 2] = ["/metadata/o2r/license", "/metadata/o2r/licence"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenceStatus {
    Open,
    MostlyOpen,
    PartiallyOpen,
    Closed,
}

impl LicenceStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(LicenceStatus::Open),
            "mostly open" => Some(LicenceStatus::MostlyOpen),
            "partially open" => Some(LicenceStatus::PartiallyOpen),
            "closed" => Some(LicenceStatus::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LicenceStatus::Open => "open",
            LicenceStatus::MostlyOpen => "mostly open",
            LicenceStatus::PartiallyOpen => "partially open",
            LicenceStatus::Closed => "closed",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            LicenceStatus::Open => "44cc11",
            LicenceStatus::MostlyOpen => "green",
            LicenceStatus::PartiallyOpen => "yellow",
            LicenceStatus::Closed => "ff0000",
        }
    }

    fn image_file(&self) -> &'static str {
        match self {
            LicenceStatus::Open => "licence_open.svg",
            LicenceStatus::MostlyOpen => "licence_mostly_open.svg",
            LicenceStatus::PartiallyOpen => "licence_partially_open.svg",
            LicenceStatus::Closed => "licence_closed.svg",
        }
    }
}

/// Licence identifiers considered open, per category
#[derive(Debug, Clone, Default)]
pub struct LicenceLists {
    code: Vec<String>,
    data: Vec<String>,
    text: Vec<String>,
}

impl LicenceLists {
    pub fn from_config(config: &LicenceConfig) -> Self {
        Self {
            code: config.open_code.clone(),
            data: config.open_data.clone(),
            text: config.open_text.clone(),
        }
    }

    fn is_open(list: &[String], licence: &str) -> bool {
        list.iter().any(|open| open.eq_ignore_ascii_case(licence))
    }

    /// `None` when the object names no licence at all
    pub fn classify(&self, licence: &Value) -> Option<LicenceStatus> {
        let categories = [
            ("code", &self.code),
            ("data", &self.data),
            ("text", &self.text),
        ];

        let mut present = 0;
        let mut open = 0;
        for (member, list) in categories {
            let Some(id) = licence
                .get(member)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
            else {
                continue;
            };
            present += 1;
            if Self::is_open(list, id) {
                open += 1;
            }
        }

        match (present, open) {
            (0, _) => None,
            (p, o) if o == p => Some(LicenceStatus::Open),
            (p, o) if o * 2 > p => Some(LicenceStatus::MostlyOpen),
            (_, o) if o > 0 => Some(LicenceStatus::PartiallyOpen),
            _ => Some(LicenceStatus::Closed),
        }
    }
}

pub fn pipeline(by_reference: bool, deps: &BadgeDeps) -> Pipeline {
    let mut pipeline = Pipeline::new("licence");

    if by_reference {
        let o2r = deps.upstream.o2r.clone();
        pipeline = pipeline
            .step(Stage::Resolving, "translate_identifier", translate_identifier)
            .step(Stage::Resolving, "fetch_compendium", move |ctx| {
                fetch_compendium(o2r.clone(), ctx)
            });
    }

    let lists = deps.licences.clone();
    let renderer = deps.renderer.clone();
    pipeline
        .step(Stage::Classifying, "classify_licence", move |ctx| {
            let lists = lists.clone();
            async move { classify_licence(&lists, ctx) }
        })
        .render(move |ctx| render(&renderer, ctx))
}

fn classify_licence(lists: &LicenceLists, ctx: RequestContext) -> StepResult {
    let metadata = ctx.require_metadata()?;

    let status = LICENCE_POINTERS
        .iter()
        .find_map(|pointer| metadata.pointer(pointer))
        .and_then(|licence| lists.classify(licence))
        .ok_or_else(|| {
            Halt::unavailable("o2r compendium does not contain licence information")
        })?;

    Ok(ctx.with_field(Field::Licence, status.as_str()))
}

fn render(renderer: &BadgeRenderer, ctx: &RequestContext) -> Result<RenderTarget, Halt> {
    let status =
        LicenceStatus::parse(ctx.require_str(Field::Licence)?).ok_or_else(Halt::internal)?;

    match ctx.mode {
        Mode::Full => Ok(renderer.image(status.image_file(), ctx.options)),
        _ => Ok(renderer.redirect("licence", status.as_str(), status.color())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badges::BadgeKind;
    use crate::pipeline::RenderOptions;
    use serde_json::json;

    fn lists() -> LicenceLists {
        LicenceLists::from_config(&LicenceConfig::default())
    }

    fn compendium(licence: Value) -> Value {
        json!({ "metadata": { "o2r": { "license": licence } } })
    }

    #[test]
    fn test_all_open() {
        let licence = json!({ "code": "Apache-2.0", "data": "ODbL-1.0", "text": "CC-BY-4.0" });
        assert_eq!(lists().classify(&licence), Some(LicenceStatus::Open));
    }

    #[test]
    fn test_partly_open_counts() {
        let two = json!({ "code": "MIT", "data": "CC0-1.0", "text": "proprietary" });
        let one = json!({ "code": "MIT", "data": "proprietary", "text": "proprietary" });
        let none = json!({ "code": "proprietary", "data": "proprietary", "text": "proprietary" });
        assert_eq!(lists().classify(&two), Some(LicenceStatus::MostlyOpen));
        assert_eq!(lists().classify(&one), Some(LicenceStatus::PartiallyOpen));
        assert_eq!(lists().classify(&none), Some(LicenceStatus::Closed));
    }

    #[test]
    fn test_case_insensitive_and_partial_members() {
        assert_eq!(
            lists().classify(&json!({ "code": "mit", "data": "cc0-1.0" })),
            Some(LicenceStatus::Open)
        );
        assert_eq!(lists().classify(&json!({})), None);
    }

    #[test]
    fn test_classify_step_reads_either_spelling() {
        let licence = json!({ "code": "MIT", "data": "CC0-1.0", "text": "CC0-1.0" });
        let ctx = RequestContext::new(BadgeKind::Licence, Mode::Compact, RenderOptions::default())
            .with_metadata(json!({ "metadata": { "o2r": { "licence": licence } } }));
        let ctx = classify_licence(&lists(), ctx).unwrap();
        assert_eq!(ctx.field_str(Field::Licence), Some("open"));
    }

    #[test]
    fn test_missing_licence_is_unavailable() {
        let ctx = RequestContext::new(BadgeKind::Licence, Mode::Compact, RenderOptions::default())
            .with_metadata(json!({ "metadata": { "o2r": {} } }));
        assert!(matches!(
            classify_licence(&lists(), ctx),
            Err(Halt::Unavailable { .. })
        ));
    }

    #[test]
    fn test_render() {
        let renderer = BadgeRenderer::new("https://img.shields.io/badge/", "", "/srv/badges");
        let licence = json!({ "code": "MIT", "data": "CC0-1.0", "text": "All rights reserved" });
        let ctx = RequestContext::new(BadgeKind::Licence, Mode::Compact, RenderOptions::default())
            .with_metadata(compendium(licence));
        let ctx = classify_licence(&lists(), ctx).unwrap();

        assert_eq!(
            render(&renderer, &ctx),
            Ok(RenderTarget::Redirect(
                "https://img.shields.io/badge/licence-mostly%20open-green.svg".to_string()
            ))
        );
    }
}
