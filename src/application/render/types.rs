use serde::{Deserialize, Serialize};

use crate::domain::{
    submission::Submission,
    template::{RenderReport, Rendered, TemplateOutline},
};

/// Identifies where a template came from so logs and reports can name it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderTarget {
    /// Template stored with a form definition.
    Form { id: String },
    /// Template supplied directly by the caller (file, stdin, tests).
    Adhoc { label: String },
}

impl RenderTarget {
    pub fn label(&self) -> &str {
        match self {
            RenderTarget::Form { id } => id.as_str(),
            RenderTarget::Adhoc { label } => label.as_str(),
        }
    }
}

/// Rendering request passed into the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub target: &'a RenderTarget,
    pub template: &'a str,
    pub submission: &'a Submission,
}

impl<'a> RenderRequest<'a> {
    pub fn new(target: &'a RenderTarget, template: &'a str, submission: &'a Submission) -> Self {
        Self {
            target,
            template,
            submission,
        }
    }
}

/// Deterministic rendering result returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderOutput {
    /// Text written verbatim into the read-only output field.
    pub text: String,
    pub report: RenderReport,
}

impl From<Rendered> for RenderOutput {
    fn from(rendered: Rendered) -> Self {
        Self {
            text: rendered.text,
            report: rendered.report,
        }
    }
}

/// Trait exposed by the rendering pipeline. Implementations must be pure and
/// deterministic: given the same input, they return identical outputs.
pub trait RenderService: Send + Sync {
    fn render(&self, request: &RenderRequest<'_>) -> RenderOutput;

    fn outline(&self, template: &str) -> TemplateOutline;
}
