//! Submission template engine.
//!
//! A template mixes literal text, `{key}` placeholders and named section blocks
//! (`{@START_<id>@} ... {@END_<id>@}`). Rendering runs three stages:
//!
//! 1. HTML entities are decoded until a fixpoint (bounded by a pass limit).
//! 2. Section blocks are expanded left to right and spliced into the output.
//! 3. Remaining placeholders are resolved against the top-level submission.
//!
//! Placeholders that cannot be resolved at the top level are kept verbatim,
//! while inside a section row they always render empty. Rendering is a pure
//! function of its inputs and never fails.

mod decode;
mod expand;
mod placeholder;
mod scan;

use serde::Serialize;

use crate::domain::submission::{Submission, SubmissionValue};

pub use decode::{DEFAULT_MAX_DECODE_PASSES, DecodeOutcome, decode_entities};
pub use expand::{SENTINEL_ROWS, SectionOutcome};
pub use scan::{Segment, scan_sections};

use expand::expand_section;
use placeholder::{placeholder_keys, substitute};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub max_decode_passes: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_decode_passes: DEFAULT_MAX_DECODE_PASSES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionReport {
    pub id: String,
    #[serde(flatten)]
    pub outcome: SectionOutcome,
}

/// Diagnostics gathered while rendering. Never affects the rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    pub decode_passes: u32,
    pub decode_converged: bool,
    pub sections: Vec<SectionReport>,
    /// Top-level placeholder keys left unresolved, in output order.
    pub retained_placeholders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub report: RenderReport,
}

/// Render `template` against `submission`.
pub fn render(template: &str, submission: &Submission, options: RenderOptions) -> Rendered {
    let decoded = decode_entities(template, options.max_decode_passes);

    let mut spliced = String::with_capacity(decoded.text.len());
    let mut sections = Vec::new();
    for segment in scan_sections(&decoded.text) {
        match segment {
            Segment::Literal(text) => spliced.push_str(text),
            Segment::Section { id, body } => {
                let outcome = expand_section(id, body, submission, &mut spliced);
                sections.push(SectionReport {
                    id: id.to_string(),
                    outcome,
                });
            }
        }
    }

    let mut text = String::with_capacity(spliced.len());
    let mut retained_placeholders = Vec::new();
    substitute(&spliced, &mut text, |key| {
        let value = submission.get(key).and_then(SubmissionValue::as_text);
        if value.is_none() {
            retained_placeholders.push(key.to_string());
        }
        value
    });

    Rendered {
        text,
        report: RenderReport {
            decode_passes: decoded.passes,
            decode_converged: decoded.converged,
            sections,
            retained_placeholders,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionOutline {
    pub id: String,
    pub placeholders: Vec<String>,
}

/// Structure of a template: its section blocks and the placeholders used
/// inside and outside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateOutline {
    pub sections: Vec<SectionOutline>,
    pub placeholders: Vec<String>,
}

pub fn outline(template: &str, options: RenderOptions) -> TemplateOutline {
    let decoded = decode_entities(template, options.max_decode_passes);

    let mut sections = Vec::new();
    let mut placeholders: Vec<String> = Vec::new();
    for segment in scan_sections(&decoded.text) {
        match segment {
            Segment::Literal(text) => {
                for key in placeholder_keys(text) {
                    if !placeholders.contains(&key) {
                        placeholders.push(key);
                    }
                }
            }
            Segment::Section { id, body } => sections.push(SectionOutline {
                id: id.to_string(),
                placeholders: placeholder_keys(body),
            }),
        }
    }

    TemplateOutline {
        sections,
        placeholders,
    }
}
