use std::{num::NonZeroU32, sync::Arc};

use metrics::counter;
use once_cell::sync::{Lazy, OnceCell};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::render::types::{RenderOutput, RenderRequest, RenderService};
use crate::domain::template::{
    self, DEFAULT_MAX_DECODE_PASSES, RenderOptions, RenderReport, SectionOutcome, TemplateOutline,
};

pub(crate) const METRIC_RENDER_TOTAL: &str = "formsmith_render_total";
pub(crate) const METRIC_DECODE_BOUND_HIT_TOTAL: &str = "formsmith_decode_bound_hit_total";
pub(crate) const METRIC_SECTION_EXPANDED_TOTAL: &str = "formsmith_section_expanded_total";

/// Placeholder substitution pipeline over submission data.
#[derive(Debug, Clone)]
pub struct SubstitutionRenderService {
    options: RenderOptions,
}

impl SubstitutionRenderService {
    pub fn new(config: RenderPipelineConfig) -> Self {
        Self {
            options: RenderOptions {
                max_decode_passes: config.max_decode_passes.get(),
            },
        }
    }
}

static RENDER_SERVICE: Lazy<Arc<SubstitutionRenderService>> =
    Lazy::new(|| Arc::new(SubstitutionRenderService::new(active_render_config())));

/// Access the shared render service instance, initialised on first use.
pub fn render_service() -> Arc<SubstitutionRenderService> {
    Arc::clone(&RENDER_SERVICE)
}

impl Default for SubstitutionRenderService {
    fn default() -> Self {
        Self::new(RenderPipelineConfig::default())
    }
}

impl RenderService for SubstitutionRenderService {
    fn render(&self, request: &RenderRequest<'_>) -> RenderOutput {
        let rendered = template::render(request.template, request.submission, self.options);

        record_metrics(&rendered.report);
        log_report(request.target.label(), &rendered.report, self.options);

        RenderOutput::from(rendered)
    }

    fn outline(&self, template: &str) -> TemplateOutline {
        template::outline(template, self.options)
    }
}

#[derive(Debug, Clone)]
pub struct RenderPipelineConfig {
    pub max_decode_passes: NonZeroU32,
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            max_decode_passes: NonZeroU32::new(DEFAULT_MAX_DECODE_PASSES)
                .unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl From<&crate::config::RenderSettings> for RenderPipelineConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self {
            max_decode_passes: settings.max_decode_passes,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderConfigError {
    #[error("render service already configured")]
    AlreadyConfigured,
}

static RENDER_PIPELINE_CONFIG: OnceCell<RenderPipelineConfig> = OnceCell::new();

pub fn configure_render_service(config: RenderPipelineConfig) -> Result<(), RenderConfigError> {
    RENDER_PIPELINE_CONFIG
        .set(config)
        .map_err(|_| RenderConfigError::AlreadyConfigured)
}

fn active_render_config() -> RenderPipelineConfig {
    RENDER_PIPELINE_CONFIG.get().cloned().unwrap_or_default()
}

fn record_metrics(report: &RenderReport) {
    counter!(METRIC_RENDER_TOTAL).increment(1);

    if !report.decode_converged {
        counter!(METRIC_DECODE_BOUND_HIT_TOTAL).increment(1);
    }

    for section in &report.sections {
        counter!(METRIC_SECTION_EXPANDED_TOTAL, "kind" => section.outcome.kind()).increment(1);
    }
}

fn log_report(label: &str, report: &RenderReport, options: RenderOptions) {
    if !report.decode_converged {
        warn!(
            target = "formsmith::render",
            template = label,
            max_decode_passes = options.max_decode_passes,
            "Entity decoding hit the pass limit; rendering the partially decoded template"
        );
    }

    for section in &report.sections {
        if let SectionOutcome::Repeating {
            undeclared_fields, ..
        } = &section.outcome
        {
            if !undeclared_fields.is_empty() {
                debug!(
                    target = "formsmith::render",
                    template = label,
                    section = section.id.as_str(),
                    fields = ?undeclared_fields,
                    "Section placeholders not defined by any row"
                );
            }
        }
    }

    debug!(
        target = "formsmith::render",
        template = label,
        decode_passes = report.decode_passes,
        sections = report.sections.len(),
        retained = ?report.retained_placeholders,
        "Rendered submission"
    );
}
