//! Rendering service over the template engine.
//!
//! The pipeline is kept pure: it accepts a template and submission data,
//! produces deterministic text, and reports diagnostics alongside. Logging and
//! metrics happen here so the domain engine stays free of side effects.

mod service;
mod types;

pub use service::{
    RenderConfigError, RenderPipelineConfig, SubstitutionRenderService, configure_render_service,
    render_service,
};
pub(crate) use service::{
    METRIC_DECODE_BOUND_HIT_TOTAL, METRIC_RENDER_TOTAL, METRIC_SECTION_EXPANDED_TOTAL,
};
pub use types::{RenderOutput, RenderRequest, RenderService, RenderTarget};
