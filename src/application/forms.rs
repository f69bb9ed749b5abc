//! Form-level rendering: resolves a template from a stored form definition or
//! an inline source, parses the submission payload and runs the renderer.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::application::render::{RenderOutput, RenderRequest, RenderService, RenderTarget};
use crate::application::repos::{FormsRepo, RepoError};
use crate::domain::{
    error::DomainError,
    forms::{FormDefinition, validate_form_id},
    submission::Submission,
    template::TemplateOutline,
};

#[derive(Debug, Error)]
pub enum FormRenderError {
    #[error("form `{0}` not found")]
    UnknownForm(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Where the template of a render comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Form { id: String },
    Inline { label: String, template: String },
}

#[derive(Clone)]
pub struct FormRenderService {
    forms: Arc<dyn FormsRepo>,
    renderer: Arc<dyn RenderService>,
}

impl FormRenderService {
    pub fn new(forms: Arc<dyn FormsRepo>, renderer: Arc<dyn RenderService>) -> Self {
        Self { forms, renderer }
    }

    pub async fn load_form(&self, id: &str) -> Result<FormDefinition, FormRenderError> {
        validate_form_id(id)?;

        self.forms
            .get_form(id)
            .await?
            .ok_or_else(|| FormRenderError::UnknownForm(id.to_string()))
    }

    /// Render a submission payload (widget envelope or bare field object).
    pub async fn render(
        &self,
        source: &TemplateSource,
        payload: Value,
    ) -> Result<RenderOutput, FormRenderError> {
        let (target, template) = self.resolve(source).await?;
        let submission = Submission::from_payload(payload)?;

        let output = self
            .renderer
            .render(&RenderRequest::new(&target, &template, &submission));

        info!(
            target = "formsmith::forms",
            template = target.label(),
            fields = submission.fields().len(),
            output_bytes = output.text.len(),
            "Rendered form submission"
        );

        Ok(output)
    }

    pub async fn render_form(
        &self,
        form_id: &str,
        payload: Value,
    ) -> Result<RenderOutput, FormRenderError> {
        let source = TemplateSource::Form {
            id: form_id.to_string(),
        };
        self.render(&source, payload).await
    }

    /// Render an ad-hoc template that is not stored with any form.
    pub async fn render_template(
        &self,
        label: &str,
        template: &str,
        payload: Value,
    ) -> Result<RenderOutput, FormRenderError> {
        let source = TemplateSource::Inline {
            label: label.to_string(),
            template: template.to_string(),
        };
        self.render(&source, payload).await
    }

    pub async fn outline(
        &self,
        source: &TemplateSource,
    ) -> Result<TemplateOutline, FormRenderError> {
        let (_, template) = self.resolve(source).await?;
        Ok(self.renderer.outline(&template))
    }

    pub async fn list_forms(&self) -> Result<Vec<String>, FormRenderError> {
        Ok(self.forms.list_forms().await?)
    }

    async fn resolve(
        &self,
        source: &TemplateSource,
    ) -> Result<(RenderTarget, String), FormRenderError> {
        match source {
            TemplateSource::Form { id } => {
                let form = self.load_form(id).await?;
                Ok((RenderTarget::Form { id: form.id }, form.template))
            }
            TemplateSource::Inline { label, template } => Ok((
                RenderTarget::Adhoc {
                    label: label.clone(),
                },
                template.clone(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::application::render::SubstitutionRenderService;

    #[derive(Default)]
    struct StubForms {
        forms: BTreeMap<String, FormDefinition>,
    }

    impl StubForms {
        fn with(mut self, id: &str, template: &str) -> Self {
            self.forms.insert(
                id.to_string(),
                FormDefinition {
                    id: id.to_string(),
                    title: None,
                    schema: json!({ "components": [] }),
                    template: template.to_string(),
                },
            );
            self
        }
    }

    #[async_trait]
    impl FormsRepo for StubForms {
        async fn get_form(&self, id: &str) -> Result<Option<FormDefinition>, RepoError> {
            Ok(self.forms.get(id).cloned())
        }

        async fn list_forms(&self) -> Result<Vec<String>, RepoError> {
            Ok(self.forms.keys().cloned().collect())
        }
    }

    fn service(forms: StubForms) -> FormRenderService {
        FormRenderService::new(
            Arc::new(forms),
            Arc::new(SubstitutionRenderService::default()),
        )
    }

    #[tokio::test]
    async fn renders_stored_form_with_envelope_payload() {
        let service = service(StubForms::default().with("contact", "Hello {name}"));

        let output = service
            .render_form("contact", json!({ "data": { "name": "Ada" } }))
            .await
            .expect("render succeeds");

        assert_eq!(output.text, "Hello Ada");
    }

    #[tokio::test]
    async fn unknown_form_is_reported() {
        let service = service(StubForms::default());

        let err = service
            .render(
                &TemplateSource::Form {
                    id: "missing".to_string(),
                },
                json!({}),
            )
            .await
            .expect_err("missing form");

        assert!(matches!(err, FormRenderError::UnknownForm(id) if id == "missing"));
    }

    #[tokio::test]
    async fn invalid_form_id_is_rejected_before_lookup() {
        let service = service(StubForms::default());

        let err = service
            .load_form("../etc/passwd")
            .await
            .expect_err("invalid id");

        assert!(matches!(err, FormRenderError::Domain(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn inline_template_outline() {
        let service = service(StubForms::default());

        let outline = service
            .outline(&TemplateSource::Inline {
                label: "inline".to_string(),
                template: "{@START_rows@}{a}{@END_rows@}{b}".to_string(),
            })
            .await
            .expect("outline");

        assert_eq!(outline.sections.len(), 1);
        assert_eq!(outline.placeholders, vec!["b"]);
    }

    #[tokio::test]
    async fn scalar_payload_is_a_validation_error() {
        let service = service(StubForms::default());

        let err = service
            .render_template("inline", "{a}", json!("not an object"))
            .await
            .expect_err("scalar payload");

        assert!(matches!(err, FormRenderError::Domain(_)));
    }
}
