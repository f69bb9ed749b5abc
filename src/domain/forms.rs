use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

const MAX_FORM_ID_LEN: usize = 128;

/// Stored form: the widget schema plus the text template its submissions render into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub schema: serde_json::Value,
    pub template: String,
}

/// Form ids double as file stems, so only ASCII word characters and `-` are allowed.
pub fn validate_form_id(id: &str) -> Result<(), DomainError> {
    if id.is_empty() {
        return Err(DomainError::validation("form id must not be empty"));
    }

    if id.len() > MAX_FORM_ID_LEN {
        return Err(DomainError::validation(format!(
            "form id exceeds {MAX_FORM_ID_LEN} characters"
        )));
    }

    if let Some(invalid) = id
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-'))
    {
        return Err(DomainError::validation(format!(
            "form id `{id}` contains invalid character `{invalid}`"
        )));
    }

    Ok(())
}
