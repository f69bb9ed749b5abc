//! Immutable submission values.
//!
//! The form widget hands over a parsed JSON document. It is converted once per
//! render into [`SubmissionValue`], so the template engine never shares or
//! mutates the caller's document.

use std::{borrow::Cow, collections::BTreeMap};

use serde_json::{Map, Number, Value};

use crate::domain::error::DomainError;

/// Keys the widget places next to `data` in a submission envelope.
const ENVELOPE_KEYS: [&str; 2] = ["metadata", "state"];

pub type Fields = BTreeMap<String, SubmissionValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<SubmissionValue>),
    Mapping(Fields),
}

impl SubmissionValue {
    /// String form used for substitution. Sequences and mappings have none and
    /// are treated as absent by callers.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            SubmissionValue::Null => Some(Cow::Borrowed("")),
            SubmissionValue::Bool(true) => Some(Cow::Borrowed("true")),
            SubmissionValue::Bool(false) => Some(Cow::Borrowed("false")),
            SubmissionValue::Number(number) => Some(Cow::Owned(format_number(number))),
            SubmissionValue::String(text) => Some(Cow::Borrowed(text.as_str())),
            SubmissionValue::Sequence(_) | SubmissionValue::Mapping(_) => None,
        }
    }

    pub fn as_row(&self) -> Option<&Fields> {
        match self {
            SubmissionValue::Mapping(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionValue::Null => "null",
            SubmissionValue::Bool(_) => "bool",
            SubmissionValue::Number(_) => "number",
            SubmissionValue::String(_) => "string",
            SubmissionValue::Sequence(_) => "sequence",
            SubmissionValue::Mapping(_) => "mapping",
        }
    }
}

impl From<Value> for SubmissionValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => SubmissionValue::Null,
            Value::Bool(flag) => SubmissionValue::Bool(flag),
            Value::Number(number) => SubmissionValue::Number(number),
            Value::String(text) => SubmissionValue::String(text),
            Value::Array(items) => {
                SubmissionValue::Sequence(items.into_iter().map(SubmissionValue::from).collect())
            }
            Value::Object(object) => SubmissionValue::Mapping(into_fields(object)),
        }
    }
}

/// Top-level field values of one submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    fields: Fields,
}

impl Submission {
    pub fn new(fields: Fields) -> Self {
        Self { fields }
    }

    /// Build a submission from the widget payload.
    ///
    /// Accepts either the envelope `{"data": {...}}` (optionally with
    /// `metadata`/`state` siblings) or a bare object of field values.
    pub fn from_payload(payload: Value) -> Result<Self, DomainError> {
        let object = match payload {
            Value::Object(object) => object,
            other => {
                return Err(DomainError::validation(format!(
                    "submission must be a JSON object, found {}",
                    SubmissionValue::from(other).kind()
                )));
            }
        };

        Ok(Self::new(into_fields(unwrap_envelope(object))))
    }

    pub fn get(&self, key: &str) -> Option<&SubmissionValue> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn unwrap_envelope(mut object: Map<String, Value>) -> Map<String, Value> {
    let is_envelope = matches!(object.get("data"), Some(Value::Object(_)))
        && object
            .keys()
            .all(|key| key == "data" || ENVELOPE_KEYS.contains(&key.as_str()));

    if is_envelope {
        if let Some(Value::Object(data)) = object.remove("data") {
            return data;
        }
    }

    object
}

fn into_fields(object: Map<String, Value>) -> Fields {
    object
        .into_iter()
        .map(|(key, value)| (key, SubmissionValue::from(value)))
        .collect()
}

/// Integral numbers print without a fractional part, matching what the form
/// widget displays (`2.0` renders as `2`).
fn format_number(number: &Number) -> String {
    if let Some(value) = number.as_i64() {
        return value.to_string();
    }
    if let Some(value) = number.as_u64() {
        return value.to_string();
    }

    match number.as_f64() {
        Some(value) if value == 0.0 => "0".to_string(),
        Some(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{value:.0}")
        }
        Some(value) => value.to_string(),
        None => number.to_string(),
    }
}
