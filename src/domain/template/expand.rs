//! Section expansion.
//!
//! # Sentinel rows
//!
//! The form widget keeps one hidden template row at the head of every
//! repeating section (datagrid) so the builder can always clone a fresh row.
//! That row is part of the submitted array but never carries user input, so
//! the first [`SENTINEL_ROWS`] entries of a repeating section are always
//! discarded before expansion. Callers that build submissions by hand must
//! prepend a sentinel row as well.

use std::{borrow::Cow, collections::BTreeSet};

use serde::Serialize;

use crate::domain::submission::{Fields, Submission, SubmissionValue};

use super::placeholder::substitute;

/// Number of leading rows dropped from every repeating section.
pub const SENTINEL_ROWS: usize = 1;

/// What happened to one section block during a render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionOutcome {
    /// Backed by a sequence; expanded once per non-sentinel row.
    Repeating {
        rows: usize,
        known_fields: Vec<String>,
        undeclared_fields: Vec<String>,
    },
    /// Backed by a non-sequence value; resolved against top-level data once.
    Plain,
    /// Section id missing from the submission (or `null`); contributes nothing.
    Dropped,
}

impl SectionOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            SectionOutcome::Repeating { .. } => "repeating",
            SectionOutcome::Plain => "plain",
            SectionOutcome::Dropped => "dropped",
        }
    }
}

/// How a placeholder resolved within one row.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution<'d> {
    Value(Cow<'d, str>),
    /// Some sibling row defines the key, this one does not.
    Declared,
    /// No row defines the key.
    Undeclared,
}

struct RowScope<'d, 'k> {
    row: Option<&'d Fields>,
    known: &'k BTreeSet<&'d str>,
}

impl<'d> RowScope<'d, '_> {
    fn resolve(&self, key: &str) -> Resolution<'d> {
        if let Some(text) = self
            .row
            .and_then(|fields| fields.get(key))
            .and_then(SubmissionValue::as_text)
        {
            return Resolution::Value(text);
        }

        if self.known.contains(key) {
            Resolution::Declared
        } else {
            Resolution::Undeclared
        }
    }
}

/// Expand one section block into `out`.
pub(super) fn expand_section(
    id: &str,
    body: &str,
    submission: &Submission,
    out: &mut String,
) -> SectionOutcome {
    match submission.get(id) {
        Some(SubmissionValue::Sequence(items)) => expand_rows(body, items, out),
        Some(SubmissionValue::Null) | None => SectionOutcome::Dropped,
        Some(_) => {
            substitute(body, out, |key| {
                Some(
                    submission
                        .get(key)
                        .and_then(SubmissionValue::as_text)
                        .unwrap_or(Cow::Borrowed("")),
                )
            });
            SectionOutcome::Plain
        }
    }
}

fn expand_rows(body: &str, items: &[SubmissionValue], out: &mut String) -> SectionOutcome {
    let rows = items.get(SENTINEL_ROWS..).unwrap_or_default();
    let known = known_fields(rows);
    let mut undeclared: BTreeSet<String> = BTreeSet::new();

    for item in rows {
        let scope = RowScope {
            row: item.as_row(),
            known: &known,
        };

        substitute(body, out, |key| match scope.resolve(key) {
            Resolution::Value(text) => Some(text),
            Resolution::Declared => Some(Cow::Borrowed("")),
            Resolution::Undeclared => {
                if !undeclared.contains(key) {
                    undeclared.insert(key.to_string());
                }
                Some(Cow::Borrowed(""))
            }
        });
    }

    SectionOutcome::Repeating {
        rows: rows.len(),
        known_fields: known.into_iter().map(str::to_string).collect(),
        undeclared_fields: undeclared.into_iter().collect(),
    }
}

/// Union of keys across rows that are mappings. Empty sequences, `null` and
/// scalar rows expand as empty rows and contribute no keys.
fn known_fields(rows: &[SubmissionValue]) -> BTreeSet<&str> {
    rows.iter()
        .filter_map(SubmissionValue::as_row)
        .flat_map(|fields| fields.keys().map(String::as_str))
        .collect()
}
