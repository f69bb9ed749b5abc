//! Formsmith renders form submissions into formatted text.
//!
//! The core is [`domain::template`]: a pure engine substituting `{key}`
//! placeholders and expanding repeating section blocks. Around it sit the
//! render service (logging and metrics), the form-definition source and the
//! `formsmith` CLI.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
