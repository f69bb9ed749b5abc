//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroU32, path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::template::DEFAULT_MAX_DECODE_PASSES;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "formsmith";
const DEFAULT_FORMS_DIR: &str = "forms";
const MAX_DECODE_PASSES_CEILING: u32 = 64;

/// Command-line arguments for the formsmith binary.
#[derive(Debug, Parser)]
#[command(
    name = "formsmith",
    version,
    about = "Render form submissions into formatted text"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FORMSMITH_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render a submission through a form's template.
    Render(RenderArgs),
    /// Print the sections and placeholders of a template as JSON.
    Inspect(InspectArgs),
    /// List the ids of stored forms.
    Forms,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the directory holding `<id>.json` form definitions.
    #[arg(long = "forms-directory", value_name = "PATH", global = true)]
    pub forms_directory: Option<PathBuf>,

    /// Override the maximum number of HTML-entity decode passes.
    #[arg(long = "max-decode-passes", value_name = "COUNT", global = true)]
    pub max_decode_passes: Option<u32>,
}

/// Exactly one template source: a stored form or a template file.
#[derive(Debug, Args, Clone)]
#[group(required = true, multiple = false)]
pub struct TemplateSourceArgs {
    /// Id of a stored form definition.
    #[arg(long = "form", value_name = "ID")]
    pub form: Option<String>,

    /// Path to a template file (`-` for stdin).
    #[arg(long = "template", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub template: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub source: TemplateSourceArgs,

    /// Submission JSON file; reads stdin when omitted or `-`.
    #[arg(
        long = "submission",
        value_name = "FILE",
        default_value = "-",
        value_hint = ValueHint::FilePath
    )]
    pub submission: PathBuf,

    /// Write the rendered text here instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Print the render report as JSON on stderr.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub report: bool,
}

#[derive(Debug, Args, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub source: TemplateSourceArgs,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub render: RenderSettings,
    pub forms: FormsSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub max_decode_passes: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct FormsSettings {
    pub directory: PathBuf,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings from layered sources.
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FORMSMITH").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    render: RawRenderSettings,
    forms: RawFormsSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(directory) = overrides.forms_directory.as_ref() {
            self.forms.directory = Some(directory.clone());
        }
        if let Some(passes) = overrides.max_decode_passes {
            self.render.max_decode_passes = Some(passes);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            render,
            forms,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let render = build_render_settings(render)?;
        let forms = build_forms_settings(forms)?;

        Ok(Self {
            logging,
            render,
            forms,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let passes = render
        .max_decode_passes
        .unwrap_or(DEFAULT_MAX_DECODE_PASSES);
    if passes > MAX_DECODE_PASSES_CEILING {
        return Err(LoadError::invalid(
            "render.max_decode_passes",
            format!("must not exceed {MAX_DECODE_PASSES_CEILING}"),
        ));
    }

    Ok(RenderSettings {
        max_decode_passes: non_zero_u32(passes, "render.max_decode_passes")?,
    })
}

fn build_forms_settings(forms: RawFormsSettings) -> Result<FormsSettings, LoadError> {
    let directory = forms
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FORMS_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "forms.directory",
            "path must not be empty",
        ));
    }

    Ok(FormsSettings { directory })
}

fn non_zero_u32(value: u32, key: &'static str) -> Result<NonZeroU32, LoadError> {
    NonZeroU32::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    max_decode_passes: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFormsSettings {
    directory: Option<PathBuf>,
}

/// Parse CLI arguments and load settings in one step.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

        assert_eq!(settings.logging.level, LevelFilter::INFO);
        assert!(matches!(settings.logging.format, LogFormat::Compact));
        assert_eq!(
            settings.render.max_decode_passes.get(),
            DEFAULT_MAX_DECODE_PASSES
        );
        assert_eq!(settings.forms.directory, PathBuf::from("forms"));
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.logging.level = Some("info".to_string());
        raw.render.max_decode_passes = Some(4);

        let overrides = GlobalOverrides {
            log_level: Some("debug".to_string()),
            max_decode_passes: Some(12),
            ..Default::default()
        };

        raw.apply_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert_eq!(settings.render.max_decode_passes.get(), 12);
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = GlobalOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn zero_decode_passes_is_rejected() {
        let mut raw = RawSettings::default();
        raw.render.max_decode_passes = Some(0);

        let err = Settings::from_raw(raw).expect_err("zero passes");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "render.max_decode_passes",
                ..
            }
        ));
    }

    #[test]
    fn excessive_decode_passes_are_rejected() {
        let mut raw = RawSettings::default();
        raw.render.max_decode_passes = Some(MAX_DECODE_PASSES_CEILING + 1);

        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut raw = RawSettings::default();
        raw.logging.level = Some("loud".to_string());

        assert!(matches!(
            Settings::from_raw(raw),
            Err(LoadError::Invalid {
                key: "logging.level",
                ..
            })
        ));
    }

    #[test]
    fn parse_render_arguments() {
        let args = CliArgs::parse_from([
            "formsmith",
            "render",
            "--form",
            "incident",
            "--submission",
            "/tmp/submission.json",
            "-o",
            "/tmp/out.txt",
            "--report",
            "--max-decode-passes",
            "3",
        ]);

        assert_eq!(args.overrides.max_decode_passes, Some(3));
        match args.command {
            Command::Render(render) => {
                assert_eq!(render.source.form.as_deref(), Some("incident"));
                assert!(render.source.template.is_none());
                assert_eq!(
                    render.submission,
                    std::path::Path::new("/tmp/submission.json")
                );
                assert_eq!(
                    render.output.as_deref(),
                    Some(std::path::Path::new("/tmp/out.txt"))
                );
                assert!(render.report);
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn render_submission_defaults_to_stdin() {
        let args = CliArgs::parse_from(["formsmith", "render", "--template", "t.txt"]);

        match args.command {
            Command::Render(render) => {
                assert_eq!(render.submission, std::path::Path::new("-"));
                assert!(render.output.is_none());
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn template_sources_are_mutually_exclusive() {
        let result = CliArgs::try_parse_from([
            "formsmith",
            "inspect",
            "--form",
            "a",
            "--template",
            "t.txt",
        ]);
        assert!(result.is_err());

        let missing = CliArgs::try_parse_from(["formsmith", "inspect"]);
        assert!(missing.is_err());
    }

    #[test]
    fn parse_forms_command_with_global_directory() {
        let args = CliArgs::parse_from(["formsmith", "forms", "--forms-directory", "/srv/forms"]);

        assert!(matches!(args.command, Command::Forms));
        assert_eq!(
            args.overrides.forms_directory.as_deref(),
            Some(std::path::Path::new("/srv/forms"))
        );
    }
}
