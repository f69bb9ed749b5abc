use std::{path::Path, process, sync::Arc};

use formsmith::{
    application::{
        error::{AppError, ErrorReport},
        forms::{FormRenderService, TemplateSource},
        render::{RenderPipelineConfig, configure_render_service, render_service},
        repos::FormsRepo,
    },
    config::{self, TemplateSourceArgs},
    infra::{forms::FsFormStore, io, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let report = ErrorReport::from_error("formsmith::main", error);

    if dispatcher::has_been_set() {
        error!(
            target = report.source,
            error = %error,
            chain = ?report.messages,
            "application error"
        );
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(
            target = report.source,
            error = %error,
            chain = ?report.messages,
            "application error"
        );
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;
    configure_render_service(RenderPipelineConfig::from(&settings.render))
        .map_err(|err| AppError::unexpected(err.to_string()))?;

    let forms: Arc<dyn FormsRepo> = Arc::new(FsFormStore::new(settings.forms.directory.clone()));
    let service = FormRenderService::new(forms, render_service());

    match cli_args.command {
        config::Command::Render(args) => run_render(&service, args).await,
        config::Command::Inspect(args) => run_inspect(&service, args).await,
        config::Command::Forms => run_forms(&service, &settings).await,
    }
}

async fn run_render(service: &FormRenderService, args: config::RenderArgs) -> Result<(), AppError> {
    if args.source.template.as_deref().is_some_and(is_stdin) && is_stdin(&args.submission) {
        return Err(AppError::validation(
            "template and submission cannot both be read from stdin",
        ));
    }

    let source = template_source(&args.source).await?;
    let payload = io::read_json(&args.submission).await?;

    let output = service.render(&source, payload).await?;

    if args.report {
        let report = serde_json::to_string_pretty(&output.report)
            .map_err(|err| AppError::unexpected(format!("failed to encode report: {err}")))?;
        eprintln!("{report}");
    }

    io::write_text(args.output.as_deref(), &output.text).await?;

    if let Some(path) = args.output.as_ref() {
        info!(
            target = "formsmith::render",
            path = %path.display(),
            bytes = output.text.len(),
            "Wrote rendered text"
        );
    }

    Ok(())
}

async fn run_inspect(service: &FormRenderService, args: config::InspectArgs) -> Result<(), AppError> {
    let source = template_source(&args.source).await?;
    let outline = service.outline(&source).await?;

    let mut json = serde_json::to_string_pretty(&outline)
        .map_err(|err| AppError::unexpected(format!("failed to encode outline: {err}")))?;
    json.push('\n');
    io::write_text(None, &json).await?;
    Ok(())
}

async fn run_forms(
    service: &FormRenderService,
    settings: &config::Settings,
) -> Result<(), AppError> {
    let ids = service.list_forms().await?;

    info!(
        target = "formsmith::forms",
        directory = %settings.forms.directory.display(),
        count = ids.len(),
        "Listing stored forms"
    );

    let mut listing = ids.join("\n");
    if !listing.is_empty() {
        listing.push('\n');
    }
    io::write_text(None, &listing).await?;
    Ok(())
}

async fn template_source(args: &TemplateSourceArgs) -> Result<TemplateSource, AppError> {
    match (&args.form, &args.template) {
        (Some(id), None) => Ok(TemplateSource::Form { id: id.clone() }),
        (None, Some(path)) => Ok(TemplateSource::Inline {
            label: template_label(path),
            template: io::read_text(path).await?,
        }),
        _ => Err(AppError::validation(
            "exactly one of --form or --template is required",
        )),
    }
}

fn template_label(path: &Path) -> String {
    if is_stdin(path) {
        return "stdin".to_string();
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("template")
        .to_string()
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}
