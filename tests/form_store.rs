use std::path::Path;
use std::sync::Arc;

use formsmith::application::forms::{FormRenderError, FormRenderService, TemplateSource};
use formsmith::application::render::SubstitutionRenderService;
use formsmith::application::repos::{FormsRepo, RepoError};
use formsmith::infra::forms::FsFormStore;
use serde_json::json;
use tempfile::TempDir;

fn write_form(dir: &Path, file: &str, body: serde_json::Value) {
    std::fs::write(dir.join(file), body.to_string()).expect("write form fixture");
}

fn fixture_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write_form(
        dir.path(),
        "incident.json",
        json!({
            "id": "incident",
            "title": "Incident report",
            "template": "Incident by {reporter}\n{@START_events@}* {time}: {what}\n{@END_events@}Severity: {severity}"
        }),
    );
    write_form(
        dir.path(),
        "contact.json",
        json!({ "id": "contact", "template": "From {email}" }),
    );
    write_form(
        dir.path(),
        "renamed.json",
        json!({ "id": "other", "template": "" }),
    );
    std::fs::write(dir.path().join("broken.json"), "{ not json").expect("write broken");
    std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write notes");
    dir
}

fn service(dir: &TempDir) -> FormRenderService {
    let forms: Arc<dyn FormsRepo> = Arc::new(FsFormStore::new(dir.path()));
    FormRenderService::new(forms, Arc::new(SubstitutionRenderService::default()))
}

#[tokio::test]
async fn lists_json_forms_sorted() {
    let dir = fixture_dir();
    let store = FsFormStore::new(dir.path());

    let ids = store.list_forms().await.expect("list forms");

    assert_eq!(ids, vec!["broken", "contact", "incident", "renamed"]);
}

#[tokio::test]
async fn loads_a_stored_definition() {
    let dir = fixture_dir();
    let store = FsFormStore::new(dir.path());

    let form = store
        .get_form("incident")
        .await
        .expect("read form")
        .expect("form exists");

    assert_eq!(form.id, "incident");
    assert_eq!(form.title.as_deref(), Some("Incident report"));
    assert!(store.get_form("absent").await.expect("read").is_none());
}

#[tokio::test]
async fn mismatched_or_malformed_definitions_are_integrity_errors() {
    let dir = fixture_dir();
    let store = FsFormStore::new(dir.path());

    let renamed = store.get_form("renamed").await.expect_err("id mismatch");
    assert!(matches!(renamed, RepoError::Integrity { .. }));

    let broken = store.get_form("broken").await.expect_err("malformed json");
    assert!(matches!(broken, RepoError::Integrity { .. }));
}

#[tokio::test]
async fn renders_a_stored_form_end_to_end() {
    let dir = fixture_dir();
    let service = service(&dir);

    let payload = json!({
        "data": {
            "reporter": "Grace",
            "events": [
                { "time": "", "what": "" },
                { "time": "09:00", "what": "alarm" },
                { "time": "09:05", "what": "resolved" }
            ],
            "severity": 2
        },
        "metadata": { "browser": "test" }
    });

    let output = service
        .render_form("incident", payload)
        .await
        .expect("render");

    assert_eq!(
        output.text,
        "Incident by Grace\n* 09:00: alarm\n* 09:05: resolved\nSeverity: 2"
    );
    assert!(output.report.retained_placeholders.is_empty());
}

#[tokio::test]
async fn unknown_forms_and_bad_payloads_are_reported() {
    let dir = fixture_dir();
    let service = service(&dir);

    let unknown = service
        .render(
            &TemplateSource::Form {
                id: "absent".to_string(),
            },
            json!({}),
        )
        .await
        .expect_err("unknown form");
    assert!(matches!(unknown, FormRenderError::UnknownForm(id) if id == "absent"));

    let not_object = service
        .render(
            &TemplateSource::Inline {
                label: "inline".to_string(),
                template: "{a}".to_string(),
            },
            json!([1, 2]),
        )
        .await
        .expect_err("array payload");
    assert!(matches!(not_object, FormRenderError::Domain(_)));
}
