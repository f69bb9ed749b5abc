//! Filesystem-backed form definitions: one `<id>.json` file per form.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::application::repos::{FormsRepo, RepoError};
use crate::domain::forms::{FormDefinition, validate_form_id};

const FORM_FILE_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct FsFormStore {
    root: PathBuf,
}

impl FsFormStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, RepoError> {
        validate_form_id(id).map_err(|err| RepoError::InvalidInput {
            message: err.to_string(),
        })?;
        Ok(self.root.join(format!("{id}.{FORM_FILE_EXTENSION}")))
    }
}

#[async_trait]
impl FormsRepo for FsFormStore {
    async fn get_form(&self, id: &str) -> Result<Option<FormDefinition>, RepoError> {
        let path = self.path_for(id)?;

        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(RepoError::from_persistence(err)),
        };

        let definition: FormDefinition =
            serde_json::from_str(&raw).map_err(|err| RepoError::Integrity {
                message: format!("{} is not a valid form definition: {err}", path.display()),
            })?;

        if definition.id != id {
            return Err(RepoError::Integrity {
                message: format!(
                    "{} declares id `{}`, expected `{id}`",
                    path.display(),
                    definition.id
                ),
            });
        }

        debug!(
            target = "formsmith::infra::forms",
            form = id,
            path = %path.display(),
            "Loaded form definition"
        );

        Ok(Some(definition))
    }

    async fn list_forms(&self) -> Result<Vec<String>, RepoError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(RepoError::from_persistence(err)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(RepoError::from_persistence)?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FORM_FILE_EXTENSION) {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            if validate_form_id(stem).is_ok() {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_directory_lists_nothing() {
        let store = FsFormStore::new("/nonexistent/formsmith-forms");
        assert!(store.list_forms().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn traversal_ids_are_rejected() {
        let store = FsFormStore::new("forms");
        let err = store.get_form("../secret").await.expect_err("invalid id");
        assert!(matches!(err, RepoError::InvalidInput { .. }));
    }
}
