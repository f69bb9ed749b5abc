use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{forms::FormRenderError, repos::RepoError},
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Error chain flattened into display lines, outermost first.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("form `{0}` not found")]
    UnknownForm(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code for the CLI: 2 for bad input, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Domain(DomainError::Validation { .. })
            | AppError::UnknownForm(_)
            | AppError::Validation(_) => 2,
            AppError::Repo(RepoError::InvalidInput { .. }) => 2,
            AppError::Infra(_)
            | AppError::Repo(RepoError::Persistence(_))
            | AppError::Repo(RepoError::Integrity { .. })
            | AppError::Unexpected(_) => 1,
        }
    }
}

impl From<FormRenderError> for AppError {
    fn from(error: FormRenderError) -> Self {
        match error {
            FormRenderError::UnknownForm(id) => AppError::UnknownForm(id),
            FormRenderError::Domain(err) => AppError::Domain(err),
            FormRenderError::Repo(err) => AppError::Repo(err),
        }
    }
}
