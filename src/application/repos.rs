//! Repository traits describing the form-definition source.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::forms::FormDefinition;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Read access to stored form definitions. Writing forms belongs to the
/// builder UI and is not part of this crate.
#[async_trait]
pub trait FormsRepo: Send + Sync {
    async fn get_form(&self, id: &str) -> Result<Option<FormDefinition>, RepoError>;

    /// Ids of every stored form, sorted.
    async fn list_forms(&self) -> Result<Vec<String>, RepoError>;
}
