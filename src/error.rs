use crate::argocd::{ApplicationArgsBuilderError, ProjectArgsBuilderError};
use reqwest::StatusCode;
use thiserror::Error;

pub(crate) type Result<T> = std::result::Result<T, ArgoError>;

/// Failures surfaced by the Argo CD gateway and the orchestration built on it.
#[derive(Error, Debug)]
pub(crate) enum ArgoError {
    /// No configured instance carries the requested name.
    #[error("cannot find an argo instance named \"{0}\"")]
    NoMatchingInstance(String),

    /// The session endpoint rejected the credentials.
    #[error("getting unauthorized for Argo CD instance {url}")]
    Unauthorized { url: String },

    #[error("failed to get argo token from {url}: {status}")]
    TokenFetch { url: String, status: StatusCode },

    #[error("no credentials configured for argo instance {0}")]
    MissingCredentials(String),

    /// The remote already holds a project with a different spec.
    #[error("duplicate project detected, cannot overwrite existing")]
    DuplicateProject,

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Any other non-success answer from Argo CD.
    #[error("{context}: {status} {message}")]
    Remote {
        context: String,
        status: StatusCode,
        message: String,
    },

    #[error("no {0} found for {1}")]
    MissingField(&'static str, String),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("name or selector is required")]
    MissingLookup,

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ArgoError {
    pub(crate) fn remote(context: impl Into<String>, status: StatusCode, message: impl Into<String>) -> Self {
        Self::Remote {
            context: context.into(),
            status,
            message: message.into(),
        }
    }
}

impl From<ProjectArgsBuilderError> for ArgoError {
    fn from(err: ProjectArgsBuilderError) -> Self {
        Self::InvalidArgs(err.to_string())
    }
}

impl From<ApplicationArgsBuilderError> for ArgoError {
    fn from(err: ApplicationArgsBuilderError) -> Self {
        Self::InvalidArgs(err.to_string())
    }
}
