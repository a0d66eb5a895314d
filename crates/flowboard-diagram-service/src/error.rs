//! Error types for the diagram services

use diagram_engine::DiagramError;
use thiserror::Error;

/// Result type alias using ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur in the persistence and publish services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No workflow identity is bound to the session (fatal: the editor
    /// cannot operate without one)
    #[error("No workflow identity is set")]
    MissingWorkflowId,

    /// The backend has no workflow under this id
    #[error("Workflow '{0}' was not found")]
    WorkflowNotFound(String),

    /// A referenced executor role no longer exists in the catalog
    #[error("Unknown executor role: {0}")]
    UnknownExecutorRole(String),

    /// A publish attempt is already running
    #[error("Publish already in progress")]
    PublishInFlight,

    /// Error from the diagram model
    #[error(transparent)]
    Diagram(#[from] DiagramError),

    /// HTTP transport failure (transient, reported but not retried)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Preview rendering failed
    #[error("Preview rendering failed: {0}")]
    Preview(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
