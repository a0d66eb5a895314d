//! Error types for the diagram engine

use thiserror::Error;

/// Result type alias using DiagramError
pub type Result<T> = std::result::Result<T, DiagramError>;

/// Errors that can occur while mutating or serializing a diagram
#[derive(Debug, Error)]
pub enum DiagramError {
    /// An element id was not found in the diagram
    #[error("Unknown element: {0}")]
    UnknownElement(String),

    /// An element with this id already exists
    #[error("Duplicate element id: {0}")]
    DuplicateId(String),

    /// A connection endpoint is empty
    #[error("Connection '{id}' has a blank {end} endpoint")]
    BlankEndpoint { id: String, end: &'static str },

    /// A connection endpoint references a task node that does not exist
    #[error("Connection '{id}' references unknown task node '{node_id}'")]
    DanglingEndpoint { id: String, node_id: String },

    /// A connection endpoint references a stage or another connection
    #[error("Connection '{id}' endpoint '{target}' is not a task node")]
    InvalidEndpoint { id: String, target: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),
}
