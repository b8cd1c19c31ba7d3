//! Error types for the workflow graph crate
//!
//! Store mutators never return these; they report rejections through
//! [`Mutation`](crate::mutation::Mutation). These errors cover the
//! fallible edges: snapshots, configuration and persistence.

use thiserror::Error;

/// Result type alias using WorkflowGraphError
pub type Result<T> = std::result::Result<T, WorkflowGraphError>;

/// Errors that can occur outside the in-memory mutation API
#[derive(Debug, Error)]
pub enum WorkflowGraphError {
    /// No workflow is stored under the id
    #[error("Workflow not found: {0}")]
    NotFound(String),

    /// Save was blocked because the graph did not validate
    #[error("Workflow is invalid: {}", .0.join("; "))]
    InvalidWorkflow(Vec<String>),

    /// A repository was handed a document still carrying the unsaved sentinel
    #[error("Workflow has no persisted id")]
    MissingId,

    /// The id cannot be used as a storage key
    #[error("Invalid workflow id: {0}")]
    InvalidId(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkflowGraphError {
    /// Create a not-found error for a workflow id
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(id.to_string())
    }
}
