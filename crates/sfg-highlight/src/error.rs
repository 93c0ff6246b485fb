//! Error types for highlight operations.

use thiserror::Error;

/// Result type alias for highlight operations.
pub type HighlightResult<T> = Result<T, HighlightError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HighlightError {
    /// Fewer than two endpoints, or both endpoints are the same node.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Node not present in the graph view.
    #[error("Node not found: {0}")]
    UnknownNode(String),

    /// An edge's transmittance label has no parseable magnitude.
    #[error("Malformed weight on edge {edge}: {label:?}")]
    MalformedWeight { edge: String, label: String },

    /// Element JSON could not be turned into a graph.
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error(transparent)]
    Simplify(#[from] SimplifyError),
}

/// Reasons a simplify request is rejected before it reaches the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimplifyError {
    #[error("There is no path between the selected nodes")]
    NoPath,

    #[error("Your path is too short. Pick a path with only 2 edges (found {0})")]
    PathTooShort(usize),

    #[error("Your path is too long. Pick a path with only 2 edges (found {0})")]
    PathTooLong(usize),
}
