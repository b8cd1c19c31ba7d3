//! Outcome of a store mutation
//!
//! Mutators never fail with an error: stale ids, non-finite coordinates,
//! self-loops and duplicate edges are rejected and the document is left
//! untouched. The rejection
//! reason is returned so a UI can explain it.

use thiserror::Error;

use crate::types::NodeId;

/// Result of a single mutation call
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// The document (or selection) changed
    Applied,
    /// The requested change was refused. The document is untouched; an
    /// unknown selection target still clears the selection.
    Rejected(RejectReason),
}

impl Mutation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Mutation::Rejected(_))
    }

    /// The rejection reason, if any
    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            Mutation::Applied => None,
            Mutation::Rejected(reason) => Some(reason),
        }
    }
}

/// Why a mutation was not applied
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("node '{0}' does not exist")]
    UnknownNode(NodeId),

    #[error("node '{node_id}' cannot move to non-finite position ({x}, {y})")]
    NonFiniteCoordinate { node_id: NodeId, x: f64, y: f64 },

    #[error("node '{0}' cannot be connected to itself")]
    SelfLoop(NodeId),

    #[error("connection '{from}' -> '{to}' already exists")]
    DuplicateConnection { from: NodeId, to: NodeId },

    #[error("there is no connection '{from}' -> '{to}'")]
    NotConnected { from: NodeId, to: NodeId },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    /// A history snapshot could not be restored
    #[error("history unavailable: {0}")]
    HistoryUnavailable(String),
}
