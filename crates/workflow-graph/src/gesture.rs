//! Two-click connection gesture
//!
//! The canvas connects nodes by picking a source, then a target. That
//! in-between "armed" state is interaction state, not graph state, so it
//! lives here rather than in the document.

use crate::mutation::{Mutation, RejectReason};
use crate::store::WorkflowGraphStore;
use crate::types::NodeId;

/// Where the gesture currently is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GestureState {
    #[default]
    Idle,
    /// A source node has been picked
    Armed(NodeId),
}

/// What a pick did
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// The picked node is now the pending source
    Armed,
    /// The picked node did not exist; still idle
    Ignored,
    /// The connection was added
    Connected { source: NodeId, target: NodeId },
    /// The store refused the connection; back to idle
    Rejected(RejectReason),
}

/// Pick-source-then-target state machine
#[derive(Debug, Default)]
pub struct ConnectGesture {
    state: GestureState,
}

impl ConnectGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// The armed source node, if any
    pub fn armed_source(&self) -> Option<&str> {
        match &self.state {
            GestureState::Armed(source) => Some(source.as_str()),
            GestureState::Idle => None,
        }
    }

    /// Feed one node pick from the canvas
    pub fn pick(&mut self, store: &mut WorkflowGraphStore, node_id: &str) -> GestureOutcome {
        match std::mem::take(&mut self.state) {
            GestureState::Idle => {
                if store.node(node_id).is_some() {
                    self.state = GestureState::Armed(node_id.to_string());
                    GestureOutcome::Armed
                } else {
                    GestureOutcome::Ignored
                }
            }
            GestureState::Armed(source) => match store.connect(&source, node_id) {
                Mutation::Applied => GestureOutcome::Connected {
                    source,
                    target: node_id.to_string(),
                },
                Mutation::Rejected(reason) => {
                    log::debug!("Connection gesture from '{}' rejected: {}", source, reason);
                    GestureOutcome::Rejected(reason)
                }
            },
        }
    }

    /// Drop any armed source
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }
}
