//! Change notifications emitted by the store
//!
//! Every applied mutation is reported to an [`EventSink`] so consumers
//! (canvas, properties panel, palette) know to re-render from the
//! store's current document. Rejected mutations emit nothing.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{NodeId, NodeType, WorkflowId};

/// Receiver for graph change events
///
/// Implement this over whatever the UI listens on. A failed delivery is
/// logged by the store and never undoes the mutation that caused it.
pub trait EventSink: Send + Sync {
    fn send(&self, event: GraphEvent) -> Result<(), EventError>;
}

/// An event could not be delivered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("graph event not delivered: {reason}")]
pub struct EventError {
    pub reason: String,
}

impl EventError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Events emitted after an applied mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GraphEvent {
    #[serde(rename_all = "camelCase")]
    NodeAdded { node_id: NodeId, node_type: NodeType },

    #[serde(rename_all = "camelCase")]
    NodeMoved { node_id: NodeId, x: f64, y: f64 },

    /// A node and every connection touching it were removed
    #[serde(rename_all = "camelCase")]
    NodeRemoved {
        node_id: NodeId,
        removed_connections: usize,
    },

    #[serde(rename_all = "camelCase")]
    Connected { source: NodeId, target: NodeId },

    #[serde(rename_all = "camelCase")]
    Disconnected { source: NodeId, target: NodeId },

    /// Label or properties changed
    #[serde(rename_all = "camelCase")]
    NodeUpdated { node_id: NodeId },

    #[serde(rename_all = "camelCase")]
    SelectionChanged { node_id: Option<NodeId> },

    /// Name, status or id changed
    #[serde(rename_all = "camelCase")]
    MetadataChanged { workflow_id: WorkflowId },

    /// The whole document was swapped (open, new)
    #[serde(rename_all = "camelCase")]
    DocumentReplaced { workflow_id: WorkflowId },

    /// Undo or redo restored a snapshot
    #[serde(rename_all = "camelCase")]
    HistoryRestored { workflow_id: WorkflowId },
}

/// Discards every event; the store's default
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: GraphEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// Buffers events in memory, in emission order
///
/// Lets a consumer poll for changes with [`Self::take`] instead of
/// listening on a channel.
#[derive(Default)]
pub struct VecEventSink {
    events: Mutex<Vec<GraphEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything buffered so far
    pub fn events(&self) -> Vec<GraphEvent> {
        self.buffer().clone()
    }

    /// Drain the buffer
    pub fn take(&self) -> Vec<GraphEvent> {
        std::mem::take(&mut *self.buffer())
    }

    pub fn clear(&self) {
        self.buffer().clear();
    }

    // A panic while pushing cannot leave the Vec half-written
    fn buffer(&self) -> MutexGuard<'_, Vec<GraphEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: GraphEvent) -> Result<(), EventError> {
        self.buffer().push(event);
        Ok(())
    }
}
