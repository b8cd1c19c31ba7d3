//! Fluent builder for workflow documents
//!
//! Builds documents with caller-chosen node ids, which the store's
//! `add_node` never allows. Meant for fixtures, imports and tests; the
//! result is plain data, so load it through
//! [`WorkflowGraphStore::replace_document`](crate::store::WorkflowGraphStore::replace_document)
//! to have it normalized.

use crate::types::{
    Connection, NodeType, Position, WorkflowDocument, WorkflowId, WorkflowNode, WorkflowStatus,
};

/// Fluent builder for constructing workflow documents
///
/// # Example
///
/// ```
/// use workflow_graph::{NodeType, WorkflowBuilder};
///
/// let doc = WorkflowBuilder::new("Welcome mail")
///     .add_node("start", NodeType::Trigger)
///     .add_node("send", NodeType::Action)
///     .with_label("Send email")
///     .with_property("template", serde_json::json!("welcome"))
///     .add_node("done", NodeType::End)
///     .connect("start", "send")
///     .connect("send", "done")
///     .build();
///
/// assert_eq!(doc.nodes.len(), 3);
/// ```
pub struct WorkflowBuilder {
    doc: WorkflowDocument,
}

impl WorkflowBuilder {
    /// Create a builder for an unsaved document
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            doc: WorkflowDocument::new(name),
        }
    }

    /// Set a persisted id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.doc.id = WorkflowId::new(id);
        self
    }

    pub fn with_status(mut self, status: WorkflowStatus) -> Self {
        self.doc.status = status;
        self
    }

    /// Add a node with the type's default label
    pub fn add_node(mut self, id: impl Into<String>, node_type: NodeType) -> Self {
        self.doc.nodes.push(WorkflowNode::new(id, node_type));
        self
    }

    /// Set the label on the most recently added node
    ///
    /// Must be called immediately after `add_node`.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        if let Some(node) = self.doc.nodes.last_mut() {
            node.label = label.into();
        }
        self
    }

    /// Set the position of the most recently added node
    pub fn at(mut self, x: f64, y: f64) -> Self {
        if let Some(node) = self.doc.nodes.last_mut() {
            node.position = Position::new(x, y);
        }
        self
    }

    /// Set one property on the most recently added node
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        if let Some(node) = self.doc.nodes.last_mut() {
            node.properties.insert(key.into(), value);
        }
        self
    }

    /// Add a connection. Endpoints are not checked.
    pub fn connect(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.doc.connections.push(Connection::new(source, target));
        self
    }

    /// Build the document without validation
    pub fn build(self) -> WorkflowDocument {
        self.doc
    }
}
