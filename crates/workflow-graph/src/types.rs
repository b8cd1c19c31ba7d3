//! Core types for workflow documents
//!
//! These types define the shape of a workflow graph: typed nodes,
//! directed connections between them, and the document that owns both.
//! They are plain data; the invariants are enforced by
//! [`WorkflowGraphStore`](crate::store::WorkflowGraphStore).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::UNSAVED_WORKFLOW_ID;

/// Unique identifier for a node
pub type NodeId = String;

/// Type-specific node configuration, opaque to the graph engine
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Identifier of a workflow document
///
/// Documents that have never been persisted carry the `local` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(String);

impl WorkflowId {
    /// Wrap an existing persisted id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The sentinel id of a document that has not been saved yet
    pub fn unsaved() -> Self {
        Self(UNSAVED_WORKFLOW_ID.to_string())
    }

    /// Mint a fresh id for a first save
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Whether this is the unsaved sentinel
    pub fn is_unsaved(&self) -> bool {
        self.0 == UNSAVED_WORKFLOW_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::unsaved()
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Entry point of the workflow. Exactly one per valid graph.
    Trigger,
    /// A concrete step (send email, call API, ...)
    Action,
    /// Branches on an expression stored in the node properties
    Condition,
    /// Waits before continuing
    Delay,
    /// Terminal node
    End,
}

impl NodeType {
    /// The palette catalogue, in display order
    pub const ALL: [NodeType; 5] = [
        NodeType::Trigger,
        NodeType::Action,
        NodeType::Condition,
        NodeType::Delay,
        NodeType::End,
    ];

    /// Label given to a freshly added node of this type
    pub fn default_label(&self) -> &'static str {
        match self {
            NodeType::Trigger => "Trigger",
            NodeType::Action => "Action",
            NodeType::Condition => "Condition",
            NodeType::Delay => "Delay",
            NodeType::End => "End",
        }
    }

    /// Whether nodes of this type may legitimately have no outgoing connection
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeType::End)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Trigger => "trigger",
            NodeType::Action => "action",
            NodeType::Condition => "condition",
            NodeType::Delay => "delay",
            NodeType::End => "end",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas coordinates of a node. Layout only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// NaN and infinities cannot be written as JSON numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A node instance in a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Node kind, fixed at creation
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// User-editable display name
    pub label: String,
    /// Position in the editor canvas
    #[serde(default)]
    pub position: Position,
    /// Type-specific configuration
    #[serde(default)]
    pub properties: Properties,
}

impl WorkflowNode {
    /// Create a node with the type's default label at the origin
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            label: node_type.default_label().to_string(),
            position: Position::default(),
            properties: Properties::new(),
        }
    }

    /// Replace the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Replace the position
    pub fn with_position(mut self, position: impl Into<Position>) -> Self {
        self.position = position.into();
        self
    }
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Node the edge leaves
    pub source_node_id: NodeId,
    /// Node the edge enters
    pub target_node_id: NodeId,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_node_id: source.into(),
            target_node_id: target.into(),
        }
    }

    /// Whether either endpoint is the given node
    pub fn touches(&self, node_id: &str) -> bool {
        self.source_node_id == node_id || self.target_node_id == node_id
    }

    /// Whether this edge is exactly `source -> target`
    pub fn links(&self, source: &str, target: &str) -> bool {
        self.source_node_id == source && self.target_node_id == target
    }
}

/// Lifecycle status of a workflow. Descriptive only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Archived,
}

/// A complete workflow document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    /// Persisted id, or the unsaved sentinel
    #[serde(default)]
    pub id: WorkflowId,
    /// Human-readable name
    pub name: String,
    #[serde(default)]
    pub status: WorkflowStatus,
    /// Nodes in insertion order
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    /// Directed edges between nodes
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// RFC 3339 timestamp of the last save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl WorkflowDocument {
    /// Create a new empty, unsaved document
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: WorkflowId::unsaved(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by ID (mutable)
    pub(crate) fn find_node_mut(&mut self, id: &str) -> Option<&mut WorkflowNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Whether the edge `source -> target` exists
    pub fn has_connection(&self, source: &str, target: &str) -> bool {
        self.connections.iter().any(|c| c.links(source, target))
    }

    /// Get connections going out of a node
    pub fn outgoing<'a, 'b>(
        &'a self,
        node_id: &'b str,
    ) -> impl Iterator<Item = &'a Connection> + use<'a, 'b> {
        self.connections
            .iter()
            .filter(move |c| c.source_node_id == node_id)
    }

    /// Get connections coming into a node
    pub fn incoming<'a, 'b>(
        &'a self,
        node_id: &'b str,
    ) -> impl Iterator<Item = &'a Connection> + use<'a, 'b> {
        self.connections
            .iter()
            .filter(move |c| c.target_node_id == node_id)
    }

    /// Get all nodes of one type, in document order
    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &WorkflowNode> + '_ {
        self.nodes.iter().filter(move |n| n.node_type == node_type)
    }
}
