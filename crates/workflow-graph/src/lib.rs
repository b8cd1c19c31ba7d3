//! Workflow Graph - design-time model for visual workflow builders
//!
//! This crate owns the graph a user assembles in a workflow editor:
//! typed nodes (trigger, action, condition, delay, end) joined by
//! directed connections. It provides:
//!
//! - A single owning store with the only legal mutations
//! - Structural validation with a complete, ordered diagnostic list
//! - Compressed snapshot-based undo/redo
//! - Change events for re-rendering consumers
//! - Whole-document persistence through a repository trait
//!
//! There is no execution engine; a workflow here is data to be edited,
//! validated and saved.
//!
//! # Architecture
//!
//! - `WorkflowGraphStore`: owns the document and enforces its invariants
//! - `validation`: trigger, terminal, reachability and dead-end checks
//! - `UndoStack`: compressed immutable snapshots for undo/redo
//! - `EventSink`: generic change notification (not tied to any UI)
//! - `EditorSession`: store plus `WorkflowRepository` for save/open
//!
//! # Example
//!
//! ```
//! use workflow_graph::{NodeType, WorkflowGraphStore};
//!
//! let mut store = WorkflowGraphStore::new();
//! let start = store.add_node(NodeType::Trigger, Some("Start"));
//! let done = store.add_node(NodeType::End, Some("Done"));
//! store.connect(&start, &done);
//!
//! assert!(store.validate().valid);
//! ```

pub mod builder;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod gesture;
pub mod mutation;
pub mod repository;
pub mod session;
pub mod store;
pub mod types;
pub mod undo;
pub mod validation;

// Re-export key types
pub use builder::WorkflowBuilder;
pub use config::{EditorConfig, SaveRule};
pub use error::{Result, WorkflowGraphError};
pub use events::{EventError, EventSink, GraphEvent, NullEventSink, VecEventSink};
pub use gesture::{ConnectGesture, GestureOutcome, GestureState};
pub use mutation::{Mutation, RejectReason};
pub use repository::{FileRepository, InMemoryRepository, WorkflowRepository, WorkflowSummary};
pub use session::EditorSession;
pub use store::{NodePatch, WorkflowGraphStore};
pub use types::{
    Connection, NodeId, NodeType, Position, Properties, WorkflowDocument, WorkflowId,
    WorkflowNode, WorkflowStatus,
};
pub use undo::UndoStack;
pub use validation::{
    repair_document, validate_workflow, IntegrityIssue, ValidationError, ValidationReport,
};
