//! The workflow graph store
//!
//! [`WorkflowGraphStore`] is the only owner of a [`WorkflowDocument`]
//! during an editing session. Palette, canvas and properties panel hold
//! no graph state of their own; they call the mutators here and re-render
//! from [`WorkflowGraphStore::document`].
//!
//! After every call:
//! - node ids are unique
//! - every connection references two live nodes
//! - no connection is a self-loop or a duplicate ordered pair
//! - the selection, if any, references a live node
//!
//! Invalid input never panics and never errors; the mutator returns
//! [`Mutation::Rejected`] and leaves the document as it was.

use std::sync::Arc;

use crate::config::EditorConfig;
use crate::constants::defaults;
use crate::error::Result;
use crate::events::{EventSink, GraphEvent, NullEventSink};
use crate::mutation::{Mutation, RejectReason};
use crate::types::{
    Connection, NodeId, NodeType, Position, Properties, WorkflowDocument, WorkflowId,
    WorkflowNode, WorkflowStatus,
};
use crate::undo::UndoStack;
use crate::validation::{self, ValidationError, ValidationReport};

/// A partial update for a node's label and properties
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    /// New label, if it should change
    pub label: Option<String>,
    /// Keys to insert or overwrite; other keys are kept
    pub properties: Properties,
}

impl NodePatch {
    /// A patch that only renames the node
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            properties: Properties::new(),
        }
    }

    /// Add one property to the patch
    pub fn property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Build a patch from a UI payload such as `{"label": "Notify", "channel": "ops"}`
    ///
    /// A string `label` key becomes the label; everything else is a property.
    /// Non-object payloads yield an empty patch.
    pub fn from_json(value: serde_json::Value) -> Self {
        let serde_json::Value::Object(mut map) = value else {
            return Self::default();
        };

        let label = match map.remove("label") {
            Some(serde_json::Value::String(label)) => Some(label),
            Some(other) => {
                map.insert("label".to_string(), other);
                None
            }
            None => None,
        };

        Self {
            label,
            properties: map,
        }
    }
}

/// Sole owner and mutator of a workflow document
pub struct WorkflowGraphStore {
    document: WorkflowDocument,
    selected_node_id: Option<NodeId>,
    history: UndoStack,
    default_position: Position,
    events: Arc<dyn EventSink>,
}

impl WorkflowGraphStore {
    /// Create a store holding an empty, unsaved document
    pub fn new() -> Self {
        Self::with_config(&EditorConfig::default())
    }

    /// Create a store holding an empty, unsaved document
    pub fn with_config(config: &EditorConfig) -> Self {
        Self::from_document(WorkflowDocument::new(defaults::DOCUMENT_NAME), config)
    }

    /// Create a store around an existing document
    ///
    /// The document is normalized first (see [`Self::replace_document`]).
    pub fn from_document(doc: WorkflowDocument, config: &EditorConfig) -> Self {
        let mut store = Self {
            document: normalize(doc),
            selected_node_id: None,
            history: UndoStack::new(config.undo_depth),
            default_position: config.default_position,
            events: Arc::new(NullEventSink),
        };
        store.reset_history();
        store
    }

    /// Route change events to a sink
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    // =========================================================================
    // Node mutations
    // =========================================================================

    /// Add a node and return its fresh id
    ///
    /// A missing or blank label falls back to the type's default label.
    pub fn add_node(&mut self, node_type: NodeType, label: Option<&str>) -> NodeId {
        let id = self.fresh_node_id();
        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(node_type.default_label());

        self.document.nodes.push(
            WorkflowNode::new(id.clone(), node_type)
                .with_label(label)
                .with_position(self.default_position),
        );
        log::debug!("Added {} node '{}'", node_type, id);

        self.record();
        self.emit(GraphEvent::NodeAdded {
            node_id: id.clone(),
            node_type,
        });
        id
    }

    /// Move a node. Any finite coordinates are stored as given.
    pub fn move_node(&mut self, node_id: &str, x: f64, y: f64) -> Mutation {
        let position = Position::new(x, y);
        let Some(node) = self.document.find_node_mut(node_id) else {
            return reject_unknown(node_id);
        };
        if !position.is_finite() {
            return Mutation::Rejected(RejectReason::NonFiniteCoordinate {
                node_id: node_id.to_string(),
                x,
                y,
            });
        }
        node.position = position;

        self.record();
        self.emit(GraphEvent::NodeMoved {
            node_id: node_id.to_string(),
            x,
            y,
        });
        Mutation::Applied
    }

    /// Remove a node together with every connection touching it
    pub fn remove_node(&mut self, node_id: &str) -> Mutation {
        let Some(index) = self.document.nodes.iter().position(|n| n.id == node_id) else {
            return reject_unknown(node_id);
        };
        self.document.nodes.remove(index);

        let before = self.document.connections.len();
        self.document.connections.retain(|c| !c.touches(node_id));
        let removed_connections = before - self.document.connections.len();
        log::debug!(
            "Removed node '{}' and {} connection(s)",
            node_id,
            removed_connections
        );

        if self.selected_node_id.as_deref() == Some(node_id) {
            self.selected_node_id = None;
            self.emit(GraphEvent::SelectionChanged { node_id: None });
        }

        self.record();
        self.emit(GraphEvent::NodeRemoved {
            node_id: node_id.to_string(),
            removed_connections,
        });
        Mutation::Applied
    }

    /// Merge a patch into a node's label and properties
    pub fn update_node_props(&mut self, node_id: &str, patch: NodePatch) -> Mutation {
        let Some(node) = self.document.find_node_mut(node_id) else {
            return reject_unknown(node_id);
        };

        if let Some(label) = patch.label {
            node.label = label;
        }
        node.properties.extend(patch.properties);

        self.record();
        self.emit(GraphEvent::NodeUpdated {
            node_id: node_id.to_string(),
        });
        Mutation::Applied
    }

    // =========================================================================
    // Connection mutations
    // =========================================================================

    /// Add the directed connection `source -> target`
    ///
    /// Rejects unknown endpoints, self-loops and duplicates. The reverse
    /// edge `target -> source` is a different connection and is allowed.
    pub fn connect(&mut self, source: &str, target: &str) -> Mutation {
        if let Some(missing) = self.first_missing(source, target) {
            return reject_unknown(missing);
        }
        if source == target {
            return Mutation::Rejected(RejectReason::SelfLoop(source.to_string()));
        }
        if self.document.has_connection(source, target) {
            return Mutation::Rejected(RejectReason::DuplicateConnection {
                from: source.to_string(),
                to: target.to_string(),
            });
        }

        self.document
            .connections
            .push(Connection::new(source, target));
        log::debug!("Connected '{}' -> '{}'", source, target);

        self.record();
        self.emit(GraphEvent::Connected {
            source: source.to_string(),
            target: target.to_string(),
        });
        Mutation::Applied
    }

    /// Remove the directed connection `source -> target`
    pub fn disconnect(&mut self, source: &str, target: &str) -> Mutation {
        if let Some(missing) = self.first_missing(source, target) {
            return reject_unknown(missing);
        }
        let Some(index) = self
            .document
            .connections
            .iter()
            .position(|c| c.links(source, target))
        else {
            return Mutation::Rejected(RejectReason::NotConnected {
                from: source.to_string(),
                to: target.to_string(),
            });
        };
        self.document.connections.remove(index);
        log::debug!("Disconnected '{}' -> '{}'", source, target);

        self.record();
        self.emit(GraphEvent::Disconnected {
            source: source.to_string(),
            target: target.to_string(),
        });
        Mutation::Applied
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Select a node, or clear the selection with `None`
    ///
    /// An unknown id clears the selection and is reported as rejected.
    pub fn select_node(&mut self, node_id: Option<&str>) -> Mutation {
        let (next, outcome) = match node_id {
            None => (None, Mutation::Applied),
            Some(id) if self.document.contains_node(id) => {
                (Some(id.to_string()), Mutation::Applied)
            }
            Some(id) => (None, reject_unknown(id)),
        };

        if self.selected_node_id != next {
            self.selected_node_id = next;
            self.emit(GraphEvent::SelectionChanged {
                node_id: self.selected_node_id.clone(),
            });
        }
        outcome
    }

    pub fn selected_node_id(&self) -> Option<&str> {
        self.selected_node_id.as_deref()
    }

    /// The node the properties panel should show
    pub fn selected_node(&self) -> Option<&WorkflowNode> {
        self.selected_node_id
            .as_deref()
            .and_then(|id| self.document.find_node(id))
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate the current document
    ///
    /// Read-only; calling it twice on an unchanged document gives the same result.
    pub fn validate(&self) -> ValidationReport {
        ValidationReport::from_errors(&self.validation_errors())
    }

    /// Typed form of [`Self::validate`]
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        validation::validate_workflow(&self.document)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Read-only view of the whole document
    pub fn document(&self) -> &WorkflowDocument {
        &self.document
    }

    pub fn node(&self, node_id: &str) -> Option<&WorkflowNode> {
        self.document.find_node(node_id)
    }

    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.document.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.document.connections
    }

    pub fn node_count(&self) -> usize {
        self.document.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.document.connections.len()
    }

    /// Ids of the nodes `node_id` points to
    pub fn outgoing(&self, node_id: &str) -> Vec<&str> {
        self.document
            .outgoing(node_id)
            .map(|c| c.target_node_id.as_str())
            .collect()
    }

    /// Ids of the nodes pointing to `node_id`
    pub fn incoming(&self, node_id: &str) -> Vec<&str> {
        self.document
            .incoming(node_id)
            .map(|c| c.source_node_id.as_str())
            .collect()
    }

    pub fn is_connected(&self, source: &str, target: &str) -> bool {
        self.document.has_connection(source, target)
    }

    /// The trigger node, if there is exactly one
    pub fn trigger_node(&self) -> Option<&WorkflowNode> {
        let mut triggers = self.document.nodes_of_type(NodeType::Trigger);
        match (triggers.next(), triggers.next()) {
            (Some(trigger), None) => Some(trigger),
            _ => None,
        }
    }

    /// Nodes reachable from the unique trigger, in document order
    ///
    /// Empty when there is not exactly one trigger.
    pub fn reachable_from_trigger(&self) -> Vec<&WorkflowNode> {
        let Some(trigger) = self.trigger_node() else {
            return Vec::new();
        };
        let reachable = validation::reachable_from(&self.document, &trigger.id);
        self.document
            .nodes
            .iter()
            .filter(|n| reachable.contains(n.id.as_str()))
            .collect()
    }

    // =========================================================================
    // Document lifecycle
    // =========================================================================

    /// Start over with an empty, unsaved document
    pub fn new_document(&mut self, name: impl Into<String>) {
        self.replace_document(WorkflowDocument::new(name));
    }

    /// Replace the document wholesale (last writer wins)
    ///
    /// `doc` goes through [`validation::repair_document`] first; each repair
    /// is logged at `warn`. Selection and undo history reset.
    pub fn replace_document(&mut self, doc: WorkflowDocument) {
        self.document = normalize(doc);
        self.selected_node_id = None;
        self.reset_history();
        log::info!(
            "Loaded workflow '{}' ({} nodes, {} connections)",
            self.document.id,
            self.document.nodes.len(),
            self.document.connections.len()
        );
        self.emit(GraphEvent::DocumentReplaced {
            workflow_id: self.document.id.clone(),
        });
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Mutation {
        self.document.name = name.into();
        self.record();
        self.emit_metadata_changed();
        Mutation::Applied
    }

    pub fn set_status(&mut self, status: WorkflowStatus) -> Mutation {
        self.document.status = status;
        self.record();
        self.emit_metadata_changed();
        Mutation::Applied
    }

    /// Assign the persisted id. Not part of undo history.
    pub fn set_workflow_id(&mut self, id: WorkflowId) -> Mutation {
        self.document.id = id;
        self.emit_metadata_changed();
        Mutation::Applied
    }

    pub(crate) fn mark_saved(&mut self, updated_at: Option<String>) {
        self.document.updated_at = updated_at;
    }

    // =========================================================================
    // Undo / redo
    // =========================================================================

    pub fn undo(&mut self) -> Mutation {
        match self.history.undo() {
            Some(snapshot) => self.restore(snapshot),
            None => Mutation::Rejected(RejectReason::NothingToUndo),
        }
    }

    pub fn redo(&mut self) -> Mutation {
        match self.history.redo() {
            Some(snapshot) => self.restore(snapshot),
            None => Mutation::Rejected(RejectReason::NothingToRedo),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn restore(&mut self, snapshot: Result<WorkflowDocument>) -> Mutation {
        let mut doc = match snapshot {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("Failed to restore undo snapshot: {}", e);
                return Mutation::Rejected(RejectReason::HistoryUnavailable(e.to_string()));
            }
        };

        // Identity and save time belong to persistence, not to history
        doc.id = self.document.id.clone();
        doc.updated_at = self.document.updated_at.clone();
        self.document = doc;

        let stale_selection = self
            .selected_node_id
            .as_deref()
            .is_some_and(|id| !self.document.contains_node(id));
        if stale_selection {
            self.selected_node_id = None;
            self.emit(GraphEvent::SelectionChanged { node_id: None });
        }

        self.emit(GraphEvent::HistoryRestored {
            workflow_id: self.document.id.clone(),
        });
        Mutation::Applied
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn fresh_node_id(&self) -> NodeId {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if !self.document.contains_node(&id) {
                return id;
            }
        }
    }

    /// First of the two ids that is not a live node
    fn first_missing<'a>(&self, source: &'a str, target: &'a str) -> Option<&'a str> {
        [source, target]
            .into_iter()
            .find(|id| !self.document.contains_node(id))
    }

    fn record(&mut self) {
        if let Err(e) = self.history.push(&self.document) {
            log::warn!("Failed to record undo snapshot: {}", e);
        }
    }

    fn reset_history(&mut self) {
        if let Err(e) = self.history.reset(&self.document) {
            log::warn!("Failed to reset undo history: {}", e);
        }
    }

    fn emit(&self, event: GraphEvent) {
        if let Err(e) = self.events.send(event) {
            log::warn!("Dropped graph event: {}", e);
        }
    }

    fn emit_metadata_changed(&self) {
        self.emit(GraphEvent::MetadataChanged {
            workflow_id: self.document.id.clone(),
        });
    }
}

impl Default for WorkflowGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

fn reject_unknown(node_id: &str) -> Mutation {
    Mutation::Rejected(RejectReason::UnknownNode(node_id.to_string()))
}

/// Repair a loaded document, logging each dropped item
fn normalize(doc: WorkflowDocument) -> WorkflowDocument {
    let (doc, issues) = validation::repair_document(doc);
    for issue in &issues {
        log::warn!("Repaired workflow '{}': {}", doc.id, issue);
    }
    doc
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::builder::WorkflowBuilder;
    use crate::events::VecEventSink;

    fn three_node_store() -> (WorkflowGraphStore, NodeId, NodeId, NodeId) {
        let mut store = WorkflowGraphStore::new();
        let t = store.add_node(NodeType::Trigger, Some("Start"));
        let a = store.add_node(NodeType::Action, Some("Send email"));
        let e = store.add_node(NodeType::End, Some("Done"));
        (store, t, a, e)
    }

    /// Every connection endpoint is a live node
    fn assert_no_dangling(store: &WorkflowGraphStore) {
        for c in store.connections() {
            assert!(store.node(&c.source_node_id).is_some(), "dangling source {:?}", c);
            assert!(store.node(&c.target_node_id).is_some(), "dangling target {:?}", c);
        }
    }

    #[test]
    fn test_add_node_defaults() {
        let mut store = WorkflowGraphStore::new();
        let id = store.add_node(NodeType::Condition, None);
        let blank = store.add_node(NodeType::Delay, Some("   "));

        let node = store.node(&id).unwrap();
        assert_eq!(node.label, "Condition");
        assert_eq!(node.position, Position::default());
        assert!(node.properties.is_empty());
        assert_eq!(store.node(&blank).unwrap().label, "Delay");
    }

    #[test]
    fn test_add_node_uses_configured_position() {
        let config = EditorConfig {
            default_position: Position::new(50.0, 75.0),
            ..Default::default()
        };
        let mut store = WorkflowGraphStore::with_config(&config);
        let id = store.add_node(NodeType::Action, None);
        assert_eq!(store.node(&id).unwrap().position, Position::new(50.0, 75.0));
    }

    #[test]
    fn test_node_ids_stay_unique() {
        let mut store = WorkflowGraphStore::new();
        let mut live = Vec::new();
        for i in 0..50 {
            let node_type = NodeType::ALL[i % NodeType::ALL.len()];
            live.push(store.add_node(node_type, None));
            if i % 3 == 0 {
                let victim = live.remove(0);
                assert!(store.remove_node(&victim).is_applied());
            }
        }

        let ids: HashSet<&str> = store.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids.len(), store.node_count());
        assert_eq!(store.node_count(), live.len());
    }

    #[test]
    fn test_move_node() {
        let (mut store, t, _, _) = three_node_store();
        assert!(store.move_node(&t, -20.5, 1e6).is_applied());
        assert_eq!(store.node(&t).unwrap().position, Position::new(-20.5, 1e6));
    }

    #[test]
    fn test_move_to_non_finite_position_rejected() {
        let sink = Arc::new(VecEventSink::new());
        let (store, t, _, _) = three_node_store();
        let mut store = store.with_event_sink(sink.clone());
        store.move_node(&t, 5.0, 5.0);
        sink.clear();
        let before = store.document().clone();

        for (x, y) in [(f64::NAN, 5.0), (0.0, f64::INFINITY), (f64::NEG_INFINITY, 1.0)] {
            assert!(matches!(
                store.move_node(&t, x, y),
                Mutation::Rejected(RejectReason::NonFiniteCoordinate { .. })
            ));
        }

        assert_eq!(store.document(), &before);
        assert!(sink.events().is_empty());

        // History holds only finite snapshots, so undo still works
        assert!(store.undo().is_applied());
        assert_eq!(store.node(&t).unwrap().position, Position::default());
    }

    #[test]
    fn test_move_unknown_node_is_noop() {
        let (mut store, _, _, _) = three_node_store();
        let before = store.document().clone();

        let outcome = store.move_node("ghost", 1.0, 1.0);
        assert_eq!(
            outcome,
            Mutation::Rejected(RejectReason::UnknownNode("ghost".to_string()))
        );
        assert_eq!(store.document(), &before);
    }

    #[test]
    fn test_self_loop_rejected() {
        let (mut store, t, _, _) = three_node_store();
        let outcome = store.connect(&t, &t);
        assert_eq!(outcome, Mutation::Rejected(RejectReason::SelfLoop(t.clone())));
        assert_eq!(store.connection_count(), 0);
    }

    #[test]
    fn test_duplicate_connect_keeps_one_edge() {
        let (mut store, t, a, _) = three_node_store();
        assert!(store.connect(&t, &a).is_applied());
        assert!(matches!(
            store.connect(&t, &a),
            Mutation::Rejected(RejectReason::DuplicateConnection { .. })
        ));
        assert_eq!(store.connection_count(), 1);
    }

    #[test]
    fn test_reverse_edge_allowed() {
        let (mut store, t, a, _) = three_node_store();
        assert!(store.connect(&t, &a).is_applied());
        assert!(store.connect(&a, &t).is_applied());
        assert!(store.is_connected(&t, &a));
        assert!(store.is_connected(&a, &t));
    }

    #[test]
    fn test_connect_unknown_endpoint_rejected() {
        let (mut store, t, _, _) = three_node_store();
        assert_eq!(
            store.connect(&t, "ghost"),
            Mutation::Rejected(RejectReason::UnknownNode("ghost".to_string()))
        );
        assert_eq!(
            store.connect("ghost", &t),
            Mutation::Rejected(RejectReason::UnknownNode("ghost".to_string()))
        );
        assert_eq!(store.connection_count(), 0);
    }

    #[test]
    fn test_remove_node_cascades() {
        let (mut store, t, a, e) = three_node_store();
        store.connect(&t, &a);
        store.connect(&a, &e);
        store.connect(&t, &e);

        assert!(store.remove_node(&a).is_applied());

        assert!(store.node(&a).is_none());
        assert!(store.connections().iter().all(|c| !c.touches(&a)));
        assert_eq!(store.connection_count(), 1);
        assert_no_dangling(&store);
    }

    #[test]
    fn test_remove_unknown_node_is_noop() {
        let (mut store, _, _, _) = three_node_store();
        assert!(store.remove_node("ghost").is_rejected());
        assert_eq!(store.node_count(), 3);
    }

    #[test]
    fn test_remove_selected_node_clears_selection() {
        let (mut store, t, a, _) = three_node_store();
        store.select_node(Some(&a));
        store.remove_node(&t);
        assert_eq!(store.selected_node_id(), Some(a.as_str()));

        store.remove_node(&a);
        assert_eq!(store.selected_node_id(), None);
        assert!(store.selected_node().is_none());
    }

    #[test]
    fn test_select_unknown_clears_selection() {
        let (mut store, t, _, _) = three_node_store();
        assert!(store.select_node(Some(&t)).is_applied());
        assert_eq!(store.selected_node().unwrap().label, "Start");

        assert!(store.select_node(Some("ghost")).is_rejected());
        assert_eq!(store.selected_node_id(), None);

        store.select_node(Some(&t));
        assert!(store.select_node(None).is_applied());
        assert_eq!(store.selected_node_id(), None);
    }

    #[test]
    fn test_update_node_props_merges() {
        let (mut store, _, a, _) = three_node_store();
        store.update_node_props(
            &a,
            NodePatch::default()
                .property("to", serde_json::json!("ops@example.com"))
                .property("subject", serde_json::json!("Hello")),
        );
        store.update_node_props(
            &a,
            NodePatch::label("Notify ops").property("subject", serde_json::json!("Alert")),
        );

        let node = store.node(&a).unwrap();
        assert_eq!(node.label, "Notify ops");
        assert_eq!(node.node_type, NodeType::Action);
        assert_eq!(node.properties["to"], "ops@example.com");
        assert_eq!(node.properties["subject"], "Alert");
    }

    #[test]
    fn test_update_unknown_node_is_noop() {
        let (mut store, _, _, _) = three_node_store();
        let before = store.document().clone();
        assert!(store
            .update_node_props("ghost", NodePatch::label("x"))
            .is_rejected());
        assert_eq!(store.document(), &before);
    }

    #[test]
    fn test_patch_from_json_lifts_label() {
        let patch = NodePatch::from_json(serde_json::json!({
            "label": "Wait",
            "seconds": 30,
        }));
        assert_eq!(patch.label.as_deref(), Some("Wait"));
        assert_eq!(patch.properties["seconds"], 30);
        assert!(!patch.properties.contains_key("label"));

        let numeric = NodePatch::from_json(serde_json::json!({"label": 7}));
        assert!(numeric.label.is_none());
        assert_eq!(numeric.properties["label"], 7);

        assert_eq!(NodePatch::from_json(serde_json::json!([1, 2])), NodePatch::default());
    }

    #[test]
    fn test_disconnect() {
        let (mut store, t, a, _) = three_node_store();
        store.connect(&t, &a);

        assert!(matches!(
            store.disconnect(&a, &t),
            Mutation::Rejected(RejectReason::NotConnected { .. })
        ));
        assert!(store.disconnect(&t, &a).is_applied());
        assert_eq!(store.connection_count(), 0);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let (mut store, t, a, _) = three_node_store();
        store.connect(&t, &a);

        let first = store.validate();
        let snapshot = store.document().clone();
        let second = store.validate();

        assert_eq!(first, second);
        assert_eq!(store.document(), &snapshot);
    }

    #[test]
    fn test_validate_sees_live_connections() {
        let (mut store, t, a, e) = three_node_store();
        store.connect(&t, &a);
        store.connect(&a, &e);
        assert!(store.validate().valid);

        store.disconnect(&a, &e);
        let report = store.validate();
        assert!(!report.valid);
        assert_eq!(
            report.errors[0],
            "workflow must contain at least one reachable end node"
        );
    }

    #[test]
    fn test_outgoing_and_incoming_ids() {
        let (mut store, t, a, e) = three_node_store();
        store.connect(&t, &a);
        store.connect(&t, &e);
        store.connect(&a, &e);

        let key = t.clone();
        let out = store.outgoing(&key);
        drop(key);
        assert_eq!(out, vec![a.as_str(), e.as_str()]);
        assert_eq!(store.incoming(&e), vec![t.as_str(), a.as_str()]);
        assert!(store.incoming(&t).is_empty());
        assert!(store.outgoing("ghost").is_empty());
    }

    #[test]
    fn test_reachable_from_trigger() {
        let (mut store, t, a, e) = three_node_store();
        store.connect(&t, &a);

        let reachable: Vec<&str> = store
            .reachable_from_trigger()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(reachable, vec![t.as_str(), a.as_str()]);
        assert!(!reachable.contains(&e.as_str()));

        store.add_node(NodeType::Trigger, None);
        assert!(store.trigger_node().is_none());
        assert!(store.reachable_from_trigger().is_empty());
    }

    #[test]
    fn test_undo_restores_removed_node_and_edges() {
        let (mut store, t, a, e) = three_node_store();
        store.connect(&t, &a);
        store.connect(&a, &e);
        store.select_node(Some(&a));

        store.remove_node(&a);
        assert_eq!(store.connection_count(), 0);

        assert!(store.undo().is_applied());
        assert!(store.node(&a).is_some());
        assert!(store.is_connected(&t, &a));
        assert!(store.is_connected(&a, &e));

        assert!(store.redo().is_applied());
        assert!(store.node(&a).is_none());
        assert_no_dangling(&store);
    }

    #[test]
    fn test_undo_clears_stale_selection() {
        let mut store = WorkflowGraphStore::new();
        let t = store.add_node(NodeType::Trigger, None);
        store.select_node(Some(&t));

        store.undo();
        assert!(store.node(&t).is_none());
        assert_eq!(store.selected_node_id(), None);
    }

    #[test]
    fn test_undo_on_fresh_store() {
        let mut store = WorkflowGraphStore::new();
        assert!(!store.can_undo());
        assert_eq!(
            store.undo(),
            Mutation::Rejected(RejectReason::NothingToUndo)
        );
        assert_eq!(
            store.redo(),
            Mutation::Rejected(RejectReason::NothingToRedo)
        );
    }

    #[test]
    fn test_undo_keeps_persisted_id() {
        let mut store = WorkflowGraphStore::new();
        store.add_node(NodeType::Trigger, None);
        store.set_workflow_id(WorkflowId::new("wf-9"));

        store.undo();
        assert_eq!(store.document().id, WorkflowId::new("wf-9"));
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn test_replace_document_normalizes() {
        let doc = WorkflowBuilder::new("Imported")
            .with_id("wf-1")
            .add_node("t", NodeType::Trigger)
            .add_node("e", NodeType::End)
            .add_node("t", NodeType::Action)
            .connect("t", "e")
            .connect("t", "e")
            .connect("t", "t")
            .connect("t", "missing")
            .build();

        let mut store = WorkflowGraphStore::new();
        let t = store.add_node(NodeType::Action, None);
        store.select_node(Some(&t));

        store.replace_document(doc);

        assert_eq!(store.document().id, WorkflowId::new("wf-1"));
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.node("t").unwrap().node_type, NodeType::Trigger);
        assert_eq!(store.connections(), &[Connection::new("t", "e")]);
        assert_eq!(store.selected_node_id(), None);
        assert!(!store.can_undo());
        assert!(store.validate().valid);
    }

    #[test]
    fn test_metadata_mutations() {
        let mut store = WorkflowGraphStore::new();
        store.rename("Renewals");
        store.set_status(WorkflowStatus::Active);
        assert_eq!(store.document().name, "Renewals");
        assert_eq!(store.document().status, WorkflowStatus::Active);

        store.undo();
        assert_eq!(store.document().status, WorkflowStatus::Draft);
    }

    #[test]
    fn test_undo_depth_counts_steps() {
        let config = EditorConfig {
            undo_depth: 2,
            ..Default::default()
        };
        let mut store = WorkflowGraphStore::with_config(&config);
        store.add_node(NodeType::Trigger, None);
        store.add_node(NodeType::Action, None);
        store.add_node(NodeType::End, None);

        assert!(store.undo().is_applied());
        assert!(store.undo().is_applied());
        assert_eq!(store.undo(), Mutation::Rejected(RejectReason::NothingToUndo));
        assert_eq!(store.node_count(), 1);
    }

    struct ClosedSink;

    impl EventSink for ClosedSink {
        fn send(&self, _event: GraphEvent) -> std::result::Result<(), crate::events::EventError> {
            Err(crate::events::EventError::new("window closed"))
        }
    }

    #[test]
    fn test_failed_delivery_keeps_mutation() {
        let mut store = WorkflowGraphStore::new().with_event_sink(Arc::new(ClosedSink));
        let t = store.add_node(NodeType::Trigger, None);
        let e = store.add_node(NodeType::End, None);

        assert!(store.connect(&t, &e).is_applied());
        assert!(store.is_connected(&t, &e));
        assert!(store.can_undo());
    }

    #[test]
    fn test_events_for_applied_mutations_only() {
        let sink = Arc::new(VecEventSink::new());
        let mut store = WorkflowGraphStore::new().with_event_sink(sink.clone());

        let t = store.add_node(NodeType::Trigger, None);
        let e = store.add_node(NodeType::End, None);
        store.connect(&t, &e);
        store.connect(&t, &e);
        store.connect(&t, &t);
        store.move_node("ghost", 0.0, 0.0);
        store.select_node(Some(&e));
        store.remove_node(&e);

        let events = sink.events();
        assert_eq!(
            events,
            vec![
                GraphEvent::NodeAdded {
                    node_id: t.clone(),
                    node_type: NodeType::Trigger,
                },
                GraphEvent::NodeAdded {
                    node_id: e.clone(),
                    node_type: NodeType::End,
                },
                GraphEvent::Connected {
                    source: t.clone(),
                    target: e.clone(),
                },
                GraphEvent::SelectionChanged {
                    node_id: Some(e.clone()),
                },
                GraphEvent::SelectionChanged { node_id: None },
                GraphEvent::NodeRemoved {
                    node_id: e.clone(),
                    removed_connections: 1,
                },
            ]
        );
    }
}
