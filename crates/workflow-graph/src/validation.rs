//! Graph validation for workflow documents
//!
//! Checks, in a fixed order so diagnostics are reproducible:
//! 1. exactly one trigger node
//! 2. at least one end node reachable from the trigger
//! 3. every node reachable from the trigger
//! 4. every non-end node has an outgoing connection
//!
//! Self-loops and duplicate connections cannot exist in a store-owned
//! document and are not rechecked. Cycles are allowed.
//!
//! Documents arriving from outside the store (files, imports) go through
//! [`repair_document`] first, which drops whatever breaks the store
//! invariants and reports each drop as an [`IntegrityIssue`].

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, NodeType, Position, WorkflowDocument, WorkflowNode};

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No trigger node at all
    MissingTrigger,
    /// More than one trigger node
    MultipleTriggers { count: usize },
    /// No end node, or none reachable from the trigger
    NoReachableEnd,
    /// A node cannot be reached from the trigger
    UnreachableNode { node_id: NodeId, label: String },
    /// A non-end node has no outgoing connection
    DeadEnd { node_id: NodeId, label: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTrigger => {
                write!(f, "workflow must contain exactly one trigger node")
            }
            Self::MultipleTriggers { count } => write!(
                f,
                "workflow must contain exactly one trigger node, found {}",
                count
            ),
            Self::NoReachableEnd => {
                write!(f, "workflow must contain at least one reachable end node")
            }
            Self::UnreachableNode { node_id, label } => write!(
                f,
                "node '{}' ({}) is not reachable from the trigger",
                label, node_id
            ),
            Self::DeadEnd { node_id, label } => write!(
                f,
                "node '{}' ({}) has no outgoing connection and is not an end node",
                label, node_id
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Flattened validation result handed to UI and save flows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when `errors` is empty
    pub valid: bool,
    /// Every violation found, in check order
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn from_errors(errors: &[ValidationError]) -> Self {
        Self::from_checks(&[], errors)
    }

    /// Report for a raw document: repairs first, then graph errors
    pub fn from_checks(issues: &[IntegrityIssue], errors: &[ValidationError]) -> Self {
        let errors: Vec<String> = issues
            .iter()
            .map(ToString::to_string)
            .chain(errors.iter().map(ToString::to_string))
            .collect();
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validate a workflow document
///
/// Returns all validation errors found (not just the first).
pub fn validate_workflow(doc: &WorkflowDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if doc.nodes.is_empty() {
        errors.push(ValidationError::MissingTrigger);
        return errors;
    }

    let triggers: Vec<&WorkflowNode> = doc.nodes_of_type(NodeType::Trigger).collect();
    match triggers.len() {
        0 => errors.push(ValidationError::MissingTrigger),
        1 => {}
        count => errors.push(ValidationError::MultipleTriggers { count }),
    }

    let reachable = match triggers.as_slice() {
        [trigger] => Some(reachable_from(doc, &trigger.id)),
        _ => None,
    };

    validate_terminal(doc, reachable.as_ref(), &mut errors);
    if let (Some(reachable), [trigger]) = (reachable.as_ref(), triggers.as_slice()) {
        validate_reachability(doc, &trigger.id, reachable, &mut errors);
    }
    validate_dead_ends(doc, &mut errors);

    errors
}

/// Compute the set of node ids reachable from `start` by following
/// connections forward. `start` itself is included.
///
/// Built fresh from the live connection set on every call.
pub fn reachable_from<'a>(doc: &'a WorkflowDocument, start: &'a str) -> HashSet<&'a str> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for conn in &doc.connections {
        adjacency
            .entry(conn.source_node_id.as_str())
            .or_default()
            .push(conn.target_node_id.as_str());
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(node_id) = queue.pop_front() {
        for &next in adjacency.get(node_id).into_iter().flatten() {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    visited
}

/// Check that some end node exists and, when the trigger is known, is reachable
fn validate_terminal(
    doc: &WorkflowDocument,
    reachable: Option<&HashSet<&str>>,
    errors: &mut Vec<ValidationError>,
) {
    let mut ends = doc.nodes_of_type(NodeType::End);
    let satisfied = match reachable {
        Some(reachable) => ends.any(|n| reachable.contains(n.id.as_str())),
        // Without a unique trigger there is nothing to traverse from
        None => ends.next().is_some(),
    };

    if !satisfied {
        errors.push(ValidationError::NoReachableEnd);
    }
}

/// Report every node the trigger cannot reach
fn validate_reachability(
    doc: &WorkflowDocument,
    trigger_id: &str,
    reachable: &HashSet<&str>,
    errors: &mut Vec<ValidationError>,
) {
    for node in &doc.nodes {
        if node.id != trigger_id && !reachable.contains(node.id.as_str()) {
            errors.push(ValidationError::UnreachableNode {
                node_id: node.id.clone(),
                label: node.label.clone(),
            });
        }
    }
}

/// Report non-end nodes with no outgoing connection
fn validate_dead_ends(doc: &WorkflowDocument, errors: &mut Vec<ValidationError>) {
    let sources: HashSet<&str> = doc
        .connections
        .iter()
        .map(|c| c.source_node_id.as_str())
        .collect();

    for node in &doc.nodes {
        if !node.node_type.is_terminal() && !sources.contains(node.id.as_str()) {
            errors.push(ValidationError::DeadEnd {
                node_id: node.id.clone(),
                label: node.label.clone(),
            });
        }
    }
}

/// Something [`repair_document`] had to drop or reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// A later node reused an earlier node's id
    DuplicateNodeId { node_id: NodeId },
    /// A node position was NaN or infinite and was reset to the origin
    NonFinitePosition { node_id: NodeId },
    /// A connection referenced a node that does not exist
    DanglingConnection { source: NodeId, target: NodeId },
    SelfLoop { node_id: NodeId },
    DuplicateConnection { source: NodeId, target: NodeId },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateNodeId { node_id } => {
                write!(f, "node id '{}' is used more than once", node_id)
            }
            Self::NonFinitePosition { node_id } => {
                write!(f, "node '{}' has a non-finite position", node_id)
            }
            Self::DanglingConnection { source, target } => write!(
                f,
                "connection '{}' -> '{}' references a missing node",
                source, target
            ),
            Self::SelfLoop { node_id } => {
                write!(f, "connection '{}' -> '{}' is a self-loop", node_id, node_id)
            }
            Self::DuplicateConnection { source, target } => write!(
                f,
                "connection '{}' -> '{}' appears more than once",
                source, target
            ),
        }
    }
}

impl std::error::Error for IntegrityIssue {}

/// Bring an externally supplied document in line with the store invariants
///
/// The first node with a given id wins. Connections are dropped when they
/// dangle, loop onto their source or repeat an earlier pair. Returns the
/// repaired document and one issue per change, in document order.
pub fn repair_document(mut doc: WorkflowDocument) -> (WorkflowDocument, Vec<IntegrityIssue>) {
    let mut issues = Vec::new();

    let mut node_ids: HashSet<NodeId> = HashSet::new();
    doc.nodes.retain(|node| {
        let unique = node_ids.insert(node.id.clone());
        if !unique {
            issues.push(IntegrityIssue::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
        unique
    });

    for node in &mut doc.nodes {
        if !node.position.is_finite() {
            node.position = Position::default();
            issues.push(IntegrityIssue::NonFinitePosition {
                node_id: node.id.clone(),
            });
        }
    }

    let mut pairs: HashSet<(NodeId, NodeId)> = HashSet::new();
    doc.connections.retain(|c| {
        let issue = if !node_ids.contains(&c.source_node_id)
            || !node_ids.contains(&c.target_node_id)
        {
            Some(IntegrityIssue::DanglingConnection {
                source: c.source_node_id.clone(),
                target: c.target_node_id.clone(),
            })
        } else if c.source_node_id == c.target_node_id {
            Some(IntegrityIssue::SelfLoop {
                node_id: c.source_node_id.clone(),
            })
        } else if !pairs.insert((c.source_node_id.clone(), c.target_node_id.clone())) {
            Some(IntegrityIssue::DuplicateConnection {
                source: c.source_node_id.clone(),
                target: c.target_node_id.clone(),
            })
        } else {
            None
        };

        match issue {
            Some(issue) => {
                issues.push(issue);
                false
            }
            None => true,
        }
    });

    (doc, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WorkflowBuilder;

    #[test]
    fn test_empty_document_short_circuits() {
        let doc = WorkflowBuilder::new("Empty").build();
        let errors = validate_workflow(&doc);
        assert_eq!(errors, vec![ValidationError::MissingTrigger]);
    }

    #[test]
    fn test_trigger_to_end_is_valid() {
        let doc = WorkflowBuilder::new("Minimal")
            .add_node("t", NodeType::Trigger)
            .add_node("e", NodeType::End)
            .connect("t", "e")
            .build();

        let errors = validate_workflow(&doc);
        assert!(errors.is_empty(), "Expected no errors, got: {:?}", errors);
    }

    #[test]
    fn test_dead_end_action_without_end() {
        let doc = WorkflowBuilder::new("No end")
            .add_node("t", NodeType::Trigger)
            .add_node("a", NodeType::Action)
            .connect("t", "a")
            .build();

        let errors = validate_workflow(&doc);
        assert_eq!(
            errors,
            vec![
                ValidationError::NoReachableEnd,
                ValidationError::DeadEnd {
                    node_id: "a".to_string(),
                    label: "Action".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_multiple_triggers_reports_count() {
        let doc = WorkflowBuilder::new("Two starts")
            .add_node("t1", NodeType::Trigger)
            .add_node("t2", NodeType::Trigger)
            .add_node("e", NodeType::End)
            .connect("t1", "e")
            .connect("t2", "e")
            .build();

        let errors = validate_workflow(&doc);
        assert_eq!(errors, vec![ValidationError::MultipleTriggers { count: 2 }]);
        assert_eq!(
            errors[0].to_string(),
            "workflow must contain exactly one trigger node, found 2"
        );
    }

    #[test]
    fn test_missing_trigger_skips_reachability() {
        let doc = WorkflowBuilder::new("Headless")
            .add_node("a", NodeType::Action)
            .add_node("e", NodeType::End)
            .connect("a", "e")
            .build();

        let errors = validate_workflow(&doc);
        assert_eq!(errors, vec![ValidationError::MissingTrigger]);
    }

    #[test]
    fn test_unreachable_node_named() {
        let doc = WorkflowBuilder::new("Island")
            .add_node("t", NodeType::Trigger)
            .add_node("e", NodeType::End)
            .add_node("d", NodeType::Delay)
            .with_label("Wait a day")
            .connect("t", "e")
            .connect("d", "e")
            .build();

        let errors = validate_workflow(&doc);
        assert_eq!(
            errors,
            vec![ValidationError::UnreachableNode {
                node_id: "d".to_string(),
                label: "Wait a day".to_string(),
            }]
        );
        assert_eq!(
            errors[0].to_string(),
            "node 'Wait a day' (d) is not reachable from the trigger"
        );
    }

    #[test]
    fn test_unreachable_end_reported() {
        let doc = WorkflowBuilder::new("Cut off")
            .add_node("t", NodeType::Trigger)
            .add_node("a", NodeType::Action)
            .add_node("e", NodeType::End)
            .connect("t", "a")
            .connect("a", "t")
            .build();

        let errors = validate_workflow(&doc);
        assert_eq!(errors[0], ValidationError::NoReachableEnd);
        assert!(errors.contains(&ValidationError::UnreachableNode {
            node_id: "e".to_string(),
            label: "End".to_string(),
        }));
    }

    #[test]
    fn test_cycles_are_allowed() {
        let doc = WorkflowBuilder::new("Retry loop")
            .add_node("t", NodeType::Trigger)
            .add_node("a", NodeType::Action)
            .add_node("c", NodeType::Condition)
            .add_node("e", NodeType::End)
            .connect("t", "a")
            .connect("a", "c")
            .connect("c", "a")
            .connect("c", "e")
            .build();

        assert!(validate_workflow(&doc).is_empty());
    }

    #[test]
    fn test_errors_follow_check_order() {
        let doc = WorkflowBuilder::new("Messy")
            .add_node("t", NodeType::Trigger)
            .add_node("x", NodeType::Action)
            .build();

        let errors = validate_workflow(&doc);
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], ValidationError::NoReachableEnd);
        assert!(matches!(errors[1], ValidationError::UnreachableNode { ref node_id, .. } if node_id == "x"));
        assert!(matches!(errors[2], ValidationError::DeadEnd { ref node_id, .. } if node_id == "t"));
        assert!(matches!(errors[3], ValidationError::DeadEnd { ref node_id, .. } if node_id == "x"));
    }

    #[test]
    fn test_reachable_from_includes_start() {
        let doc = WorkflowBuilder::new("Reach")
            .add_node("a", NodeType::Trigger)
            .add_node("b", NodeType::Action)
            .add_node("c", NodeType::End)
            .connect("a", "b")
            .build();

        let reachable = reachable_from(&doc, "a");
        assert!(reachable.contains("a"));
        assert!(reachable.contains("b"));
        assert!(!reachable.contains("c"));
    }

    #[test]
    fn test_report_from_errors() {
        let report = ValidationReport::from_errors(&[ValidationError::MissingTrigger]);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec!["workflow must contain exactly one trigger node".to_string()]
        );
        assert!(ValidationReport::from_errors(&[]).valid);
    }

    #[test]
    fn test_repair_reports_every_drop() {
        let doc = WorkflowBuilder::new("Imported")
            .add_node("t", NodeType::Trigger)
            .add_node("e", NodeType::End)
            .add_node("t", NodeType::Action)
            .connect("t", "e")
            .connect("e", "ghost")
            .connect("t", "t")
            .connect("t", "e")
            .build();

        let (repaired, issues) = repair_document(doc);

        assert_eq!(repaired.nodes.len(), 2);
        assert_eq!(repaired.nodes[0].node_type, NodeType::Trigger);
        assert_eq!(repaired.connections.len(), 1);
        assert_eq!(
            issues,
            vec![
                IntegrityIssue::DuplicateNodeId {
                    node_id: "t".to_string()
                },
                IntegrityIssue::DanglingConnection {
                    source: "e".to_string(),
                    target: "ghost".to_string(),
                },
                IntegrityIssue::SelfLoop {
                    node_id: "t".to_string()
                },
                IntegrityIssue::DuplicateConnection {
                    source: "t".to_string(),
                    target: "e".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_repair_resets_non_finite_positions() {
        let doc = WorkflowBuilder::new("Layout")
            .add_node("t", NodeType::Trigger)
            .at(f64::NAN, 10.0)
            .add_node("e", NodeType::End)
            .at(40.0, 10.0)
            .build();

        let (repaired, issues) = repair_document(doc);
        assert_eq!(repaired.nodes[0].position, Position::default());
        assert_eq!(repaired.nodes[1].position, Position::new(40.0, 10.0));
        assert_eq!(
            issues,
            vec![IntegrityIssue::NonFinitePosition {
                node_id: "t".to_string()
            }]
        );
    }

    #[test]
    fn test_repair_leaves_clean_document_alone() {
        let doc = WorkflowBuilder::new("Clean")
            .add_node("t", NodeType::Trigger)
            .add_node("e", NodeType::End)
            .connect("t", "e")
            .build();

        let (repaired, issues) = repair_document(doc.clone());
        assert!(issues.is_empty());
        assert_eq!(repaired, doc);
    }

    #[test]
    fn test_report_lists_repairs_before_graph_errors() {
        let issues = [IntegrityIssue::DanglingConnection {
            source: "e".to_string(),
            target: "ghost".to_string(),
        }];
        let report = ValidationReport::from_checks(&issues, &[ValidationError::NoReachableEnd]);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![
                "connection 'e' -> 'ghost' references a missing node".to_string(),
                "workflow must contain at least one reachable end node".to_string(),
            ]
        );
        assert!(!ValidationReport::from_checks(&issues, &[]).valid);
    }
}
